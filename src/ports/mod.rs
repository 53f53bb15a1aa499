//! Port traits. API boundaries for the hexagon.
//!
//! Outbound only: the CLI is a pre-validated configuration source, not an
//! inbound port.

pub mod outbound;

pub use outbound::{ArtifactPort, BrowserPort, DriverPort, MarkerCatalog, ProgressPort, Selector};
