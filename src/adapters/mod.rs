//! Infrastructure adapters. Implement outbound ports.
//!
//! WebDriver, filesystem, console. Map errors to DomainError.

pub mod browser;
pub mod persistence;
pub mod ui;
