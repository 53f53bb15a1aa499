//! wa-bulk: bulk WhatsApp sending through an automated, profile-bound
//! Firefox session, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
