//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Per-recipient failures are
//! not errors; they live in `SendOutcome`. These variants are run-level.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("browser driver error: {0}")]
    Browser(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("profile locked: {0}")]
    Lock(String),
}
