//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod validator;

pub use entities::{
    FailureReason, FormatPolicy, MediaAttachment, MediaKind, Recipient, RunConfig, RunSummary,
    SendOutcome, SendResult, SessionState, ValidationFailure, MAX_MEDIA_BYTES,
};
pub use errors::DomainError;
