//! Domain entities. Pure data structures for the core business.
//!
//! No WebDriver/IO types here; these are mapped from adapters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::DomainError;

/// Platform limit for a single media attachment. A file of exactly this size
/// is accepted; one byte over is rejected.
pub const MAX_MEDIA_BYTES: u64 = 50 * 1024 * 1024;

/// Recipient number format policy: required country prefix and exact digit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatPolicy {
    pub prefix: String,
    pub digit_len: usize,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        Self {
            prefix: "966".to_string(),
            digit_len: 12,
        }
    }
}

/// Why a raw input was rejected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Input contained no digits at all.
    Empty,
    /// Digits present but prefix or length does not match the policy.
    Format,
}

/// One message target. Created at load time, immutable thereafter.
/// Invalid recipients keep their raw input verbatim for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub raw: String,
    /// Digits-only, country-code-prefixed identifier. Empty when invalid.
    pub normalized: String,
    pub rejection: Option<ValidationFailure>,
}

impl Recipient {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    /// Identifier used in artifacts: the normalized digits for valid
    /// recipients, the raw input verbatim for rejected ones.
    pub fn reported(&self) -> &str {
        if self.is_valid() {
            &self.normalized
        } else {
            &self.raw
        }
    }
}

/// Media kind, classified from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    Audio,
}

const IMAGE_EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
const DOC_EXTS: &[&str] = &["pdf", "doc", "docx", "txt", "xlsx", "pptx", "csv"];
const AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

/// A media file configured for the run. The extension is classified at
/// construction; existence and size are verified per send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaAttachment {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaAttachment {
    /// Classify a path by extension. Unsupported extensions are a
    /// configuration error, surfaced before any recipient is processed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref().to_path_buf();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let kind = if IMAGE_EXTS.contains(&ext.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if DOC_EXTS.contains(&ext.as_str()) {
            MediaKind::Document
        } else if AUDIO_EXTS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else {
            return Err(DomainError::Config(format!(
                "unsupported file type: .{ext}"
            )));
        };
        Ok(Self { path, kind })
    }
}

/// Effective configuration for one run. Never mutated after validation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub message: Option<String>,
    pub caption: Option<String>,
    pub media: Option<MediaAttachment>,
    pub policy: FormatPolicy,
    /// Pacing delay between sends in milliseconds. The orchestrator applies
    /// a 1s floor.
    pub send_delay_ms: u64,
}

impl RunConfig {
    pub fn has_payload(&self) -> bool {
        self.message.is_some() || self.media.is_some()
    }
}

/// Authentication lifecycle of the browser session. Owned by the session
/// service; `Expired` and `Failed` are terminal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AwaitingAuthentication,
    Authenticated,
    Expired,
    Failed,
}

/// Per-recipient failure taxonomy. Each is local and recorded, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Recipient fails the format policy; never handed to the composer.
    InvalidFormat,
    /// Platform cannot resolve the identifier to a chat.
    RecipientUnreachable,
    /// Attachment missing or over the size limit; no UI interaction attempted.
    MediaInvalid,
    /// Submit happened but no delivery acknowledgment within the timeout.
    /// Ambiguous: the message may have been sent.
    DeliveryUnconfirmed,
    /// Session was not (or no longer) authenticated when this recipient's
    /// turn came. Blanket reason for not-yet-attempted recipients.
    SessionUnavailable,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureReason::InvalidFormat => "invalid format",
            FailureReason::RecipientUnreachable => "recipient unreachable",
            FailureReason::MediaInvalid => "media invalid",
            FailureReason::DeliveryUnconfirmed => "delivery unconfirmed",
            FailureReason::SessionUnavailable => "session unavailable",
        };
        f.write_str(s)
    }
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(FailureReason),
}

/// One recipient, one result. Immutable once created.
#[derive(Debug, Clone)]
pub struct SendResult {
    pub recipient: Recipient,
    pub outcome: SendOutcome,
    pub at: DateTime<Utc>,
}

impl SendResult {
    pub fn new(recipient: Recipient, outcome: SendOutcome) -> Self {
        Self {
            recipient,
            outcome,
            at: Utc::now(),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, SendOutcome::Sent)
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.outcome {
            SendOutcome::Sent => None,
            SendOutcome::Failed(reason) => Some(reason),
        }
    }
}

/// Aggregate of a run. Built incrementally, finalized before artifacts are
/// written. Every recipient appears exactly once.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub results: Vec<SendResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn started() -> Self {
        Self {
            results: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn push(&mut self, result: SendResult) {
        self.results.push(result);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn sent(&self) -> usize {
        self.results.iter().filter(|r| r.is_sent()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.sent()
    }
}
