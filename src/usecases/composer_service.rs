//! Per-recipient message delivery: open the chat, fill text or attach media
//! with caption, submit, and wait for a delivery acknowledgment.
//!
//! Every failure is classified into a `FailureReason` and returned in the
//! outcome; `Err` is reserved for driver-level faults that abort the run.

use crate::domain::{
    DomainError, FailureReason, Recipient, RunConfig, SendOutcome, MAX_MEDIA_BYTES,
};
use crate::ports::{BrowserPort, MarkerCatalog, Selector};
use crate::usecases::SessionService;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Interval between marker probes inside the bounded waits.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives the UI for one send. Stateless between calls; the shared session
/// is the only carried context.
pub struct ComposerService {
    session: Arc<SessionService>,
    markers: MarkerCatalog,
    /// Bound on waiting for the chat (or the invalid-number dialog) to open.
    chat_open_timeout: Duration,
    /// Bound on waiting for the post-submit delivery acknowledgment.
    ack_timeout: Duration,
}

impl ComposerService {
    pub fn new(
        session: Arc<SessionService>,
        markers: MarkerCatalog,
        chat_open_timeout: Duration,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            session,
            markers,
            chat_open_timeout,
            ack_timeout,
        }
    }

    /// Deliver the configured payload to one valid recipient.
    pub async fn send(
        &self,
        recipient: &Recipient,
        config: &RunConfig,
    ) -> Result<SendOutcome, DomainError> {
        // Attachment shape is checked before any UI interaction: a missing or
        // oversized file fails identically for every recipient.
        if let Some(media) = &config.media {
            if let Some(reason) = Self::check_media(media.path.as_path()).await {
                return Ok(SendOutcome::Failed(reason));
            }
        }

        let browser = self
            .session
            .browser()
            .await
            .ok_or_else(|| DomainError::Session("no active browser session".into()))?;

        let number = recipient.normalized.as_str();
        match &config.media {
            None => {
                // Text-only fast path: deep link with the text pre-filled.
                let text = normalize_newlines(config.message.as_deref().unwrap_or_default());
                browser.goto(&self.markers.prefill_url(number, &text)).await?;
                let Some(composer) = self.wait_chat_open(browser.as_ref()).await? else {
                    return Ok(SendOutcome::Failed(FailureReason::RecipientUnreachable));
                };
                let prefilled = browser
                    .editor_text(&composer)
                    .await?
                    .is_some_and(|t| !t.trim().is_empty());
                if !prefilled && !browser.set_editor_text(&composer, &text).await? {
                    warn!(number, "composer rejected text fill");
                    return Ok(SendOutcome::Failed(FailureReason::DeliveryUnconfirmed));
                }
                browser.press_enter().await?;
            }
            Some(media) => {
                browser.goto(&self.markers.chat_url(number)).await?;
                let Some(composer) = self.wait_chat_open(browser.as_ref()).await? else {
                    return Ok(SendOutcome::Failed(FailureReason::RecipientUnreachable));
                };

                debug!(number, path = %media.path.display(), "attaching media");
                if !self.click_any(browser.as_ref(), self.markers.attach_button).await? {
                    warn!(number, "attachment button not found");
                    return Ok(SendOutcome::Failed(FailureReason::DeliveryUnconfirmed));
                }
                if !self
                    .upload_any(browser.as_ref(), self.markers.file_input, media)
                    .await?
                {
                    warn!(number, "file input not found");
                    return Ok(SendOutcome::Failed(FailureReason::DeliveryUnconfirmed));
                }

                if let Some(caption) = &config.caption {
                    self.fill_caption(browser.as_ref(), caption).await?;
                }

                if !self.click_any(browser.as_ref(), self.markers.send_button).await? {
                    // Overlay may swallow the click; Enter submits as well.
                    browser.press_enter().await?;
                }

                // A text message configured alongside media goes out in the
                // same attempt, through the chat composer.
                if let Some(message) = &config.message {
                    let text = normalize_newlines(message);
                    if browser.set_editor_text(&composer, &text).await? {
                        browser.press_enter().await?;
                    } else {
                        warn!(number, "composer not available for trailing text");
                    }
                }
            }
        }

        if self.wait_for_ack(browser.as_ref()).await? {
            Ok(SendOutcome::Sent)
        } else {
            Ok(SendOutcome::Failed(FailureReason::DeliveryUnconfirmed))
        }
    }

    /// None = file missing or oversized. Exactly the limit is accepted.
    async fn check_media(path: &std::path::Path) -> Option<FailureReason> {
        match tokio::fs::metadata(path).await {
            Err(_) => {
                warn!(path = %path.display(), "media file not found");
                Some(FailureReason::MediaInvalid)
            }
            Ok(meta) if meta.len() > MAX_MEDIA_BYTES => {
                warn!(
                    path = %path.display(),
                    size = meta.len(),
                    limit = MAX_MEDIA_BYTES,
                    "media file over size limit"
                );
                Some(FailureReason::MediaInvalid)
            }
            Ok(_) => None,
        }
    }

    /// Wait for the chat composer after a deep-link navigation. Returns the
    /// matched composer locator, or None when the platform reports the
    /// number as invalid or the chat never opens.
    async fn wait_chat_open(
        &self,
        browser: &dyn BrowserPort,
    ) -> Result<Option<Selector>, DomainError> {
        let deadline = Instant::now() + self.chat_open_timeout;
        loop {
            if browser.any_visible(self.markers.invalid_number).await? {
                debug!("platform reports number as invalid");
                return Ok(None);
            }
            for sel in self.markers.composer {
                if browser.any_visible(std::slice::from_ref(sel)).await? {
                    return Ok(Some(*sel));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Fill the caption editor if it shows up; a missing editor downgrades to
    /// sending without caption, matching the platform's optional caption UI.
    async fn fill_caption(
        &self,
        browser: &dyn BrowserPort,
        caption: &str,
    ) -> Result<(), DomainError> {
        let text = normalize_newlines(caption);
        let deadline = Instant::now() + self.chat_open_timeout;
        loop {
            for sel in self.markers.caption_editor {
                if browser.set_editor_text(sel, &text).await? {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                warn!("caption editor not found; sending without caption");
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Poll-click the first locator that becomes clickable.
    async fn click_any(
        &self,
        browser: &dyn BrowserPort,
        locators: &[Selector],
    ) -> Result<bool, DomainError> {
        let deadline = Instant::now() + self.chat_open_timeout;
        loop {
            for sel in locators {
                if browser.click(sel).await? {
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn upload_any(
        &self,
        browser: &dyn BrowserPort,
        locators: &[Selector],
        media: &crate::domain::MediaAttachment,
    ) -> Result<bool, DomainError> {
        let deadline = Instant::now() + self.chat_open_timeout;
        loop {
            for sel in locators {
                if browser.upload_file(sel, &media.path).await? {
                    return Ok(true);
                }
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Bounded poll for a UI-visible delivery acknowledgment.
    async fn wait_for_ack(&self, browser: &dyn BrowserPort) -> Result<bool, DomainError> {
        let deadline = Instant::now() + self.ack_timeout;
        loop {
            if browser.any_visible(self.markers.delivery_ack).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// CRLF and bare CR become LF. Character order is never touched: RTL text is
/// submitted exactly as read.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
