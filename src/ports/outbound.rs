//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters. The browser-automation driver is a black box
//! behind `DriverPort`/`BrowserPort`; UI markers are plain `Selector` data,
//! so a platform UI change never touches the session or delivery state
//! machines.

use crate::domain::{DomainError, RunConfig, RunSummary, SendResult};
use std::path::Path;
use std::sync::Arc;

/// Locator for a page element. All platform markers are static data in the
/// adapter layer's marker catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Css(&'static str),
    XPath(&'static str),
}

/// UI detectors the state machines poll, plus the deep-link scheme. The
/// concrete values live in the adapter layer's marker catalog; swapping them
/// tracks platform UI changes without touching the state machines.
#[derive(Debug, Clone, Copy)]
pub struct MarkerCatalog {
    pub base_url: &'static str,
    /// Any of these visible means the account is logged in.
    pub authenticated: &'static [Selector],
    /// Any of these visible means the login (QR) screen is showing.
    pub login_screen: &'static [Selector],
    /// Chat text composer, most specific first (the caption editor is
    /// excluded by the locators themselves).
    pub composer: &'static [Selector],
    /// Modal shown when the deep-linked number is not on the platform.
    pub invalid_number: &'static [Selector],
    pub attach_button: &'static [Selector],
    pub file_input: &'static [Selector],
    pub caption_editor: &'static [Selector],
    pub send_button: &'static [Selector],
    /// Per-message delivery tick shown after a successful submit.
    pub delivery_ack: &'static [Selector],
}

impl MarkerCatalog {
    /// Deep link opening the conversation for a normalized identifier.
    pub fn chat_url(&self, number: &str) -> String {
        format!("{}send?phone={}", self.base_url, number)
    }

    /// Deep link that opens the conversation with the text pre-filled.
    pub fn prefill_url(&self, number: &str, text: &str) -> String {
        format!(
            "{}send?phone={}&text={}",
            self.base_url,
            number,
            urlencoding::encode(text)
        )
    }
}

/// Launches one browser bound to the persistent profile. One launch per
/// phase: the headless bootstrap opens a visible window first, then a
/// second, headless one on the same profile.
#[async_trait::async_trait]
pub trait DriverPort: Send + Sync {
    async fn launch(&self, headless: bool) -> Result<Arc<dyn BrowserPort>, DomainError>;
}

/// Primitive operations on one live browser session.
///
/// Methods that target an element return `Ok(false)` when the element is not
/// present or not visible yet; polling loops live in the use cases, bounded
/// by their own timeouts. `Err` means the driver itself failed and the run
/// cannot continue.
#[async_trait::async_trait]
pub trait BrowserPort: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DomainError>;

    /// True if any of the selectors matches a displayed element.
    async fn any_visible(&self, selectors: &[Selector]) -> Result<bool, DomainError>;

    /// Click the first displayed match. False if nothing clickable matched.
    async fn click(&self, selector: &Selector) -> Result<bool, DomainError>;

    /// Current text of a rich-text editor, or None if it is not displayed.
    async fn editor_text(&self, selector: &Selector) -> Result<Option<String>, DomainError>;

    /// Fill a rich-text editor: clears it, writes `text` preserving line
    /// breaks and bidirectional script direction, fires an input event.
    /// False if the editor is not displayed.
    async fn set_editor_text(&self, selector: &Selector, text: &str) -> Result<bool, DomainError>;

    /// Send Enter to the focused element (submits the composer).
    async fn press_enter(&self) -> Result<(), DomainError>;

    /// Feed a local file path into a file input. False if the input is absent.
    async fn upload_file(&self, selector: &Selector, path: &Path) -> Result<bool, DomainError>;

    /// Tear down the session and the browser process.
    async fn close(&self) -> Result<(), DomainError>;
}

/// Run artifact sink. `record` is called once per result as it is produced
/// so a crash mid-run loses nothing; `finalize` writes the summary set.
#[async_trait::async_trait]
pub trait ArtifactPort: Send + Sync {
    async fn record(&self, result: &SendResult) -> Result<(), DomainError>;

    async fn finalize(&self, summary: &RunSummary, config: &RunConfig)
        -> Result<(), DomainError>;
}

/// Progress notifications for the operator console. Implementations must not
/// block; the null implementation is used by tests.
pub trait ProgressPort: Send + Sync {
    fn login_wait(&self, waiting: bool);
    fn batch_started(&self, total: usize);
    fn send_started(&self, index: usize, total: usize, number: &str);
    fn send_finished(&self, result: &SendResult);
    fn batch_finished(&self, summary: &RunSummary);
}
