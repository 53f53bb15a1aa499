//! Scripted in-memory browser. Backs `--dry-run` and the test suite: the
//! full pipeline runs against it without launching Firefox.
//!
//! Marker groups are interpreted by membership against the catalog, so the
//! mock stays in lockstep with the real detectors.

use crate::domain::DomainError;
use crate::ports::{BrowserPort, DriverPort, MarkerCatalog, Selector};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted platform behavior for one run.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Account is logged in from the start.
    pub authenticated: bool,
    /// Show the delivery tick after a submit.
    pub confirm_delivery: bool,
    /// Numbers the platform reports as invalid.
    pub unreachable: HashSet<String>,
    /// Simulate external session revocation after this many submits.
    pub logout_after_sends: Option<usize>,
}

impl MockBehavior {
    /// The dry-run profile: everything succeeds.
    pub fn delivering() -> Self {
        Self {
            authenticated: true,
            confirm_delivery: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    authenticated: AtomicBool,
    submits: AtomicUsize,
    navigations: AtomicUsize,
    ui_actions: AtomicUsize,
    current_url: Mutex<Option<String>>,
}

/// DriverPort implementation sharing one scripted state across launches
/// (the headless bootstrap relaunches on the same "profile").
pub struct MockDriver {
    behavior: MockBehavior,
    markers: MarkerCatalog,
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new(behavior: MockBehavior, markers: MarkerCatalog) -> Self {
        let state = Arc::new(MockState::default());
        state
            .authenticated
            .store(behavior.authenticated, Ordering::SeqCst);
        Self {
            behavior,
            markers,
            state,
        }
    }

    /// Navigations performed (page loads).
    pub fn navigations(&self) -> usize {
        self.state.navigations.load(Ordering::SeqCst)
    }

    /// Element-level interactions: clicks, fills, uploads, key presses.
    pub fn ui_actions(&self) -> usize {
        self.state.ui_actions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverPort for MockDriver {
    async fn launch(&self, _headless: bool) -> Result<Arc<dyn BrowserPort>, DomainError> {
        Ok(Arc::new(MockBrowser {
            behavior: self.behavior.clone(),
            markers: self.markers,
            state: Arc::clone(&self.state),
        }))
    }
}

/// One scripted session.
pub struct MockBrowser {
    behavior: MockBehavior,
    markers: MarkerCatalog,
    state: Arc<MockState>,
}

impl MockBrowser {
    fn is_authed(&self) -> bool {
        self.state.authenticated.load(Ordering::SeqCst)
    }

    fn current_number(&self) -> Option<String> {
        let url = self
            .state
            .current_url
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()?;
        let rest = url.split_once("phone=")?.1;
        Some(
            rest.split('&')
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }

    fn chat_open(&self) -> bool {
        match self.current_number() {
            Some(number) => self.is_authed() && !self.behavior.unreachable.contains(&number),
            None => false,
        }
    }

    fn touch(&self) {
        self.state.ui_actions.fetch_add(1, Ordering::SeqCst);
    }

    /// A submit happened; possibly revoke the session afterwards.
    fn register_submit(&self) {
        let n = self.state.submits.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.behavior.logout_after_sends {
            if n >= limit {
                self.state.authenticated.store(false, Ordering::SeqCst);
            }
        }
    }

    fn in_group(sels: &[Selector], group: &[Selector]) -> bool {
        sels.iter().any(|s| group.contains(s))
    }
}

#[async_trait]
impl BrowserPort for MockBrowser {
    async fn goto(&self, url: &str) -> Result<(), DomainError> {
        self.state.navigations.fetch_add(1, Ordering::SeqCst);
        *self
            .state
            .current_url
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
        Ok(())
    }

    async fn any_visible(&self, selectors: &[Selector]) -> Result<bool, DomainError> {
        let m = &self.markers;
        if Self::in_group(selectors, m.authenticated) {
            return Ok(self.is_authed());
        }
        if Self::in_group(selectors, m.login_screen) {
            return Ok(!self.is_authed());
        }
        if Self::in_group(selectors, m.invalid_number) {
            let unreachable = self
                .current_number()
                .is_some_and(|n| self.behavior.unreachable.contains(&n));
            return Ok(unreachable);
        }
        if Self::in_group(selectors, m.composer) {
            return Ok(self.chat_open());
        }
        if Self::in_group(selectors, m.delivery_ack) {
            return Ok(self.is_authed() && self.behavior.confirm_delivery);
        }
        if Self::in_group(selectors, m.caption_editor)
            || Self::in_group(selectors, m.send_button)
            || Self::in_group(selectors, m.attach_button)
        {
            return Ok(self.chat_open());
        }
        Ok(false)
    }

    async fn click(&self, selector: &Selector) -> Result<bool, DomainError> {
        if !self.chat_open() {
            return Ok(false);
        }
        self.touch();
        if self.markers.send_button.contains(selector) {
            self.register_submit();
        }
        Ok(true)
    }

    async fn editor_text(&self, selector: &Selector) -> Result<Option<String>, DomainError> {
        if self.chat_open()
            && (self.markers.composer.contains(selector)
                || self.markers.caption_editor.contains(selector))
        {
            // Deep-link prefill is not simulated; the composer falls back to
            // the DOM fill path.
            Ok(Some(String::new()))
        } else {
            Ok(None)
        }
    }

    async fn set_editor_text(&self, _selector: &Selector, _text: &str) -> Result<bool, DomainError> {
        if !self.chat_open() {
            return Ok(false);
        }
        self.touch();
        Ok(true)
    }

    async fn press_enter(&self) -> Result<(), DomainError> {
        self.touch();
        self.register_submit();
        Ok(())
    }

    async fn upload_file(&self, _selector: &Selector, _path: &Path) -> Result<bool, DomainError> {
        if !self.chat_open() {
            return Ok(false);
        }
        self.touch();
        Ok(true)
    }

    async fn close(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
