//! Session lifecycle: launch the profile-bound browser, detect the
//! authenticated UI state, wait for QR login within a bounded window.
//!
//! The state machine follows the `SessionState` enum; `Expired` and `Failed`
//! are terminal for the run. The browser is acquired here and released via
//! `close()` on every exit path.

use crate::domain::{DomainError, SessionState};
use crate::ports::{BrowserPort, DriverPort, MarkerCatalog, ProgressPort};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Interval between authentication-marker probes while waiting for login.
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Owns the one authenticated browser session of the run.
pub struct SessionService {
    driver: Arc<dyn DriverPort>,
    markers: MarkerCatalog,
    progress: Arc<dyn ProgressPort>,
    /// Final sending phase runs headless; login always happens in a visible
    /// window first (QR code must be scannable).
    headless: bool,
    login_timeout: Duration,
    state: Mutex<SessionState>,
    browser: tokio::sync::Mutex<Option<Arc<dyn BrowserPort>>>,
    ever_authenticated: Mutex<bool>,
}

impl SessionService {
    pub fn new(
        driver: Arc<dyn DriverPort>,
        markers: MarkerCatalog,
        progress: Arc<dyn ProgressPort>,
        headless: bool,
        login_timeout: Duration,
    ) -> Self {
        Self {
            driver,
            markers,
            progress,
            headless,
            login_timeout,
            state: Mutex::new(SessionState::Uninitialized),
            browser: tokio::sync::Mutex::new(None),
            ever_authenticated: Mutex::new(false),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True once the session has reached `Authenticated`, even if it expired
    /// later. Drives the process exit code.
    pub fn ever_authenticated(&self) -> bool {
        *self
            .ever_authenticated
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
        if next == SessionState::Authenticated {
            *self
                .ever_authenticated
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = true;
        }
    }

    /// The live browser, once `ensure_ready` reached `Authenticated`.
    pub async fn browser(&self) -> Option<Arc<dyn BrowserPort>> {
        self.browser.lock().await.clone()
    }

    /// Bring the session to a decided state. Idempotent: `Authenticated`,
    /// `Expired` and `Failed` are returned as-is; only an undecided session
    /// launches the browser and runs the login wait.
    pub async fn ensure_ready(&self) -> Result<SessionState, DomainError> {
        match self.state() {
            SessionState::Authenticated => return Ok(SessionState::Authenticated),
            SessionState::Expired => return Ok(SessionState::Expired),
            SessionState::Failed => return Ok(SessionState::Failed),
            SessionState::Uninitialized | SessionState::AwaitingAuthentication => {}
        }

        if self.headless {
            // Login needs a visible window for the QR scan. Run it on the
            // same profile, close, then relaunch headless: the profile keeps
            // the authenticated state.
            info!("opening visible bootstrap window for login");
            let bootstrap = self.driver.launch(false).await?;
            let outcome = self.wait_for_login(bootstrap.as_ref()).await;
            if let Err(e) = bootstrap.close().await {
                warn!(error = %e, "bootstrap window close failed");
            }
            match outcome {
                Ok(true) => info!("login confirmed in profile"),
                Ok(false) => {
                    self.set_state(SessionState::Failed);
                    return Ok(SessionState::Failed);
                }
                Err(e) => {
                    self.set_state(SessionState::Failed);
                    return Err(e);
                }
            }
        }

        let browser = self.driver.launch(self.headless).await?;
        let authenticated = match self.wait_for_login(browser.as_ref()).await {
            Ok(v) => v,
            Err(e) => {
                self.set_state(SessionState::Failed);
                *self.browser.lock().await = Some(browser);
                return Err(e);
            }
        };
        *self.browser.lock().await = Some(browser);

        if authenticated {
            self.set_state(SessionState::Authenticated);
            Ok(SessionState::Authenticated)
        } else {
            warn!(
                timeout_secs = self.login_timeout.as_secs(),
                "login not detected within timeout"
            );
            self.set_state(SessionState::Failed);
            Ok(SessionState::Failed)
        }
    }

    /// Re-probe an `Authenticated` session. A visible login screen means the
    /// session was revoked externally: transition to `Expired` (terminal).
    pub async fn verify_active(&self) -> Result<SessionState, DomainError> {
        if self.state() != SessionState::Authenticated {
            return Ok(self.state());
        }
        let Some(browser) = self.browser().await else {
            return Ok(self.state());
        };
        if browser.any_visible(self.markers.login_screen).await? {
            warn!("logged-out marker observed mid-run; session expired");
            self.set_state(SessionState::Expired);
        }
        Ok(self.state())
    }

    /// Close the browser. Safe to call on every exit path, including after
    /// failures; the first call wins.
    pub async fn close(&self) {
        if let Some(browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "browser close failed");
            }
        }
    }

    /// Navigate to the web client and poll for an authenticated-state marker
    /// until the login timeout elapses. Ok(false) = timeout, not an error.
    async fn wait_for_login(&self, browser: &dyn BrowserPort) -> Result<bool, DomainError> {
        browser.goto(self.markers.base_url).await?;

        if browser.any_visible(self.markers.authenticated).await? {
            return Ok(true);
        }

        self.set_state(SessionState::AwaitingAuthentication);
        self.progress.login_wait(true);
        let deadline = Instant::now() + self.login_timeout;
        let result = loop {
            match browser.any_visible(self.markers.authenticated).await {
                Ok(true) => break Ok(true),
                Ok(false) => {}
                Err(e) => break Err(e),
            }
            if Instant::now() >= deadline {
                break Ok(false);
            }
            tokio::time::sleep(LOGIN_POLL_INTERVAL).await;
        };
        self.progress.login_wait(false);
        result
    }
}
