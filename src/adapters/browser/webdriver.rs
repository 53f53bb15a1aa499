//! Implements DriverPort/BrowserPort over the WebDriver protocol via
//! fantoccini, driving Firefox through geckodriver.
//!
//! The geckodriver process is spawned per launch and torn down with the
//! session, unless an external `webdriver_url` is configured. The persistent
//! profile is passed through `moz:firefoxOptions`, which is what keeps the
//! QR login across runs.

use crate::domain::DomainError;
use crate::ports::{BrowserPort, DriverPort, Selector};
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const CONNECT_ATTEMPTS: u32 = 10;
const CONNECT_PAUSE: Duration = Duration::from_millis(500);

/// WebDriver Enter key (W3C keyboard codepoint).
const ENTER_KEY: &str = "\u{e007}";

/// Clears a rich-text (lexical) editor and rewrites it line by line. DOM
/// text nodes plus `dir=auto` keep multi-line and RTL content intact where
/// plain keystroke injection reorders it.
const SET_EDITOR_TEXT_JS: &str = r#"
const el = arguments[0];
const txt = String(arguments[1] ?? '');
el.setAttribute('dir', 'auto');
el.focus();
while (el.firstChild) el.removeChild(el.firstChild);
const lines = txt.split('\n');
for (let i = 0; i < lines.length; i++) {
    if (i) el.appendChild(document.createElement('br'));
    el.appendChild(document.createTextNode(lines[i]));
}
el.dispatchEvent(new InputEvent('input', {bubbles: true}));
return (el.innerText || el.textContent || '').split('\r').join('');
"#;

const EDITOR_TEXT_JS: &str = "return (arguments[0].innerText || '').split('\\r').join('');";

/// Scroll-into-view plus JS click: immune to overlays intercepting the
/// native click.
const CLICK_JS: &str =
    "arguments[0].scrollIntoView({block:'center'}); arguments[0].click(); return true;";

/// Launch-time settings for the Firefox/geckodriver pair.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    pub profile_dir: PathBuf,
    pub geckodriver_bin: String,
    /// Attach to an already-running WebDriver server instead of spawning one.
    pub webdriver_url: Option<String>,
    pub port: u16,
    pub page_load_timeout_ms: u64,
}

/// DriverPort implementation: one geckodriver + Firefox per launch, all
/// bound to the same persistent profile directory.
pub struct GeckoDriverFactory {
    opts: WebDriverOptions,
}

impl GeckoDriverFactory {
    pub fn new(opts: WebDriverOptions) -> Self {
        Self { opts }
    }
}

#[async_trait]
impl DriverPort for GeckoDriverFactory {
    async fn launch(&self, headless: bool) -> Result<Arc<dyn BrowserPort>, DomainError> {
        let browser = WebDriverBrowser::launch(&self.opts, headless).await?;
        Ok(Arc::new(browser))
    }
}

/// One live WebDriver session.
pub struct WebDriverBrowser {
    client: Client,
    /// Present only when we spawned geckodriver ourselves.
    driver_process: tokio::sync::Mutex<Option<Child>>,
}

impl WebDriverBrowser {
    pub async fn launch(opts: &WebDriverOptions, headless: bool) -> Result<Self, DomainError> {
        std::fs::create_dir_all(&opts.profile_dir)
            .map_err(|e| DomainError::Browser(format!("create profile dir: {e}")))?;
        let profile = opts
            .profile_dir
            .canonicalize()
            .unwrap_or_else(|_| opts.profile_dir.clone());

        let (url, child) = match &opts.webdriver_url {
            Some(url) => (url.clone(), None),
            None => {
                let child = Command::new(&opts.geckodriver_bin)
                    .arg("--port")
                    .arg(opts.port.to_string())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| {
                        DomainError::Browser(format!(
                            "start {}: {e} (is geckodriver installed?)",
                            opts.geckodriver_bin
                        ))
                    })?;
                (format!("http://localhost:{}", opts.port), Some(child))
            }
        };

        let mut firefox_args = vec![
            Value::String("-profile".into()),
            Value::String(profile.display().to_string()),
        ];
        if headless {
            firefox_args.push(Value::String("-headless".into()));
        }
        let caps = json!({
            "moz:firefoxOptions": { "args": firefox_args },
            "timeouts": { "pageLoad": opts.page_load_timeout_ms },
        });
        let caps = caps
            .as_object()
            .cloned()
            .ok_or_else(|| DomainError::Browser("capabilities must be an object".into()))?;

        // Session startup is racy right after spawning geckodriver; retry
        // with a short pause, like any driver bootstrap.
        let mut connected: Option<Client> = None;
        let mut last_err: Option<String> = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            let mut builder = ClientBuilder::rustls()
                .map_err(|e| DomainError::Browser(format!("tls setup: {e}")))?;
            builder.capabilities(caps.clone());
            match builder.connect(&url).await {
                Ok(client) => {
                    connected = Some(client);
                    break;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "webdriver connect attempt failed");
                    last_err = Some(e.to_string());
                    tokio::time::sleep(CONNECT_PAUSE).await;
                }
            }
        }

        match connected {
            Some(client) => {
                info!(%url, headless, profile = %profile.display(), "browser session started");
                Ok(Self {
                    client,
                    driver_process: tokio::sync::Mutex::new(child),
                })
            }
            None => {
                if let Some(mut child) = child {
                    let _ = child.start_kill();
                }
                Err(DomainError::Browser(format!(
                    "webdriver connect to {url} failed after {CONNECT_ATTEMPTS} attempts: {}",
                    last_err.unwrap_or_else(|| "unknown".into())
                )))
            }
        }
    }

    fn locator(selector: &Selector) -> Locator<'static> {
        match *selector {
            Selector::Css(css) => Locator::Css(css),
            Selector::XPath(xpath) => Locator::XPath(xpath),
        }
    }

    fn map_err(e: CmdError) -> DomainError {
        DomainError::Browser(e.to_string())
    }

    /// First displayed element matching the selector, if any.
    async fn first_displayed(&self, selector: &Selector) -> Result<Option<Element>, DomainError> {
        let elems = self
            .client
            .find_all(Self::locator(selector))
            .await
            .map_err(Self::map_err)?;
        for elem in elems {
            // Stale elements read as not displayed.
            if elem.is_displayed().await.unwrap_or(false) {
                return Ok(Some(elem));
            }
        }
        Ok(None)
    }

    async fn execute_on(
        &self,
        elem: &Element,
        script: &str,
        extra: Vec<Value>,
    ) -> Result<Value, DomainError> {
        let mut args = vec![serde_json::to_value(elem)
            .map_err(|e| DomainError::Browser(format!("serialize element ref: {e}")))?];
        args.extend(extra);
        self.client
            .execute(script, args)
            .await
            .map_err(Self::map_err)
    }
}

#[async_trait]
impl BrowserPort for WebDriverBrowser {
    async fn goto(&self, url: &str) -> Result<(), DomainError> {
        self.client.goto(url).await.map_err(Self::map_err)
    }

    async fn any_visible(&self, selectors: &[Selector]) -> Result<bool, DomainError> {
        for selector in selectors {
            if self.first_displayed(selector).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn click(&self, selector: &Selector) -> Result<bool, DomainError> {
        match self.first_displayed(selector).await? {
            Some(elem) => {
                self.execute_on(&elem, CLICK_JS, vec![]).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn editor_text(&self, selector: &Selector) -> Result<Option<String>, DomainError> {
        match self.first_displayed(selector).await? {
            Some(elem) => {
                let value = self.execute_on(&elem, EDITOR_TEXT_JS, vec![]).await?;
                Ok(Some(value.as_str().unwrap_or_default().to_string()))
            }
            None => Ok(None),
        }
    }

    async fn set_editor_text(&self, selector: &Selector, text: &str) -> Result<bool, DomainError> {
        match self.first_displayed(selector).await? {
            Some(elem) => {
                self.execute_on(
                    &elem,
                    SET_EDITOR_TEXT_JS,
                    vec![Value::String(text.to_string())],
                )
                .await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn press_enter(&self) -> Result<(), DomainError> {
        let active = self.client.active_element().await.map_err(Self::map_err)?;
        active.send_keys(ENTER_KEY).await.map_err(Self::map_err)
    }

    async fn upload_file(&self, selector: &Selector, path: &Path) -> Result<bool, DomainError> {
        // File inputs are hidden in the attach menu; presence is enough.
        let elems = self
            .client
            .find_all(Self::locator(selector))
            .await
            .map_err(Self::map_err)?;
        let Some(input) = elems.into_iter().next() else {
            return Ok(false);
        };
        let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        input
            .send_keys(&abs.display().to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(true)
    }

    async fn close(&self) -> Result<(), DomainError> {
        let result = self.client.clone().close().await.map_err(Self::map_err);
        if let Some(mut child) = self.driver_process.lock().await.take() {
            if let Err(e) = child.start_kill() {
                warn!(error = %e, "geckodriver kill failed");
            }
        }
        result
    }
}
