//! Application configuration. Environment-level settings under the
//! `WA_BULK_` prefix; CLI flags override these, these override defaults.

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Persistent Firefox profile directory. Read from WA_BULK_PROFILE_DIR.
    pub profile_dir: Option<String>,

    /// Root for per-run artifact directories. Read from WA_BULK_RUNS_DIR.
    pub runs_dir: Option<String>,

    /// Seconds to wait for QR login. Read from WA_BULK_LOGIN_TIMEOUT_SECS.
    #[serde(default)]
    pub login_timeout_secs: Option<u64>,

    /// Pacing delay between sends in ms. Read from WA_BULK_SEND_DELAY_MS.
    #[serde(default)]
    pub send_delay_ms: Option<u64>,

    /// Seconds to wait for the per-message delivery tick. Read from
    /// WA_BULK_ACK_TIMEOUT_SECS.
    #[serde(default)]
    pub ack_timeout_secs: Option<u64>,

    /// Seconds to wait for a chat to open after a deep link. Read from
    /// WA_BULK_CHAT_OPEN_TIMEOUT_SECS.
    #[serde(default)]
    pub chat_open_timeout_secs: Option<u64>,

    /// Attach to a running WebDriver server instead of spawning geckodriver.
    /// Read from WA_BULK_WEBDRIVER_URL.
    #[serde(default)]
    pub webdriver_url: Option<String>,

    /// geckodriver binary name/path. Read from WA_BULK_GECKODRIVER_BIN.
    #[serde(default)]
    pub geckodriver_bin: Option<String>,

    /// Port for the spawned geckodriver. Read from WA_BULK_WEBDRIVER_PORT.
    #[serde(default)]
    pub webdriver_port: Option<u16>,

    /// Browser page-load timeout in ms. Read from WA_BULK_PAGE_LOAD_TIMEOUT_MS.
    #[serde(default)]
    pub page_load_timeout_ms: Option<u64>,

    /// Required country prefix for recipients. Read from WA_BULK_NUMBER_PREFIX.
    #[serde(default)]
    pub number_prefix: Option<String>,

    /// Required digit count for recipients. Read from WA_BULK_NUMBER_DIGITS.
    #[serde(default)]
    pub number_digits: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        // try_parsing: numeric fields arrive as env strings otherwise.
        c = c.add_source(config::Environment::with_prefix("WA_BULK").try_parsing(true));
        if let Ok(path) = std::env::var("WA_BULK_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let cfg: Self = c.build()?.try_deserialize()?;
        Ok(cfg)
    }

    pub fn profile_dir_or_default(&self) -> String {
        self.profile_dir
            .clone()
            .unwrap_or_else(|| "wa_profile".to_string())
    }

    pub fn runs_dir_or_default(&self) -> String {
        self.runs_dir.clone().unwrap_or_else(|| "runs".to_string())
    }

    pub fn login_timeout_secs_or_default(&self) -> u64 {
        self.login_timeout_secs.unwrap_or(45)
    }

    pub fn send_delay_ms_or_default(&self) -> u64 {
        self.send_delay_ms.unwrap_or(3000)
    }

    pub fn ack_timeout_secs_or_default(&self) -> u64 {
        self.ack_timeout_secs.unwrap_or(20)
    }

    pub fn chat_open_timeout_secs_or_default(&self) -> u64 {
        self.chat_open_timeout_secs.unwrap_or(15)
    }

    pub fn geckodriver_bin_or_default(&self) -> String {
        self.geckodriver_bin
            .clone()
            .unwrap_or_else(|| "geckodriver".to_string())
    }

    pub fn webdriver_port_or_default(&self) -> u16 {
        self.webdriver_port.unwrap_or(4444)
    }

    pub fn page_load_timeout_ms_or_default(&self) -> u64 {
        self.page_load_timeout_ms.unwrap_or(120_000)
    }

    pub fn number_prefix_or_default(&self) -> String {
        self.number_prefix
            .clone()
            .unwrap_or_else(|| "966".to_string())
    }

    pub fn number_digits_or_default(&self) -> usize {
        self.number_digits.unwrap_or(12)
    }
}
