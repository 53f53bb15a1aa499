//! Browser adapters: the WebDriver-backed driver, the platform marker
//! catalog, and the scripted mock.

pub mod markers;
pub mod mock;
pub mod webdriver;

pub use markers::WHATSAPP_WEB;
pub use mock::{MockBehavior, MockDriver};
pub use webdriver::{GeckoDriverFactory, WebDriverOptions};
