// # WebDriver Panel
//
// This crate drives the Timeweb hosting panel through a real browser, talking
// to chromedriver or geckodriver over the WebDriver protocol.
//
// ## Layout
//
// - [`WebDriverLauncher`]: starts a browser session with the configured options
// - [`WebDriverPanel`]: the `PanelPage` implementation over that session
// - [`selectors`]: every DOM selector the panel depends on
//
// ## Browser options
//
// Both browsers run headless by default, at 1920x1080, with a fixed desktop
// user agent and the usual automation markers suppressed
// (`navigator.webdriver`, the `enable-automation` switch).
//
// ## Security
//
// The panel password is typed into the login form and never logged.

pub mod page;
pub mod selectors;

pub use page::WebDriverPanel;

use async_trait::async_trait;
use thirtyfour::prelude::*;
use thirtyfour::common::capabilities::firefox::FirefoxPreferences;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities, FirefoxCapabilities};
use timeweb_ddns_core::traits::{PanelLauncher, PanelPage};
use timeweb_ddns_core::{BrowserKind, DdnsConfig, Error, Result};

/// User agent presented to the panel
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:139.0) Gecko/20100101 Firefox/139.0";

/// Script that hides the `navigator.webdriver` flag
pub(crate) const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// How the browser is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub browser: BrowserKind,
    pub server_url: String,
    pub headless: bool,
    pub chrome_binary: Option<String>,
}

impl BrowserOptions {
    pub fn from_config(config: &DdnsConfig) -> Self {
        Self {
            browser: config.browser,
            server_url: config.webdriver_url(),
            headless: config.headless,
            chrome_binary: config.chrome_binary.clone().filter(|b| !b.is_empty()),
        }
    }

    /// Command-line switches passed to Chrome
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--window-size=1920,1080",
                "--disable-blink-features=AutomationControlled",
            ]
            .map(String::from),
        );
        args.push(format!("--user-agent={}", USER_AGENT));
        args
    }

    /// Command-line switches passed to Firefox
    pub fn firefox_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push("--width=1920".to_string());
        args.push("--height=1080".to_string());
        args
    }

    fn chrome_capabilities(&self) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in self.chrome_args() {
            caps.add_arg(&arg)?;
        }
        caps.add_experimental_option("excludeSwitches", vec!["enable-automation"])?;
        caps.add_experimental_option("useAutomationExtension", false)?;
        if let Some(binary) = &self.chrome_binary {
            caps.set_binary(binary)?;
        }
        Ok(caps)
    }

    fn firefox_capabilities(&self) -> WebDriverResult<FirefoxCapabilities> {
        let mut caps = DesiredCapabilities::firefox();
        for arg in self.firefox_args() {
            caps.add_arg(&arg)?;
        }

        let mut prefs = FirefoxPreferences::new();
        prefs.set_user_agent(USER_AGENT.to_string())?;
        prefs.set("dom.webdriver.enabled", false)?;
        prefs.set("useAutomationExtension", false)?;
        caps.set_preferences(prefs)?;
        Ok(caps)
    }
}

/// Map a WebDriver failure into the crate error type
pub(crate) fn browser_error(e: WebDriverError) -> Error {
    Error::browser(e.to_string())
}

/// Starts browser sessions against a WebDriver server
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    options: BrowserOptions,
}

impl WebDriverLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    pub fn from_config(config: &DdnsConfig) -> Self {
        Self::new(BrowserOptions::from_config(config))
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }
}

#[async_trait]
impl PanelLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn PanelPage>> {
        let driver = match self.options.browser {
            BrowserKind::Chrome => {
                tracing::info!("Using Chrome via {}", self.options.server_url);
                let caps = self.options.chrome_capabilities().map_err(browser_error)?;
                WebDriver::new(self.options.server_url.as_str(), caps).await
            }
            BrowserKind::Firefox => {
                tracing::info!("Using Firefox via {}", self.options.server_url);
                let caps = self.options.firefox_capabilities().map_err(browser_error)?;
                WebDriver::new(self.options.server_url.as_str(), caps).await
            }
        }
        .map_err(|e| {
            Error::browser(format!(
                "Could not start {} through {}: {}",
                self.options.browser, self.options.server_url, e
            ))
        })?;

        let mut panel = WebDriverPanel::new(driver);
        panel.hide_automation().await;
        Ok(Box::new(panel))
    }
}
