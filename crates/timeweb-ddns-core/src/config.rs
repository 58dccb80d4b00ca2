//! Configuration types for the DDNS updater
//!
//! The configuration is a single JSON object on disk, optionally overridden by
//! environment variables. Everything that used to be process-global (data
//! directory, file locations) lives in [`DataPaths`], which is built once at
//! startup and handed to each component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Data directory used when `DATA_DIR` is unset
pub const DEFAULT_DATA_DIR: &str = "data";

/// Environment override for the panel login
pub const LOGIN_ENV: &str = "TIMEWEB_LOGIN";

/// Environment override for the panel password
pub const PASSWORD_ENV: &str = "TIMEWEB_PASSWORD";

/// Environment override for the domain list (comma-separated)
pub const DOMAINS_ENV: &str = "TIMEWEB_DOMAINS";

const CONFIG_FILE_NAME: &str = "config.json";
const IP_FILE_NAME: &str = "ip.txt";
const COOKIES_FILE_NAME: &str = "cookies.json";

/// A string that never shows up in logs or debug output
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying value. Only pass it to the login form.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Browser driven through WebDriver
///
/// Serialized lowercase; read case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    /// Default address of the matching driver server (chromedriver / geckodriver)
    pub fn default_webdriver_url(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "http://localhost:9515",
            BrowserKind::Firefox => "http://localhost:4444",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(crate::Error::config(format!(
                "Unsupported browser '{}'. Supported: chrome, firefox",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for BrowserKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Bounded waits used against the panel UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// How long cookie replay may take to show the authenticated marker
    #[serde(default = "default_cookie_login_secs")]
    pub cookie_login_secs: u64,

    /// How long the credential form may take to show the authenticated marker
    #[serde(default = "default_credential_login_secs")]
    pub credential_login_secs: u64,

    /// Wait for record rows and modal transitions
    #[serde(default = "default_element_secs")]
    pub element_secs: u64,

    /// Pause after a confirmed update so the panel can persist it
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,
}

impl TimeoutConfig {
    pub fn cookie_login(&self) -> Duration {
        Duration::from_secs(self.cookie_login_secs)
    }

    pub fn credential_login(&self) -> Duration {
        Duration::from_secs(self.credential_login_secs)
    }

    pub fn element(&self) -> Duration {
        Duration::from_secs(self.element_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            cookie_login_secs: default_cookie_login_secs(),
            credential_login_secs: default_credential_login_secs(),
            element_secs: default_element_secs(),
            settle_millis: default_settle_millis(),
        }
    }
}

fn default_cookie_login_secs() -> u64 {
    10
}

fn default_credential_login_secs() -> u64 {
    30
}

fn default_element_secs() -> u64 {
    10
}

fn default_settle_millis() -> u64 {
    1000
}

/// Main updater configuration, stored as `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Panel login
    #[serde(default)]
    pub timeweb_login: String,

    /// Panel password
    #[serde(default)]
    pub timeweb_password: Secret,

    /// Fully-qualified domain names whose A-records are managed, in order
    #[serde(default)]
    pub domains: Vec<String>,

    /// Browser to drive
    #[serde(default)]
    pub browser: BrowserKind,

    /// Auto-mode polling interval
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,

    /// WebDriver server address (defaults per browser)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Explicit Chrome binary location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_binary: Option<String>,

    /// UI wait bounds
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_check_interval_minutes() -> u64 {
    30
}

fn default_headless() -> bool {
    true
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self {
            timeweb_login: String::new(),
            timeweb_password: Secret::default(),
            domains: Vec::new(),
            browser: BrowserKind::default(),
            check_interval_minutes: default_check_interval_minutes(),
            webdriver_url: None,
            headless: default_headless(),
            chrome_binary: None,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl DdnsConfig {
    /// Load the configuration file
    ///
    /// A missing file yields the defaults. A field with a bad value is
    /// reported and replaced by its default while the other fields are kept.
    /// A file that is not a JSON object at all is reported and also yields
    /// the defaults, so the caller can fall back to environment variables or
    /// interactive setup.
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        if !path.exists() {
            tracing::debug!("Config file does not exist: {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let fields = match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Object(fields)) => fields,
            Ok(_) => {
                tracing::warn!(
                    "Config file {} is not a JSON object. Ignoring it.",
                    path.display()
                );
                return Ok(Self::default());
            }
            Err(e) => {
                tracing::warn!(
                    "Config file {} is corrupted or empty ({}). Ignoring it.",
                    path.display(),
                    e
                );
                return Ok(Self::default());
            }
        };

        Ok(Self::from_fields(fields, path))
    }

    /// Build from a parsed object, dropping only the fields that do not fit
    fn from_fields(fields: serde_json::Map<String, serde_json::Value>, path: &Path) -> Self {
        let mut valid = serde_json::Map::new();
        for (key, value) in fields {
            let mut single = serde_json::Map::new();
            single.insert(key.clone(), value.clone());
            match serde_json::from_value::<Self>(serde_json::Value::Object(single)) {
                Ok(_) => {
                    valid.insert(key, value);
                }
                Err(e) => {
                    tracing::warn!(
                        "Config file {}: ignoring invalid '{}' ({}), using the default",
                        path.display(),
                        key,
                        e
                    );
                }
            }
        }

        serde_json::from_value(serde_json::Value::Object(valid)).unwrap_or_else(|e| {
            tracing::warn!("Config file {} could not be applied ({})", path.display(), e);
            Self::default()
        })
    }

    /// Write the configuration file, creating the data directory if needed
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Apply `TIMEWEB_LOGIN`, `TIMEWEB_PASSWORD` and `TIMEWEB_DOMAINS` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (environment, test fixtures)
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(login) = lookup(LOGIN_ENV).filter(|v| !v.is_empty()) {
            self.timeweb_login = login;
        }
        if let Some(password) = lookup(PASSWORD_ENV).filter(|v| !v.is_empty()) {
            self.timeweb_password = Secret::new(password);
        }
        if let Some(domains) = lookup(DOMAINS_ENV).filter(|v| !v.trim().is_empty()) {
            self.domains = parse_domain_list(&domains);
        }
    }

    /// Whether both login and password are present
    pub fn has_credentials(&self) -> bool {
        !self.timeweb_login.trim().is_empty() && !self.timeweb_password.is_empty()
    }

    /// Fail with `ConfigurationMissing` when credentials are absent
    pub fn require_credentials(&self) -> Result<(), crate::Error> {
        if self.has_credentials() {
            Ok(())
        } else {
            Err(crate::Error::config_missing(format!(
                "{} and {} must be set in config.json or the environment",
                LOGIN_ENV, PASSWORD_ENV
            )))
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.require_credentials()?;

        if self.check_interval_minutes == 0 {
            return Err(crate::Error::config(
                "check_interval_minutes must be greater than 0",
            ));
        }

        for domain in &self.domains {
            validate_domain_name(domain)?;
        }

        Ok(())
    }

    /// WebDriver server address for the configured browser
    pub fn webdriver_url(&self) -> String {
        self.webdriver_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.browser.default_webdriver_url().to_string())
    }

    /// Auto-mode sleep between checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }
}

/// Split a comma-separated domain list, trimming blanks and dropping duplicates
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for domain in raw.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if !domains.iter().any(|d| d == domain) {
            domains.push(domain.to_string());
        }
    }
    domains
}

/// Validate that a string is a plausible fully-qualified domain name
///
/// Basic RFC 1035 checks: total length, label length, label characters.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(crate::Error::config(format!(
            "Domain name must be fully qualified: '{}'",
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Locations of every file the updater reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory from `DATA_DIR`, defaulting to `data`
    pub fn from_env() -> Self {
        let dir = std::env::var(DATA_DIR_ENV)
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }

    pub fn ip_file(&self) -> PathBuf {
        self.data_dir.join(IP_FILE_NAME)
    }

    pub fn cookies_file(&self) -> PathBuf {
        self.data_dir.join(COOKIES_FILE_NAME)
    }
}
