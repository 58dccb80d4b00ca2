// # Panel Page Trait
//
// The hosting panel is a web UI with no API, so every record operation goes
// through a browser page. This trait is the page object the session manager
// and the record synchronizer talk to; the WebDriver crate implements it for a
// real browser and the tests implement it with a scripted fake.
//
// Waits take an explicit timeout and report expiry as `Ok(false)`. `Err` is
// reserved for the browser itself failing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A browser cookie as exported by the panel page
///
/// Cookies are kept as opaque JSON objects so they round-trip through
/// `cookies.json` without losing fields the browser cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCookie(pub serde_json::Value);

impl SessionCookie {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Cookie name, if present
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(|v| v.as_str())
    }

    /// Cookie value, if present
    pub fn value(&self) -> Option<&str> {
        self.0.get("value").and_then(|v| v.as_str())
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Page object for one browser session against the hosting panel
#[async_trait]
pub trait PanelPage: Send {
    /// URL currently loaded in the browser
    async fn current_url(&mut self) -> Result<String, crate::Error>;

    /// Load a URL
    async fn navigate(&mut self, url: &str) -> Result<(), crate::Error>;

    /// Reload the current page
    async fn reload(&mut self) -> Result<(), crate::Error>;

    /// Add cookies to the browser for the currently loaded origin
    async fn inject_cookies(&mut self, cookies: &[SessionCookie]) -> Result<(), crate::Error>;

    /// Export every cookie the browser currently holds
    async fn export_cookies(&mut self) -> Result<Vec<SessionCookie>, crate::Error>;

    /// Wait for the element that only appears in an authenticated session
    ///
    /// Returns `Ok(false)` if it did not appear within `timeout`.
    async fn wait_for_auth_marker(&mut self, timeout: Duration) -> Result<bool, crate::Error>;

    /// Fill and submit the login form, then wait for the authenticated marker
    ///
    /// Returns `Ok(false)` if the form or the marker did not appear in time.
    async fn submit_credentials(
        &mut self,
        login: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<bool, crate::Error>;

    /// Find the A-record row for `fqdn` on the loaded DNS page
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The row exists; `value` is its displayed value cell
    /// - `Ok(None)`: No such row appeared within `timeout`
    async fn find_record_row(
        &mut self,
        fqdn: &str,
        timeout: Duration,
    ) -> Result<Option<String>, crate::Error>;

    /// Open the edit modal of the A-record row for `fqdn`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The modal is open; `value` is the current input value
    /// - `Ok(None)`: The row or the modal did not appear within `timeout`
    async fn open_edit_modal(
        &mut self,
        fqdn: &str,
        timeout: Duration,
    ) -> Result<Option<String>, crate::Error>;

    /// Replace the value in the open modal's input
    async fn set_ip_value(&mut self, value: &str) -> Result<(), crate::Error>;

    /// Press confirm and wait for the modal to close
    ///
    /// Returns `Ok(false)` if the modal was still visible after `timeout`.
    async fn confirm(&mut self, timeout: Duration) -> Result<bool, crate::Error>;

    /// Press cancel and wait for the modal to close
    ///
    /// Returns `Ok(false)` if the modal was still visible after `timeout`.
    async fn cancel(&mut self, timeout: Duration) -> Result<bool, crate::Error>;

    /// Save a screenshot of the current page
    async fn screenshot(&mut self, path: &Path) -> Result<(), crate::Error>;

    /// Shut the browser down
    async fn close(self: Box<Self>) -> Result<(), crate::Error>;
}

/// Starts a fresh browser session
#[async_trait]
pub trait PanelLauncher: Send + Sync {
    /// Launch a browser and return a page for it
    async fn launch(&self) -> Result<Box<dyn PanelPage>, crate::Error>;
}
