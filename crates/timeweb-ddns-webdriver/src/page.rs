//! `PanelPage` over a live WebDriver session

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thirtyfour::Cookie;
use thirtyfour::prelude::*;
use timeweb_ddns_core::traits::{PanelPage, SessionCookie};
use timeweb_ddns_core::{Error, Result};

use crate::selectors::*;
use crate::{HIDE_WEBDRIVER_SCRIPT, browser_error};

/// Poll interval for element waits
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One browser session against the panel
pub struct WebDriverPanel {
    driver: WebDriver,
    /// Edit dialog opened by the last `open_edit_modal`
    modal: Option<WebElement>,
}

impl WebDriverPanel {
    pub fn new(driver: WebDriver) -> Self {
        Self {
            driver,
            modal: None,
        }
    }

    /// Hide `navigator.webdriver` on the current document
    pub(crate) async fn hide_automation(&mut self) {
        if let Err(e) = self
            .driver
            .execute(HIDE_WEBDRIVER_SCRIPT, Vec::new())
            .await
        {
            tracing::debug!("Could not hide webdriver flag: {}", e);
        }
    }

    /// First displayed match within `timeout`
    async fn wait_visible(&self, by: By, timeout: Duration) -> Result<Option<WebElement>> {
        self.driver
            .query(by)
            .wait(timeout, POLL_INTERVAL)
            .and_displayed()
            .first_opt()
            .await
            .map_err(browser_error)
    }

    async fn find_row(&self, fqdn: &str, timeout: Duration) -> Result<Option<WebElement>> {
        self.wait_visible(By::XPath(record_row_xpath(fqdn)), timeout)
            .await
    }

    fn open_modal(&self) -> Result<&WebElement> {
        self.modal
            .as_ref()
            .ok_or_else(|| Error::browser("no edit dialog is open"))
    }

    async fn value_input(&self) -> Result<WebElement> {
        self.open_modal()?
            .find(By::XPath(VALUE_INPUT_XPATH))
            .await
            .map_err(browser_error)
    }

    /// Click a dialog button and wait for it to go away
    async fn press_modal_button(&mut self, css: &'static str, timeout: Duration) -> Result<bool> {
        let button = self
            .open_modal()?
            .find(By::Css(css))
            .await
            .map_err(browser_error)?;
        button.click().await.map_err(browser_error)?;

        let gone = wait_until_gone(&button, timeout).await;
        if gone {
            self.modal = None;
        }
        Ok(gone)
    }
}

/// Poll until `element` is hidden or detached, up to `timeout`
async fn wait_until_gone(element: &WebElement, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match element.is_displayed().await {
            Ok(false) | Err(_) => return true,
            Ok(true) => {}
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[async_trait]
impl PanelPage for WebDriverPanel {
    async fn current_url(&mut self) -> Result<String> {
        let url = self.driver.current_url().await.map_err(browser_error)?;
        Ok(url.to_string())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.modal = None;
        self.driver.goto(url).await.map_err(browser_error)?;
        self.hide_automation().await;
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        self.modal = None;
        self.driver.refresh().await.map_err(browser_error)?;
        self.hide_automation().await;
        Ok(())
    }

    async fn inject_cookies(&mut self, cookies: &[SessionCookie]) -> Result<()> {
        for cookie in cookies {
            let parsed: Cookie = match serde_json::from_value(cookie.as_json().clone()) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable cookie {}: {}",
                        cookie.name().unwrap_or("<unnamed>"),
                        e
                    );
                    continue;
                }
            };
            self.driver.add_cookie(parsed).await.map_err(browser_error)?;
        }
        Ok(())
    }

    async fn export_cookies(&mut self) -> Result<Vec<SessionCookie>> {
        let cookies = self.driver.get_all_cookies().await.map_err(browser_error)?;
        cookies
            .into_iter()
            .map(|c| Ok(SessionCookie::new(serde_json::to_value(c)?)))
            .collect()
    }

    async fn wait_for_auth_marker(&mut self, timeout: Duration) -> Result<bool> {
        let marker = self
            .wait_visible(By::Css(AUTH_MARKER_CSS), timeout)
            .await?;
        Ok(marker.is_some())
    }

    async fn submit_credentials(
        &mut self,
        login: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<bool> {
        let Some(login_field) = self
            .wait_visible(By::Name(LOGIN_FIELD_NAME), timeout)
            .await?
        else {
            tracing::warn!("Login form did not appear");
            return Ok(false);
        };

        login_field.send_keys(login).await.map_err(browser_error)?;
        self.driver
            .find(By::Name(PASSWORD_FIELD_NAME))
            .await
            .map_err(browser_error)?
            .send_keys(password)
            .await
            .map_err(browser_error)?;
        self.driver
            .find(By::Css(SUBMIT_BUTTON_CSS))
            .await
            .map_err(browser_error)?
            .click()
            .await
            .map_err(browser_error)?;

        self.wait_for_auth_marker(timeout).await
    }

    async fn find_record_row(&mut self, fqdn: &str, timeout: Duration) -> Result<Option<String>> {
        let Some(row) = self.find_row(fqdn, timeout).await? else {
            return Ok(None);
        };
        let text = row
            .find(By::XPath(VALUE_CELL_XPATH))
            .await
            .map_err(browser_error)?
            .text()
            .await
            .map_err(browser_error)?;
        Ok(Some(text.trim().to_string()))
    }

    async fn open_edit_modal(&mut self, fqdn: &str, timeout: Duration) -> Result<Option<String>> {
        let Some(row) = self.find_row(fqdn, timeout).await? else {
            return Ok(None);
        };
        row.find(By::Css(EDIT_BUTTON_CSS))
            .await
            .map_err(browser_error)?
            .click()
            .await
            .map_err(browser_error)?;

        let Some(modal) = self
            .wait_visible(By::XPath(EDIT_MODAL_XPATH), timeout)
            .await?
        else {
            return Ok(None);
        };
        self.modal = Some(modal);

        let value = self
            .value_input()
            .await?
            .value()
            .await
            .map_err(browser_error)?
            .unwrap_or_default();
        Ok(Some(value))
    }

    async fn set_ip_value(&mut self, value: &str) -> Result<()> {
        let input = self.value_input().await?;
        input.clear().await.map_err(browser_error)?;
        input.send_keys(value).await.map_err(browser_error)?;
        Ok(())
    }

    async fn confirm(&mut self, timeout: Duration) -> Result<bool> {
        self.press_modal_button(CONFIRM_BUTTON_CSS, timeout).await
    }

    async fn cancel(&mut self, timeout: Duration) -> Result<bool> {
        self.press_modal_button(CANCEL_BUTTON_CSS, timeout).await
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.driver.screenshot(path).await.map_err(browser_error)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.driver.quit().await.map_err(browser_error)
    }
}
