//! Panel session manager
//!
//! Owns the browser page and gets it into an authenticated state. Login is
//! two-phase: replay the cookies saved by a previous run, and only if that does
//! not reach an authenticated page, submit the login form.
//!
//! ```text
//! Unauthenticated ──▶ CookieAttempt ──▶ Authenticated
//!        │                  │
//!        │ (no cookies)     │ (marker timeout: cookies cleared)
//!        ▼                  ▼
//!        └────────▶ CredentialAttempt ──▶ Authenticated | Failed
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{Secret, TimeoutConfig};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::traits::{PanelPage, StateStore};

/// Panel home page; loading it establishes the cookie origin
pub const PANEL_HOME_URL: &str = "https://hosting.timeweb.ru/";

/// Where the session manager is in the login flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    CookieAttempt,
    CredentialAttempt,
    Authenticated,
    Failed,
}

/// Result of [`SessionManager::login`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Saved cookies were accepted
    CookieSuccess,
    /// The login form was accepted and fresh cookies were saved
    CredentialSuccess,
    /// Neither path reached an authenticated page
    Failure(String),
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, LoginOutcome::Failure(_))
    }
}

/// Panel login credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: Secret,
}

/// One browser session against the panel
pub struct SessionManager {
    page: Box<dyn PanelPage>,
    store: Arc<dyn StateStore>,
    credentials: Credentials,
    timeouts: TimeoutConfig,
    diagnostics: Diagnostics,
    state: SessionState,
}

impl SessionManager {
    pub fn new(
        page: Box<dyn PanelPage>,
        store: Arc<dyn StateStore>,
        credentials: Credentials,
        timeouts: TimeoutConfig,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            page,
            store,
            credentials,
            timeouts,
            diagnostics,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Authenticate, preferring saved cookies over the login form
    ///
    /// Never returns an error: every failure ends in
    /// [`LoginOutcome::Failure`] with the session in [`SessionState::Failed`].
    pub async fn login(&mut self) -> LoginOutcome {
        if self.is_authenticated() {
            debug!("Session already authenticated");
            return LoginOutcome::CookieSuccess;
        }

        info!("Logging in to the hosting panel...");

        match self.try_cookies().await {
            Ok(true) => {
                info!("Logged in with saved cookies");
                self.state = SessionState::Authenticated;
                return LoginOutcome::CookieSuccess;
            }
            Ok(false) => {}
            Err(e) => {
                warn!("Cookie login failed: {}", e);
                self.forget_cookies().await;
            }
        }

        match self.try_credentials().await {
            Ok(true) => {
                info!("Logged in with credentials");
                self.state = SessionState::Authenticated;
                self.save_cookies().await;
                LoginOutcome::CredentialSuccess
            }
            Ok(false) => {
                self.fail("authenticated page did not appear after submitting the login form")
                    .await
            }
            Err(e) => self.fail(&e.to_string()).await,
        }
    }

    /// Replay saved cookies; `Ok(false)` when there are none or they were rejected
    async fn try_cookies(&mut self) -> Result<bool> {
        let cookies = match self.store.cookies().await {
            Ok(Some(cookies)) => cookies,
            Ok(None) => {
                debug!("No saved cookies");
                return Ok(false);
            }
            Err(e) => {
                warn!("Could not read saved cookies: {}", e);
                return Ok(false);
            }
        };

        self.state = SessionState::CookieAttempt;
        info!("Trying saved cookies...");

        self.page.navigate(PANEL_HOME_URL).await?;
        self.page.inject_cookies(&cookies).await?;
        self.page.reload().await?;

        if self
            .page
            .wait_for_auth_marker(self.timeouts.cookie_login())
            .await?
        {
            return Ok(true);
        }

        warn!("Saved cookies are no longer valid");
        self.forget_cookies().await;
        Ok(false)
    }

    async fn try_credentials(&mut self) -> Result<bool> {
        self.state = SessionState::CredentialAttempt;
        info!("Logging in with login and password...");

        self.page.navigate(PANEL_HOME_URL).await?;
        self.page
            .submit_credentials(
                &self.credentials.login,
                self.credentials.password.expose(),
                self.timeouts.credential_login(),
            )
            .await
    }

    async fn save_cookies(&mut self) {
        match self.page.export_cookies().await {
            Ok(cookies) => {
                if let Err(e) = self.store.set_cookies(&cookies).await {
                    warn!("Failed to save session cookies: {}", e);
                } else {
                    debug!("Saved {} session cookies", cookies.len());
                }
            }
            Err(e) => warn!("Failed to read session cookies from the browser: {}", e),
        }
    }

    async fn forget_cookies(&mut self) {
        if let Err(e) = self.store.clear_cookies().await {
            warn!("Failed to delete saved cookies: {}", e);
        }
    }

    async fn fail(&mut self, reason: &str) -> LoginOutcome {
        error!("Login failed: {}", reason);
        self.state = SessionState::Failed;
        let path = self.diagnostics.auth_failure_path();
        self.diagnostics.capture(self.page.as_mut(), &path).await;
        LoginOutcome::Failure(reason.to_string())
    }

    /// Page for record operations; fails fast unless authenticated
    pub fn page(&mut self) -> Result<&mut dyn PanelPage> {
        if !self.is_authenticated() {
            return Err(Error::AuthenticationRequired);
        }
        Ok(self.page.as_mut())
    }

    /// Screenshot the current page, whatever the session state
    pub async fn capture(&mut self, path: &std::path::Path) {
        self.diagnostics.capture(self.page.as_mut(), path).await;
    }

    /// Shut the browser down
    pub async fn close(self) -> Result<()> {
        debug!("Closing browser session");
        self.page.close().await
    }
}
