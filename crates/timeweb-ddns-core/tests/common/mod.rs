//! Test doubles shared by the contract tests
//!
//! `FakePanel` models just enough of the hosting panel to exercise the
//! session manager, the synchronizer and the engine: a table of A-records, a
//! login that accepts one password, and cookies that are either the current
//! session cookie or stale. Everything it does is counted in a shared
//! `PanelState` so tests can assert on it after the session is gone.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timeweb_ddns_core::error::{Error, Result};
use timeweb_ddns_core::traits::{IpResolver, PanelLauncher, PanelPage, SessionCookie};
use timeweb_ddns_core::{DdnsConfig, Secret, TimeoutConfig};

pub const LOGIN: &str = "user@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const SESSION_COOKIE: &str = "live-session";

/// Panel-side state that outlives individual browser sessions
#[derive(Debug, Default)]
pub struct PanelState {
    /// fqdn -> current A value
    pub records: HashMap<String, String>,
    /// Rows that never appear
    pub missing_rows: HashSet<String>,
    /// Domains whose edit dialog never closes on cancel
    pub stuck_cancel: HashSet<String>,
    /// Domains whose edit dialog never closes on confirm
    pub stuck_confirm: HashSet<String>,
    /// Password the login form accepts
    pub password: String,
    /// How long the edit dialog takes to open
    pub modal_delay: Duration,

    pub launches: usize,
    pub closes: usize,
    pub credential_submissions: usize,
    pub cookie_injections: usize,
    pub mutations: usize,
    pub modal_opens: Vec<String>,
    pub navigations: Vec<String>,
    pub screenshots: Vec<PathBuf>,
}

pub type SharedPanel = Arc<Mutex<PanelState>>;

/// Build a panel with the given records and the default password
pub fn panel_with_records(records: &[(&str, &str)]) -> SharedPanel {
    Arc::new(Mutex::new(PanelState {
        records: records
            .iter()
            .map(|(d, v)| (d.to_string(), v.to_string()))
            .collect(),
        password: PASSWORD.to_string(),
        ..PanelState::default()
    }))
}

pub fn live_cookies() -> Vec<SessionCookie> {
    vec![SessionCookie::new(json!({
        "name": "PHPSESSID",
        "value": SESSION_COOKIE,
        "domain": ".timeweb.ru",
        "path": "/"
    }))]
}

pub fn stale_cookies() -> Vec<SessionCookie> {
    vec![SessionCookie::new(json!({
        "name": "PHPSESSID",
        "value": "expired",
        "domain": ".timeweb.ru",
        "path": "/"
    }))]
}

/// One browser session against the fake panel
pub struct FakePanel {
    shared: SharedPanel,
    url: String,
    injected: Vec<SessionCookie>,
    authenticated: bool,
    modal: Option<String>,
    pending_value: Option<String>,
}

impl FakePanel {
    pub fn new(shared: SharedPanel) -> Self {
        Self {
            shared,
            url: "about:blank".to_string(),
            injected: Vec::new(),
            authenticated: false,
            modal: None,
            pending_value: None,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PanelState> {
        self.shared.lock().unwrap()
    }
}

#[async_trait]
impl PanelPage for FakePanel {
    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.url = url.to_string();
        self.state().navigations.push(url.to_string());
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        if self
            .injected
            .iter()
            .any(|c| c.value() == Some(SESSION_COOKIE))
        {
            self.authenticated = true;
        }
        Ok(())
    }

    async fn inject_cookies(&mut self, cookies: &[SessionCookie]) -> Result<()> {
        self.state().cookie_injections += 1;
        self.injected.extend_from_slice(cookies);
        Ok(())
    }

    async fn export_cookies(&mut self) -> Result<Vec<SessionCookie>> {
        Ok(live_cookies())
    }

    async fn wait_for_auth_marker(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.authenticated)
    }

    async fn submit_credentials(
        &mut self,
        login: &str,
        password: &str,
        _timeout: Duration,
    ) -> Result<bool> {
        let mut state = self.state();
        state.credential_submissions += 1;
        let accepted = login == LOGIN && password == state.password;
        drop(state);
        self.authenticated = accepted;
        Ok(accepted)
    }

    async fn find_record_row(&mut self, fqdn: &str, _timeout: Duration) -> Result<Option<String>> {
        let state = self.state();
        if state.missing_rows.contains(fqdn) {
            return Ok(None);
        }
        Ok(state.records.get(fqdn).cloned())
    }

    async fn open_edit_modal(&mut self, fqdn: &str, _timeout: Duration) -> Result<Option<String>> {
        let delay = self.state().modal_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        if state.missing_rows.contains(fqdn) {
            return Ok(None);
        }
        let Some(value) = state.records.get(fqdn).cloned() else {
            return Ok(None);
        };
        state.modal_opens.push(fqdn.to_string());
        drop(state);
        self.modal = Some(fqdn.to_string());
        self.pending_value = None;
        Ok(Some(value))
    }

    async fn set_ip_value(&mut self, value: &str) -> Result<()> {
        if self.modal.is_none() {
            return Err(Error::browser("no edit dialog open"));
        }
        self.pending_value = Some(value.to_string());
        Ok(())
    }

    async fn confirm(&mut self, _timeout: Duration) -> Result<bool> {
        let Some(fqdn) = self.modal.clone() else {
            return Err(Error::browser("no edit dialog open"));
        };
        if self.state().stuck_confirm.contains(&fqdn) {
            return Ok(false);
        }
        if let Some(value) = self.pending_value.take() {
            let mut state = self.state();
            state.records.insert(fqdn, value);
            state.mutations += 1;
        }
        self.modal = None;
        Ok(true)
    }

    async fn cancel(&mut self, _timeout: Duration) -> Result<bool> {
        let Some(fqdn) = self.modal.clone() else {
            return Err(Error::browser("no edit dialog open"));
        };
        if self.state().stuck_cancel.contains(&fqdn) {
            return Ok(false);
        }
        self.modal = None;
        self.pending_value = None;
        Ok(true)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<()> {
        self.state().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state().closes += 1;
        Ok(())
    }
}

/// Launches `FakePanel`s over one shared panel state
pub struct FakeLauncher {
    shared: SharedPanel,
}

impl FakeLauncher {
    pub fn new(shared: SharedPanel) -> Self {
        Self { shared }
    }
}

#[async_trait]
impl PanelLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PanelPage>> {
        self.shared.lock().unwrap().launches += 1;
        Ok(Box::new(FakePanel::new(Arc::clone(&self.shared))))
    }
}

/// Resolver that replays a script of answers, repeating the last one
pub struct ScriptedResolver {
    answers: Mutex<VecDeque<Option<Ipv4Addr>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn always(ip: Ipv4Addr) -> Self {
        Self::script(vec![Some(ip)])
    }

    pub fn unavailable() -> Self {
        Self::script(vec![None])
    }

    /// `None` entries fail with `NoIpAvailable`
    pub fn script(answers: Vec<Option<Ipv4Addr>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter shared with the resolver after it moves into the engine
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve_current_ip(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front().flatten()
        } else {
            answers.front().copied().flatten()
        };
        answer.ok_or_else(|| Error::no_ip("all endpoints failed"))
    }
}

/// Timeouts that never sleep
pub fn instant_timeouts() -> TimeoutConfig {
    TimeoutConfig {
        cookie_login_secs: 0,
        credential_login_secs: 0,
        element_secs: 0,
        settle_millis: 0,
    }
}

/// Config with valid credentials for `domains`
pub fn config_for(domains: &[&str]) -> DdnsConfig {
    DdnsConfig {
        timeweb_login: LOGIN.to_string(),
        timeweb_password: Secret::new(PASSWORD),
        domains: domains.iter().map(|d| d.to_string()).collect(),
        timeouts: instant_timeouts(),
        ..DdnsConfig::default()
    }
}

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// Engine over the fake panel and the given store
pub fn build_engine(
    resolver: ScriptedResolver,
    panel: &SharedPanel,
    store: Arc<dyn timeweb_ddns_core::StateStore>,
    config: DdnsConfig,
) -> timeweb_ddns_core::DdnsEngine {
    timeweb_ddns_core::DdnsEngine::new(
        Box::new(resolver),
        Box::new(FakeLauncher::new(Arc::clone(panel))),
        store,
        config,
        timeweb_ddns_core::Diagnostics::new("diag"),
    )
    .expect("engine construction succeeds")
}

/// Authenticated session over the fake panel
pub async fn logged_in_session(
    panel: &SharedPanel,
    store: Arc<dyn timeweb_ddns_core::StateStore>,
) -> timeweb_ddns_core::SessionManager {
    let mut session = timeweb_ddns_core::SessionManager::new(
        Box::new(FakePanel::new(Arc::clone(panel))),
        store,
        timeweb_ddns_core::Credentials {
            login: LOGIN.to_string(),
            password: Secret::new(PASSWORD),
        },
        instant_timeouts(),
        timeweb_ddns_core::Diagnostics::new("diag"),
    );
    assert!(session.login().await.is_success());
    session
}
