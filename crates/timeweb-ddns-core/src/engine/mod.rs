//! Update orchestrator
//!
//! The DdnsEngine ties the pieces together for one update run:
//!
//! ```text
//! ┌────────────┐   ip    ┌─────────────┐  changed?  ┌────────────────┐
//! │ IpResolver │───────▶│ DdnsEngine  │──────────▶│ SessionManager │
//! └────────────┘         └─────────────┘            │ + Synchronizer │
//!                              │  ▲                 └────────────────┘
//!                  cached ip   │  │ all domains ok?         │
//!                              ▼  │                         ▼
//!                        ┌─────────────┐             hosting panel
//!                        │ StateStore  │
//!                        └─────────────┘
//! ```
//!
//! The cached IP is written only after every configured domain reports
//! success, so a partial failure is retried on the next run.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::DdnsConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::session::{Credentials, LoginOutcome, SessionManager};
use crate::sync::{RecordSynchronizer, RecordValue, SyncReport};
use crate::traits::{IpResolver, PanelLauncher, StateStore};

/// What a single [`DdnsEngine::run_update`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No public IP could be determined; nothing was touched
    IpUnavailable,

    /// The resolved IP matches the cached one
    Unchanged { ip: Ipv4Addr },

    /// Every domain now points at `ip` and the cache was advanced
    Updated {
        previous: Option<Ipv4Addr>,
        ip: Ipv4Addr,
    },

    /// At least one domain failed; the cache was left as it was
    SyncFailed { ip: Ipv4Addr, report: SyncReport },

    /// The panel session could not be authenticated
    AuthenticationFailed { reason: String },
}

impl UpdateOutcome {
    /// Whether the run left every domain pointing at the current IP
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::Unchanged { .. } | UpdateOutcome::Updated { .. }
        )
    }
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::run_update()`] once, or [`DdnsEngine::run_auto_mode()`]
///    to keep checking until Ctrl-C
///
/// Each run launches its own browser only when the IP changed (or when
/// forced), and closes it before returning.
pub struct DdnsEngine {
    /// Public IP discovery
    resolver: Box<dyn IpResolver>,

    /// Starts browser sessions against the panel
    launcher: Box<dyn PanelLauncher>,

    /// Cached IP and cookies
    state_store: Arc<dyn StateStore>,

    /// Credentials, domains, timeouts
    config: DdnsConfig,

    /// Screenshot locations
    diagnostics: Diagnostics,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// Fails with `ConfigurationMissing` if credentials are absent and with
    /// `Config` if the rest of the configuration is invalid.
    pub fn new(
        resolver: Box<dyn IpResolver>,
        launcher: Box<dyn PanelLauncher>,
        state_store: Arc<dyn StateStore>,
        config: DdnsConfig,
        diagnostics: Diagnostics,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            launcher,
            state_store,
            config,
            diagnostics,
        })
    }

    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }

    /// Replace the configuration (after the settings menu changed it)
    pub fn set_config(&mut self, config: DdnsConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Replace the browser launcher (after the browser choice changed)
    pub fn set_launcher(&mut self, launcher: Box<dyn PanelLauncher>) {
        self.launcher = launcher;
    }

    /// Check the public IP and push it to every domain if it changed
    ///
    /// With `force`, the panel is synced even if the IP matches the cache.
    pub async fn run_update(&self, force: bool) -> Result<UpdateOutcome> {
        if force {
            info!("Starting forced DNS update...");
        } else {
            info!("Checking whether the IP address changed...");
        }

        let current_ip = match self.resolver.resolve_current_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Could not determine the current IP address: {}", e);
                return Ok(UpdateOutcome::IpUnavailable);
            }
        };

        let cached_ip = self.state_store.cached_ip().await?;
        info!(
            "Current IP: {}, saved IP: {}",
            current_ip,
            cached_ip
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        if !force && cached_ip == Some(current_ip) {
            info!("IP address unchanged, nothing to do");
            return Ok(UpdateOutcome::Unchanged { ip: current_ip });
        }

        if cached_ip != Some(current_ip) {
            info!(
                "IP address changed: {} -> {}",
                cached_ip
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                current_ip
            );
        }

        if self.config.domains.is_empty() {
            warn!("No domains configured, nothing to update");
        }

        let mut session = match self.open_session().await {
            Ok(session) => session,
            Err(Error::Authentication(reason)) => {
                error!("DNS update aborted: could not log in");
                return Ok(UpdateOutcome::AuthenticationFailed { reason });
            }
            Err(e) => return Err(e),
        };

        let synced = RecordSynchronizer::new(&mut session)
            .sync_all(&self.config.domains, current_ip)
            .await;
        Self::release(session).await;
        let report = synced?;

        if report.all_succeeded() {
            self.state_store.set_cached_ip(current_ip).await?;
            info!("All A-records updated, saved IP is now {}", current_ip);
            Ok(UpdateOutcome::Updated {
                previous: cached_ip,
                ip: current_ip,
            })
        } else {
            error!(
                "Some A-records could not be updated ({}); saved IP left unchanged",
                report.failed().join(", ")
            );
            Ok(UpdateOutcome::SyncFailed {
                ip: current_ip,
                report,
            })
        }
    }

    /// Run [`run_update`](Self::run_update) every `interval` until Ctrl-C
    ///
    /// A signal that arrives mid-run stops the loop once that run has
    /// released its browser; one that arrives during the sleep stops it at once.
    pub async fn run_auto_mode(&self, interval: Duration) -> Result<()> {
        self.run_auto_internal(interval, None).await
    }

    /// Auto mode with a programmatic shutdown signal instead of Ctrl-C
    ///
    /// Used by tests and by callers that manage their own signal handling.
    pub async fn run_auto_mode_with_shutdown(
        &self,
        interval: Duration,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_auto_internal(interval, shutdown_rx).await
    }

    async fn run_auto_internal(
        &self,
        interval: Duration,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            "Auto mode started, checking every {} seconds",
            interval.as_secs()
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);
        let mut stopping = false;

        loop {
            // A run owns a browser session; let it finish so the session is closed.
            let run = self.run_update(false);
            tokio::pin!(run);
            let result = loop {
                tokio::select! {
                    result = &mut run => break result,
                    _ = &mut shutdown, if !stopping => {
                        info!("Shutdown signal received, finishing the current update first");
                        stopping = true;
                    }
                }
            };

            match result {
                Ok(outcome) => debug!("Update cycle finished: {:?}", outcome),
                Err(e) => error!("Update cycle failed: {}", e),
            }

            if stopping {
                break;
            }

            let next = chrono::Local::now()
                + chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::zero());
            info!("Next check at {}", next.format("%Y-%m-%d %H:%M:%S"));

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("Auto mode stopped");
        Ok(())
    }

    /// Launch a browser and log in
    ///
    /// On failure the browser is closed and `Error::Authentication` returned.
    /// The caller owns the session and must [`close`](SessionManager::close) it.
    pub async fn open_session(&self) -> Result<SessionManager> {
        let page = self.launcher.launch().await?;
        let mut session = SessionManager::new(
            page,
            Arc::clone(&self.state_store),
            Credentials {
                login: self.config.timeweb_login.clone(),
                password: self.config.timeweb_password.clone(),
            },
            self.config.timeouts.clone(),
            self.diagnostics.clone(),
        );

        match session.login().await {
            LoginOutcome::Failure(reason) => {
                Self::release(session).await;
                Err(Error::auth(reason))
            }
            outcome => {
                debug!("Login outcome: {:?}", outcome);
                Ok(session)
            }
        }
    }

    /// Read the live A-record of every configured domain
    pub async fn read_records(&self) -> Result<Vec<(String, RecordValue)>> {
        let mut session = self.open_session().await?;
        let records = RecordSynchronizer::new(&mut session)
            .read_all(&self.config.domains)
            .await;
        Self::release(session).await;
        records
    }

    /// Point a single domain at `ip`, leaving the cached IP alone
    pub async fn update_single_record(&self, fqdn: &str, ip: Ipv4Addr) -> Result<bool> {
        let mut session = self.open_session().await?;
        let synced = RecordSynchronizer::new(&mut session)
            .sync_record(fqdn, ip)
            .await;
        Self::release(session).await;
        synced
    }

    /// Forget the cached IP and the session cookies
    pub async fn reset_session(&self) -> Result<()> {
        self.state_store.reset().await?;
        info!("Session reset: saved IP and cookies deleted");
        Ok(())
    }

    async fn release(session: SessionManager) {
        if let Err(e) = session.close().await {
            warn!("Failed to close the browser: {}", e);
        }
    }
}
