//! Record synchronizer
//!
//! Pushes one IPv4 address into the A-records of the configured domains
//! through an authenticated [`SessionManager`]. Domains are handled one at a
//! time and independently: a failure on one is logged, screenshotted and
//! reported, and the next domain is still attempted.

use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::session::SessionManager;

/// Panel origin for DNS pages
pub const PANEL_BASE_URL: &str = "https://hosting.timeweb.ru";

/// Live value of an A-record as shown in the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    Found(String),
    NotFound,
}

impl std::fmt::Display for RecordValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordValue::Found(value) => f.write_str(value),
            RecordValue::NotFound => f.write_str("not found"),
        }
    }
}

/// Per-domain outcome of [`RecordSynchronizer::sync_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    results: Vec<(String, bool)>,
}

impl SyncReport {
    pub fn push(&mut self, fqdn: impl Into<String>, success: bool) {
        self.results.push((fqdn.into(), success));
    }

    /// Outcomes in the order the domains were attempted
    pub fn results(&self) -> &[(String, bool)] {
        &self.results
    }

    pub fn succeeded(&self, fqdn: &str) -> Option<bool> {
        self.results
            .iter()
            .find(|(d, _)| d == fqdn)
            .map(|(_, ok)| *ok)
    }

    /// Domains that could not be synced
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(d, _)| d.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }
}

/// DNS management page that lists the records of `fqdn`
///
/// Names with more than two labels are addressed as a subdomain of the rest:
/// `api.example.com` becomes `fqdn=example.com&sub=api`.
pub fn dns_page_url(fqdn: &str) -> String {
    let parts: Vec<&str> = fqdn.split('.').collect();
    if parts.len() > 2 {
        let sub = parts[0];
        let domain = parts[1..].join(".");
        format!(
            "{}/domains/dns-records/subdomain?fqdn={}&sub={}",
            PANEL_BASE_URL, domain, sub
        )
    } else {
        format!("{}/domains/dns-records/domain?fqdn={}", PANEL_BASE_URL, fqdn)
    }
}

/// Drives A-record reads and updates over one session
pub struct RecordSynchronizer<'a> {
    session: &'a mut SessionManager,
}

impl<'a> RecordSynchronizer<'a> {
    pub fn new(session: &'a mut SessionManager) -> Self {
        Self { session }
    }

    /// Load the DNS page for `fqdn` unless it is already showing
    async fn open_dns_page(&mut self, fqdn: &str) -> Result<()> {
        let url = dns_page_url(fqdn);
        let page = self.session.page()?;
        if page.current_url().await? != url {
            debug!("Opening DNS page for {}", fqdn);
            page.navigate(&url).await?;
        }
        Ok(())
    }

    /// Make the A-record of `fqdn` point at `ip`
    ///
    /// Returns `Ok(false)` if this domain could not be synced. `Err` is only
    /// returned when the session is not authenticated.
    pub async fn sync_record(&mut self, fqdn: &str, ip: Ipv4Addr) -> Result<bool> {
        // Fail fast before touching the page
        self.session.page()?;

        info!("Updating {}", fqdn);
        match self.try_sync(fqdn, ip).await {
            Ok(()) => Ok(true),
            Err(Error::AuthenticationRequired) => Err(Error::AuthenticationRequired),
            Err(e) => {
                warn!("Could not update the A-record for {}: {}", fqdn, e);
                let path = self.session.diagnostics().record_failure_path(fqdn);
                self.session.capture(&path).await;
                Ok(false)
            }
        }
    }

    async fn try_sync(&mut self, fqdn: &str, ip: Ipv4Addr) -> Result<()> {
        let element_timeout = self.session.timeouts().element();
        let settle = self.session.timeouts().settle();
        let desired = ip.to_string();

        self.open_dns_page(fqdn).await?;

        let page = self.session.page()?;
        debug!("Looking for the A-record row of {}", fqdn);
        let current = page
            .open_edit_modal(fqdn, element_timeout)
            .await?
            .ok_or_else(|| Error::record_not_found(fqdn))?;

        if current.trim() == desired {
            info!("{} already points at {}, skipping", fqdn, desired);
            if !page.cancel(element_timeout).await? {
                return Err(Error::record_timeout(format!(
                    "edit dialog for {} did not close after cancel",
                    fqdn
                )));
            }
            return Ok(());
        }

        page.set_ip_value(&desired).await?;
        if !page.confirm(element_timeout).await? {
            return Err(Error::record_timeout(format!(
                "edit dialog for {} did not close after saving",
                fqdn
            )));
        }

        info!("A-record for {} updated to {}", fqdn, desired);
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }

    /// Sync every domain in order; the report's overall result is the AND of all
    pub async fn sync_all(&mut self, domains: &[String], ip: Ipv4Addr) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        for fqdn in domains {
            let ok = self.sync_record(fqdn, ip).await?;
            report.push(fqdn.clone(), ok);
        }
        Ok(report)
    }

    /// Read the live value of the A-record for `fqdn`
    pub async fn read_record(&mut self, fqdn: &str) -> Result<RecordValue> {
        let element_timeout = self.session.timeouts().element();

        match self.read_value(fqdn, element_timeout).await {
            Ok(Some(value)) => {
                info!("Found: {} -> {}", fqdn, value);
                Ok(RecordValue::Found(value))
            }
            Ok(None) => {
                warn!("No A-record found for {}", fqdn);
                Ok(RecordValue::NotFound)
            }
            Err(Error::AuthenticationRequired) => Err(Error::AuthenticationRequired),
            Err(e) => {
                warn!("Could not read the A-record for {}: {}", fqdn, e);
                Ok(RecordValue::NotFound)
            }
        }
    }

    async fn read_value(
        &mut self,
        fqdn: &str,
        timeout: std::time::Duration,
    ) -> Result<Option<String>> {
        self.open_dns_page(fqdn).await?;
        let value = self.session.page()?.find_record_row(fqdn, timeout).await?;
        Ok(value.map(|v| v.trim().to_string()))
    }

    /// Read every domain's live value, in order
    pub async fn read_all(&mut self, domains: &[String]) -> Result<Vec<(String, RecordValue)>> {
        info!("Reading current A-records...");
        let mut records = Vec::with_capacity(domains.len());
        for fqdn in domains {
            let value = self.read_record(fqdn).await?;
            records.push((fqdn.clone(), value));
        }
        Ok(records)
    }
}
