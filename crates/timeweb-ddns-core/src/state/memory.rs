// # Memory State Store
//
// In-memory implementation of StateStore. Nothing survives a restart, so the
// first run always treats the IP as new. Used by tests and by callers that
// want to exercise the update flow without touching the data directory.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::panel::SessionCookie;
use crate::traits::state_store::StateStore;

#[derive(Debug, Default)]
struct MemoryState {
    ip: Option<Ipv4Addr>,
    cookies: Option<Vec<SessionCookie>>,
    ip_writes: usize,
}

/// In-memory state store
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<MemoryState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a cached IP already present
    pub fn with_ip(ip: Ipv4Addr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                ip: Some(ip),
                ..MemoryState::default()
            })),
        }
    }

    /// Number of times the cached IP has been written
    pub async fn ip_write_count(&self) -> usize {
        self.inner.read().await.ip_writes
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn cached_ip(&self) -> Result<Option<Ipv4Addr>, Error> {
        Ok(self.inner.read().await.ip)
    }

    async fn set_cached_ip(&self, ip: Ipv4Addr) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.ip = Some(ip);
        guard.ip_writes += 1;
        Ok(())
    }

    async fn clear_cached_ip(&self) -> Result<(), Error> {
        self.inner.write().await.ip = None;
        Ok(())
    }

    async fn cookies(&self) -> Result<Option<Vec<SessionCookie>>, Error> {
        Ok(self
            .inner
            .read()
            .await
            .cookies
            .clone()
            .filter(|c| !c.is_empty()))
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<(), Error> {
        self.inner.write().await.cookies = Some(cookies.to_vec());
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<(), Error> {
        self.inner.write().await.cookies = None;
        Ok(())
    }
}
