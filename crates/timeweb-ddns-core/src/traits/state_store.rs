// # State Store Trait
//
// Persistent state between runs: the IP most recently pushed to every
// configured domain, and the panel's session cookies. Both are optional; an
// absent value is a normal condition, not an error.

use async_trait::async_trait;
use std::net::Ipv4Addr;

use super::panel::SessionCookie;

/// Trait for state store implementations
///
/// Implementations must be safe to share between tasks.
///
/// # Invariants
///
/// - The cached IP is only advanced after every configured domain was synced
/// - Cookies are only written after a successful login
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Last IP applied to all domains
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ip))`: The stored address
    /// - `Ok(None)`: Nothing stored yet, or the stored value was unreadable
    async fn cached_ip(&self) -> Result<Option<Ipv4Addr>, crate::Error>;

    /// Replace the stored IP
    async fn set_cached_ip(&self, ip: Ipv4Addr) -> Result<(), crate::Error>;

    /// Stored session cookies, if any
    ///
    /// A corrupted cookie file reads as `Ok(None)`.
    async fn cookies(&self) -> Result<Option<Vec<SessionCookie>>, crate::Error>;

    /// Replace the stored session cookies
    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<(), crate::Error>;

    /// Forget the stored session cookies
    async fn clear_cookies(&self) -> Result<(), crate::Error>;

    /// Forget both the stored IP and the cookies
    async fn reset(&self) -> Result<(), crate::Error> {
        self.clear_cookies().await?;
        self.clear_cached_ip().await
    }

    /// Forget the stored IP
    async fn clear_cached_ip(&self) -> Result<(), crate::Error>;
}
