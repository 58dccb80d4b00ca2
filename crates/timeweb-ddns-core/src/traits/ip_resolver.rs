// # IP Resolver Trait
//
// Defines the interface for discovering the machine's current public IPv4
// address. Implementations usually ask one or more HTTP echo services and fall
// back between them.

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP resolution
///
/// # Contract
///
/// - Returns an address only if it parses as IPv4
/// - Returns `Error::NoIpAvailable` when every source failed
/// - Never touches the state store or the panel
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The first valid address any source returned
    /// - `Err(Error::NoIpAvailable)`: All sources failed
    async fn resolve_current_ip(&self) -> Result<Ipv4Addr, crate::Error>;
}
