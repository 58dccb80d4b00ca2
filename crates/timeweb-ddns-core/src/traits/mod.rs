//! Core traits for the DDNS updater
//!
//! These are the seams between the update logic and the outside world.
//!
//! - [`IpResolver`]: Discover the current public IPv4 address
//! - [`PanelPage`] / [`PanelLauncher`]: Drive the hosting panel UI
//! - [`StateStore`]: Persist the last applied IP and session cookies

pub mod ip_resolver;
pub mod panel;
pub mod state_store;

pub use ip_resolver::IpResolver;
pub use panel::{PanelLauncher, PanelPage, SessionCookie};
pub use state_store::StateStore;
