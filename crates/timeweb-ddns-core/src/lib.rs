// # timeweb-ddns-core
//
// Core library for keeping Timeweb hosting-panel A-records pointed at the
// machine's current public IPv4 address.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for discovering the public IP
// - **PanelPage / PanelLauncher**: Page-object traits over a browser session
// - **StateStore**: Trait for the cached IP and session cookies
// - **SessionManager**: Cookie-first, credential-fallback login
// - **RecordSynchronizer**: Per-domain A-record read/update through the panel UI
// - **DdnsEngine**: Orchestrates one update run or the periodic auto mode
//
// The panel has no API, so the browser is the only way in. Everything that
// touches the real browser lives in `timeweb-ddns-webdriver`; this crate only
// sees the `PanelPage` trait and is tested with a scripted fake.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod session;
pub mod state;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use config::{BrowserKind, DataPaths, DdnsConfig, Secret, TimeoutConfig};
pub use diagnostics::Diagnostics;
pub use engine::{DdnsEngine, UpdateOutcome};
pub use error::{Error, Result};
pub use session::{Credentials, LoginOutcome, SessionManager, SessionState};
pub use state::{FileStateStore, MemoryStateStore};
pub use sync::{RecordSynchronizer, RecordValue, SyncReport, dns_page_url};
pub use traits::{IpResolver, PanelLauncher, PanelPage, SessionCookie, StateStore};
