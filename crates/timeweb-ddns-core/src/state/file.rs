// # File State Store
//
// Persists state as two small files in the data directory:
//
// - `ip.txt`: the last IP applied to every domain, as plain text
// - `cookies.json`: the panel session cookies, as a JSON array
//
// Writes go to a temporary file first and are renamed into place, so a crash
// mid-write leaves either the old content or the new one. Unreadable content
// is reported and treated as absent; the next successful run rewrites it.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::DataPaths;
use crate::traits::panel::SessionCookie;
use crate::traits::state_store::StateStore;

/// File-based state store
///
/// # Example
///
/// ```rust,no_run
/// use timeweb_ddns_core::config::DataPaths;
/// use timeweb_ddns_core::state::FileStateStore;
/// use timeweb_ddns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new(&DataPaths::new("/var/lib/timeweb-ddns")).await?;
///
///     store.set_cached_ip("1.2.3.4".parse()?).await?;
///     assert_eq!(store.cached_ip().await?, Some("1.2.3.4".parse()?));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    ip_path: PathBuf,
    cookies_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStateStore {
    /// Open the store, creating the data directory if needed
    pub async fn new(paths: &DataPaths) -> Result<Self, Error> {
        let dir = paths.data_dir();
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create data directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            ip_path: paths.ip_file(),
            cookies_path: paths.cookies_file(),
            write_lock: Mutex::new(()),
        })
    }

    /// Read a file, mapping "does not exist" to `None`
    async fn read_optional(path: &Path) -> Result<Option<String>, Error> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::state_store(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write via temp file + rename
    async fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let temp_path = Self::temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(content).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", path.display());
        Ok(())
    }

    async fn remove_if_present(&self, path: &Path) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::state_store(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut temp = path.to_path_buf();
        temp.set_extension("tmp");
        temp
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn cached_ip(&self) -> Result<Option<Ipv4Addr>, Error> {
        let Some(content) = Self::read_optional(&self.ip_path).await? else {
            return Ok(None);
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.parse::<Ipv4Addr>() {
            Ok(ip) => Ok(Some(ip)),
            Err(_) => {
                tracing::warn!(
                    "IP cache {} holds an invalid address '{}'. Ignoring it.",
                    self.ip_path.display(),
                    trimmed
                );
                Ok(None)
            }
        }
    }

    async fn set_cached_ip(&self, ip: Ipv4Addr) -> Result<(), Error> {
        self.write_atomic(&self.ip_path, ip.to_string().as_bytes())
            .await
    }

    async fn clear_cached_ip(&self) -> Result<(), Error> {
        self.remove_if_present(&self.ip_path).await
    }

    async fn cookies(&self) -> Result<Option<Vec<SessionCookie>>, Error> {
        let Some(content) = Self::read_optional(&self.cookies_path).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<SessionCookie>>(&content) {
            Ok(cookies) if cookies.is_empty() => Ok(None),
            Ok(cookies) => Ok(Some(cookies)),
            Err(e) => {
                tracing::warn!(
                    "Cookie file {} is corrupted ({}). Ignoring it.",
                    self.cookies_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn set_cookies(&self, cookies: &[SessionCookie]) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(cookies)
            .map_err(|e| Error::state_store(format!("Failed to serialize cookies: {}", e)))?;
        self.write_atomic(&self.cookies_path, json.as_bytes()).await
    }

    async fn clear_cookies(&self) -> Result<(), Error> {
        self.remove_if_present(&self.cookies_path).await
    }
}
