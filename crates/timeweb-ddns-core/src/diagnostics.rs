//! Diagnostic screenshots
//!
//! When a login or a record update fails, a screenshot of the browser page is
//! saved next to the state files so the failure can be inspected afterwards.

use std::path::{Path, PathBuf};

use crate::config::DataPaths;
use crate::traits::PanelPage;

const AUTH_SCREENSHOT: &str = "error_screenshot.png";

/// Where failure screenshots go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_paths(paths: &DataPaths) -> Self {
        Self::new(paths.data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Screenshot taken when authentication fails
    pub fn auth_failure_path(&self) -> PathBuf {
        self.dir.join(AUTH_SCREENSHOT)
    }

    /// Screenshot taken when updating `fqdn` fails
    pub fn record_failure_path(&self, fqdn: &str) -> PathBuf {
        let safe: String = fqdn
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("error_dns_{}.png", safe))
    }

    /// Save a screenshot, logging rather than failing if the browser refuses
    pub async fn capture(&self, page: &mut dyn PanelPage, path: &Path) {
        match page.screenshot(path).await {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                tracing::info!("Screenshot saved as {}", name);
            }
            Err(e) => {
                tracing::warn!("Failed to save screenshot {}: {}", path.display(), e);
            }
        }
    }
}
