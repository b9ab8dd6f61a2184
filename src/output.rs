//! Side effects of producing an invoice: writing the PDF and showing a folder to the user.
//!
//! Commands receive these as trait objects so that invoice computation and rendering never touch
//! the filesystem, and so that tests can record what would have happened.

use crate::error::Res;
use crate::utils;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persists rendered invoices.
#[async_trait::async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Writes `bytes` under `file_name`, replacing any earlier version, and returns where they
    /// were written.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Res<PathBuf>;
}

/// Opens a folder in the host file browser.
#[async_trait::async_trait]
pub trait Desktop: Send + Sync {
    async fn open_folder(&self, path: &Path) -> Res<()>;
}

/// Stores invoices as files in a folder, which is created when missing.
#[derive(Debug, Clone)]
pub struct FolderStore {
    dir: PathBuf,
}

impl FolderStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl InvoiceStore for FolderStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Res<PathBuf> {
        utils::make_dir(&self.dir)
            .await
            .context("Unable to create the invoices folder")?;
        let path = self.dir.join(file_name);
        utils::write(&path, bytes).await?;
        info!("Invoice written to {}", path.display());
        Ok(path)
    }
}

/// Opens folders with the platform's file browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDesktop;

impl SystemDesktop {
    fn opener() -> &'static str {
        if cfg!(target_os = "windows") {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        }
    }
}

#[async_trait::async_trait]
impl Desktop for SystemDesktop {
    async fn open_folder(&self, path: &Path) -> Res<()> {
        let opener = Self::opener();
        debug!("Running {opener} {}", path.display());
        // The file browser keeps running after we exit, so the child is not awaited.
        tokio::process::Command::new(opener)
            .arg(path)
            .spawn()
            .with_context(|| format!("Unable to open {} with {opener}", path.display()))?;
        Ok(())
    }
}

/// Logs the folder instead of opening it. Used when running against the built-in test data.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDesktop;

#[async_trait::async_trait]
impl Desktop for LogDesktop {
    async fn open_folder(&self, path: &Path) -> Res<()> {
        info!("Not opening {} in test mode", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_folder_store_creates_folder_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FolderStore::new(dir.path().join("factures"));

        let path = store.save("a.pdf", b"first").await.unwrap();
        assert_eq!(path, dir.path().join("factures").join("a.pdf"));
        store.save("a.pdf", b"second").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
    }

    #[test]
    fn test_opener() {
        assert!(!SystemDesktop::opener().is_empty());
    }
}
