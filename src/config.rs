//! Configuration file handling for fermage.
//!
//! The configuration file is stored at `$FERMAGE_HOME/config.json` and tells the app where the
//! lease workbook is, where invoices are written and, optionally, where the PDF fonts are.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "fermage";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const TABLEAU: &str = "tableau";
const WORKBOOK_FILE: &str = "tableau_fermage.xlsx";
const FACTURES: &str = "factures";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$FERMAGE_HOME` and from there it loads `$FERMAGE_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the fermage home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its `tableau` and `factures` subdirectories and an initial
    /// `config.json` with default settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/fermage`
    /// - `workbook` - An existing lease workbook. When given, it is copied to
    ///   `tableau/tableau_fermage.xlsx` in the home directory.
    ///
    /// # Errors
    /// - Returns an `ErrorType::Io` error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, workbook: Option<&Path>) -> Result<Self> {
        Self::try_create(dir.into(), workbook)
            .await
            .pub_result(ErrorType::Io)
    }

    async fn try_create(maybe_relative: PathBuf, workbook: Option<&Path>) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the fermage home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        utils::make_dir(root.join(TABLEAU)).await?;
        utils::make_dir(root.join(FACTURES)).await?;

        let config_file = ConfigFile::default();
        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        let config = Self {
            root,
            config_path,
            config_file,
        };

        if let Some(source) = workbook {
            let destination = config.workbook_path();
            utils::copy(source, &destination).await?;
            debug!("Copied the workbook to {}", destination.display());
        }

        Ok(config)
    }

    /// This will
    /// - validate that `fermage_home` exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    ///
    /// Any failure is an `ErrorType::Config` error.
    pub async fn load(fermage_home: impl Into<PathBuf>) -> Result<Self> {
        Self::try_load(fermage_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn try_load(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Fermage home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!(
                "The config file is missing '{}', run 'fermage init' first",
                config_path.display()
            )
        }
        let config_file = ConfigFile::load(&config_path).await?;

        Ok(Self {
            root,
            config_path,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The lease workbook, resolved against the home directory when relative.
    pub fn workbook_path(&self) -> PathBuf {
        self.resolve(&self.config_file.workbook_path)
    }

    /// The folder that holds `workbook_path`.
    pub fn workbook_dir(&self) -> PathBuf {
        let workbook = self.workbook_path();
        workbook
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    /// The folder invoices are written to, resolved against the home directory when relative.
    pub fn invoices_dir(&self) -> PathBuf {
        self.resolve(&self.config_file.invoices_dir)
    }

    /// The folder holding the DejaVu fonts, if one is configured.
    pub fn fonts_dir(&self) -> Option<PathBuf> {
        self.config_file.fonts_dir.as_deref().map(|p| self.resolve(p))
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is absolute.
    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            return p.to_path_buf();
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "fermage",
///   "config_version": 1,
///   "workbook_path": "tableau/tableau_fermage.xlsx",
///   "invoices_dir": "factures",
///   "fonts_dir": "assets/fonts"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "fermage"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the lease workbook (relative to the home directory or absolute)
    workbook_path: PathBuf,

    /// Folder where invoices are written (relative to the home directory or absolute)
    invoices_dir: PathBuf,

    /// Folder holding DejaVuSans.ttf, DejaVuSans-Bold.ttf and DejaVuSans-Oblique.ttf. The
    /// builtin Helvetica fonts are used when this is not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fonts_dir: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            workbook_path: PathBuf::from(TABLEAU).join(WORKBOOK_FILE),
            invoices_dir: PathBuf::from(FACTURES),
            fonts_dir: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("fermage_home");

        let config = Config::create(&home_dir, None).await.unwrap();

        assert!(config.config_path().is_file());
        assert!(config.root().join(TABLEAU).is_dir());
        assert!(config.invoices_dir().is_dir());
        assert_eq!(
            config.workbook_path(),
            config.root().join("tableau").join("tableau_fermage.xlsx")
        );
        assert_eq!(config.workbook_dir(), config.root().join("tableau"));
        assert!(config.fonts_dir().is_none());
        assert!(!config.workbook_path().exists());
    }

    #[tokio::test]
    async fn test_config_create_copies_workbook() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("mine.xlsx");
        utils::write(&source, "not really a workbook").await.unwrap();

        let config = Config::create(dir.path().join("home"), Some(&source))
            .await
            .unwrap();

        let copied = utils::read(&config.workbook_path()).await.unwrap();
        assert_eq!(copied, "not really a workbook");
        assert!(source.is_file());
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path(), None).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(created.config_file, loaded.config_file);
    }

    #[tokio::test]
    async fn test_config_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("The config file is missing"));
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("nope")).await.unwrap_err();
        assert!(err.to_string().contains("Fermage home is missing"));
    }

    #[tokio::test]
    async fn test_config_file_with_fonts_and_absolute_paths() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "app_name": "fermage",
            "config_version": 1,
            "workbook_path": "/srv/baux/tableau.xlsx",
            "invoices_dir": "sortie",
            "fonts_dir": "assets/fonts"
        }"#;
        utils::write(dir.path().join(CONFIG_JSON), json)
            .await
            .unwrap();

        let config = Config::load(dir.path()).await.unwrap();

        assert_eq!(config.workbook_path(), PathBuf::from("/srv/baux/tableau.xlsx"));
        assert_eq!(config.workbook_dir(), PathBuf::from("/srv/baux"));
        assert_eq!(config.invoices_dir(), config.root().join("sortie"));
        assert_eq!(
            config.fonts_dir(),
            Some(config.root().join("assets").join("fonts"))
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_JSON);
        let json = r#"{
            "app_name": "another_app",
            "config_version": 1,
            "workbook_path": "x.xlsx",
            "invoices_dir": "factures"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("fonts_dir"));
        assert!(json.contains("\"app_name\":\"fermage\""));
    }
}
