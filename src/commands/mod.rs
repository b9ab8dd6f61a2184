//! Command handlers for the fermage CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod catalog;
mod init;
mod invoice;
mod open;

use crate::error::{ErrorType, IntoResult};
use crate::output::{Desktop, FolderStore, InvoiceStore, LogDesktop, SystemDesktop};
use crate::workbook::{self, Mode, Workbook};
use crate::{Config, Result};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

pub use catalog::{owners, parcels, years};
pub use init::init;
pub use invoice::{generate, preview, Generated};
pub use open::open;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Everything a command needs once the home directory exists: the configuration, the workbook to
/// read, where invoices go, how folders are shown and the date printed on invoices.
pub struct App {
    config: Config,
    workbook: Box<dyn Workbook>,
    store: Box<dyn InvoiceStore>,
    desktop: Box<dyn Desktop>,
    today: NaiveDate,
}

impl App {
    /// Loads the configuration in `home`. In `Mode::Test` the built-in test workbook is read and
    /// folders are logged instead of opened.
    pub async fn load(home: &Path, mode: Mode) -> Result<Self> {
        let config = Config::load(home).await?;
        let workbook = workbook::workbook(&config, mode)
            .context("Unable to prepare the workbook")
            .pub_result(ErrorType::Io)?;
        let store = Box::new(FolderStore::new(config.invoices_dir()));
        let desktop: Box<dyn Desktop> = match mode {
            Mode::Xlsx => Box::new(SystemDesktop),
            Mode::Test => Box::new(LogDesktop),
        };
        let today = chrono::Local::now().date_naive();
        Ok(Self::new(config, workbook, store, desktop, today))
    }

    pub fn new(
        config: Config,
        workbook: Box<dyn Workbook>,
        store: Box<dyn InvoiceStore>,
        desktop: Box<dyn Desktop>,
        today: NaiveDate,
    ) -> Self {
        Self {
            config,
            workbook,
            store,
            desktop,
            today,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workbook(&self) -> &dyn Workbook {
        self.workbook.as_ref()
    }

    pub fn store(&self) -> &dyn InvoiceStore {
        self.store.as_ref()
    }

    pub fn desktop(&self) -> &dyn Desktop {
        self.desktop.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}
