//! These structs provide the CLI interface for the fermage CLI.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// fermage: generates agricultural lease (fermage) invoices from a spreadsheet.
///
/// The spreadsheet has one sheet per year. Each row of a sheet describes a parcel leased by an
/// owner to a tenant, with its area, the quantity of quintals due per hectare, the reference and
/// adjusted quintal prices and the tax rate. Pick a year, an owner, a tenant and some parcels to
/// preview the invoice and write it as a PDF.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, its folders and the configuration file.
    ///
    /// This is the first command you should run. The home directory gets a `tableau` folder for
    /// the workbook, a `factures` folder for the invoices and a `config.json` file. Pass
    /// --workbook to copy an existing workbook into place.
    Init(InitArgs),
    /// List the years, which are the sheets of the workbook.
    Years,
    /// List the owners, tenants and parcels of one year.
    Owners(YearArgs),
    /// List the parcels of one owner in one year.
    Parcels(ParcelsArgs),
    /// Compute an invoice and print it without writing anything.
    Preview(InvoiceArgs),
    /// Compute an invoice, confirm it and write it as a PDF in the invoices folder.
    Generate(GenerateArgs),
    /// Open the invoices folder or the workbook folder in the file browser.
    Open(OpenArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory holding the configuration, the workbook and the invoices. Defaults to the
    /// directory of the fermage executable.
    #[arg(long, env = "FERMAGE_HOME", default_value_t = default_fermage_home())]
    fermage_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, fermage_home: PathBuf) -> Self {
        Self {
            log_level,
            fermage_home: fermage_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn fermage_home(&self) -> &DisplayPath {
        &self.fermage_home
    }
}

/// (Not shown): Args for the `fermage init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// An existing lease workbook (.xlsx) to copy into the home directory.
    #[arg(long)]
    workbook: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(workbook: Option<PathBuf>) -> Self {
        Self { workbook }
    }

    pub fn workbook(&self) -> Option<&Path> {
        self.workbook.as_deref()
    }
}

/// (Not shown): Args for the `fermage owners` command.
#[derive(Debug, Parser, Clone)]
pub struct YearArgs {
    /// The year, which is the name of a sheet in the workbook.
    #[arg(long)]
    year: String,
}

impl YearArgs {
    pub fn new(year: impl Into<String>) -> Self {
        Self { year: year.into() }
    }

    pub fn year(&self) -> &str {
        &self.year
    }
}

/// (Not shown): Args for the `fermage parcels` command.
#[derive(Debug, Parser, Clone)]
pub struct ParcelsArgs {
    /// The year, which is the name of a sheet in the workbook.
    #[arg(long)]
    year: String,

    /// The owner whose parcels are listed.
    #[arg(long)]
    owner: String,
}

impl ParcelsArgs {
    pub fn new(year: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            owner: owner.into(),
        }
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// (Not shown): Args for the `fermage preview` command.
#[derive(Debug, Parser, Clone)]
pub struct InvoiceArgs {
    /// The year, which is the name of a sheet in the workbook.
    #[arg(long)]
    year: String,

    /// The owner (propriétaire) who issues the invoice.
    #[arg(long)]
    owner: String,

    /// The tenant (fermier) who is invoiced.
    #[arg(long)]
    tenant: String,

    /// A parcel id to invoice. Repeat the flag to invoice several parcels.
    #[arg(long = "parcel", required = true)]
    parcels: Vec<String>,
}

impl InvoiceArgs {
    pub fn new(
        year: impl Into<String>,
        owner: impl Into<String>,
        tenant: impl Into<String>,
        parcels: Vec<String>,
    ) -> Self {
        Self {
            year: year.into(),
            owner: owner.into(),
            tenant: tenant.into(),
            parcels,
        }
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn parcels(&self) -> &[String] {
        &self.parcels
    }
}

/// (Not shown): Args for the `fermage generate` command.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    invoice: InvoiceArgs,

    /// Write the PDF without asking for confirmation.
    #[arg(long)]
    yes: bool,

    /// Do not open the invoices folder after writing the PDF.
    #[arg(long)]
    no_open: bool,
}

impl GenerateArgs {
    pub fn new(invoice: InvoiceArgs, yes: bool, no_open: bool) -> Self {
        Self {
            invoice,
            yes,
            no_open,
        }
    }

    pub fn invoice(&self) -> &InvoiceArgs {
        &self.invoice
    }

    pub fn yes(&self) -> bool {
        self.yes
    }

    pub fn no_open(&self) -> bool {
        self.no_open
    }
}

/// The folders that `fermage open` can show.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    /// The folder where invoices are written.
    #[default]
    Invoices,
    /// The folder holding the workbook.
    Workbook,
}

serde_plain::derive_display_from_serialize!(Folder);
serde_plain::derive_fromstr_from_deserialize!(Folder);

/// (Not shown): Args for the `fermage open` command.
#[derive(Debug, Parser, Clone)]
pub struct OpenArgs {
    /// Which folder to open: "invoices" or "workbook"
    #[arg(value_enum, default_value_t = Folder::Invoices)]
    folder: Folder,
}

impl OpenArgs {
    pub fn new(folder: Folder) -> Self {
        Self { folder }
    }

    pub fn folder(&self) -> Folder {
        self.folder
    }
}

fn default_fermage_home() -> DisplayPath {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    DisplayPath(match exe_dir {
        Some(dir) => dir,
        None => match dirs::home_dir() {
            Some(home) => home.join("fermage"),
            None => {
                error!(
                    "There was an error when trying to find the fermage executable and your home \
                    directory. You can get around this by providing --fermage-home or \
                    FERMAGE_HOME. If you continue using the program right now, you may have \
                    problems!",
                );
                PathBuf::from("fermage")
            }
        },
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
