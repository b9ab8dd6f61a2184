//! Read-only access to the lease workbook.
//!
//! The `Workbook` trait is the only thing the loader and the calculator know about the
//! spreadsheet. `XlsxWorkbook` reads an `.xlsx` file on disk and `TestWorkbook` holds sheets in
//! memory.

mod test_workbook;
mod xlsx;

use crate::error::Res;
use crate::model::Cell;
use crate::Config;

pub use test_workbook::TestWorkbook;
pub use xlsx::XlsxWorkbook;

/// Environment variable that switches the program to the in-memory `TestWorkbook`.
pub const TEST_MODE_ENV: &str = "FERMAGE_IN_TEST_MODE";

/// A source of year sheets.
#[async_trait::async_trait]
pub trait Workbook: Send + Sync {
    /// The names of the sheets, in workbook order.
    async fn sheet_names(&self) -> Res<Vec<String>>;

    /// The cells of `sheet_name` row by row, starting with the header row. Returns `None` when the
    /// workbook has no sheet with that name.
    async fn rows(&self, sheet_name: &str) -> Res<Option<Vec<Vec<Cell>>>>;
}

/// Whether the program reads the configured workbook file or the built-in test data.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Xlsx,
    Test,
}

impl Mode {
    /// When `FERMAGE_IN_TEST_MODE` is set and non-zero in length, then the mode will be
    /// `Mode::Test`, otherwise it will be `Mode::Xlsx`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Xlsx,
        }
    }
}

/// Creates the workbook for `mode`. The `.xlsx` file is not opened until the workbook is queried.
pub fn workbook(config: &Config, mode: Mode) -> Res<Box<dyn Workbook>> {
    Ok(match mode {
        Mode::Xlsx => Box::new(XlsxWorkbook::new(config.workbook_path())),
        Mode::Test => Box::new(TestWorkbook::seeded()?),
    })
}
