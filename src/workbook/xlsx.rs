//! Implements the `Workbook` trait for an `.xlsx` file using calamine.

use crate::error::Res;
use crate::model::Cell;
use crate::workbook::Workbook;
use anyhow::{anyhow, Context};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Reads sheets from an `.xlsx` file. The file is opened for each query and closed right after,
/// so edits made to the spreadsheet between two commands are always seen.
#[derive(Debug, Clone)]
pub struct XlsxWorkbook {
    path: PathBuf,
}

impl XlsxWorkbook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Workbook for XlsxWorkbook {
    async fn sheet_names(&self) -> Res<Vec<String>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Ok(open(&path)?.sheet_names()))
            .await
            .context("The workbook reader task failed")?
    }

    async fn rows(&self, sheet_name: &str) -> Res<Option<Vec<Vec<Cell>>>> {
        trace!("rows for {sheet_name}");
        let path = self.path.clone();
        let sheet_name = sheet_name.to_string();
        tokio::task::spawn_blocking(move || read_sheet(&path, &sheet_name))
            .await
            .context("The workbook reader task failed")?
    }
}

fn open(path: &Path) -> Res<Xlsx<BufReader<File>>> {
    open_workbook(path).map_err(|e| anyhow!("Unable to open workbook {}: {e}", path.display()))
}

fn read_sheet(path: &Path, sheet_name: &str) -> Res<Option<Vec<Vec<Cell>>>> {
    let mut workbook = open(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        debug!("No sheet named '{sheet_name}' in {}", path.display());
        return Ok(None);
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| anyhow!("Unable to read sheet '{sheet_name}': {e}"))?;
    Ok(Some(to_rows(&range)))
}

/// Converts a range into rows addressed from cell A1, so that column positions do not depend on
/// where the first used cell of the sheet is.
fn to_rows(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| range.get_value((row, col)).map(to_cell).unwrap_or_default())
                .collect()
        })
        .collect()
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => match Decimal::from_f64(*f) {
            Some(d) => Cell::Number(d),
            None => Cell::Text(f.to_string()),
        },
        other => Cell::Text(other.to_string()),
    }
}
