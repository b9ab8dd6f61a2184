//! Implements the `Workbook` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a spreadsheet file.

use crate::error::Res;
use crate::model::Cell;
use crate::workbook::Workbook;
use anyhow::Context;
use std::io::Cursor;

/// An implementation of the `Workbook` trait that does not read a file. It can hold any sheets in
/// memory and `seeded` fills it with the data in this module.
#[derive(Debug, Clone)]
pub struct TestWorkbook {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
}

impl TestWorkbook {
    /// Create an empty `TestWorkbook`.
    pub fn empty() -> Self {
        Self { sheets: Vec::new() }
    }

    /// Create a `TestWorkbook` from `(sheet name, CSV data)` pairs. The CSV data includes the
    /// header row, and rows may have any length.
    pub fn from_csv(sheets: &[(&str, &str)]) -> Res<Self> {
        let mut workbook = Self::empty();
        for (name, csv_data) in sheets {
            let rows = load_csv(csv_data)
                .with_context(|| format!("Unable to load CSV data for sheet '{name}'"))?;
            workbook.set_sheet(*name, rows);
        }
        Ok(workbook)
    }

    /// Adds or replaces a sheet.
    pub fn set_sheet(&mut self, name: impl Into<String>, rows: Vec<Vec<Cell>>) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = rows,
            None => self.sheets.push((name, rows)),
        }
    }

    /// The workbook seeded with the data in this module: sheets `2024` and `2025`.
    pub fn seeded() -> Res<Self> {
        Self::from_csv(&[("2024", SHEET_2024), ("2025", SHEET_2025)])
    }
}

#[async_trait::async_trait]
impl Workbook for TestWorkbook {
    async fn sheet_names(&self) -> Res<Vec<String>> {
        Ok(self.sheets.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn rows(&self, sheet_name: &str) -> Res<Option<Vec<Vec<Cell>>>> {
        Ok(self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, rows)| rows.clone()))
    }
}

/// Loads rows of cells from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<Cell>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    Ok(rows)
}

const HEADER: &str = "ID,Propriétaire,Adresse propriétaire,CP/Ville propriétaire,Parcelle,Fermier,\
Adresse fermier,CP/Ville fermier,Surface (ha),Quantité (qx),Prix du quintal,Indice (%),\
Prix ajusté,Taxe (%)";

/// Seed data for the 2025 sheet.
const SHEET_2025: &str = r##"ID,Propriétaire,Adresse propriétaire,CP/Ville propriétaire,Parcelle,Fermier,Adresse fermier,CP/Ville fermier,Surface (ha),Quantité (qx),Prix du quintal,Indice (%),Prix ajusté,Taxe (%)
1,Dupont,1 rue des Champs,69000 Lyon,P1,Martin,2 chemin Vert,01000 Bourg-en-Bresse,2.5,10,18,1.5,20,5.5
2,Dupont,1 rue des Champs,69000 Lyon,P2,Martin,2 chemin Vert,01000 Bourg-en-Bresse,4,12,18,1.5,21,5.5
3,Dupont,1 rue des Champs,69000 Lyon,P3,Bernard,,,"1,25",8,18,1.5,19.5,10
4,Durand,8 place de l'Église,38000 Grenoble,ZA 12,Martin,2 chemin Vert,01000 Bourg-en-Bresse,3,9,17,1.5,18.75,5.5
5,Durand,8 place de l'Église,38000 Grenoble,ZA 13,Martin,2 chemin Vert,01000 Bourg-en-Bresse,0,9,17,1.5,18.75,5.5
6,Leroy,3 impasse du Moulin,71000 Mâcon,B7,Bernard,,,deux,7,16,1.5,17,5.5
"##;

/// Seed data for the 2024 sheet.
const SHEET_2024: &str = r##"ID,Propriétaire,Adresse propriétaire,CP/Ville propriétaire,Parcelle,Fermier,Adresse fermier,CP/Ville fermier,Surface (ha),Quantité (qx),Prix du quintal,Indice (%),Prix ajusté,Taxe (%)
1,Dupont,1 rue des Champs,69000 Lyon,P1,Martin,2 chemin Vert,01000 Bourg-en-Bresse,2.5,10,17.5,1.2,19,5.5
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_seeded_sheets() {
        let workbook = TestWorkbook::seeded().unwrap();
        assert_eq!(workbook.sheet_names().await.unwrap(), vec!["2024", "2025"]);
        let rows = workbook.rows("2025").await.unwrap().unwrap();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[1][1], Cell::Text("Dupont".into()));
        assert_eq!(rows[1][8], Cell::Number("2.5".parse::<Decimal>().unwrap()));
        assert_eq!(rows[3][8], Cell::Text("1,25".into()));
        assert!(workbook.rows("1999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_header_constant_matches_seed() {
        let workbook = TestWorkbook::from_csv(&[("x", HEADER)]).unwrap();
        let rows = workbook.rows("x").await.unwrap().unwrap();
        assert_eq!(rows[0].len(), crate::model::COLUMN_COUNT);
        assert!(SHEET_2025.starts_with(HEADER));
        assert!(SHEET_2024.starts_with(HEADER));
    }

    #[tokio::test]
    async fn test_set_sheet_replaces() {
        let mut workbook = TestWorkbook::empty();
        workbook.set_sheet("2025", vec![vec![Cell::parse("a")]]);
        workbook.set_sheet("2025", vec![]);
        assert_eq!(workbook.sheet_names().await.unwrap(), vec!["2025"]);
        assert!(workbook.rows("2025").await.unwrap().unwrap().is_empty());
    }
}
