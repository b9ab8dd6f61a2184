//! Reads year sheets from a `Workbook` and turns them into a `Catalog`.

use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Catalog, LeaseSheet};
use crate::workbook::Workbook;
use crate::Result;
use anyhow::Context;
use tracing::debug;

/// The names of the year sheets, in workbook order.
pub async fn list_years(workbook: &dyn Workbook) -> Result<Vec<String>> {
    workbook
        .sheet_names()
        .await
        .context("Unable to list the sheets of the workbook")
        .pub_result(ErrorType::Io)
}

/// Reads and parses the sheet named `year`.
///
/// # Errors
/// - `ErrorType::MissingSheet` when the workbook has no sheet for `year`
/// - `ErrorType::MalformedRow` when a row has fewer columns than expected
/// - `ErrorType::Io` when the workbook cannot be read
pub async fn load_sheet(workbook: &dyn Workbook, year: &str) -> Result<LeaseSheet> {
    let rows = workbook
        .rows(year)
        .await
        .with_context(|| format!("Unable to read the sheet for {year}"))
        .pub_result(ErrorType::Io)?
        .ok_or_else(|| {
            Error::msg(
                ErrorType::MissingSheet,
                format!("The sheet for {year} does not exist"),
            )
        })?;
    let sheet = LeaseSheet::parse(&rows)?;
    debug!("Read {} records for {year}", sheet.records().len());
    Ok(sheet)
}

/// Scans the sheet for `year` and returns its distinct owners, distinct tenants and the parcels of
/// each owner. A malformed row fails the whole load.
pub async fn load_catalog(workbook: &dyn Workbook, year: &str) -> Result<Catalog> {
    let sheet = load_sheet(workbook, year).await?;
    Ok(Catalog::from_sheet(&sheet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Parcel};
    use crate::workbook::TestWorkbook;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_list_years() {
        let workbook = TestWorkbook::seeded().unwrap();
        let years = list_years(&workbook).await.unwrap();
        assert_eq!(years, vec!["2024", "2025"]);
    }

    #[tokio::test]
    async fn test_load_catalog() {
        let workbook = TestWorkbook::seeded().unwrap();
        let catalog = load_catalog(&workbook, "2025").await.unwrap();

        let owners: Vec<&str> = catalog.owners().iter().map(String::as_str).collect();
        assert_eq!(owners, vec!["Dupont", "Durand"]);
        let tenants: Vec<&str> = catalog.tenants().iter().map(String::as_str).collect();
        assert_eq!(tenants, vec!["Bernard", "Martin"]);

        assert_eq!(
            catalog.parcels("Dupont"),
            &[
                Parcel {
                    id: "P1".into(),
                    tenant: "Martin".into(),
                    area: dec("2.5")
                },
                Parcel {
                    id: "P2".into(),
                    tenant: "Martin".into(),
                    area: dec("4")
                },
                Parcel {
                    id: "P3".into(),
                    tenant: "Bernard".into(),
                    area: dec("1.25")
                },
            ]
        );
        assert_eq!(catalog.parcels("Durand").len(), 1);
        assert_eq!(catalog.parcels("Durand")[0].id, "ZA 12");
    }

    #[tokio::test]
    async fn test_zero_and_non_numeric_area_are_excluded() {
        let workbook = TestWorkbook::seeded().unwrap();
        let catalog = load_catalog(&workbook, "2025").await.unwrap();
        assert!(!catalog.owners().contains("Leroy"));
        assert!(catalog.parcels("Durand").iter().all(|p| p.id != "ZA 13"));

        let sheet = load_sheet(&workbook, "2025").await.unwrap();
        assert_eq!(sheet.coercions().len(), 1);
        assert_eq!(sheet.coercions()[0].raw, "deux");
    }

    #[tokio::test]
    async fn test_missing_year() {
        let workbook = TestWorkbook::seeded().unwrap();
        let err = load_catalog(&workbook, "1999").await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MissingSheet);
        assert!(err.to_string().contains("1999"));
    }

    #[tokio::test]
    async fn test_malformed_row_discards_the_sheet() {
        let mut workbook = TestWorkbook::empty();
        let good: Vec<Cell> = [
            "1", "A", "", "", "P1", "B", "", "", "1", "1", "1", "1", "1", "0",
        ]
        .iter()
        .map(Cell::parse)
        .collect();
        let short: Vec<Cell> = ["2", "A", "", "", "P2"].iter().map(Cell::parse).collect();
        workbook.set_sheet("2025", vec![good.clone(), good, short]);

        let err = load_catalog(&workbook, "2025").await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedRow);
        assert!(err.to_string().contains("Row 3"));
    }

    #[tokio::test]
    async fn test_numeric_parcel_ids_are_text() {
        let workbook = TestWorkbook::from_csv(&[(
            "2025",
            "header\n1,A,,,12,B,,,1.5,1,1,1,1,0\n",
        )])
        .unwrap();
        let catalog = load_catalog(&workbook, "2025").await.unwrap();
        assert_eq!(catalog.parcels("A")[0].id, "12");
    }
}
