//! Computes the invoice for a `Selection`.

use crate::error::{Error, ErrorType, IntoResult};
use crate::loader::load_sheet;
use crate::model::{Invoice, InvoiceHeader, InvoiceLine, LeaseSheet, Party, Selection};
use crate::workbook::Workbook;
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Reads the sheet for the selected year and computes the invoice.
///
/// The first row of the owner and tenant pair supplies the addresses, the reference price and the
/// adjustment index. Each selected parcel is billed from the first row that also matches its id,
/// using the area held by the selection. Parcels without such a row produce no line and are listed
/// in `Invoice::omitted`.
///
/// # Errors
/// - `ErrorType::MissingSheet` or `ErrorType::MalformedRow` from reading the sheet
/// - `ErrorType::NotFound` when no row matches the owner and tenant
/// - `ErrorType::MalformedRow` when a matched row breaks a line invariant
/// - `ErrorType::NoLines` when none of the selected parcels produced a line
pub async fn compute_invoice(
    workbook: &dyn Workbook,
    selection: &Selection,
    issued_on: NaiveDate,
) -> Result<Invoice> {
    let sheet = load_sheet(workbook, selection.year()).await?;
    invoice_from_sheet(&sheet, selection, issued_on)
}

/// Computes the invoice from an already parsed sheet.
pub fn invoice_from_sheet(
    sheet: &LeaseSheet,
    selection: &Selection,
    issued_on: NaiveDate,
) -> Result<Invoice> {
    let (owner, tenant) = (selection.owner(), selection.tenant());
    let first = sheet.find(owner, tenant).ok_or_else(|| {
        Error::msg(
            ErrorType::NotFound,
            format!(
                "No row for owner '{owner}' and tenant '{tenant}' in {}",
                selection.year()
            ),
        )
    })?;

    let header = InvoiceHeader {
        year: selection.year().to_string(),
        owner: Party::new(owner, &first.owner_address, &first.owner_city),
        tenant: Party::new(tenant, &first.tenant_address, &first.tenant_city),
        reference_price: first.reference_price,
        adjustment_index: first.adjustment_index,
        issued_on,
    };

    let mut lines = Vec::new();
    let mut omitted = Vec::new();
    for chosen in selection.parcels() {
        let Some(record) = sheet.find_parcel(owner, tenant, &chosen.parcel) else {
            warn!(
                "Parcel {} has no row for {owner} and {tenant}, it is left out of the invoice",
                chosen.parcel
            );
            omitted.push(chosen.parcel.clone());
            continue;
        };
        let line = InvoiceLine::new(
            &chosen.parcel,
            chosen.area,
            record.quantity,
            record.adjusted_price,
            record.tax_rate,
        )
        .with_context(|| format!("Invalid values at row {}", record.row))
        .pub_result(ErrorType::MalformedRow)?;
        debug!(
            "Parcel {}: HT {} TTC {}",
            line.parcel, line.amount_ht, line.amount_ttc
        );
        lines.push(line);
    }

    Invoice::new(header, selection.parcels().to_vec(), lines, omitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_catalog;
    use crate::model::{Catalog, Cell, ParcelSelection};
    use crate::workbook::TestWorkbook;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    async fn selection(owner: &str, tenant: &str, parcels: &[&str]) -> Selection {
        let workbook = TestWorkbook::seeded().unwrap();
        let catalog = load_catalog(&workbook, "2025").await.unwrap();
        Selection::from_catalog(&catalog, "2025", owner, tenant, parcels).unwrap()
    }

    #[tokio::test]
    async fn test_single_parcel_example() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = selection("Dupont", "Martin", &["P1"]).await;

        let invoice = compute_invoice(&workbook, &selection, today()).await.unwrap();

        assert_eq!(invoice.lines().len(), 1);
        assert_eq!(invoice.total_ht().to_string(), "500.00");
        assert_eq!(invoice.total_ttc().to_string(), "527.50");
        assert_eq!(invoice.preview_total_ttc().to_string(), "527.50");
        assert_eq!(invoice.reference_price(), dec("18"));
        assert_eq!(invoice.adjustment_index(), dec("1.5"));
        assert_eq!(invoice.owner().city, "69000 Lyon");
        assert_eq!(invoice.tenant().address, "2 chemin Vert");
        assert!(invoice.omitted().is_empty());
        assert_eq!(
            invoice.file_name(),
            "facture_fermage_2025_Dupont_Martin.pdf"
        );
    }

    #[tokio::test]
    async fn test_totals_are_sums_of_lines() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = selection("Dupont", "Martin", &["P2", "P1"]).await;

        let invoice = compute_invoice(&workbook, &selection, today()).await.unwrap();

        // Catalog order: P1 then P2.
        let parcels: Vec<&str> = invoice.lines().iter().map(|l| l.parcel.as_str()).collect();
        assert_eq!(parcels, vec!["P1", "P2"]);
        // 2.5 × 10 × 20 + 4 × 12 × 21
        assert_eq!(invoice.total_ht().value(), dec("1508"));
        let ttc: Decimal = invoice.lines().iter().map(|l| l.amount_ttc.value()).sum();
        assert_eq!(invoice.total_ttc().value(), ttc);
        assert_eq!(
            invoice.preview_total_ttc().value(),
            dec("1508") * dec("1.055")
        );
    }

    #[tokio::test]
    async fn test_parcel_of_another_tenant_is_omitted() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = selection("Dupont", "Martin", &["P1", "P3"]).await;

        let invoice = compute_invoice(&workbook, &selection, today()).await.unwrap();

        assert_eq!(invoice.lines().len(), 1);
        assert_eq!(invoice.omitted(), &["P3".to_string()]);
        assert_eq!(invoice.parcels().len(), 2);
        assert_eq!(invoice.total_ht().to_string(), "500.00");
    }

    #[tokio::test]
    async fn test_no_lines() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = selection("Dupont", "Martin", &["P3"]).await;
        let err = compute_invoice(&workbook, &selection, today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NoLines);
    }

    #[tokio::test]
    async fn test_unknown_pair() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = Selection::new(
            "2025",
            "Durand",
            "Bernard",
            vec![ParcelSelection::new("ZA 12", dec("3"))],
        )
        .unwrap();
        let err = compute_invoice(&workbook, &selection, today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_missing_year() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = Selection::new(
            "1999",
            "Dupont",
            "Martin",
            vec![ParcelSelection::new("P1", dec("2.5"))],
        )
        .unwrap();
        let err = compute_invoice(&workbook, &selection, today())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MissingSheet);
    }

    #[tokio::test]
    async fn test_blank_addresses_get_defaults() {
        let workbook = TestWorkbook::seeded().unwrap();
        let selection = selection("Dupont", "Bernard", &["P3"]).await;

        let invoice = compute_invoice(&workbook, &selection, today()).await.unwrap();

        assert_eq!(invoice.tenant().address, "Adresse non spécifiée");
        assert_eq!(invoice.tenant().city, "CP/Ville non spécifiés");
        // 1.25 × 8 × 19.5 at 10%
        assert_eq!(invoice.total_ht().to_string(), "195.00");
        assert_eq!(invoice.total_ttc().to_string(), "214.50");
    }

    #[test]
    fn test_out_of_range_tax_is_malformed() {
        let cells: Vec<Cell> = [
            "1", "A", "", "", "P1", "B", "", "", "1", "1", "1", "1", "1", "250",
        ]
        .iter()
        .map(Cell::parse)
        .collect();
        let sheet = LeaseSheet::parse(&[vec![], cells]).unwrap();
        let selection =
            Selection::new("2025", "A", "B", vec![ParcelSelection::new("P1", dec("1"))]).unwrap();

        let err = invoice_from_sheet(&sheet, &selection, today()).unwrap_err();

        assert_eq!(err.error_type(), ErrorType::MalformedRow);
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_huge_values_are_malformed() {
        let big = "100000000000000";
        let cells: Vec<Cell> = [
            "1", "A", "", "", "P1", "B", "", "", big, big, "1", "1", big, "5.5",
        ]
        .iter()
        .map(Cell::parse)
        .collect();
        let sheet = LeaseSheet::parse(&[vec![], cells]).unwrap();
        let catalog = Catalog::from_sheet(&sheet);
        let selection = Selection::from_catalog(&catalog, "2025", "A", "B", &["P1"]).unwrap();

        let err = invoice_from_sheet(&sheet, &selection, today()).unwrap_err();

        assert_eq!(err.error_type(), ErrorType::MalformedRow);
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_area_comes_from_the_selected_tenant_row() {
        let rows: Vec<Vec<Cell>> = [
            ["1", "A", "", "", "P1", "X", "", "", "5", "10", "1", "1", "2", "0"],
            ["2", "A", "", "", "P1", "B", "", "", "2", "10", "1", "1", "2", "0"],
        ]
        .iter()
        .map(|r| r.iter().map(Cell::parse).collect())
        .collect();
        let mut all = vec![vec![]];
        all.extend(rows);
        let sheet = LeaseSheet::parse(&all).unwrap();
        let catalog = Catalog::from_sheet(&sheet);

        let selection = Selection::from_catalog(&catalog, "2025", "A", "B", &["P1"]).unwrap();
        let invoice = invoice_from_sheet(&sheet, &selection, today()).unwrap();

        assert_eq!(invoice.lines()[0].area, dec("2"));
        assert_eq!(invoice.total_ht().to_string(), "40.00");

        let selection = Selection::from_catalog(&catalog, "2025", "A", "X", &["P1"]).unwrap();
        let invoice = invoice_from_sheet(&sheet, &selection, today()).unwrap();
        assert_eq!(invoice.total_ht().to_string(), "100.00");
    }
}
