//! The invoice computed for one selection.

use crate::error::{Error, ErrorType, Res};
use crate::model::amount::{as_given, fixed2};
use crate::model::{Amount, ParcelSelection};
use crate::Result;
use anyhow::{ensure, Context};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub(crate) const UNKNOWN_ADDRESS: &str = "Adresse non spécifiée";
pub(crate) const UNKNOWN_CITY: &str = "CP/Ville non spécifiés";

/// The identity block of the owner or the tenant.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub address: String,
    /// Postal code and city, e.g. `69000 Lyon`.
    pub city: String,
}

impl Party {
    /// Blank address fields are replaced with a placeholder.
    pub fn new(name: impl Into<String>, address: &str, city: &str) -> Self {
        let or = |s: &str, default: &str| {
            if s.trim().is_empty() {
                default.to_string()
            } else {
                s.trim().to_string()
            }
        };
        Self {
            name: name.into(),
            address: or(address, UNKNOWN_ADDRESS),
            city: or(city, UNKNOWN_CITY),
        }
    }

    /// The last word of the postal code and city line, which is the city for `69000 Lyon`.
    pub fn town(&self) -> &str {
        self.city.split_whitespace().last().unwrap_or_default()
    }
}

/// One row of the invoice table.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub parcel: String,
    /// Hectares.
    pub area: Decimal,
    /// Quintals per hectare.
    pub quantity: Decimal,
    pub adjusted_price: Decimal,
    /// Percent.
    pub tax_rate: Decimal,
    /// `area × quantity × adjusted_price`
    pub amount_ht: Amount,
    /// `amount_ht × (1 + tax_rate / 100)`
    pub amount_ttc: Amount,
}

impl InvoiceLine {
    /// Computes the amounts of a line. Negative area, quantity or price, or a tax rate outside
    /// `[0, 100]`, is an error.
    pub fn new(
        parcel: impl Into<String>,
        area: Decimal,
        quantity: Decimal,
        adjusted_price: Decimal,
        tax_rate: Decimal,
    ) -> Res<Self> {
        let parcel = parcel.into();
        ensure!(
            !area.is_sign_negative() || area.is_zero(),
            "Parcel {parcel} has a negative area ({area})"
        );
        ensure!(
            !quantity.is_sign_negative() || quantity.is_zero(),
            "Parcel {parcel} has a negative quantity ({quantity})"
        );
        ensure!(
            !adjusted_price.is_sign_negative() || adjusted_price.is_zero(),
            "Parcel {parcel} has a negative adjusted price ({adjusted_price})"
        );
        ensure!(
            tax_rate >= Decimal::ZERO && tax_rate <= Decimal::ONE_HUNDRED,
            "Parcel {parcel} has a tax rate outside of 0-100% ({tax_rate})"
        );

        let ht = area
            .checked_mul(quantity)
            .and_then(|v| v.checked_mul(adjusted_price))
            .with_context(|| format!("Parcel {parcel} has an amount too large to compute"))?;
        let ttc = with_tax(ht, tax_rate)
            .with_context(|| format!("Parcel {parcel} has an amount too large to compute"))?;
        Ok(Self {
            parcel,
            area,
            quantity,
            adjusted_price,
            tax_rate,
            amount_ht: ht.into(),
            amount_ttc: ttc.into(),
        })
    }
}

/// A computed fermage invoice.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    year: String,
    owner: Party,
    tenant: Party,
    reference_price: Decimal,
    adjustment_index: Decimal,
    issued_on: NaiveDate,
    /// Every parcel the user selected, including those in `omitted`.
    parcels: Vec<ParcelSelection>,
    lines: Vec<InvoiceLine>,
    /// Selected parcels for which no row matched the owner and tenant.
    omitted: Vec<String>,
    total_ht: Amount,
    total_ttc: Amount,
    preview_total_ttc: Amount,
}

/// The parts of an invoice that come from the first row of the owner and tenant pair.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvoiceHeader {
    pub year: String,
    pub owner: Party,
    pub tenant: Party,
    pub reference_price: Decimal,
    pub adjustment_index: Decimal,
    pub issued_on: NaiveDate,
}

impl Invoice {
    /// Assembles an invoice and its totals. Fails with `ErrorType::NoLines` if `lines` is empty.
    pub fn new(
        header: InvoiceHeader,
        parcels: Vec<ParcelSelection>,
        lines: Vec<InvoiceLine>,
        omitted: Vec<String>,
    ) -> Result<Self> {
        if lines.is_empty() {
            return Err(Error::msg(
                ErrorType::NoLines,
                format!(
                    "None of the selected parcels has a row for {} and {} in {}",
                    header.owner.name, header.tenant.name, header.year
                ),
            ));
        }
        let too_large = || {
            Error::msg(
                ErrorType::MalformedRow,
                format!(
                    "The totals of the invoice for {} and {} in {} are too large to compute",
                    header.owner.name, header.tenant.name, header.year
                ),
            )
        };
        let total_ht = checked_sum(lines.iter().map(|l| l.amount_ht)).ok_or_else(too_large)?;
        let total_ttc = checked_sum(lines.iter().map(|l| l.amount_ttc)).ok_or_else(too_large)?;
        // The preview scales the pre-tax total by the rate of the last line.
        let last_rate = lines.last().map(|l| l.tax_rate).unwrap_or(Decimal::ZERO);
        let preview_total_ttc = with_tax(total_ht.value(), last_rate).ok_or_else(too_large)?;
        Ok(Self {
            year: header.year,
            owner: header.owner,
            tenant: header.tenant,
            reference_price: header.reference_price,
            adjustment_index: header.adjustment_index,
            issued_on: header.issued_on,
            parcels,
            lines,
            omitted,
            total_ht,
            total_ttc,
            preview_total_ttc: preview_total_ttc.into(),
        })
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn owner(&self) -> &Party {
        &self.owner
    }

    pub fn tenant(&self) -> &Party {
        &self.tenant
    }

    pub fn reference_price(&self) -> Decimal {
        self.reference_price
    }

    pub fn adjustment_index(&self) -> Decimal {
        self.adjustment_index
    }

    pub fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    pub fn parcels(&self) -> &[ParcelSelection] {
        &self.parcels
    }

    pub fn lines(&self) -> &[InvoiceLine] {
        &self.lines
    }

    pub fn omitted(&self) -> &[String] {
        &self.omitted
    }

    /// Sum of the pre-tax line amounts.
    pub fn total_ht(&self) -> Amount {
        self.total_ht
    }

    /// Sum of the tax-inclusive line amounts. This is the total printed on the PDF.
    pub fn total_ttc(&self) -> Amount {
        self.total_ttc
    }

    /// The tax-inclusive total as the preview shows it: the pre-tax total scaled by the tax rate of
    /// the last line. It differs from `total_ttc` when lines have different tax rates.
    pub fn preview_total_ttc(&self) -> Amount {
        self.preview_total_ttc
    }

    /// `facture_fermage_<year>_<owner>_<tenant>.pdf`, with path separators replaced.
    pub fn file_name(&self) -> String {
        let name = format!(
            "facture_fermage_{}_{}_{}.pdf",
            self.year, self.owner.name, self.tenant.name
        );
        name.replace(['/', '\\'], "_")
    }
}

/// `amount × (1 + tax_rate / 100)`, or `None` on overflow.
fn with_tax(amount: Decimal, tax_rate: Decimal) -> Option<Decimal> {
    let rate = tax_rate.checked_div(Decimal::ONE_HUNDRED)?;
    amount.checked_mul(Decimal::ONE.checked_add(rate)?)
}

fn checked_sum(mut amounts: impl Iterator<Item = Amount>) -> Option<Amount> {
    amounts.try_fold(Amount::ZERO, |total, amount| total.checked_add(amount))
}

/// The text preview of the invoice, shown before the PDF is written.
impl Display for Invoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Aperçu de la Facture de Fermage")?;
        writeln!(f)?;
        writeln!(f, "Année : {}", self.year)?;
        writeln!(f, "Propriétaire : {}", self.owner.name)?;
        writeln!(
            f,
            "Adresse Propriétaire : {}, {}",
            self.owner.address, self.owner.city
        )?;
        writeln!(f, "Fermier : {}", self.tenant.name)?;
        writeln!(
            f,
            "Adresse Fermier : {}, {}",
            self.tenant.address, self.tenant.city
        )?;
        writeln!(f)?;
        writeln!(f, "Détails des parcelles :")?;

        let header = [
            "Parcelle",
            "Surface (ha)",
            "Quantité (qx)",
            "Prix Ajusté (€)",
            "Impôts (%)",
            "Total HT (€)",
        ];
        let rows: Vec<[String; 6]> = self
            .lines
            .iter()
            .map(|l| {
                [
                    l.parcel.clone(),
                    fixed2(l.area),
                    fixed2(l.quantity),
                    fixed2(l.adjusted_price),
                    as_given(l.tax_rate),
                    l.amount_ht.to_string(),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: Vec<&str>| -> String {
            cells
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        writeln!(f, "{}", line(header.to_vec()))?;
        for row in &rows {
            writeln!(f, "{}", line(row.iter().map(String::as_str).collect()))?;
        }

        if !self.omitted.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Parcelles sans ligne correspondante : {}",
                self.omitted.join(", ")
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Total HT : {} €", self.total_ht)?;
        write!(f, "Total TTC : {} €", self.preview_total_ttc())
    }
}
