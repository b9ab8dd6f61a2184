//! The rows of a year sheet, parsed into `LeaseRecord` values.

use crate::error::{Error, ErrorType};
use crate::model::amount::parse_number;
use crate::model::Cell;
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::warn;

/// The number of cells a data row must have. Column 0 holds a row id that is not used.
pub const COLUMN_COUNT: usize = 14;

/// The columns of a year sheet that are read, in sheet order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Owner,
    OwnerAddress,
    OwnerCity,
    Parcel,
    Tenant,
    TenantAddress,
    TenantCity,
    Area,
    Quantity,
    ReferencePrice,
    AdjustmentIndex,
    AdjustedPrice,
    TaxRate,
}

serde_plain::derive_display_from_serialize!(Column);

impl Column {
    /// The 0-based position of the column in a row.
    pub const fn index(self) -> usize {
        match self {
            Column::Owner => 1,
            Column::OwnerAddress => 2,
            Column::OwnerCity => 3,
            Column::Parcel => 4,
            Column::Tenant => 5,
            Column::TenantAddress => 6,
            Column::TenantCity => 7,
            Column::Area => 8,
            Column::Quantity => 9,
            Column::ReferencePrice => 10,
            Column::AdjustmentIndex => 11,
            Column::AdjustedPrice => 12,
            Column::TaxRate => 13,
        }
    }
}

/// A numeric cell that held text which is not a number. Its value was replaced by zero.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Coercion {
    /// 1-based row number in the sheet.
    pub row: usize,
    pub column: Column,
    pub raw: String,
}

impl Display for Coercion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Incorrect value for {} at row {}: '{}', using 0 instead",
            self.column, self.row, self.raw
        )
    }
}

/// One data row of a year sheet.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    /// 1-based row number in the sheet.
    pub row: usize,
    pub owner: String,
    pub owner_address: String,
    pub owner_city: String,
    pub parcel: String,
    pub tenant: String,
    pub tenant_address: String,
    pub tenant_city: String,
    /// Hectares.
    pub area: Decimal,
    /// Quintals.
    pub quantity: Decimal,
    pub reference_price: Decimal,
    /// Percent. A blank or zero index reads as 1.
    pub adjustment_index: Decimal,
    pub adjusted_price: Decimal,
    /// Percent.
    pub tax_rate: Decimal,
}

impl LeaseRecord {
    pub fn matches(&self, owner: &str, tenant: &str) -> bool {
        self.owner == owner && self.tenant == tenant
    }

    pub fn matches_parcel(&self, owner: &str, tenant: &str, parcel: &str) -> bool {
        self.matches(owner, tenant) && self.parcel == parcel
    }

    /// True when the row can be offered for selection: it names an owner, a tenant and a parcel,
    /// and the parcel has a positive area.
    pub fn is_selectable(&self) -> bool {
        !self.owner.is_empty()
            && !self.tenant.is_empty()
            && !self.parcel.is_empty()
            && self.area > Decimal::ZERO
    }
}

/// All the data rows of one year sheet along with any numeric cells that had to be coerced.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeaseSheet {
    records: Vec<LeaseRecord>,
    coercions: Vec<Coercion>,
}

impl LeaseSheet {
    /// Parses the rows of a sheet, including its header row, which is skipped.
    ///
    /// Rows whose cells are all empty are ignored. Any other row with fewer than `COLUMN_COUNT`
    /// cells fails the whole sheet with `ErrorType::MalformedRow`.
    pub fn parse(rows: &[Vec<Cell>]) -> Result<Self> {
        let mut records = Vec::new();
        let mut coercions = Vec::new();

        for (ix, cells) in rows.iter().enumerate().skip(1) {
            let row = ix + 1;
            if cells.iter().all(Cell::is_empty) {
                continue;
            }
            if cells.len() < COLUMN_COUNT {
                return Err(Error::msg(
                    ErrorType::MalformedRow,
                    format!(
                        "Row {row} has {} columns but {COLUMN_COUNT} are expected",
                        cells.len()
                    ),
                ));
            }
            records.push(parse_record(row, cells, &mut coercions));
        }

        for coercion in &coercions {
            warn!("{coercion}");
        }

        Ok(Self { records, coercions })
    }

    pub fn records(&self) -> &[LeaseRecord] {
        &self.records
    }

    pub fn coercions(&self) -> &[Coercion] {
        &self.coercions
    }

    /// The first record for the owner and tenant pair.
    pub fn find(&self, owner: &str, tenant: &str) -> Option<&LeaseRecord> {
        self.records.iter().find(|r| r.matches(owner, tenant))
    }

    /// The first record for the owner, tenant and parcel.
    pub fn find_parcel(&self, owner: &str, tenant: &str, parcel: &str) -> Option<&LeaseRecord> {
        self.records
            .iter()
            .find(|r| r.matches_parcel(owner, tenant, parcel))
    }
}

fn parse_record(row: usize, cells: &[Cell], coercions: &mut Vec<Coercion>) -> LeaseRecord {
    let text = |column: Column| cells[column.index()].text();
    let mut number = |column: Column| -> Option<Decimal> {
        match &cells[column.index()] {
            Cell::Empty => None,
            Cell::Number(d) => Some(*d),
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => match parse_number(s) {
                Some(d) => Some(d),
                None => {
                    coercions.push(Coercion {
                        row,
                        column,
                        raw: s.clone(),
                    });
                    Some(Decimal::ZERO)
                }
            },
        }
    };

    let area = number(Column::Area).unwrap_or_default();
    let quantity = number(Column::Quantity).unwrap_or_default();
    let reference_price = number(Column::ReferencePrice).unwrap_or_default();
    let adjustment_index = number(Column::AdjustmentIndex)
        .filter(|d| !d.is_zero())
        .unwrap_or(Decimal::ONE);
    let adjusted_price = number(Column::AdjustedPrice).unwrap_or_default();
    let tax_rate = number(Column::TaxRate).unwrap_or_default();

    LeaseRecord {
        row,
        owner: text(Column::Owner),
        owner_address: text(Column::OwnerAddress),
        owner_city: text(Column::OwnerCity),
        parcel: text(Column::Parcel),
        tenant: text(Column::Tenant),
        tenant_address: text(Column::TenantAddress),
        tenant_city: text(Column::TenantCity),
        area,
        quantity,
        reference_price,
        adjustment_index,
        adjusted_price,
        tax_rate,
    }
}
