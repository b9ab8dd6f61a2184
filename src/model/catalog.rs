use crate::model::LeaseSheet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A parcel offered for selection, with the tenant of its row and its area in hectares. An owner
/// may lease the same parcel id to several tenants, each row with its own area.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    pub tenant: String,
    pub area: Decimal,
}

/// What a year sheet offers for selection: the distinct owners and tenants, and the parcels of
/// each owner in the order they appear in the sheet.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    owners: BTreeSet<String>,
    tenants: BTreeSet<String>,
    parcels: BTreeMap<String, Vec<Parcel>>,
}

impl Catalog {
    /// Collects the selectable rows of `sheet`. Rows missing an owner, a tenant or a parcel id, or
    /// without a positive area, are skipped.
    pub fn from_sheet(sheet: &LeaseSheet) -> Self {
        let mut catalog = Catalog::default();
        for record in sheet.records().iter().filter(|r| r.is_selectable()) {
            catalog.owners.insert(record.owner.clone());
            catalog.tenants.insert(record.tenant.clone());
            catalog
                .parcels
                .entry(record.owner.clone())
                .or_default()
                .push(Parcel {
                    id: record.parcel.clone(),
                    tenant: record.tenant.clone(),
                    area: record.area,
                });
        }
        catalog
    }

    pub fn owners(&self) -> &BTreeSet<String> {
        &self.owners
    }

    pub fn tenants(&self) -> &BTreeSet<String> {
        &self.tenants
    }

    /// The parcels of `owner`, empty when the owner is unknown.
    pub fn parcels(&self, owner: &str) -> &[Parcel] {
        self.parcels.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_parcels(&self) -> &BTreeMap<String, Vec<Parcel>> {
        &self.parcels
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.tenants.is_empty() && self.parcels.is_empty()
    }
}
