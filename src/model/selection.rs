use crate::error::{Error, ErrorType};
use crate::model::Catalog;
use crate::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A parcel chosen for invoicing, with the area that will be billed.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParcelSelection {
    pub parcel: String,
    pub area: Decimal,
}

impl ParcelSelection {
    pub fn new(parcel: impl Into<String>, area: Decimal) -> Self {
        Self {
            parcel: parcel.into(),
            area,
        }
    }
}

/// Everything the user picked for one invoice. It is built once per action and handed to the
/// calculator; nothing else holds on to it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    year: String,
    owner: String,
    tenant: String,
    parcels: Vec<ParcelSelection>,
}

impl Selection {
    /// Creates a selection. Fails with `ErrorType::Selection` if the year, owner or tenant is
    /// blank, or if no parcel is selected.
    pub fn new(
        year: impl Into<String>,
        owner: impl Into<String>,
        tenant: impl Into<String>,
        parcels: Vec<ParcelSelection>,
    ) -> Result<Self> {
        let selection = Self {
            year: year.into().trim().to_string(),
            owner: owner.into().trim().to_string(),
            tenant: tenant.into().trim().to_string(),
            parcels,
        };
        if selection.year.is_empty() || selection.owner.is_empty() || selection.tenant.is_empty()
        {
            return Err(Error::msg(
                ErrorType::Selection,
                "A year, an owner and a tenant must be selected",
            ));
        }
        if selection.parcels.is_empty() {
            return Err(Error::msg(
                ErrorType::Selection,
                "At least one parcel must be selected",
            ));
        }
        Ok(selection)
    }

    /// Creates a selection by picking parcels of `owner` from `catalog` by id. The parcels keep the
    /// catalog order. The area of a parcel comes from its row for `tenant`, or from its first row
    /// when the tenant has none, in which case the calculator leaves it out. An id that the
    /// catalog does not list for the owner is an error; an id given twice is selected once.
    pub fn from_catalog<S: AsRef<str>>(
        catalog: &Catalog,
        year: impl Into<String>,
        owner: &str,
        tenant: &str,
        parcel_ids: &[S],
    ) -> Result<Self> {
        let available = catalog.parcels(owner);
        if let Some(unknown) = parcel_ids
            .iter()
            .map(AsRef::as_ref)
            .find(|id| !available.iter().any(|p| p.id == *id))
        {
            return Err(Error::msg(
                ErrorType::Selection,
                format!("Parcel '{unknown}' is not listed for owner '{owner}'"),
            ));
        }

        let tenant = tenant.trim();
        let mut parcels: Vec<ParcelSelection> = Vec::new();
        for parcel in available {
            let wanted = parcel_ids.iter().any(|id| id.as_ref() == parcel.id);
            let seen = parcels.iter().any(|p| p.parcel == parcel.id);
            if !wanted || seen {
                continue;
            }
            let leased = available
                .iter()
                .find(|p| p.id == parcel.id && p.tenant == tenant)
                .unwrap_or(parcel);
            parcels.push(ParcelSelection::new(leased.id.clone(), leased.area));
        }

        Self::new(year, owner, tenant, parcels)
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

    pub fn parcels(&self) -> &[ParcelSelection] {
        &self.parcels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, LeaseSheet};
    use std::str::FromStr;

    fn catalog() -> Catalog {
        let rows: Vec<Vec<Cell>> = [
            ["ID", "", "", "", "", "", "", "", "", "", "", "", "", ""],
            ["", "Dupont", "", "", "P1", "Martin", "", "", "2.5", "", "", "", "", ""],
            ["", "Dupont", "", "", "P2", "Martin", "", "", "4", "", "", "", "", ""],
            ["", "Dupont", "", "", "P3", "Martin", "", "", "1", "", "", "", "", ""],
        ]
        .iter()
        .map(|r| r.iter().map(Cell::parse).collect())
        .collect();
        Catalog::from_sheet(&LeaseSheet::parse(&rows).unwrap())
    }

    #[test]
    fn test_from_catalog_uses_catalog_order_and_areas() {
        let s = Selection::from_catalog(&catalog(), "2025", "Dupont", "Martin", &["P3", "P1", "P3"])
            .unwrap();
        assert_eq!(
            s.parcels(),
            &[
                ParcelSelection::new("P1", Decimal::from_str("2.5").unwrap()),
                ParcelSelection::new("P3", Decimal::ONE),
            ]
        );
        assert_eq!(s.year(), "2025");
    }

    #[test]
    fn test_from_catalog_takes_the_area_of_the_tenant_row() {
        let rows: Vec<Vec<Cell>> = [
            ["ID", "", "", "", "", "", "", "", "", "", "", "", "", ""],
            ["", "A", "", "", "P1", "X", "", "", "5", "", "", "", "", ""],
            ["", "A", "", "", "P2", "X", "", "", "3", "", "", "", "", ""],
            ["", "A", "", "", "P1", "B", "", "", "2", "", "", "", "", ""],
        ]
        .iter()
        .map(|r| r.iter().map(Cell::parse).collect())
        .collect();
        let catalog = Catalog::from_sheet(&LeaseSheet::parse(&rows).unwrap());

        let s = Selection::from_catalog(&catalog, "2025", "A", "B", &["P1"]).unwrap();
        assert_eq!(s.parcels(), &[ParcelSelection::new("P1", Decimal::from(2))]);

        let s = Selection::from_catalog(&catalog, "2025", "A", "X", &["P1"]).unwrap();
        assert_eq!(s.parcels(), &[ParcelSelection::new("P1", Decimal::from(5))]);

        // B has no row for P2, the first row is used and the calculator omits it.
        let s = Selection::from_catalog(&catalog, "2025", "A", "B", &["P2", "P1"]).unwrap();
        assert_eq!(
            s.parcels(),
            &[
                ParcelSelection::new("P1", Decimal::from(2)),
                ParcelSelection::new("P2", Decimal::from(3)),
            ]
        );
    }

    #[test]
    fn test_from_catalog_unknown_parcel() {
        let err = Selection::from_catalog(&catalog(), "2025", "Dupont", "Martin", &["P9"])
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Selection);
        assert!(err.to_string().contains("P9"));
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let err = Selection::from_catalog::<&str>(&catalog(), "2025", "Dupont", "Martin", &[])
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Selection);

        let err = Selection::new(
            "2025",
            " ",
            "Martin",
            vec![ParcelSelection::new("P1", Decimal::ONE)],
        )
        .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Selection);
    }
}
