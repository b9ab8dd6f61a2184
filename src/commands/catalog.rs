use crate::args::{ParcelsArgs, YearArgs};
use crate::commands::{App, Out};
use crate::error::ErrorType;
use crate::loader::{list_years, load_catalog};
use crate::model::{as_given, Catalog, Parcel};
use crate::Result;
use std::fmt::Write;
use tracing::error;

/// Lists the sheets of the workbook.
pub async fn years(app: &App) -> Result<Out<Vec<String>>> {
    let years = list_years(app.workbook()).await?;
    if years.is_empty() {
        return Ok(Out::new("The workbook has no sheets", years));
    }
    Ok(Out::new(format!("Years: {}", years.join(", ")), years))
}

/// Lists the owners, the tenants and the parcels of each owner for one year.
///
/// A year without a sheet is reported and yields an empty catalog rather than an error, so that
/// picking a year that has not been filled in yet does not stop the user.
pub async fn owners(app: &App, args: &YearArgs) -> Result<Out<Catalog>> {
    let year = args.year();
    let catalog = match load_catalog(app.workbook(), year).await {
        Ok(catalog) => catalog,
        Err(e) if e.error_type() == ErrorType::MissingSheet => {
            error!("Error while loading {year}: {e}");
            return Ok(Out::new(
                format!("No data for {year}"),
                Catalog::default(),
            ));
        }
        Err(e) => return Err(e),
    };

    if catalog.is_empty() {
        return Ok(Out::new(format!("No owner has parcels in {year}"), catalog));
    }

    let mut message = String::new();
    let owners: Vec<&str> = catalog.owners().iter().map(String::as_str).collect();
    let tenants: Vec<&str> = catalog.tenants().iter().map(String::as_str).collect();
    // Writing to a String cannot fail.
    let _ = writeln!(message, "Owners: {}", owners.join(", "));
    let _ = writeln!(message, "Tenants: {}", tenants.join(", "));
    for (owner, parcels) in catalog.all_parcels() {
        let _ = write!(message, "\n{owner}: {}", describe(parcels));
    }
    Ok(Out::new(message.trim_end(), catalog))
}

/// Lists the parcels of one owner for one year.
pub async fn parcels(app: &App, args: &ParcelsArgs) -> Result<Out<Vec<Parcel>>> {
    let catalog = load_catalog(app.workbook(), args.year()).await?;
    let parcels = catalog.parcels(args.owner()).to_vec();
    if parcels.is_empty() {
        return Ok(Out::new(
            format!("{} has no parcels in {}", args.owner(), args.year()),
            parcels,
        ));
    }
    Ok(Out::new(
        format!("Parcels of {}: {}", args.owner(), describe(&parcels)),
        parcels,
    ))
}

fn describe(parcels: &[Parcel]) -> String {
    parcels
        .iter()
        .map(|p| format!("{} ({} ha)", p.id, as_given(p.area)))
        .collect::<Vec<_>>()
        .join(", ")
}
