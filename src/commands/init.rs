use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;
use tracing::warn;

/// Creates the home directory, its `tableau` and `factures` folders and an initial `config.json`.
///
/// # Arguments
/// - `fermage_home` - The directory that will be the root of the home directory
/// - `workbook` - An existing lease workbook, copied to `tableau/tableau_fermage.xlsx`
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(fermage_home: &Path, workbook: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(fermage_home, workbook).await?;
    if !config.workbook_path().is_file() {
        warn!(
            "There is no workbook yet, place it at {} or change 'workbook_path' in {}",
            config.workbook_path().display(),
            config.config_path().display()
        );
    }
    Ok(format!(
        "Successfully created the fermage directory and config in {}",
        config.root().display()
    )
    .into())
}
