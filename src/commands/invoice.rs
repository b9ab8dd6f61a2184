use crate::args::{GenerateArgs, InvoiceArgs};
use crate::calculator::invoice_from_sheet;
use crate::commands::{App, Out};
use crate::error::{ErrorType, IntoResult};
use crate::loader::load_sheet;
use crate::model::{Catalog, Invoice, Selection};
use crate::render::render_pdf;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// What `generate` wrote.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    pub path: PathBuf,
    pub invoice: Invoice,
}

/// Computes the invoice described by `args`. The message is the text preview.
pub async fn preview(app: &App, args: &InvoiceArgs) -> Result<Out<Invoice>> {
    let invoice = compute(app, args).await?;
    Ok(Out::new(invoice.to_string(), invoice))
}

/// Computes the invoice described by `args`, asks `confirm` whether to go on unless `--yes` was
/// given, writes the PDF through the store and opens the invoices folder unless `--no-open` was
/// given.
pub async fn generate<F>(app: &App, args: &GenerateArgs, confirm: F) -> Result<Out<Generated>>
where
    F: FnOnce(&Invoice) -> bool,
{
    let invoice = compute(app, args.invoice()).await?;
    if !args.yes() && !confirm(&invoice) {
        return Ok("Invoice generation cancelled".into());
    }

    let fonts_dir = app.config().fonts_dir();
    let for_render = invoice.clone();
    let pdf = tokio::task::spawn_blocking(move || render_pdf(&for_render, fonts_dir.as_deref()))
        .await
        .context("The PDF rendering task failed")
        .pub_result(ErrorType::Render)??;
    debug!("Rendered {} bytes", pdf.len());

    let path = app
        .store()
        .save(&invoice.file_name(), &pdf)
        .await
        .context("Unable to save the invoice")
        .pub_result(ErrorType::Io)?;

    if !args.no_open() {
        let folder = app.config().invoices_dir();
        if let Err(e) = app.desktop().open_folder(&folder).await {
            warn!("The invoice was written but the folder could not be opened: {e:#}");
        }
    }

    let message = format!("The invoice has been generated: {}", path.display());
    Ok(Out::new(message, Generated { path, invoice }))
}

/// Reads the year sheet once, builds the selection from its catalog and computes the invoice.
async fn compute(app: &App, args: &InvoiceArgs) -> Result<Invoice> {
    let sheet = load_sheet(app.workbook(), args.year()).await?;
    let catalog = Catalog::from_sheet(&sheet);
    let selection = Selection::from_catalog(
        &catalog,
        args.year(),
        args.owner(),
        args.tenant(),
        args.parcels(),
    )?;
    invoice_from_sheet(&sheet, &selection, app.today())
}
