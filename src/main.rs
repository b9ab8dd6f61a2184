use clap::Parser;
use fermage::args::{Args, Command};
use fermage::commands::{self, App};
use fermage::model::Invoice;
use fermage::{Mode, Result};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().fermage_home().path();

    // This allows for running the program without a workbook file. When FERMAGE_IN_TEST_MODE is
    // set and non-zero in length, then the mode will be Mode::Test, otherwise it will be
    // Mode::Xlsx.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.workbook()).await?.print(),

        Command::Years => {
            let app = App::load(home, mode).await?;
            commands::years(&app).await?.print()
        }

        Command::Owners(year_args) => {
            let app = App::load(home, mode).await?;
            commands::owners(&app, year_args).await?.print()
        }

        Command::Parcels(parcels_args) => {
            let app = App::load(home, mode).await?;
            commands::parcels(&app, parcels_args).await?.print()
        }

        Command::Preview(invoice_args) => {
            let app = App::load(home, mode).await?;
            commands::preview(&app, invoice_args).await?.print()
        }

        Command::Generate(generate_args) => {
            let app = App::load(home, mode).await?;
            commands::generate(&app, generate_args, confirm_on_stdin)
                .await?
                .print()
        }

        Command::Open(open_args) => {
            let app = App::load(home, mode).await?;
            commands::open(&app, open_args).await?.print()
        }
    };
    Ok(())
}

/// Shows the preview on stdout and asks whether the PDF should be written. Anything other than a
/// yes, including a read error, cancels.
fn confirm_on_stdin(invoice: &Invoice) -> bool {
    println!("{invoice}");
    println!();
    print!("Générer la facture PDF ? [o/N] ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut answer) {
        error!("Unable to read the answer: {e}");
        return false;
    }
    matches!(
        answer.trim().to_lowercase().as_str(),
        "o" | "oui" | "y" | "yes"
    )
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
