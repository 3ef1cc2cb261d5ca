//! CardForge CLI - CSV to vCards with QR download codes
//!
//! Writes one card and one QR PNG per valid row, then the URL/QR report.
//! Returns non-zero on configuration or I/O failure.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardforge_core::{BatchPipeline, PartialSettings, Settings};

#[derive(Parser)]
#[command(name = "cardforge-cli")]
#[command(about = "CardForge CLI - Contact Card Compiler")]
struct Cli {
    /// Input CSV file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// CSV text given inline instead of a file
    #[arg(short, long = "string", value_name = "CSV")]
    string: Option<String>,

    /// Base URL of the server hosting the cards
    #[arg(short, long)]
    base_url: Option<String>,

    /// Directory that image file names are relative to
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Directory for generated cards and QR images
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path of the URL/QR report CSV
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Write a JSON run manifest here
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// JSON or YAML config file; flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> PartialSettings {
        PartialSettings {
            input: self.input.clone(),
            inline_csv: self.string.clone(),
            base_url: self.base_url.clone(),
            image_dir: self.image_dir.clone(),
            output_dir: self.output_dir.clone(),
            report: self.report.clone(),
            manifest: self.manifest.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = match Settings::resolve(cli.overrides(), cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = BatchPipeline::from_settings(&settings);

    match pipeline.run_source(&settings.input) {
        Ok(outcome) => {
            println!(
                "Output CSV has been saved to {} with {} URL and QR code entries ({} rows rejected)",
                settings.report.display(),
                outcome.results.len(),
                outcome.failures.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "batch aborted");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
