use clap::Parser;
use configuration::{load_settings, telemetry::init_tracing, CliOverrides};
use std::path::PathBuf;

/// Aggregates stock prices from an upstream price-history provider: windowed
/// averages for one ticker and Pearson correlation for a pair.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults to `config.toml` if present.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CliOverrides,
}

/// The main entry point for the stock aggregation service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets such as STOCKAGG__UPSTREAM__TOKEN may live in a .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    cli.overrides.apply(&mut settings);
    settings.validate()?;

    // Held until exit so buffered file logs are flushed.
    let _log_guard = init_tracing(&settings.logging)?;
    tracing::info!(settings = ?settings, "Configuration loaded.");

    web_server::run_server(&settings).await
}
