use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Operate the SHELF books service.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
struct Cli {
    /// Directory holding `base.toml` and environment overlays
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Environment overlay to apply (local, staging, production)
    #[arg(long = "env", global = true, value_name = "NAME")]
    environment: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server until Ctrl-C
    Serve,
    /// Print the resolved settings as JSON
    Config,
    /// Print the merged OpenAPI document
    Openapi,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_with(cli.config_dir, cli.environment)
        .context("failed to load SHELF settings")?;

    match cli.command {
        Command::Serve => serve(settings),
        Command::Config => print_json(&serde_json::to_value(&settings)?),
        Command::Openapi => {
            let registry = shelf_app::registry(&settings);
            print_json(&shelf_http::router::merged_openapi(&registry))
        }
    }
}

fn serve(settings: Settings) -> anyhow::Result<()> {
    shelf_telemetry::init(&settings.telemetry)?;
    tracing::info!(env = ?settings.environment, "shelf serve");

    tokio::runtime::Runtime::new()
        .context("failed to start tokio runtime")?
        .block_on(shelf_app::run(settings))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
