use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use promdeps_server::cli::{self, Cli, Command};
use promdeps_server::http::run_http_server;
use promdeps_server::logging::init_logging;
use promdeps_server::Configuration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        Configuration::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command.clone().unwrap_or_default() {
        Command::Serve => {
            info!(version = env!("CARGO_PKG_VERSION"), "starting promdeps");
            run_http_server(&config.server)
                .await
                .context("HTTP server failed")?;
        }
        Command::Extract { exprs, pretty } => {
            cli::run_extract(exprs, pretty, io::stdin().lock(), io::stdout().lock())
                .context("Failed to extract metric names")?;
        }
        Command::Config => {
            cli::run_show_config(&config, io::stdout().lock())
                .context("Failed to print configuration")?;
        }
    }

    Ok(())
}
