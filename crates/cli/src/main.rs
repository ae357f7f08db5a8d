//! `graphkit` - Microsoft Graph keywords on the command line
//!
//! Configuration comes from `GRAPHKIT_*` variables (a `.env` file is
//! honoured), a config file, or the credential flags. Results are printed
//! to stdout as JSON; logs go to stderr.

mod cli;
mod commands;
mod logging;
mod pending;

use std::io::Write;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use graphkit_domain::Config;
use graphkit_infra::{config, MsGraph};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::Cli;
use crate::logging::{init_cli_logger, log_command_execution};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_cli_logger(cli.verbose, cli.log_json);
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env file loaded"),
    }

    let mut settings = load_settings(&cli)?;
    cli.credentials.apply(&mut settings);

    let mut graph = MsGraph::new(settings).await.context("failed to initialise the MSGraph library")?;
    commands::ensure_configured(&mut graph).await.context("failed to configure the MSGraph client")?;

    let command_name = cli.command.name();
    let started = Instant::now();
    let result = commands::execute(cli.command, &mut graph).await;
    log_command_execution(command_name, started.elapsed(), result.as_ref().err());

    let output = result.with_context(|| format!("`{command_name}` failed"))?;
    emit(&output)?;

    info!(command = command_name, "done");
    Ok(())
}

/// Explicit `--config` file, else environment, else probed files, else
/// defaults. A source that exists but is invalid is an error.
fn load_settings(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(path) = &cli.config {
        return config::load_from_file(Some(path.clone()))
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    config::load_or_default().context("invalid configuration")
}

fn emit(value: &Value) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to write output")?;
    writeln!(stdout)?;
    Ok(())
}
