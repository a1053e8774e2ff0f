mod bootstrap_helpers;
mod cli_args;
mod runtime_config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::bootstrap_helpers::{init_tracing, load_dotenv};
use crate::cli_args::Cli;
use crate::runtime_config::{build_runtime_config, load_settlement_users};

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = load_dotenv();
    init_tracing();
    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(error) => warn!(error = %error, "ignoring unreadable environment file"),
    }

    let cli = Cli::parse();
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    let users = load_settlement_users(&cli.settlement_users_file)?;
    if users.is_empty() {
        warn!(
            path = %cli.settlement_users_file.display(),
            "settlement users file lists no users; every settlement command will be refused"
        );
    }
    let config = build_runtime_config(&cli, users)?;
    info!(
        stress_channel = config.stress.channel_id.as_str(),
        settlement_channel = config.settlement.channel_id.as_str(),
        layout = config.stress.layout.name,
        "starting slack command bridge"
    );
    sift_slack_runtime::run_slack_command_bridge(config)
        .await
        .context("slack command bridge failed")
}

#[cfg(test)]
mod tests;
