//! `roque` binary: parse, configure, run one command, print.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use roque_cli::cli::{run, Cli};
use roque_cli::config::AppConfig;
use roque_cli::output::to_json;
use roque_cli::{init_tracing, AppContext};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.log_filter);
    debug!(database = %config.database_path.display(), "Starting roque");

    let ctx = AppContext::open(config)
        .await
        .context("failed to open the database")?;

    let result = run(&ctx, cli.command, cli.json).await;
    ctx.db.close().await;

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            debug!(code = ?err.code, message = %err.message, "Command failed");
            if cli.json {
                println!("{}", to_json(&err).unwrap_or_else(|_| err.message.clone()));
            } else {
                eprintln!("error: {}", err.message);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
