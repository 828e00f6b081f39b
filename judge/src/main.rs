//! Reviews SQL selection submissions against live databases.

#![warn(clippy::all, clippy::pedantic)]

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use sql_judge_common::config::JudgesConfig;
use sql_judge_common::pipeline::Judges;
use sql_judge_common::shutdown::install_shutdown_handler;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json", env = "JUDGE_CONFIG")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, env = "JUDGE_VERBOSE")]
    verbose: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

fn init_logging(config: &JudgesConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = JudgesConfig::load_from_file(&cli.config)
        .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;
    init_logging(&config, cli.verbose);

    if cli.check {
        info!("configuration in {} is valid", cli.config.display());
        return Ok(());
    }

    let token = CancellationToken::new();
    install_shutdown_handler(token.clone())?;

    let judges = Judges::new(token);
    judges.start(&config).await?;
    judges.wait().await;

    info!("all judges stopped");
    Ok(())
}
