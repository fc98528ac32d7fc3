//! Trek CLI - sign in to and browse the Teeny Tech Trek API

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "trek")]
#[command(about = "Teeny Tech Trek API client")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true, env = "TREK_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL, overriding the configuration
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Set logging level
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Timeout for one-shot commands in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(
        cli.config.as_deref(),
        config::Overrides {
            api_url: cli.api_url,
            log_level: cli.log_level.map(|l| l.directive().to_string()),
        },
    )?;
    trek_core::logging::init_tracing(&config.logging)?;

    debug!(api = %config.api.base_url, "Starting Trek CLI");

    // `watch` runs until the session ends
    let bounded = cli.timeout > 0 && !matches!(cli.command, Commands::Watch { .. });
    let run = cli.command.execute(config);

    let result = if bounded {
        match tokio::time::timeout(Duration::from_secs(cli.timeout), run).await {
            Ok(result) => result,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    } else {
        run.await
    };

    if let Err(e) = result {
        error!("Command failed: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
