// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! slock - run commands under a session lock

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{destroy, inspect, run};
use slock_core::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "slock",
    version,
    about = "Session locks over a shared memcached store"
)]
struct Cli {
    /// Config file [default: <config dir>/slock/config.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Memcached server as host:port, overriding the config file
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command while holding a session lock
    Run(run::RunArgs),
    /// Remove all lock state for a session
    Destroy(destroy::DestroyArgs),
    /// Show the current lock state for a session
    Inspect(inspect::InspectArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.store.addr = server;
    }

    match cli.command {
        Commands::Run(args) => run::run(args, config).await.map(ExitCode::from),
        Commands::Destroy(args) => {
            destroy::destroy(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect(args) => {
            inspect::inspect(args, config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Log to stderr, filtered by `SLOCK_LOG` (default: warn)
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("SLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// An explicit `--config` must exist; the default location is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::load(path)?);
    }
    match dirs::config_dir() {
        Some(dir) => Ok(Config::load_or_default(&dir.join("slock").join("config.toml"))?),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
