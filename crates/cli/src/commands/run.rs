// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `slock run -- <cmd> [args]` - Run a command while holding a session lock

use super::{build_lock, LockArgs};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use slock_core::{Config, SessionLock};
use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: LockArgs,

    /// Evict a FIFO queue head that stays unchanged this long (e.g. "30s")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub stale_after: Option<Duration>,

    /// Permits for a semaphore created by this run (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub permits: Option<u32>,

    /// Command to run, after `--`
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        self.target.apply(config);
        if let Some(stale_after) = self.stale_after {
            config.fifo.stale_after = stale_after;
        }
        if let Some(permits) = self.permits {
            config.semaphore.permits = permits;
        }
    }
}

/// Exit code after Ctrl-C interrupted the wait for the lock
pub const INTERRUPTED: u8 = 130;

pub async fn run(args: RunArgs, mut config: Config) -> Result<u8> {
    args.apply(&mut config);
    let lock = build_lock(args.target.lock, &config)?;
    run_locked(lock, &args, tokio::signal::ctrl_c()).await
}

/// Wait for the lock unless `interrupt` fires first, then run the command.
/// An interrupted wait withdraws from the lock before returning.
async fn run_locked(
    mut lock: Box<dyn SessionLock>,
    args: &RunArgs,
    interrupt: impl Future<Output = io::Result<()>>,
) -> Result<u8> {
    let kind = args.target.lock;
    let session = &args.target.session;

    let acquired = tokio::select! {
        result = lock.acquire(session) => Some(result),
        _ = interrupt => None,
    };
    match acquired {
        Some(result) => {
            result.with_context(|| format!("acquiring {kind} lock for session {session}"))?
        }
        None => {
            tracing::warn!(%kind, session = %session, "interrupted while waiting for lock");
            lock.leave()
                .await
                .with_context(|| format!("leaving {kind} lock for session {session}"))?;
            return Ok(INTERRUPTED);
        }
    }

    // Release even when the command could not be started
    let status = run_child(&args.command).await;
    let released = lock.release().await;

    let status = status?;
    released.with_context(|| format!("releasing {kind} lock for session {session}"))?;

    tracing::debug!(?status, "command finished");
    Ok(exit_code(status))
}

/// Run with inherited stdio. Ctrl-C stops the child instead of this process.
async fn run_child(command: &[String]) -> Result<ExitStatus> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| anyhow!("no command given"))?;

    let mut child = Command::new(program)
        .args(rest)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("starting {program}"))?;

    tokio::select! {
        status = child.wait() => Ok(status?),
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!(program = %program, "interrupted, stopping command");
            child.kill().await?;
            Ok(child.wait().await?)
        }
    }
}

/// The child's exit code, or 128 + signal number when it was killed
fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }
    1
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
