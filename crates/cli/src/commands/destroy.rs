// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `slock destroy` - Remove all lock state for a session

use super::{build_lock, LockArgs};
use anyhow::{Context, Result};
use clap::Args;
use slock_core::Config;

#[derive(Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub target: LockArgs,
}

pub async fn destroy(args: DestroyArgs, mut config: Config) -> Result<()> {
    args.target.apply(&mut config);
    let lock = build_lock(args.target.lock, &config)?;

    lock.destroy(&args.target.session).await.with_context(|| {
        format!(
            "destroying {} lock for session {}",
            args.target.lock, args.target.session
        )
    })?;

    println!(
        "Destroyed {} lock for session {}",
        args.target.lock, args.target.session
    );
    Ok(())
}
