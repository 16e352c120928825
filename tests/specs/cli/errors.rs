//! Argument error specs

use crate::prelude::*;

#[test]
fn missing_subcommand_fails() {
    let temp = Project::empty();

    temp.slock().fails().stderr_has("Usage");
}

#[test]
fn unknown_lock_kind_fails() {
    let temp = Project::empty();

    temp.slock()
        .args(&["run", "--lock", "redis", "--session", "a", "--", "true"])
        .fails()
        .stderr_has("invalid value");
}

#[test]
fn run_without_command_fails() {
    let temp = Project::empty();

    temp.slock()
        .args(&["run", "--lock", "file", "--session", "a"])
        .fails();
}

#[test]
fn bad_duration_fails() {
    let temp = Project::empty();

    temp.slock()
        .args(&[
            "run",
            "--lock",
            "fifo",
            "--session",
            "a",
            "--stale-after",
            "soon",
            "--",
            "true",
        ])
        .fails()
        .stderr_has("--stale-after");
}

#[test]
fn inspect_does_not_accept_file_locks() {
    let temp = Project::empty();

    temp.slock()
        .args(&["inspect", "--lock", "file", "--session", "a"])
        .fails()
        .stderr_has("invalid value");
}

#[test]
fn zero_permits_are_rejected() {
    let temp = Project::empty();

    temp.slock()
        .args(&[
            "run",
            "--lock",
            "semaphore",
            "--session",
            "a",
            "--permits",
            "0",
            "--",
            "true",
        ])
        .fails()
        .stderr_has("--permits");
}
