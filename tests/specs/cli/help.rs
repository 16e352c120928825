//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let temp = Project::empty();

    temp.slock()
        .args(&["--help"])
        .passes()
        .stdout_has("run")
        .stdout_has("destroy")
        .stdout_has("inspect");
}

#[test]
fn run_help_lists_lock_options() {
    let temp = Project::empty();

    temp.slock()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--lock")
        .stdout_has("--session")
        .stdout_has("--stale-after")
        .stdout_has("--permits")
        .stdout_has("fifo")
        .stdout_has("semaphore");
}

#[test]
fn version_is_printed() {
    let temp = Project::empty();

    temp.slock()
        .args(&["--version"])
        .passes()
        .stdout_has("slock");
}
