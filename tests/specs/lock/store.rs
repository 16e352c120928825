//! Store-backed lock specs without a server

use crate::prelude::*;

fn with_fast_timeout(temp: &Project) -> String {
    temp.file("slock.toml", "[store]\ntimeout = \"1s\"\n")
        .display()
        .to_string()
}

#[test]
fn fifo_run_with_unreachable_server_fails_without_running() {
    let temp = Project::empty();
    let config = with_fast_timeout(&temp);

    temp.slock()
        .args(&[
            "--config", &config, "--server", DEAD_SERVER, "run", "--lock", "fifo", "--session",
            "abc", "--", "touch", "ran",
        ])
        .fails()
        .stderr_has("acquiring fifo lock for session abc")
        .stderr_has("unreachable");

    assert!(!temp.path().join("ran").exists());
}

#[test]
fn semaphore_run_with_unreachable_server_fails() {
    let temp = Project::empty();
    let config = with_fast_timeout(&temp);

    temp.slock()
        .args(&[
            "--config", &config, "--server", DEAD_SERVER, "run", "--lock", "semaphore",
            "--session", "abc", "--", "true",
        ])
        .fails()
        .stderr_has("acquiring semaphore lock");
}

#[test]
fn inspect_with_unreachable_server_fails() {
    let temp = Project::empty();
    let config = with_fast_timeout(&temp);

    temp.slock()
        .args(&[
            "--config", &config, "--server", DEAD_SERVER, "inspect", "--lock", "fifo", "--session",
            "abc",
        ])
        .fails()
        .stderr_has("reading fifo_queue_abc")
        .stdout_lacks("absent");
}

#[test]
fn destroy_with_unreachable_server_fails() {
    let temp = Project::empty();
    let config = with_fast_timeout(&temp);

    temp.slock()
        .args(&[
            "--config", &config, "--server", DEAD_SERVER, "destroy", "--lock", "semaphore",
            "--session", "abc",
        ])
        .fails()
        .stderr_has("destroying semaphore lock");
}
