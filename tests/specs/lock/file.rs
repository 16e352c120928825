//! File lock specs

use crate::prelude::*;

fn run_args<'a>(dir: &'a str, session: &'a str, command: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["run", "--lock", "file", "--session", session, "--dir", dir, "--"];
    args.extend_from_slice(command);
    args
}

#[test]
fn run_executes_command_under_lock() {
    let temp = Project::empty();
    let locks = temp.locks();
    let dir = locks.to_str().unwrap();

    temp.slock()
        .args(&run_args(dir, "abc", &["sh", "-c", "echo locked > out.txt"]))
        .passes();

    assert_eq!(
        std::fs::read_to_string(temp.path().join("out.txt")).unwrap(),
        "locked\n"
    );
    assert!(locks.join("abc").is_file());
}

#[test]
fn run_passes_through_stdout() {
    let temp = Project::empty();
    let locks = temp.locks();

    temp.slock()
        .args(&run_args(locks.to_str().unwrap(), "abc", &["echo", "hello from child"]))
        .passes()
        .stdout_has("hello from child");
}

#[test]
fn run_exits_with_child_code() {
    let temp = Project::empty();
    let locks = temp.locks();

    temp.slock()
        .args(&run_args(locks.to_str().unwrap(), "abc", &["sh", "-c", "exit 7"]))
        .exits_with(7);
}

#[test]
fn lock_is_released_between_runs() {
    let temp = Project::empty();
    let locks = temp.locks();
    let dir = locks.to_str().unwrap();

    for _ in 0..2 {
        temp.slock().args(&run_args(dir, "abc", &["true"])).passes();
    }
}

#[test]
fn missing_command_program_fails_and_releases() {
    let temp = Project::empty();
    let locks = temp.locks();
    let dir = locks.to_str().unwrap();

    temp.slock()
        .args(&run_args(dir, "abc", &["slock-no-such-program"]))
        .fails()
        .stderr_has("slock-no-such-program");

    temp.slock().args(&run_args(dir, "abc", &["true"])).passes();
}

#[test]
fn missing_directory_is_rejected() {
    let temp = Project::empty();
    let missing = temp.path().join("missing");

    temp.slock()
        .args(&run_args(missing.to_str().unwrap(), "abc", &["true"]))
        .fails()
        .stderr_has("invalid lock directory");
}

#[test]
fn destroy_removes_lock_file_and_is_idempotent() {
    let temp = Project::empty();
    let locks = temp.locks();
    let dir = locks.to_str().unwrap();
    temp.slock().args(&run_args(dir, "abc", &["true"])).passes();

    for _ in 0..2 {
        temp.slock()
            .args(&["destroy", "--lock", "file", "--session", "abc", "--dir", dir])
            .passes()
            .stdout_has("Destroyed file lock for session abc");
    }
    assert!(!locks.join("abc").exists());
}

#[cfg(unix)]
#[test]
fn interrupt_while_waiting_exits_130_without_running() {
    let temp = Project::empty();
    let locks = temp.locks();
    let dir = locks.to_str().unwrap();

    let mut holder = temp.spawn(&run_args(dir, "abc", &["sleep", "10"]));
    holder.wait_for_log("acquired");

    let mut waiter = temp.spawn(&run_args(dir, "abc", &["touch", "ran"]));
    waiter.wait_for_log("lock file busy");
    std::thread::sleep(std::time::Duration::from_millis(100));
    waiter.interrupt();

    assert_eq!(waiter.wait().code(), Some(130));
    assert!(!temp.path().join("ran").exists());

    // Ctrl-C on the holder kills its command and releases the lock
    holder.interrupt();
    assert_eq!(holder.wait().code(), Some(128 + 9));
    temp.slock().args(&run_args(dir, "abc", &["true"])).passes();
}
