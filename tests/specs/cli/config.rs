//! Config file specs

use crate::prelude::*;

#[test]
fn explicit_missing_config_fails() {
    let temp = Project::empty();

    temp.slock()
        .args(&["--config", "nope.toml", "destroy", "--lock", "file", "--session", "a"])
        .fails()
        .stderr_has("nope.toml");
}

#[test]
fn invalid_config_fails() {
    let temp = Project::empty();
    temp.file("bad.toml", "[store]\ntimeout = \"eventually\"\n");

    temp.slock()
        .args(&["--config", "bad.toml", "destroy", "--lock", "file", "--session", "a"])
        .fails()
        .stderr_has("invalid config");
}

#[test]
fn default_config_location_is_used() {
    let temp = Project::empty();
    temp.file(".config/slock/config.toml", "[file]\ndir = \"/nonexistent/slock\"\n");

    temp.slock()
        .args(&["run", "--lock", "file", "--session", "a", "--", "true"])
        .fails()
        .stderr_has("/nonexistent/slock");
}

#[test]
fn file_dir_from_config() {
    let temp = Project::empty();
    let locks = temp.locks();
    temp.file(
        "slock.toml",
        &format!("[file]\ndir = {:?}\n", locks.display().to_string()),
    );

    temp.slock()
        .args(&["--config", "slock.toml", "run", "--lock", "file", "--session", "cfg", "--", "true"])
        .passes();

    assert!(locks.join("cfg").is_file());
}
