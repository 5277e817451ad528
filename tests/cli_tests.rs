//! CLI integration tests
//!
//! These drive the compiled binary with assert_cmd. Network- and
//! device-touching paths are avoided; config isolation goes through
//! XDG_CONFIG_HOME.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("vivavoce").unwrap();
    cmd.env_remove("GEMINI_API_KEY")
        .env_remove("VIVAVOCE_PASSWORD");
    cmd
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("scenarios"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_prints() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vivavoce"));
}

#[test]
fn scenarios_lists_catalog() {
    cmd()
        .arg("scenarios")
        .assert()
        .success()
        .stdout(predicate::str::contains("free-chat"))
        .stdout(predicate::str::contains("screen-coach"))
        .stdout(predicate::str::contains("show-and-tell"));
}

#[test]
fn chat_without_api_key_fails() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["chat", "Hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing API key"));
}

#[test]
fn live_with_unknown_scenario_is_usage_error() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("GEMINI_API_KEY", "dummy-key")
        .args(["--scenario", "does-not-exist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown scenario"));
}

#[test]
fn transcribe_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "not audio").unwrap();

    cmd()
        .arg("transcribe")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported audio file type"));
}

#[test]
fn login_without_email_or_guest_is_usage_error() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("GEMINI_API_KEY", "dummy-key")
        .arg("login")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--email"));
}

#[test]
fn login_guest_needs_no_network() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("GEMINI_API_KEY", "dummy-key")
        .args(["login", "--guest"])
        .assert()
        .success()
        .stderr(predicate::str::contains("guest@vivavoce.local"));
}

#[test]
fn config_path_points_into_vivavoce() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vivavoce"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_set_then_get_round_trips() {
    let config_home = tempfile::tempdir().unwrap();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "set", "tier", "thinker"])
        .assert()
        .success();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "get", "tier"])
        .assert()
        .success()
        .stdout(predicate::str::contains("thinker"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let config_home = tempfile::tempdir().unwrap();
    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "set", "keystroke", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_get_masks_api_key() {
    let config_home = tempfile::tempdir().unwrap();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "set", "api_key", "abcdefghijklmnop"])
        .assert()
        .success();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "get", "api_key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("abcd...mnop"));
}

#[test]
fn config_init_twice_fails() {
    let config_home = tempfile::tempdir().unwrap();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "init"])
        .assert()
        .success();

    cmd()
        .env("XDG_CONFIG_HOME", config_home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
