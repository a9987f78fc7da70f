//! Integration tests for the `headcount` CLI binary.
//!
//! Every test points `--config` and `--overrides` into a temp dir so the
//! user's real configuration is never read or written.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn headcount_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("headcount");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("HEADCOUNT_CONFIG")
        .env_remove("HEADCOUNT_OVERRIDES")
        .env_remove("HEADCOUNT_NEW_PASSWORD")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--overrides")
        .arg(dir.join("overrides.toml"));
    cmd
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

const TWO_CAMERAS: &str = r#"
[[cameras]]
name = "D4"
host = "10.0.0.4"
password = "hunter2"
logical_channel = 3

[[cameras]]
name = "D6"
host = "10.0.0.6"
password = "hunter2"
logical_channel = 5
"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = cargo_bin_cmd!("headcount").current_dir(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn help_lists_commands() {
    cargo_bin_cmd!("headcount")
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("summary"))
                .and(predicate::str::contains("config")),
        );
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn config_path_prints_both_files() {
    let dir = tempfile::tempdir().unwrap();
    headcount_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("config.toml").and(predicate::str::contains("overrides.toml")),
        );
}

#[test]
fn config_show_masks_passwords() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), TWO_CAMERAS);

    headcount_cmd(dir.path())
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********").and(predicate::str::contains("hunter2").not()));
}

#[test]
fn set_override_persists_and_shows_up() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), TWO_CAMERAS);

    headcount_cmd(dir.path())
        .args(["config", "set-override", "D4", "host", "10.9.9.9"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(dir.path().join("overrides.toml")).unwrap();
    assert!(saved.contains("10.9.9.9"), "overrides file:\n{saved}");

    let output = headcount_cmd(dir.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["overrides"]["cameras"]["D4"]["host"], "10.9.9.9");
}

#[test]
fn set_override_unknown_camera_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), TWO_CAMERAS);

    headcount_cmd(dir.path())
        .args(["config", "set-override", "D9", "host", "10.0.0.9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("D4, D6"));
}

#[test]
fn set_override_bad_port_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), TWO_CAMERAS);

    headcount_cmd(dir.path())
        .args(["config", "set-override", "D4", "port", "eighty"])
        .assert()
        .code(2);
}

#[test]
fn duplicate_channels_are_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        r#"
        [[cameras]]
        name = "A"
        host = "10.0.0.1"
        logical_channel = 1

        [[cameras]]
        name = "B"
        host = "10.0.0.2"
        logical_channel = 1
        "#,
    );

    headcount_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("logical_channel"));
}

// ── Runtime commands ────────────────────────────────────────────────

#[test]
fn run_without_password_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    write_config(
        dir.path(),
        r#"
        [[cameras]]
        name = "Lobby"
        host = "10.0.0.1"
        logical_channel = 1
        "#,
    );

    headcount_cmd(dir.path())
        .arg("run")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Lobby"));
}

#[tokio::test(flavor = "multi_thread")]
async fn summary_prints_camera_counters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/videoStatServer.cgi"))
        .and(query_param("action", "getSummary"))
        .and(query_param("name", "PC-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "summary.EnteredSubtotal.Today=12\nsummary.ExitedSubtotal.Today=5\n",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let addr = server.address();
    write_config(
        dir.path(),
        &format!(
            r#"
            [[cameras]]
            name = "D4"
            host = "{}"
            port = {}
            password = "pw"
            logical_channel = 3
            "#,
            addr.ip(),
            addr.port()
        ),
    );

    let output = headcount_cmd(dir.path())
        .args(["summary", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["camera"], "D4");
    assert_eq!(rows[0]["entered"], 12);
    assert_eq!(rows[0]["exited"], 5);
}

#[test]
fn summary_with_every_camera_down_exits_7() {
    let dir = tempfile::tempdir().unwrap();
    // Port 9 (discard) on loopback refuses connections.
    write_config(
        dir.path(),
        r#"
        request_timeout_secs = 2

        [[cameras]]
        name = "D4"
        host = "127.0.0.1"
        port = 9
        password = "pw"
        logical_channel = 3
        "#,
    );

    headcount_cmd(dir.path())
        .arg("summary")
        .assert()
        .code(7);
}
