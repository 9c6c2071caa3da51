//! CLI command integration tests.
//! Each test uses a temp directory via TURF_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn turf_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("turf").unwrap();
    cmd.env("TURF_DATA_DIR", data_dir.path());
    cmd
}

fn credential_line<'a>(stdout: &'a str, prefix: &str) -> &'a str {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("no `{prefix}` line in output:\n{stdout}"))
        .trim()
}

#[test]
fn stats_fresh_db() {
    let dir = TempDir::new().unwrap();
    turf_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("profiles:   0"))
        .stdout(predicate::str::contains("hotspots:   0"))
        .stdout(predicate::str::contains("positions:  0"))
        .stdout(predicate::str::contains("points:     0"));
}

#[test]
fn setup_prints_credentials_then_stats_counts_it() {
    let dir = TempDir::new().unwrap();

    let output = turf_cmd(&dir).arg("setup").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let token = credential_line(&stdout, "token:");
    let ssid = credential_line(&stdout, "ssid:");
    assert_eq!(token.len(), 32);
    assert!(ssid.starts_with("turf-"), "unexpected ssid: {ssid}");

    turf_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotspots:   1"));
}

#[test]
fn rotate_advances_ssid() {
    let dir = TempDir::new().unwrap();

    let output = turf_cmd(&dir).arg("setup").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let token = credential_line(&stdout, "token:").to_string();
    let old_ssid = credential_line(&stdout, "ssid:").to_string();

    let output = turf_cmd(&dir).args(["rotate", &token]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let new_ssid = credential_line(&stdout, "ssid:");
    assert_ne!(new_ssid, old_ssid);
    assert!(new_ssid.starts_with("turf-"));
}

#[test]
fn rotate_unknown_token_fails() {
    let dir = TempDir::new().unwrap();
    turf_cmd(&dir)
        .args(["rotate", "not-a-token"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no hotspot with that token"));
}

#[test]
fn db_flag_overrides_data_dir() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("elsewhere.db");

    turf_cmd(&dir)
        .args(["--db", db_path.to_str().unwrap(), "setup"])
        .assert()
        .success();

    assert!(db_path.exists(), "--db path should be created");
    // The default location under TURF_DATA_DIR stays empty.
    turf_cmd(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotspots:   0"));
}
