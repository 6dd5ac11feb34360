//! Binary-level tests: argument validation and exit-code mapping.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn missing_manifest_url_is_a_usage_error() {
    Command::cargo_bin("slipway")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_describes_the_exit_code_contract_inputs() {
    Command::cargo_bin("slipway")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("MANIFEST_URL"))
        .stdout(predicate::str::contains("INSTALL_ROOT"));
}

#[test]
fn verbose_and_quiet_are_mutually_exclusive() {
    Command::cargo_bin("slipway")
        .unwrap()
        .args(["https://example.invalid/manifest.json", "--verbose", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn unreachable_manifest_exits_with_code_one() {
    let dir = TempDir::new().unwrap();
    // Port 9 (discard) refuses connections immediately.
    Command::cargo_bin("slipway")
        .unwrap()
        .args(["http://127.0.0.1:9/manifest.json"])
        .arg(dir.path())
        .arg("--no-launch")
        .assert()
        .code(1);
}
