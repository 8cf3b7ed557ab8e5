//! CLI smoke tests for drvpipe.
//!
//! These tests verify that every command runs without panicking and returns
//! appropriate exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn drvpipe_cmd() -> Command {
  cargo_bin_cmd!("drvpipe")
}

/// Configuration whose only platform has an empty package set.
const MINIMAL_CONFIG: &str = r#"
return {
  platforms = { "x86_64-linux" },
  index = { path = "packages.json" },
  outputs = function(platform, pkgs)
    return {
      default = { name = "tool", completions = true },
      dev = { tools = {}, rust_src = false },
    }
  end,
}
"#;

const EMPTY_INDEX: &str = r#"{ "version": 1, "revision": "r1", "platforms": { "x86_64-linux": {} } }"#;

fn temp_project() -> TempDir {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("drvpipe.lua"), MINIMAL_CONFIG).unwrap();
  std::fs::write(temp.path().join("packages.json"), EMPTY_INDEX).unwrap();
  temp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  drvpipe_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  drvpipe_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("drvpipe"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "show", "develop", "verify", "info", "completions"] {
    drvpipe_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn unknown_platform_is_rejected_by_parser() {
  drvpipe_cmd()
    .args(["build", "--platform", "pdp11-unix"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown architecture 'pdp11'"));
}

#[test]
fn platform_and_all_conflict() {
  drvpipe_cmd()
    .args(["show", "--all", "--platform", "x86_64-linux"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be used with"));
}

// =============================================================================
// completions
// =============================================================================

#[test]
fn completions_subcommand_prints_script() {
  drvpipe_cmd()
    .args(["completions", "bash"])
    .assert()
    .success()
    .stdout(predicate::str::contains("_drvpipe()"));
}

#[test]
fn complete_env_prints_script_and_exits() {
  drvpipe_cmd()
    .env("COMPLETE", "zsh")
    .arg("build")
    .assert()
    .success()
    .stdout(predicate::str::contains("#compdef drvpipe"));
}

#[test]
fn complete_env_with_unknown_shell_is_ignored() {
  drvpipe_cmd()
    .env("COMPLETE", "tcsh")
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("drvpipe"));
}

// =============================================================================
// info / verify
// =============================================================================

#[test]
#[serial]
fn info_reports_store() {
  let temp = TempDir::new().unwrap();
  let store = temp.path().join("store");

  drvpipe_cmd()
    .arg("info")
    .env("DRVPIPE_STORE", &store)
    .assert()
    .success()
    .stdout(predicate::str::contains(store.display().to_string()))
    .stdout(predicate::str::contains("Published outputs: 0"));
}

#[test]
#[serial]
fn verify_with_empty_store() {
  let temp = TempDir::new().unwrap();

  drvpipe_cmd()
    .arg("verify")
    .env("DRVPIPE_STORE", temp.path().join("store"))
    .assert()
    .success()
    .stdout(predicate::str::contains("No published outputs"));
}

#[test]
#[serial]
fn verify_unknown_hash_is_incomplete() {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir_all(temp.path().join("store/build/0123456789abcdef0123")).unwrap();

  drvpipe_cmd()
    .args(["verify", "0123456789abcdef0123"])
    .env("DRVPIPE_STORE", temp.path().join("store"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("incomplete"));
}

// =============================================================================
// show
// =============================================================================

#[test]
fn show_evaluates_without_building() {
  let temp = temp_project();

  drvpipe_cmd()
    .arg("show")
    .arg(temp.path().join("drvpipe.lua"))
    .args(["--platform", "x86_64-linux"])
    .env("DRVPIPE_STORE", temp.path().join("store"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Index revision: r1"))
    .stdout(predicate::str::contains("tool (x86_64-linux)"))
    .stdout(predicate::str::contains("cargo build --release"))
    .stdout(predicate::str::contains("COMPLETE=<bash|fish|zsh>"));

  assert!(!temp.path().join("store").exists());
}

#[test]
fn show_unlisted_platform_fails() {
  let temp = temp_project();

  drvpipe_cmd()
    .arg("show")
    .arg(temp.path().join("drvpipe.lua"))
    .args(["--platform", "aarch64-darwin"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("aarch64-darwin is not listed"));
}

#[test]
fn show_nonexistent_config_fails() {
  drvpipe_cmd()
    .args(["show", "/nonexistent/path/drvpipe.lua"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("configuration not found"));
}

#[test]
fn build_nonexistent_config_fails() {
  drvpipe_cmd()
    .args(["build", "/nonexistent/path/drvpipe.lua"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load configuration"));
}
