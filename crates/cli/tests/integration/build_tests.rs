use predicates::prelude::*;

use super::common::{TestEnv, host, tool_output};

#[test]
fn build_publishes_host_output() {
  let env = TestEnv::new(&tool_output("completions = true"));

  env
    .drvpipe_cmd()
    .arg("build")
    .arg(&env.config_path)
    .assert()
    .success()
    .stdout(predicate::str::contains(host().to_string()))
    .stdout(predicate::str::contains("Completions: 3"));

  let published = env.published();
  assert_eq!(published.len(), 1);
  assert!(published[0].join("bin/tool").is_file());
  assert!(published[0].join("share/fish/vendor_completions.d/tool.fish").is_file());
}

#[test]
fn build_json_lists_every_platform() {
  let env = TestEnv::new(&tool_output(""));

  let assert = env
    .drvpipe_cmd()
    .arg("build")
    .arg(&env.config_path)
    .args(["--all", "-o", "json"])
    .assert()
    .success();

  let reports: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
  let reports = reports.as_array().unwrap();
  assert_eq!(reports.len(), 1);
  assert_eq!(reports[0]["platform"], host().to_string());
  assert_eq!(
    reports[0]["output"]["executable"],
    env.published()[0].join("bin/tool").display().to_string()
  );
  assert!(reports[0].get("error").is_none());
}

#[test]
fn failed_stage_prints_log_and_exits_non_zero() {
  let env = TestEnv::new(r#"name = "tool", src = "src", native_build_inputs = { "sh" }, build = "echo 'linker exploded' >&2; exit 3""#);

  env
    .drvpipe_cmd()
    .arg("build")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("compile stage failed (exit code 3)"))
    .stderr(predicate::str::contains("linker exploded"))
    .stderr(predicate::str::contains("1 of 1 platform(s) failed"));

  assert!(env.published().is_empty());
}

#[test]
fn missing_manual_pages_fail_the_build() {
  let env = TestEnv::new(&tool_output(r#"man_pages = "share/man/*.1""#));

  env
    .drvpipe_cmd()
    .arg("build")
    .arg(&env.config_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("share/man/*.1"));

  assert!(env.published().is_empty());
}

#[test]
fn verify_detects_tampering() {
  let env = TestEnv::new(&tool_output(""));
  env.drvpipe_cmd().arg("build").arg(&env.config_path).assert().success();

  env.drvpipe_cmd().arg("verify").assert().success();

  let root = env.published()[0].clone();
  std::fs::write(root.join("bin/tool"), "#!/bin/sh\necho replaced\n").unwrap();

  env
    .drvpipe_cmd()
    .arg("verify")
    .arg(&root)
    .assert()
    .failure()
    .stderr(predicate::str::contains("expected"))
    .stderr(predicate::str::contains("1 of 1 output(s) failed verification"));
}
