use predicates::prelude::*;

use super::common::{TestEnv, tool_output};

#[test]
fn print_renders_activation_script() {
  let env = TestEnv::new(&tool_output(""));

  env
    .drvpipe_cmd()
    .arg("develop")
    .arg(&env.config_path)
    .args(["--print", "--shell", "bash"])
    .assert()
    .success()
    .stdout(predicate::str::contains("export PATH='/bin:/usr/bin':\"$PATH\""))
    .stdout(predicate::str::contains("export RUST_SRC_PATH='/usr/lib/rust'"));

  assert!(env.published().is_empty());
}

#[test]
fn print_for_fish() {
  let env = TestEnv::new(&tool_output(""));

  env
    .drvpipe_cmd()
    .arg("develop")
    .arg(&env.config_path)
    .args(["--print", "--shell", "fish"])
    .assert()
    .success()
    .stdout(predicate::str::contains("set -gx RUST_SRC_PATH '/usr/lib/rust'"));
}

#[test]
fn spawned_shell_sees_environment() {
  let env = TestEnv::new(&tool_output(""));

  env
    .drvpipe_cmd()
    .env("SHELL", "/bin/bash")
    .arg("develop")
    .arg(&env.config_path)
    .write_stdin("echo \"src=$RUST_SRC_PATH\"\nexit 0\n")
    .assert()
    .success()
    .stdout(predicate::str::contains("src=/usr/lib/rust"));
}

#[test]
fn unknown_tool_fails() {
  let env = TestEnv::new(&tool_output(""));
  std::fs::write(
    &env.config_path,
    std::fs::read_to_string(&env.config_path)
      .unwrap()
      .replace(r#"tools = { "sh", "coreutils" }"#, r#"tools = { "rust-analyzer" }"#),
  )
  .unwrap();

  env
    .drvpipe_cmd()
    .arg("develop")
    .arg(&env.config_path)
    .arg("--print")
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown package 'rust-analyzer'"));
}
