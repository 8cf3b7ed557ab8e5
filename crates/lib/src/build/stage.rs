//! Stage execution.
//!
//! Every stage runs through `/bin/sh -c` with a cleared environment built by
//! the sandbox. Stages behave like one shell session: a stage first sources
//! the environment file left by the previous stage and rewrites it with
//! `export -p` when it finishes, so exports in `pre_build` reach `compile`.

use std::collections::BTreeMap;
use std::process::Output;

use tokio::process::Command;
use tracing::{debug, info};

use super::sandbox::{ENV_FILE_VAR, Sandbox};
use super::types::{BuildError, BuildStage};

/// Lines of output kept in a stage failure.
pub const LOG_TAIL_LINES: usize = 40;

/// Run `script` as `stage` inside the sandbox, with `extra` layered over the
/// sandbox environment. Returns the trimmed stdout.
pub async fn run_stage(
  sandbox: &Sandbox,
  stage: BuildStage,
  script: &str,
  extra: &BTreeMap<String, String>,
) -> Result<String, BuildError> {
  info!(stage = %stage, "running stage");

  let mut command = Command::new(STAGE_SHELL);
  command
    .arg("-c")
    .arg(wrap_script(script))
    .current_dir(sandbox.src_dir())
    .env_clear()
    .envs(sandbox.env())
    .envs(extra);

  debug!(shell = STAGE_SHELL, working_dir = ?sandbox.src_dir(), "spawning stage");

  let output = command.output().await.map_err(|e| BuildError::Failed {
    stage,
    exit_code: None,
    log: format!("failed to spawn {}: {}", STAGE_SHELL, e),
  })?;

  log_output(&output);

  if !output.status.success() {
    return Err(BuildError::Failed {
      stage,
      exit_code: output.status.code(),
      log: failure_log(&output),
    });
  }

  Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(unix)]
pub(crate) const STAGE_SHELL: &str = "/bin/sh";

#[cfg(not(unix))]
pub(crate) const STAGE_SHELL: &str = "sh";

fn wrap_script(script: &str) -> String {
  format!(
    "set -e\n. \"${var}\"\n{script}\nexport -p > \"${var}\"\n",
    var = ENV_FILE_VAR,
    script = script
  )
}

fn log_output(output: &Output) {
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stdout.trim().is_empty() {
    debug!(stdout = %stdout.trim(), "stage stdout");
  }
  if !stderr.trim().is_empty() {
    debug!(stderr = %stderr.trim(), "stage stderr");
  }
}

/// Tail of stderr, or of stdout when the stage wrote nothing to stderr.
pub fn failure_log(output: &Output) -> String {
  let stderr = String::from_utf8_lossy(&output.stderr);
  if !stderr.trim().is_empty() {
    return tail(&stderr, LOG_TAIL_LINES);
  }
  tail(&String::from_utf8_lossy(&output.stdout), LOG_TAIL_LINES)
}

fn tail(text: &str, lines: usize) -> String {
  let all: Vec<&str> = text.trim_end().lines().collect();
  let start = all.len().saturating_sub(lines);
  all[start..].join("\n")
}
