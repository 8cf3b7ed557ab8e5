//! Completion harvesting.
//!
//! The built executable describes itself: run with `<env_var>=<shell>` it
//! prints the completion script for that shell on stdout.
//!
//! Harvesting belongs to the post-build hook, so the executable sees the same
//! session as the stages: the session file is sourced by a shell that then
//! `exec`s the executable with the completion variable set last.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use super::AugmentError;
use crate::build::{CompletionSpec, STAGE_SHELL};
use crate::shell::Shell;

/// `$0` is the executable, `$1` the session file, `$2=$3` the completion variable.
const HARVEST_SCRIPT: &str = r#". "$1" && export "$2=$3" && exec "$0""#;

/// Run `executable` once per requested shell and collect the scripts.
///
/// Each run starts from exactly `env`, sources `session` over it, and runs in
/// `work_dir`.
pub async fn harvest_completions(
  executable: &Path,
  env: &BTreeMap<String, String>,
  session: &Path,
  work_dir: &Path,
  spec: &CompletionSpec,
) -> Result<BTreeMap<Shell, Vec<u8>>, AugmentError> {
  if !executable.is_file() {
    return Err(AugmentError::MissingExecutable(executable.to_path_buf()));
  }
  let executable = std::path::absolute(executable)?;
  let session = std::path::absolute(session)?;

  let mut scripts = BTreeMap::new();
  for shell in &spec.shells {
    if scripts.contains_key(shell) {
      continue;
    }
    let script = generate(&executable, env, &session, work_dir, &spec.env_var, *shell).await?;
    scripts.insert(*shell, script);
  }

  info!(shells = scripts.len(), "harvested completions");
  Ok(scripts)
}

async fn generate(
  executable: &Path,
  env: &BTreeMap<String, String>,
  session: &Path,
  work_dir: &Path,
  env_var: &str,
  shell: Shell,
) -> Result<Vec<u8>, AugmentError> {
  debug!(executable = ?executable, shell = %shell, "generating completions");

  let output = Command::new(STAGE_SHELL)
    .arg("-c")
    .arg(HARVEST_SCRIPT)
    .arg(executable)
    .arg(session)
    .arg(env_var)
    .arg(shell.as_str())
    .current_dir(work_dir)
    .env_clear()
    .envs(env)
    .stdin(Stdio::null())
    .output()
    .await
    .map_err(|e| AugmentError::CompletionGeneration {
      shell,
      exit_code: None,
      stderr: e.to_string(),
    })?;

  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
  if !output.status.success() {
    return Err(AugmentError::CompletionGeneration {
      shell,
      exit_code: output.status.code(),
      stderr,
    });
  }
  if output.stdout.iter().all(u8::is_ascii_whitespace) {
    return Err(AugmentError::CompletionGeneration {
      shell,
      exit_code: output.status.code(),
      stderr: if stderr.is_empty() {
        "no completion script on stdout".to_string()
      } else {
        stderr
      },
    });
  }

  Ok(output.stdout)
}
