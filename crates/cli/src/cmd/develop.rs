//! Implementation of the `drvpipe develop` command.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::info;

use drvpipe_lib::platform::Platform;
use drvpipe_lib::shell::Shell;

/// Print the activation script, or spawn `shell` inside the environment and
/// exit with its status.
pub fn cmd_develop(config: &Path, shell: Option<Shell>, print: bool, platform: Option<Platform>) -> Result<()> {
  let pipeline = super::load_pipeline(config)?;
  let platform = match platform {
    Some(platform) => platform,
    None => Platform::host().context("Failed to detect host platform")?,
  };
  let dev = pipeline
    .develop(&platform)
    .with_context(|| format!("Failed to assemble dev environment for {}", platform))?;
  let shell = shell.unwrap_or_else(Shell::detect);

  if print {
    print!("{}", dev.activation_script(shell));
    return Ok(());
  }

  let inherited = std::env::var("PATH").ok();
  info!(shell = %shell, platform = %platform, tools = dev.tools.len(), "entering dev environment");

  let status = Command::new(shell.program())
    .envs(dev.session_env(inherited.as_deref()))
    .status()
    .with_context(|| format!("Failed to spawn {}", shell.program()))?;

  std::process::exit(status.code().unwrap_or(1));
}
