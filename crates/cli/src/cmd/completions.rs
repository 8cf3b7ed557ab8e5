//! Completions for `drvpipe` itself.
//!
//! `drvpipe` honours the same contract it expects from the programs it
//! builds: run with `COMPLETE=<shell>` it prints its completion script for
//! that shell and exits.

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

use drvpipe_lib::build::DEFAULT_COMPLETION_ENV;

use crate::Cli;

pub fn cmd_completions(shell: Shell) -> Result<()> {
  write_completions(shell);
  Ok(())
}

/// Print completions when the completion variable names a known shell.
///
/// Returns whether anything was printed.
pub fn complete_from_env() -> bool {
  let Ok(value) = std::env::var(DEFAULT_COMPLETION_ENV) else {
    return false;
  };
  match value.parse::<Shell>() {
    Ok(shell) => {
      write_completions(shell);
      true
    }
    Err(_) => false,
  }
}

fn write_completions(shell: Shell) {
  let mut cmd = Cli::command();
  let name = cmd.get_name().to_string();
  generate(shell, &mut cmd, name, &mut io::stdout());
}
