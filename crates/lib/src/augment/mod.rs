//! Artifact augmentation.
//!
//! Runs after the compile stage has produced the executable and before the
//! output tree is published: harvests shell completions from the executable
//! and installs manual pages generated during the build. Everything is
//! harvested and located first, so a failure installs nothing.

mod completions;
mod install;
mod manpages;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::build::{BuildOutput, PostBuildHook};
use crate::shell::Shell;

pub use completions::harvest_completions;
pub use install::{Augmentation, install};
pub use manpages::{locate_manual_pages, man_section};

#[derive(Debug, Error)]
pub enum AugmentError {
  #[error("executable not found: {0}")]
  MissingExecutable(PathBuf),

  #[error("failed to generate {shell} completions ({}): {stderr}", describe_exit(.exit_code))]
  CompletionGeneration {
    shell: Shell,
    exit_code: Option<i32>,
    stderr: String,
  },

  #[error("no manual pages match '{pattern}'")]
  ManualPageNotFound { pattern: String },

  #[error("invalid manual page pattern '{pattern}': {source}")]
  InvalidPattern {
    pattern: String,
    #[source]
    source: glob::PatternError,
  },

  #[error("failed to install artifacts: {0}")]
  Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "not started".to_string(),
  }
}

/// Augment a build's staging output according to its post-build hook.
pub async fn augment(output: &BuildOutput, hook: &PostBuildHook) -> Result<Augmentation, AugmentError> {
  let program = output
    .executable
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| AugmentError::MissingExecutable(output.executable.clone()))?;

  let scripts = match &hook.completions {
    Some(spec) => {
      harvest_completions(
        &output.executable,
        output.env(),
        output.session_file(),
        output.work_dir(),
        spec,
      )
      .await?
    }
    None => Default::default(),
  };

  let pages = match &hook.man_pages {
    Some(pattern) => locate_manual_pages(&output.intermediate_path, pattern)?,
    None => Vec::new(),
  };

  let installed = install(&output.root_path, &program, &scripts, &pages)?;
  info!(
    platform = %output.platform,
    completions = installed.completions.len(),
    manual_pages = installed.manual_pages.len(),
    "augmented output"
  );
  Ok(installed)
}
