//! Installation of harvested artifacts into an output root.
//!
//! Completions land where each shell looks for them (see
//! [`Shell::completion_path`]); manual pages go to `share/man/man<section>/`.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::manpages::man_section;
use crate::shell::Shell;
use crate::util::fs::{install_bytes, install_file};

const DATA_MODE: u32 = 0o644;

/// Paths installed into an output root, relative to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Augmentation {
  pub completions: BTreeMap<Shell, PathBuf>,
  pub manual_pages: Vec<PathBuf>,
}

/// Install completion scripts and manual pages under `root`.
pub fn install(
  root: &Path,
  program: &str,
  completions: &BTreeMap<Shell, Vec<u8>>,
  manual_pages: &[PathBuf],
) -> io::Result<Augmentation> {
  let mut installed = Augmentation::default();

  for (shell, script) in completions {
    let rel = shell.completion_path(program);
    install_bytes(script, &root.join(&rel), DATA_MODE)?;
    debug!(shell = %shell, path = ?rel, "installed completions");
    installed.completions.insert(*shell, rel);
  }

  for page in manual_pages {
    let Some(name) = page.file_name() else {
      continue;
    };
    let rel = PathBuf::from("share/man")
      .join(format!("man{}", man_section(page)))
      .join(name);
    install_file(page, &root.join(&rel), DATA_MODE)?;
    debug!(page = ?rel, "installed manual page");
    installed.manual_pages.push(rel);
  }

  Ok(installed)
}
