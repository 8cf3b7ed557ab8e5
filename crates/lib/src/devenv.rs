//! Development environments.
//!
//! A dev environment is the set of tools a contributor works with plus the
//! location of the standard library sources for editor tooling. It is
//! assembled from the same package index as the build and never touches the
//! store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::{IndexError, PackageDescriptor, PackageIndex};
use crate::platform::Platform;
use crate::shell::Shell;

pub const DEFAULT_DEV_TOOLS: &[&str] = &["cargo", "rustc", "rustfmt", "clippy", "cargo-mutants", "pre-commit"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevEnvSpec {
  pub tools: Vec<String>,
  /// `None` leaves the standard library location unset.
  pub std_source: Option<StdSource>,
}

/// Where the standard library sources live and which variable points at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdSource {
  pub var: String,
  pub package: String,
  pub subpath: PathBuf,
}

impl Default for DevEnvSpec {
  fn default() -> Self {
    Self {
      tools: DEFAULT_DEV_TOOLS.iter().map(|s| s.to_string()).collect(),
      std_source: Some(StdSource::default()),
    }
  }
}

impl Default for StdSource {
  fn default() -> Self {
    Self {
      var: "RUST_SRC_PATH".to_string(),
      package: "rust-src".to_string(),
      subpath: PathBuf::from("lib/rustlib/src/rust/library"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevEnvironment {
  pub platform: Platform,
  pub tools: Vec<PackageDescriptor>,
  pub env: BTreeMap<String, String>,
}

/// Resolve a dev environment against `index`.
pub fn assemble(spec: &DevEnvSpec, index: &PackageIndex) -> Result<DevEnvironment, IndexError> {
  let tools: Vec<PackageDescriptor> = index.lookup_all(&spec.tools)?.into_iter().cloned().collect();

  let mut env = BTreeMap::new();
  if let Some(std_source) = &spec.std_source {
    let package = index.lookup(&std_source.package)?;
    let location = package.path.join(&std_source.subpath);
    env.insert(std_source.var.clone(), location.display().to_string());
  }

  debug!(platform = %index.platform(), tools = tools.len(), "assembled dev environment");

  Ok(DevEnvironment {
    platform: *index.platform(),
    tools,
    env,
  })
}

impl DevEnvironment {
  /// Tool `bin/` directories in declaration order, joined as a search path.
  pub fn path(&self) -> String {
    let mut dirs: Vec<PathBuf> = Vec::with_capacity(self.tools.len());
    for tool in &self.tools {
      let dir = tool.bin_dir();
      if !dirs.contains(&dir) {
        dirs.push(dir);
      }
    }
    std::env::join_paths(&dirs)
      .map(|p| p.to_string_lossy().into_owned())
      .unwrap_or_else(|_| {
        dirs
          .iter()
          .map(|d| d.display().to_string())
          .collect::<Vec<_>>()
          .join(":")
      })
  }

  /// Script that activates this environment in an interactive `shell`.
  pub fn activation_script(&self, shell: Shell) -> String {
    let mut lines = vec![format!("# {} dev environment for {}", crate::consts::APP_NAME, self.platform)];
    let path = self.path();
    if !path.is_empty() {
      lines.push(shell.prepend_path("PATH", &path));
    }
    for (key, value) in &self.env {
      lines.push(shell.export(key, value));
    }
    lines.push(String::new());
    lines.join("\n")
  }

  /// Environment for a subshell, given the caller's current `PATH`.
  pub fn session_env(&self, inherited_path: Option<&str>) -> BTreeMap<String, String> {
    let mut env = self.env.clone();
    let path = match (self.path(), inherited_path) {
      (tools, Some(rest)) if !tools.is_empty() && !rest.is_empty() => {
        let separator = if cfg!(windows) { ";" } else { ":" };
        format!("{}{}{}", tools, separator, rest)
      }
      (tools, Some(rest)) if tools.is_empty() => rest.to_string(),
      (tools, _) => tools,
    };
    env.insert("PATH".to_string(), path);
    env
  }
}
