//! Shells the pipeline knows how to install completions for and render
//! environment activation scripts in.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Shells completions are harvested for when a configuration does not say.
pub const DEFAULT_COMPLETION_SHELLS: &[Shell] = &[Shell::Bash, Shell::Fish, Shell::Zsh];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
  Bash,
  Elvish,
  Fish,
  #[serde(alias = "pwsh")]
  PowerShell,
  Zsh,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shell '{0}', expected one of: bash, elvish, fish, powershell, zsh")]
pub struct UnknownShell(pub String);

impl Shell {
  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Elvish => "elvish",
      Shell::Fish => "fish",
      Shell::PowerShell => "powershell",
      Shell::Zsh => "zsh",
    }
  }

  /// Detect the user's shell from `$SHELL`, falling back to bash.
  pub fn detect() -> Self {
    std::env::var("SHELL")
      .ok()
      .and_then(|shell| {
        Path::new(&shell)
          .file_name()
          .and_then(|n| n.to_str())
          .and_then(|n| n.parse().ok())
      })
      .unwrap_or(Shell::Bash)
  }

  /// Where a completion script for `program` is installed, relative to an
  /// output root.
  pub fn completion_path(&self, program: &str) -> PathBuf {
    match self {
      Shell::Bash => PathBuf::from("share/bash-completion/completions").join(format!("{}.bash", program)),
      Shell::Elvish => PathBuf::from("share/elvish/lib").join(format!("{}.elv", program)),
      Shell::Fish => PathBuf::from("share/fish/vendor_completions.d").join(format!("{}.fish", program)),
      Shell::PowerShell => PathBuf::from("share/powershell/completions").join(format!("{}.ps1", program)),
      Shell::Zsh => PathBuf::from("share/zsh/site-functions").join(format!("_{}", program)),
    }
  }

  /// A statement exporting `key=value` in this shell.
  pub fn export(&self, key: &str, value: &str) -> String {
    match self {
      Shell::Bash | Shell::Zsh => format!("export {}={}", key, posix_quote(value)),
      Shell::Fish => format!("set -gx {} {}", key, posix_quote(value)),
      Shell::Elvish => format!("set-env {} {}", key, doubled_quote(value)),
      Shell::PowerShell => format!("$env:{} = {}", key, doubled_quote(value)),
    }
  }

  /// A statement prepending `value` to the PATH-like variable `key`.
  pub fn prepend_path(&self, key: &str, value: &str) -> String {
    match self {
      Shell::Bash | Shell::Zsh => format!("export {}={}:\"${}\"", key, posix_quote(value), key),
      Shell::Fish => format!("set -gx {} {} ${}", key, posix_quote(value), key),
      Shell::Elvish => format!("set-env {} {}':'(get-env {})", key, doubled_quote(value), key),
      Shell::PowerShell => format!(
        "$env:{} = {} + [IO.Path]::PathSeparator + $env:{}",
        key,
        doubled_quote(value),
        key
      ),
    }
  }

  /// Program name used to spawn an interactive session.
  pub fn program(&self) -> &'static str {
    match self {
      Shell::PowerShell => "pwsh",
      other => other.as_str(),
    }
  }
}

fn posix_quote(value: &str) -> String {
  format!("'{}'", value.replace('\'', r"'\''"))
}

/// Elvish and PowerShell escape a quote inside single quotes by doubling it.
fn doubled_quote(value: &str) -> String {
  format!("'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Shell {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Shell {
  type Err = UnknownShell;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "bash" => Ok(Shell::Bash),
      "elvish" => Ok(Shell::Elvish),
      "fish" => Ok(Shell::Fish),
      "powershell" | "pwsh" => Ok(Shell::PowerShell),
      "zsh" => Ok(Shell::Zsh),
      _ => Err(UnknownShell(s.to_string())),
    }
  }
}
