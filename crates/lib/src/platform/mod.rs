//! Target platform identifiers.
//!
//! A [`Platform`] is an architecture/OS pair rendered as a tag such as
//! `x86_64-linux` or `aarch64-darwin`. The set of platforms a pipeline targets
//! is fixed when its configuration is loaded.

pub mod arch;
pub mod os;
pub mod paths;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use arch::Arch;
use os::Os;

/// Platforms targeted when a configuration does not list its own.
pub const DEFAULT_PLATFORMS: &[&str] = &["x86_64-linux", "aarch64-linux", "x86_64-darwin", "aarch64-darwin"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("invalid platform tag '{0}', expected <arch>-<os>")]
  Malformed(String),

  #[error("unknown architecture '{0}'")]
  UnknownArch(String),

  #[error("unknown operating system '{0}'")]
  UnknownOs(String),

  #[error("host platform is not supported")]
  UnsupportedHost,
}

/// Platform identifier combining architecture and OS (e.g., "aarch64-darwin")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Like [`Platform::current`], but as a `Result`.
  pub fn host() -> Result<Self, PlatformError> {
    Self::current().ok_or(PlatformError::UnsupportedHost)
  }

  /// Returns the platform tag (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // Arch names never contain '-', so split at the first one.
    let (arch, os) = s.split_once('-').ok_or_else(|| PlatformError::Malformed(s.to_string()))?;
    Ok(Self {
      arch: arch.parse()?,
      os: os.parse()?,
    })
  }
}

impl TryFrom<String> for Platform {
  type Error = PlatformError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Platform> for String {
  fn from(platform: Platform) -> Self {
    platform.triple()
  }
}

/// The default supported platform set.
pub fn default_platforms() -> Vec<Platform> {
  DEFAULT_PLATFORMS
    .iter()
    .filter_map(|tag| tag.parse().ok())
    .collect()
}

/// Returns the platform tag for the current system (e.g., "aarch64-darwin")
///
/// Returns `None` if the current platform is not supported
pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
