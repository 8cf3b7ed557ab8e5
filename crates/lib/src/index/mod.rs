//! Package index binding.
//!
//! A [`PackageIndex`] maps package names to installed descriptors for one
//! platform. Indexes are produced by a [`PackageSource`] (in practice the
//! pinned JSON file in [`pinned`]) and are read-only once resolved: builds and
//! dev environments only ever look packages up.

pub mod pinned;

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Platform;

pub use pinned::{INDEX_VERSION, PinnedIndex};

#[derive(Debug, Error)]
pub enum IndexError {
  #[error("unknown package '{name}' for {platform}")]
  UnknownPackage { name: String, platform: Platform },

  #[error("package index has no entries for {0}")]
  UnsupportedPlatform(Platform),

  #[error("package index revision mismatch: pinned {pinned}, index file has {actual}")]
  RevisionMismatch { pinned: String, actual: String },

  #[error("failed to read package index {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse package index {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("unsupported package index version {0}, expected {INDEX_VERSION}")]
  UnsupportedVersion(u32),
}

/// An installed package available to builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
  /// Filled in from the index key when the index is resolved.
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  /// Install prefix.
  pub path: PathBuf,
  /// Executables provided under `bin/`.
  #[serde(default)]
  pub bins: Vec<String>,
}

impl PackageDescriptor {
  pub fn bin_dir(&self) -> PathBuf {
    self.path.join("bin")
  }

  pub fn lib_dir(&self) -> PathBuf {
    self.path.join("lib")
  }
}

/// The resolved package set for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIndex {
  platform: Platform,
  revision: String,
  packages: BTreeMap<String, PackageDescriptor>,
}

impl PackageIndex {
  pub fn new(
    platform: Platform,
    revision: impl Into<String>,
    packages: impl IntoIterator<Item = PackageDescriptor>,
  ) -> Self {
    Self {
      platform,
      revision: revision.into(),
      packages: packages.into_iter().map(|p| (p.name.clone(), p)).collect(),
    }
  }

  pub fn platform(&self) -> &Platform {
    &self.platform
  }

  pub fn revision(&self) -> &str {
    &self.revision
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &PackageDescriptor> {
    self.packages.values()
  }

  pub fn lookup(&self, name: &str) -> Result<&PackageDescriptor, IndexError> {
    self.packages.get(name).ok_or_else(|| IndexError::UnknownPackage {
      name: name.to_string(),
      platform: self.platform,
    })
  }

  /// Look up every name in order, failing on the first miss.
  pub fn lookup_all<'a, S: AsRef<str>>(&'a self, names: &[S]) -> Result<Vec<&'a PackageDescriptor>, IndexError> {
    names.iter().map(|name| self.lookup(name.as_ref())).collect()
  }
}

/// Resolves the package set for a platform.
///
/// Passed explicitly to whatever needs packages so tests can substitute an
/// in-memory source.
pub trait PackageSource: Send + Sync {
  fn resolve(&self, platform: &Platform) -> Result<PackageIndex, IndexError>;

  /// The pinned revision every resolved index is derived from.
  fn revision(&self) -> &str;
}
