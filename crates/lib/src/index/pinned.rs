//! Pinned package index files.
//!
//! The index file pins the package set every platform build resolves against:
//!
//! ```json
//! {
//!   "version": 1,
//!   "revision": "b5a0c7e1",
//!   "platforms": {
//!     "x86_64-linux": {
//!       "cargo": { "path": "/opt/rust", "version": "1.82.0", "bins": ["cargo"] },
//!       "openssl": { "path": "/opt/openssl" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{IndexError, PackageDescriptor, PackageIndex, PackageSource};
use crate::platform::Platform;

/// Current index file format version.
pub const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
  pub version: u32,
  pub revision: String,
  pub platforms: BTreeMap<Platform, BTreeMap<String, PackageDescriptor>>,
}

/// A package source backed by a pinned index file.
#[derive(Debug, Clone)]
pub struct PinnedIndex {
  file: IndexFile,
}

impl PinnedIndex {
  /// Load an index file, optionally requiring a specific pinned revision.
  ///
  /// Relative package paths are resolved against the index file's directory.
  pub fn load(path: &Path, pinned: Option<&str>) -> Result<Self, IndexError> {
    let content = fs::read_to_string(path).map_err(|source| IndexError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut file: IndexFile = serde_json::from_str(&content).map_err(|source| IndexError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    let base = path.parent().unwrap_or(Path::new("."));
    for packages in file.platforms.values_mut() {
      for package in packages.values_mut() {
        if package.path.is_relative() {
          package.path = base.join(&package.path);
        }
      }
    }

    debug!(path = %path.display(), revision = %file.revision, "loaded package index");
    Self::from_file(file, pinned)
  }

  pub fn from_file(file: IndexFile, pinned: Option<&str>) -> Result<Self, IndexError> {
    if file.version != INDEX_VERSION {
      return Err(IndexError::UnsupportedVersion(file.version));
    }
    if let Some(pinned) = pinned
      && pinned != file.revision
    {
      return Err(IndexError::RevisionMismatch {
        pinned: pinned.to_string(),
        actual: file.revision,
      });
    }
    Ok(Self { file })
  }

  pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
    self.file.platforms.keys()
  }
}

impl PackageSource for PinnedIndex {
  fn resolve(&self, platform: &Platform) -> Result<PackageIndex, IndexError> {
    let packages = self
      .file
      .platforms
      .get(platform)
      .ok_or(IndexError::UnsupportedPlatform(*platform))?;

    Ok(PackageIndex::new(
      *platform,
      self.file.revision.clone(),
      packages.iter().map(|(name, descriptor)| PackageDescriptor {
        name: name.clone(),
        ..descriptor.clone()
      }),
    ))
  }

  fn revision(&self) -> &str {
    &self.file.revision
  }
}
