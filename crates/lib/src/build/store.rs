//! Published build outputs.
//!
//! A published tree lives at `<store>/build/<hash>/` and carries a completion
//! marker recording the hash of everything else in the tree. A directory
//! without a readable marker was never completed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::platform::Platform;
use crate::util::hash::{ContentHash, DirHashError, ObjectHash, hash_directory};

/// Marker file name indicating a build completed successfully.
pub const BUILD_COMPLETE_MARKER: &str = ".drvpipe-complete";

const MARKER_VERSION: u32 = 1;

/// The marker itself is written after the hash is taken.
const OUTPUT_HASH_EXCLUSIONS: &[&str] = &[BUILD_COMPLETE_MARKER];

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to read marker {path}: {source}")]
  ReadMarker {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse marker {path}: {source}")]
  ParseMarker {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to write marker: {0}")]
  WriteMarker(#[source] io::Error),

  #[error(transparent)]
  Hash(#[from] DirHashError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMarker {
  pub version: u32,
  /// Always "complete" for published builds.
  pub status: String,
  /// Full 64-character SHA256 hash of the published tree.
  pub output_hash: ContentHash,
  pub platform: Platform,
}

/// Outcome of rechecking a published tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
  Intact(BuildMarker),
  Corrupted { expected: ContentHash, actual: ContentHash },
  Incomplete,
}

pub fn build_dir_path(store: &Path, hash: &ObjectHash) -> PathBuf {
  store.join("build").join(&hash.0)
}

/// Hash of a staged or published output tree, ignoring the marker.
pub fn output_hash(root: &Path) -> Result<ContentHash, DirHashError> {
  hash_directory(root, OUTPUT_HASH_EXCLUSIONS)
}

/// Hash `root` and record the result in its completion marker.
pub fn write_build_marker(root: &Path, platform: Platform) -> Result<BuildMarker, StoreError> {
  let marker = BuildMarker {
    version: MARKER_VERSION,
    status: "complete".to_string(),
    output_hash: output_hash(root)?,
    platform,
  };
  let content = serde_json::to_string(&marker).map_err(|e| StoreError::WriteMarker(io::Error::other(e)))?;
  fs::write(root.join(BUILD_COMPLETE_MARKER), format!("{}\n", content)).map_err(StoreError::WriteMarker)?;
  Ok(marker)
}

/// Read the completion marker, or `None` if the tree has none.
pub fn read_build_marker(root: &Path) -> Result<Option<BuildMarker>, StoreError> {
  let path = root.join(BUILD_COMPLETE_MARKER);
  if !path.exists() {
    return Ok(None);
  }

  let content = fs::read_to_string(&path).map_err(|source| StoreError::ReadMarker {
    path: path.clone(),
    source,
  })?;
  let marker = serde_json::from_str(&content).map_err(|source| StoreError::ParseMarker { path, source })?;
  Ok(Some(marker))
}

/// Recompute a published tree's hash and compare it with its marker.
pub fn verify_output(root: &Path) -> Result<Verification, StoreError> {
  let Some(marker) = read_build_marker(root)? else {
    debug!(path = ?root, "no completion marker");
    return Ok(Verification::Incomplete);
  };

  let actual = output_hash(root)?;
  if actual == marker.output_hash {
    Ok(Verification::Intact(marker))
  } else {
    warn!(
      path = ?root,
      expected = %marker.output_hash,
      actual = %actual,
      "published output does not match its marker"
    );
    Ok(Verification::Corrupted {
      expected: marker.output_hash,
      actual,
    })
  }
}
