//! Manual page discovery.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use glob::{Pattern, glob};
use tracing::{debug, warn};

use super::AugmentError;

/// Find manual pages matching `pattern` below `root`.
///
/// Every matching file is returned, sorted. When two matches share a file name
/// only the lexicographically last path is kept.
pub fn locate_manual_pages(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, AugmentError> {
  // The sandbox path is literal; only the configured part is a pattern.
  let full = format!("{}/{}", Pattern::escape(&root.to_string_lossy()), pattern);
  let entries = glob(&full).map_err(|source| AugmentError::InvalidPattern {
    pattern: pattern.to_string(),
    source,
  })?;

  let mut matches = Vec::new();
  for entry in entries {
    match entry {
      Ok(path) if path.is_file() => matches.push(path),
      Ok(_) => {}
      Err(e) => warn!(error = %e, "glob error"),
    }
  }
  matches.sort();

  if matches.is_empty() {
    return Err(AugmentError::ManualPageNotFound {
      pattern: pattern.to_string(),
    });
  }

  let parents: BTreeSet<&Path> = matches.iter().filter_map(|p| p.parent()).collect();
  if parents.len() > 1 {
    warn!(
      pattern = %pattern,
      directories = parents.len(),
      "manual pages matched in more than one directory"
    );
  }

  let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
  for path in matches {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
      continue;
    };
    if let Some(previous) = by_name.insert(name.clone(), path) {
      warn!(page = %name, shadowed = ?previous, "duplicate manual page name");
    }
  }

  let pages: Vec<PathBuf> = by_name.into_values().collect();
  debug!(count = pages.len(), "located manual pages");
  Ok(pages)
}

/// Manual section of a page file, from its extension: `tool.1` and
/// `tool.1.gz` are section 1, `tool.3p` is section 3.
pub fn man_section(path: &Path) -> String {
  let file = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
  let name = file.strip_suffix(".gz").unwrap_or(file.as_ref());
  name
    .rsplit_once('.')
    .and_then(|(_, ext)| ext.chars().next())
    .filter(|c| c.is_ascii_digit())
    .map(|c| c.to_string())
    .unwrap_or_else(|| "1".to_string())
}
