//! Implementation of the `drvpipe verify` command.
//!
//! Rehashes published outputs and compares them with the hash recorded in
//! their completion markers.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;

use drvpipe_lib::build::{Verification, verify_output};
use drvpipe_lib::platform::paths::store_dir;

use crate::output::{OutputFormat, print_info, print_json, print_success, print_warning, truncate_hash};

#[derive(Serialize)]
struct VerifyReport {
  path: PathBuf,
  status: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  expected: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  actual: Option<String>,
}

pub fn cmd_verify(outputs: &[String], output: OutputFormat) -> Result<()> {
  let build_dir = store_dir().join("build");
  let roots = if outputs.is_empty() {
    published_outputs(&build_dir)?
  } else {
    outputs.iter().map(|o| resolve_output(&build_dir, o)).collect()
  };

  if roots.is_empty() && !output.is_json() {
    print_info("No published outputs to verify.");
    return Ok(());
  }

  let mut reports = Vec::with_capacity(roots.len());
  for root in roots {
    let verification = verify_output(&root).with_context(|| format!("Failed to verify {}", root.display()))?;
    reports.push(report(root, verification));
  }

  let bad = reports.iter().filter(|r| r.status != "intact").count();

  if output.is_json() {
    print_json(&reports)?;
  } else {
    for report in &reports {
      match (report.status, &report.expected, &report.actual) {
        ("intact", _, _) => print_success(&report.path.display().to_string()),
        ("corrupted", Some(expected), Some(actual)) => print_warning(&format!(
          "{}: expected {}, found {}",
          report.path.display(),
          truncate_hash(expected),
          truncate_hash(actual)
        )),
        (status, _, _) => print_warning(&format!("{}: {}", report.path.display(), status)),
      }
    }
  }

  if bad > 0 {
    bail!("{} of {} output(s) failed verification", bad, reports.len());
  }
  Ok(())
}

fn report(path: PathBuf, verification: Verification) -> VerifyReport {
  match verification {
    Verification::Intact(_) => VerifyReport {
      path,
      status: "intact",
      expected: None,
      actual: None,
    },
    Verification::Corrupted { expected, actual } => VerifyReport {
      path,
      status: "corrupted",
      expected: Some(expected.0),
      actual: Some(actual.0),
    },
    Verification::Incomplete => VerifyReport {
      path,
      status: "incomplete",
      expected: None,
      actual: None,
    },
  }
}

/// An existing directory is taken as is; anything else names a hash in the store.
fn resolve_output(build_dir: &Path, output: &str) -> PathBuf {
  let path = PathBuf::from(output);
  if path.is_dir() { path } else { build_dir.join(output) }
}

fn published_outputs(build_dir: &Path) -> Result<Vec<PathBuf>> {
  if !build_dir.exists() {
    return Ok(Vec::new());
  }
  let mut roots = Vec::new();
  for entry in fs::read_dir(build_dir).with_context(|| format!("Failed to read {}", build_dir.display()))? {
    let path = entry?.path();
    if path.is_dir() {
      roots.push(path);
    }
  }
  roots.sort();
  Ok(roots)
}
