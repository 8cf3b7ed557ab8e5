//! Implementation of the `drvpipe build` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use drvpipe_lib::build::InstalledArtifactTree;
use drvpipe_lib::pipeline::PipelineError;
use drvpipe_lib::platform::Platform;

use crate::output::{
  OutputFormat, format_elapsed, print_error, print_json, print_log, print_stat, print_success, symbols, truncate_hash,
};

#[derive(Serialize)]
struct PlatformReport<'a> {
  platform: Platform,
  #[serde(skip_serializing_if = "Option::is_none")]
  output: Option<&'a InstalledArtifactTree>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

/// Build every target platform concurrently and report each one.
///
/// Fails when any requested platform failed; the others are still published.
pub fn cmd_build(config: &Path, platforms: &[Platform], all: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let pipeline = super::load_pipeline(config)?;
  let targets = super::target_platforms(&pipeline, platforms, all)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let results = rt.block_on(pipeline.realize_all(&targets));
  let failed = results.values().filter(|r| r.is_err()).count();

  if output.is_json() {
    let reports: Vec<PlatformReport> = results
      .iter()
      .map(|(platform, result)| PlatformReport {
        platform: *platform,
        output: result.as_ref().ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
      })
      .collect();
    print_json(&reports)?;
  } else {
    for (platform, result) in &results {
      match result {
        Ok(tree) => {
          print_success(&format!(
            "{} {} {}",
            platform,
            symbols::ARROW,
            tree.root.display()
          ));
          print_stat("Output hash", truncate_hash(&tree.output_hash.0));
          print_stat("Completions", &tree.shell_completions.len().to_string());
          print_stat("Manual pages", &tree.manual_pages.len().to_string());
        }
        Err(e) => {
          print_error(&format!("{}: {}", platform, e));
          if let PipelineError::Build(err) = e
            && let Some(log) = err.log()
          {
            print_log(log);
          }
        }
      }
    }
    println!();
    print_stat("Duration", &format_elapsed(start.elapsed()));
  }

  if failed > 0 {
    bail!("{} of {} platform(s) failed", failed, results.len());
  }
  Ok(())
}
