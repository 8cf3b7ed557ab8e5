mod build;
pub mod completions;
mod develop;
mod info;
mod show;
mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use drvpipe_lib::build::Builder;
use drvpipe_lib::pipeline::Pipeline;
use drvpipe_lib::platform::Platform;

pub use build::cmd_build;
pub use completions::cmd_completions;
pub use develop::cmd_develop;
pub use info::cmd_info;
pub use show::cmd_show;
pub use verify::cmd_verify;

fn load_pipeline(config: &Path) -> Result<Pipeline> {
  Pipeline::load(config, Builder::from_env())
    .with_context(|| format!("Failed to load configuration: {}", config.display()))
}

/// Platforms a command should act on: every configured platform with `--all`,
/// the ones given with `--platform`, or the host.
fn target_platforms(pipeline: &Pipeline, requested: &[Platform], all: bool) -> Result<Vec<Platform>> {
  if all {
    return Ok(pipeline.platforms().to_vec());
  }
  if !requested.is_empty() {
    return Ok(requested.to_vec());
  }
  Ok(vec![Platform::host().context("Failed to detect host platform")?])
}
