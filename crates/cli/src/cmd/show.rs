//! Implementation of the `drvpipe show` command.
//!
//! Evaluates the configuration for each target platform and prints what would
//! be built. Nothing is compiled and the store is not touched.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};

use drvpipe_lib::eval::PlatformOutputs;
use drvpipe_lib::platform::Platform;

use crate::output::{OutputFormat, print_error, print_info, print_json, print_stat};

pub fn cmd_show(config: &Path, platforms: &[Platform], all: bool, output: OutputFormat) -> Result<()> {
  let pipeline = super::load_pipeline(config)?;
  let targets = super::target_platforms(&pipeline, platforms, all)?;

  let mut evaluated: BTreeMap<Platform, PlatformOutputs> = BTreeMap::new();
  let mut failed = 0;
  for platform in &targets {
    match pipeline.outputs(platform) {
      Ok((_, outputs)) => {
        evaluated.insert(*platform, outputs);
      }
      Err(e) => {
        failed += 1;
        print_error(&format!("{}: {}", platform, e));
      }
    }
  }

  if output.is_json() {
    print_json(&evaluated)?;
  } else {
    print_stat("Index revision", pipeline.revision());
    for (platform, outputs) in &evaluated {
      let spec = &outputs.default;
      print_info(&format!("{} ({})", spec.name, platform));
      print_stat("Source", &spec.src.display().to_string());
      print_stat("Build", &spec.build);
      print_stat("Binary", &spec.intermediate.join(&spec.binary).display().to_string());
      if !spec.native_build_inputs.is_empty() {
        print_stat("Native inputs", &spec.native_build_inputs.join(", "));
      }
      if !spec.build_inputs.is_empty() {
        print_stat("Build inputs", &spec.build_inputs.join(", "));
      }
      if let Some(completions) = &spec.post_build.completions {
        let shells: Vec<&str> = completions.shells.iter().map(|s| s.as_str()).collect();
        print_stat("Completions", &format!("{}=<{}>", completions.env_var, shells.join("|")));
      }
      if let Some(pattern) = &spec.post_build.man_pages {
        print_stat("Manual pages", pattern);
      }
      print_stat("Dev tools", &outputs.dev.tools.join(", "));
    }
  }

  if failed > 0 {
    bail!("{} of {} platform(s) failed to evaluate", failed, targets.len());
  }
  Ok(())
}
