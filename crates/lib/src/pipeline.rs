//! Per-platform pipelines.
//!
//! For each platform: resolve the package index, evaluate the configuration,
//! build, augment and publish. Platforms never share state; a failure is
//! reported for its platform and does not stop the others.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::build::{BuildError, Builder, InstalledArtifactTree};
use crate::devenv::{self, DevEnvironment};
use crate::eval::{EvalError, PipelineConfig, PlatformOutputs, evaluate_outputs, load_config};
use crate::index::{IndexError, PackageIndex, PackageSource, PinnedIndex};
use crate::matrix::PlatformMatrix;
use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Eval(#[from] EvalError),

  #[error(transparent)]
  Index(#[from] IndexError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("platform {0} is not listed in the configuration")]
  UnsupportedPlatform(Platform),

  #[error("build task for {platform} did not complete: {message}")]
  Task { platform: Platform, message: String },
}

/// A platform's resolved index together with what the configuration asks for.
pub type Evaluated = (PackageIndex, PlatformOutputs);

pub struct Pipeline {
  config: PipelineConfig,
  source: Arc<dyn PackageSource>,
  builder: Builder,
}

impl Pipeline {
  pub fn new(config: PipelineConfig, source: Arc<dyn PackageSource>, builder: Builder) -> Self {
    Self {
      config,
      source,
      builder,
    }
  }

  /// Load a configuration file and the pinned index it names.
  pub fn load(path: &Path, builder: Builder) -> Result<Self, PipelineError> {
    let config = load_config(path)?;
    let index = PinnedIndex::load(&config.index.path, config.index.revision.as_deref())?;
    Ok(Self::new(config, Arc::new(index), builder))
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  pub fn platforms(&self) -> &[Platform] {
    &self.config.platforms
  }

  pub fn builder(&self) -> &Builder {
    &self.builder
  }

  /// Revision of the package source every platform resolves against.
  pub fn revision(&self) -> &str {
    self.source.revision()
  }

  /// Lazily evaluated outputs for every configured platform.
  pub fn outputs_matrix(&self) -> PlatformMatrix<Evaluated, PipelineError> {
    self.matrix_over(self.config.platforms.iter().copied())
  }

  fn matrix_over(&self, platforms: impl IntoIterator<Item = Platform>) -> PlatformMatrix<Evaluated, PipelineError> {
    let config = self.config.clone();
    let source = self.source.clone();
    PlatformMatrix::new(platforms, move |platform| evaluate(&config, source.as_ref(), platform))
  }

  /// Evaluate a single platform.
  pub fn outputs(&self, platform: &Platform) -> Result<Evaluated, PipelineError> {
    self.check_platform(platform)?;
    evaluate(&self.config, self.source.as_ref(), platform)
  }

  /// Assemble the dev environment for `platform`. Touches nothing on disk.
  pub fn develop(&self, platform: &Platform) -> Result<DevEnvironment, PipelineError> {
    let (index, outputs) = self.outputs(platform)?;
    Ok(devenv::assemble(&outputs.dev, &index)?)
  }

  /// Build and publish one platform.
  pub async fn realize(&self, platform: &Platform) -> Result<InstalledArtifactTree, PipelineError> {
    let (index, outputs) = self.outputs(platform)?;
    Ok(self.builder.realize(&outputs.default, &index).await?)
  }

  /// Build and publish several platforms concurrently.
  ///
  /// Every requested platform gets an entry in the result.
  pub async fn realize_all(
    &self,
    platforms: &[Platform],
  ) -> BTreeMap<Platform, Result<InstalledArtifactTree, PipelineError>> {
    let mut results = BTreeMap::new();
    let mut requested = Vec::new();
    for platform in platforms {
      match self.check_platform(platform) {
        Ok(()) => requested.push(*platform),
        Err(e) => {
          results.insert(*platform, Err(e));
        }
      }
    }

    let mut tasks = JoinSet::new();
    let mut task_platforms = HashMap::new();

    for (platform, evaluated) in self.matrix_over(requested).into_results() {
      let (index, outputs) = match evaluated {
        Ok(evaluated) => evaluated,
        Err(e) => {
          results.insert(platform, Err(e));
          continue;
        }
      };
      let builder = self.builder.clone();
      let handle = tasks.spawn(async move { builder.realize(&outputs.default, &index).await });
      task_platforms.insert(handle.id(), platform);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
      match joined {
        Ok((id, result)) => {
          if let Some(platform) = task_platforms.remove(&id) {
            results.insert(platform, result.map_err(PipelineError::from));
          }
        }
        Err(e) => {
          if let Some(platform) = task_platforms.remove(&e.id()) {
            error!(platform = %platform, error = %e, "build task failed");
            results.insert(
              platform,
              Err(PipelineError::Task {
                platform,
                message: e.to_string(),
              }),
            );
          }
        }
      }
    }

    let failed = results.values().filter(|r| r.is_err()).count();
    info!(platforms = results.len(), failed, "pipeline finished");
    results
  }

  fn check_platform(&self, platform: &Platform) -> Result<(), PipelineError> {
    if self.config.platforms.contains(platform) {
      Ok(())
    } else {
      Err(PipelineError::UnsupportedPlatform(*platform))
    }
  }
}

fn evaluate(config: &PipelineConfig, source: &dyn PackageSource, platform: &Platform) -> Result<Evaluated, PipelineError> {
  let index = source.resolve(platform)?;
  let outputs = evaluate_outputs(config, platform, &index)?;
  Ok((index, outputs))
}
