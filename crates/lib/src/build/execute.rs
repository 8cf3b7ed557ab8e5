//! Build realization.
//!
//! A build goes through its stages strictly in order:
//!
//! 1. resolve inputs against the platform's package index
//! 2. prepare the sandbox
//! 3. `pre-build`, then `compile`, then install the executable
//! 4. `post-build`: the user script, then augmentation
//! 5. publish into the store
//!
//! Any failure drops the sandbox; nothing reaches the store unless every stage
//! succeeded.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::sandbox::Sandbox;
use super::stage::run_stage;
use super::store::{BuildMarker, build_dir_path, write_build_marker};
use super::types::{BuildError, BuildOutput, BuildSpec, BuildStage, InstalledArtifactTree};
use crate::augment::{Augmentation, augment};
use crate::index::PackageIndex;
use crate::platform::paths::store_dir;
use crate::util::fs::install_file;
use crate::util::hash::hash_directory;

const EXECUTABLE_MODE: u32 = 0o755;

#[derive(Debug, Clone)]
pub struct Builder {
  store: PathBuf,
}

impl Builder {
  pub fn new(store: impl Into<PathBuf>) -> Self {
    Self { store: store.into() }
  }

  /// A builder publishing into the configured store directory.
  pub fn from_env() -> Self {
    Self::new(store_dir())
  }

  pub fn store(&self) -> &Path {
    &self.store
  }

  /// Inside the store, so `publish` can rename within one filesystem.
  fn sandbox_root(&self) -> PathBuf {
    self.store.join("tmp")
  }

  /// Build, augment and publish one platform's package.
  pub async fn realize(&self, spec: &BuildSpec, index: &PackageIndex) -> Result<InstalledArtifactTree, BuildError> {
    let output = self.build(spec, index).await?;
    let augmentation = self.post_build(spec, &output).await?;
    self.publish(output, augmentation)
  }

  /// Compile `spec` and install its executable into the staging output.
  pub async fn build(&self, spec: &BuildSpec, index: &PackageIndex) -> Result<BuildOutput, BuildError> {
    if spec.platform != *index.platform() {
      return Err(crate::index::IndexError::UnsupportedPlatform(spec.platform).into());
    }

    let native = index.lookup_all(&spec.native_build_inputs)?;
    let libs = index.lookup_all(&spec.build_inputs)?;

    if !spec.src.is_dir() {
      return Err(BuildError::SourceNotFound(spec.src.clone()));
    }
    let exclude: Vec<&str> = spec.src_exclude.iter().map(String::as_str).collect();
    let source = hash_directory(&spec.src, &exclude)?;
    let hash = spec.derivation_hash(index.revision(), &source)?;

    info!(name = %spec.name, platform = %spec.platform, hash = %hash, "building");

    let sandbox = Sandbox::create(&self.sandbox_root(), spec, &native, &libs)
      .map_err(|e| stage_failure(BuildStage::Prepare, e))?;
    let none = BTreeMap::new();

    if let Some(script) = &spec.pre_build {
      run_stage(&sandbox, BuildStage::PreBuild, script, &none).await?;
    }
    run_stage(&sandbox, BuildStage::Compile, &spec.build, &none).await?;

    let intermediate_path = sandbox.src_dir().join(&spec.intermediate);
    let binary_path = intermediate_path.join(&spec.binary);
    if !binary_path.is_file() {
      return Err(BuildError::Failed {
        stage: BuildStage::Compile,
        exit_code: None,
        log: format!("compile did not produce {}", binary_path.display()),
      });
    }

    let root_path = sandbox.out_dir().to_path_buf();
    let executable = root_path.join("bin").join(&spec.binary);
    install_file(&binary_path, &executable, EXECUTABLE_MODE)?;
    debug!(executable = ?executable, "installed executable");

    Ok(BuildOutput {
      hash,
      platform: spec.platform,
      root_path,
      binary_path,
      intermediate_path,
      executable,
      sandbox,
    })
  }

  /// Run the post-build script, then harvest completions and manual pages.
  pub async fn post_build(&self, spec: &BuildSpec, output: &BuildOutput) -> Result<Augmentation, BuildError> {
    if let Some(script) = &spec.post_build.script {
      let env = BTreeMap::from([
        ("binary".to_string(), output.executable.display().to_string()),
        ("intermediate".to_string(), output.intermediate_path.display().to_string()),
      ]);
      run_stage(&output.sandbox, BuildStage::PostBuild, script, &env).await?;
    }

    Ok(augment(output, &spec.post_build).await?)
  }

  /// Seal the staging output and move it into the store.
  ///
  /// An existing publication under the same hash is replaced.
  pub fn publish(&self, output: BuildOutput, augmentation: Augmentation) -> Result<InstalledArtifactTree, BuildError> {
    let root = build_dir_path(&self.store, &output.hash);
    let marker = seal(&output, &root).map_err(|e| stage_failure(BuildStage::Publish, e))?;

    let executable = match output.executable.strip_prefix(&output.root_path) {
      Ok(rel) => root.join(rel),
      Err(_) => output.executable.clone(),
    };

    info!(platform = %output.platform, path = ?root, "published");

    Ok(InstalledArtifactTree {
      platform: output.platform,
      hash: output.hash,
      executable,
      shell_completions: augmentation
        .completions
        .into_iter()
        .map(|(shell, rel)| (shell, root.join(rel)))
        .collect(),
      manual_pages: augmentation.manual_pages.iter().map(|rel| root.join(rel)).collect(),
      output_hash: marker.output_hash,
      root,
    })
  }
}

fn seal(output: &BuildOutput, root: &Path) -> Result<BuildMarker, BuildError> {
  let marker = write_build_marker(&output.root_path, output.platform)?;

  if let Some(parent) = root.parent() {
    fs::create_dir_all(parent)?;
  }
  if root.exists() {
    debug!(path = ?root, "replacing previous publication");
    fs::remove_dir_all(root)?;
  }
  fs::rename(&output.root_path, root)?;
  Ok(marker)
}

/// Attribute a failure outside any stage script to `stage`.
fn stage_failure(stage: BuildStage, err: BuildError) -> BuildError {
  BuildError::Failed {
    stage,
    exit_code: None,
    log: err.to_string(),
  }
}
