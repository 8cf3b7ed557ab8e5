use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sandbox::Sandbox;
use super::store::StoreError;
use crate::augment::AugmentError;
use crate::index::IndexError;
use crate::platform::Platform;
use crate::shell::{DEFAULT_COMPLETION_SHELLS, Shell};
use crate::util::hash::{ContentHash, DirHashError, Hashable, ObjectHash};

pub const DEFAULT_BUILD_COMMAND: &str = "cargo build --release";
pub const DEFAULT_INTERMEDIATE_DIR: &str = "target/release";
pub const DEFAULT_SRC_EXCLUDE: &[&str] = &[".git", "target", "result"];
pub const DEFAULT_COMPLETION_ENV: &str = "COMPLETE";

/// A fully specified package build for one platform.
///
/// Package inputs are names; they are resolved against the platform's
/// [`PackageIndex`](crate::index::PackageIndex) when the build runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  pub platform: Platform,
  /// Source tree, copied into the sandbox.
  pub src: PathBuf,
  /// File names skipped when copying and fingerprinting the source.
  pub src_exclude: Vec<String>,
  /// Build-time tools; their `bin/` directories go on `PATH` first.
  pub native_build_inputs: Vec<String>,
  /// Link/runtime libraries.
  pub build_inputs: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub pre_build: Option<String>,
  /// The compile command.
  pub build: String,
  /// Executable name produced under `intermediate`.
  pub binary: String,
  /// Intermediate directory, relative to the source copy.
  pub intermediate: PathBuf,
  pub post_build: PostBuildHook,
}

/// Everything that runs once the executable exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostBuildHook {
  pub script: Option<String>,
  pub completions: Option<CompletionSpec>,
  /// Glob rooted at the intermediate directory.
  pub man_pages: Option<String>,
}

/// How to ask the built executable for its own completion scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSpec {
  /// Variable whose value names the shell to emit a script for.
  pub env_var: String,
  pub shells: Vec<Shell>,
}

impl Default for CompletionSpec {
  fn default() -> Self {
    Self {
      env_var: DEFAULT_COMPLETION_ENV.to_string(),
      shells: DEFAULT_COMPLETION_SHELLS.to_vec(),
    }
  }
}

impl BuildSpec {
  pub fn new(name: &str, platform: Platform, src: impl Into<PathBuf>) -> Self {
    Self {
      name: name.to_string(),
      version: None,
      platform,
      src: src.into(),
      src_exclude: DEFAULT_SRC_EXCLUDE.iter().map(|s| s.to_string()).collect(),
      native_build_inputs: Vec::new(),
      build_inputs: Vec::new(),
      env: BTreeMap::new(),
      pre_build: None,
      build: DEFAULT_BUILD_COMMAND.to_string(),
      binary: name.to_string(),
      intermediate: PathBuf::from(DEFAULT_INTERMEDIATE_DIR),
      post_build: PostBuildHook::default(),
    }
  }

  pub fn with_native_inputs(mut self, names: &[&str]) -> Self {
    self.native_build_inputs = names.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn with_pre_build(mut self, script: &str) -> Self {
    self.pre_build = Some(script.to_string());
    self
  }

  pub fn with_build(mut self, script: &str) -> Self {
    self.build = script.to_string();
    self
  }

  pub fn with_post_build(mut self, hook: PostBuildHook) -> Self {
    self.post_build = hook;
    self
  }

  /// Derivation hash: the spec (minus the source location), the index
  /// revision, and the content hash of the source tree.
  pub fn derivation_hash(&self, revision: &str, source: &ContentHash) -> Result<ObjectHash, serde_json::Error> {
    let mut spec = self.clone();
    spec.src = PathBuf::new();
    DerivationKey {
      spec,
      revision: revision.to_string(),
      source: source.clone(),
    }
    .compute_hash()
  }
}

#[derive(Serialize)]
struct DerivationKey {
  spec: BuildSpec,
  revision: String,
  source: ContentHash,
}

impl Hashable for DerivationKey {}

/// Points in the pipeline a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStage {
  Prepare,
  PreBuild,
  Compile,
  PostBuild,
  Publish,
}

impl BuildStage {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildStage::Prepare => "prepare",
      BuildStage::PreBuild => "pre-build",
      BuildStage::Compile => "compile",
      BuildStage::PostBuild => "post-build",
      BuildStage::Publish => "publish",
    }
  }
}

impl fmt::Display for BuildStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  /// A stage script exited non-zero, or compile left no executable behind.
  #[error("{stage} stage failed ({})", describe_exit(.exit_code))]
  Failed {
    stage: BuildStage,
    exit_code: Option<i32>,
    log: String,
  },

  #[error(transparent)]
  Index(#[from] IndexError),

  #[error(transparent)]
  Augment(#[from] AugmentError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error("source tree not found: {0}")]
  SourceNotFound(PathBuf),

  #[error("failed to hash tree: {0}")]
  Hash(#[from] DirHashError),

  #[error("failed to serialize build spec: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {}", code),
    None => "no exit code".to_string(),
  }
}

impl BuildError {
  /// Captured stage output, if the failure came from a stage.
  pub fn log(&self) -> Option<&str> {
    match self {
      BuildError::Failed { log, .. } if !log.is_empty() => Some(log),
      _ => None,
    }
  }
}

/// A compiled package whose post-build steps have not run yet.
///
/// The sandbox (and with it `intermediate_path`) lives exactly as long as this
/// value; dropping it without publishing discards the build.
#[derive(Debug)]
pub struct BuildOutput {
  pub hash: ObjectHash,
  pub platform: Platform,
  /// Staging output root; becomes the published tree.
  pub root_path: PathBuf,
  /// The executable as produced by the compile stage.
  pub binary_path: PathBuf,
  pub intermediate_path: PathBuf,
  /// The executable installed under `root_path/bin`.
  pub executable: PathBuf,
  pub(crate) sandbox: Sandbox,
}

impl BuildOutput {
  /// Environment every post-build subprocess starts from.
  pub fn env(&self) -> &BTreeMap<String, String> {
    self.sandbox.env()
  }

  /// Exports carried from the last stage that ran; layered over [`env`](Self::env).
  pub fn session_file(&self) -> &std::path::Path {
    self.sandbox.env_file()
  }

  /// Working directory for post-build subprocesses.
  pub fn work_dir(&self) -> &std::path::Path {
    self.sandbox.src_dir()
  }
}

/// A published build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledArtifactTree {
  pub platform: Platform,
  pub hash: ObjectHash,
  pub root: PathBuf,
  pub executable: PathBuf,
  pub shell_completions: BTreeMap<Shell, PathBuf>,
  pub manual_pages: Vec<PathBuf>,
  pub output_hash: ContentHash,
}
