//! Per-build sandbox.
//!
//! Layout under a fresh temporary directory:
//!
//! ```text
//! <sandbox>/
//!   src/       copy of the source tree; stages run here
//!   out/       staging output root, published on success
//!   tmp/       TMPDIR for every stage
//!   stage.env  environment carried from one stage to the next
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use super::types::{BuildError, BuildSpec};
use crate::consts::SOURCE_DATE_EPOCH;
use crate::index::PackageDescriptor;
use crate::util::fs::copy_tree;

/// `PATH` value when no inputs provide binaries, so lookups fail fast.
pub const PATH_NOT_SET: &str = "/path-not-set";
pub const HOMELESS_SHELTER: &str = "/homeless-shelter";
pub const ENV_FILE_VAR: &str = "DRVPIPE_ENV_FILE";

const ENV_FILE_NAME: &str = "stage.env";

#[derive(Debug)]
pub struct Sandbox {
  dir: TempDir,
  src: PathBuf,
  out: PathBuf,
  tmp: PathBuf,
  env_file: PathBuf,
  env: BTreeMap<String, String>,
}

impl Sandbox {
  /// Create a sandbox under `root` and copy the spec's source tree into it.
  pub fn create(
    root: &Path,
    spec: &BuildSpec,
    native: &[&PackageDescriptor],
    libs: &[&PackageDescriptor],
  ) -> Result<Self, BuildError> {
    fs::create_dir_all(root)?;
    let dir = tempfile::Builder::new().prefix("build-").tempdir_in(root)?;

    let src = dir.path().join("src");
    let out = dir.path().join("out");
    let tmp = dir.path().join("tmp");
    let env_file = dir.path().join(ENV_FILE_NAME);

    let copied = copy_tree(&spec.src, &src, &spec.src_exclude)?;
    fs::create_dir_all(&out)?;
    fs::create_dir_all(&tmp)?;
    fs::write(&env_file, "")?;

    debug!(sandbox = %dir.path().display(), files = copied, "sandbox prepared");

    let env = base_env(spec, native, libs, &src, &out, &tmp, &env_file)?;

    Ok(Self {
      dir,
      src,
      out,
      tmp,
      env_file,
      env,
    })
  }

  pub fn path(&self) -> &Path {
    self.dir.path()
  }

  pub fn src_dir(&self) -> &Path {
    &self.src
  }

  pub fn out_dir(&self) -> &Path {
    &self.out
  }

  pub fn tmp_dir(&self) -> &Path {
    &self.tmp
  }

  pub fn env_file(&self) -> &Path {
    &self.env_file
  }

  /// Environment every subprocess in this sandbox starts from.
  pub fn env(&self) -> &BTreeMap<String, String> {
    &self.env
  }
}

fn base_env(
  spec: &BuildSpec,
  native: &[&PackageDescriptor],
  libs: &[&PackageDescriptor],
  src: &Path,
  out: &Path,
  tmp: &Path,
  env_file: &Path,
) -> Result<BTreeMap<String, String>, BuildError> {
  let mut env = BTreeMap::new();

  let bins: Vec<PathBuf> = native.iter().chain(libs).map(|p| p.bin_dir()).collect();
  env.insert("PATH".to_string(), search_path(&bins, PATH_NOT_SET)?);
  env.insert("HOME".to_string(), HOMELESS_SHELTER.to_string());

  let tmp = tmp.display().to_string();
  for var in ["TMPDIR", "TMP", "TEMP", "TEMPDIR"] {
    env.insert(var.to_string(), tmp.clone());
  }

  env.insert("out".to_string(), out.display().to_string());
  env.insert("src".to_string(), src.display().to_string());
  env.insert("LANG".to_string(), "C".to_string());
  env.insert("LC_ALL".to_string(), "C".to_string());
  env.insert("SOURCE_DATE_EPOCH".to_string(), SOURCE_DATE_EPOCH.to_string());
  env.insert("DRVPIPE_PLATFORM".to_string(), spec.platform.triple());
  env.insert(ENV_FILE_VAR.to_string(), env_file.display().to_string());

  if !libs.is_empty() {
    let lib_dirs: Vec<PathBuf> = libs.iter().map(|p| p.lib_dir()).collect();
    let pkg_config: Vec<PathBuf> = libs.iter().map(|p| p.lib_dir().join("pkgconfig")).collect();
    env.insert("LIBRARY_PATH".to_string(), search_path(&lib_dirs, "")?);
    env.insert("PKG_CONFIG_PATH".to_string(), search_path(&pkg_config, "")?);
  }

  for (key, value) in &spec.env {
    env.insert(key.clone(), value.clone());
  }

  Ok(env)
}

/// Join directories into a search path, dropping repeats but keeping order.
fn search_path(dirs: &[PathBuf], empty: &str) -> Result<String, BuildError> {
  if dirs.is_empty() {
    return Ok(empty.to_string());
  }
  let mut unique: Vec<&PathBuf> = Vec::with_capacity(dirs.len());
  for dir in dirs {
    if !unique.contains(&dir) {
      unique.push(dir);
    }
  }
  let joined = std::env::join_paths(unique).map_err(io::Error::other)?;
  Ok(joined.to_string_lossy().into_owned())
}
