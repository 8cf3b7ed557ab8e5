//! Configuration file evaluation.
//!
//! A `drvpipe.lua` file returns a table:
//!
//! ```lua
//! return {
//!   platforms = { "x86_64-linux", "aarch64-darwin" },      -- optional
//!   index = { path = "packages.json", revision = "b5a0" }, -- revision optional
//!   outputs = function(platform, pkgs)
//!     return { default = { name = "handlr", ... }, dev = { tools = { ... } } }
//!   end,
//! }
//! ```
//!
//! [`load_config`] reads the static part. [`evaluate_outputs`] calls
//! `outputs` for a single platform in a fresh Lua state, so no Lua state is
//! shared between platforms.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::build::{BuildSpec, CompletionSpec, DEFAULT_COMPLETION_ENV, PostBuildHook};
use crate::devenv::{DevEnvSpec, StdSource};
use crate::index::PackageIndex;
use crate::lua::packages::packages_table;
use crate::lua::runtime::{create_runtime, load_file, platform_table};
use crate::platform::{Platform, PlatformError, default_platforms};
use crate::shell::Shell;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
  #[error("configuration not found: {0}")]
  NotFound(PathBuf),

  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  #[error("invalid configuration {path}: {message}")]
  Config { path: PathBuf, message: String },

  #[error(transparent)]
  Platform(#[from] PlatformError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
  /// Index file, resolved against the configuration directory.
  pub path: PathBuf,
  pub revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
  pub path: PathBuf,
  pub dir: PathBuf,
  pub platforms: Vec<Platform>,
  pub index: IndexConfig,
}

/// What a configuration produces for one platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformOutputs {
  pub default: BuildSpec,
  pub dev: DevEnvSpec,
}

/// Read a configuration's platforms and index settings.
pub fn load_config(path: &Path) -> Result<PipelineConfig, EvalError> {
  let path = dunce::canonicalize(path).map_err(|_| EvalError::NotFound(path.to_path_buf()))?;
  let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

  let lua = create_runtime(&dir)?;
  let config = config_table(&lua, &path)?;

  let platforms = match config.get::<Option<Vec<String>>>("platforms")? {
    Some(tags) => {
      let mut platforms = Vec::with_capacity(tags.len());
      for tag in tags {
        let platform: Platform = tag.parse()?;
        if !platforms.contains(&platform) {
          platforms.push(platform);
        }
      }
      platforms
    }
    None => default_platforms(),
  };
  if platforms.is_empty() {
    return Err(config_error(&path, "'platforms' must not be empty"));
  }

  let index: LuaTable = config
    .get::<Option<LuaTable>>("index")?
    .ok_or_else(|| config_error(&path, "missing 'index' table"))?;
  let index_path: String = index
    .get::<Option<String>>("path")?
    .ok_or_else(|| config_error(&path, "'index' requires a 'path'"))?;
  let revision: Option<String> = index.get("revision")?;

  if !matches!(config.get::<LuaValue>("outputs")?, LuaValue::Function(_)) {
    return Err(config_error(&path, "'outputs' must be a function"));
  }

  debug!(path = %path.display(), platforms = platforms.len(), "loaded configuration");

  Ok(PipelineConfig {
    index: IndexConfig {
      path: dir.join(index_path),
      revision,
    },
    path,
    dir,
    platforms,
  })
}

/// Call the configuration's `outputs` function for `platform`.
pub fn evaluate_outputs(
  config: &PipelineConfig,
  platform: &Platform,
  index: &PackageIndex,
) -> Result<PlatformOutputs, EvalError> {
  let lua = create_runtime(&config.dir)?;
  let table = config_table(&lua, &config.path)?;
  let outputs: LuaFunction = table.get("outputs")?;

  let result: LuaValue = outputs.call((platform_table(&lua, platform)?, packages_table(&lua, index)?))?;
  let LuaValue::Table(result) = result else {
    return Err(config_error(&config.path, "'outputs' must return a table"));
  };

  let default: LuaTable = result
    .get::<Option<LuaTable>>("default")?
    .ok_or_else(|| config_error(&config.path, "'outputs' must return a 'default' output"))?;
  let default = parse_build_spec(&default, platform, config)?;

  let dev = match result.get::<Option<LuaTable>>("dev")? {
    Some(dev) => parse_dev_spec(&dev, config)?,
    None => DevEnvSpec::default(),
  };

  debug!(platform = %platform, name = %default.name, "evaluated outputs");
  Ok(PlatformOutputs { default, dev })
}

fn config_table(lua: &Lua, path: &Path) -> Result<LuaTable, EvalError> {
  match load_file(lua, path)? {
    LuaValue::Table(table) => Ok(table),
    _ => Err(config_error(path, "configuration must return a table")),
  }
}

fn config_error(path: &Path, message: &str) -> EvalError {
  EvalError::Config {
    path: path.to_path_buf(),
    message: message.to_string(),
  }
}

fn parse_build_spec(table: &LuaTable, platform: &Platform, config: &PipelineConfig) -> Result<BuildSpec, EvalError> {
  let name: String = table
    .get::<Option<String>>("name")?
    .ok_or_else(|| config_error(&config.path, "default output requires 'name'"))?;
  let src: String = table.get::<Option<String>>("src")?.unwrap_or_else(|| ".".to_string());

  let mut spec = BuildSpec::new(&name, *platform, config.dir.join(src));
  spec.version = table.get("version")?;
  spec.pre_build = table.get("pre_build")?;

  if let Some(binary) = table.get::<Option<String>>("binary")? {
    spec.binary = binary;
  }
  if let Some(build) = table.get::<Option<String>>("build")? {
    spec.build = build;
  }
  if let Some(intermediate) = table.get::<Option<String>>("intermediate")? {
    spec.intermediate = PathBuf::from(intermediate);
  }
  if let Some(exclude) = table.get::<Option<Vec<String>>>("src_exclude")? {
    spec.src_exclude = exclude;
  }
  if let Some(env) = table.get::<Option<BTreeMap<String, String>>>("env")? {
    spec.env = env;
  }

  spec.native_build_inputs = package_names(table.get("native_build_inputs")?, config)?;
  spec.build_inputs = package_names(table.get("build_inputs")?, config)?;

  spec.post_build = PostBuildHook {
    script: table.get("post_build")?,
    completions: parse_completions(table.get("completions")?, config)?,
    man_pages: table.get("man_pages")?,
  };

  Ok(spec)
}

/// Package lists accept names or descriptor tables from `pkgs`.
fn package_names(list: Option<LuaTable>, config: &PipelineConfig) -> Result<Vec<String>, EvalError> {
  let Some(list) = list else {
    return Ok(Vec::new());
  };

  let mut names = Vec::new();
  for value in list.sequence_values::<LuaValue>() {
    match value? {
      LuaValue::String(s) => names.push(s.to_str()?.to_string()),
      LuaValue::Table(t) => names.push(t.get::<String>("name")?),
      other => {
        return Err(config_error(
          &config.path,
          &format!("package inputs must be names or packages, got {}", other.type_name()),
        ));
      }
    }
  }
  Ok(names)
}

fn parse_completions(value: LuaValue, config: &PipelineConfig) -> Result<Option<CompletionSpec>, EvalError> {
  match value {
    LuaValue::Nil | LuaValue::Boolean(false) => Ok(None),
    LuaValue::Boolean(true) => Ok(Some(CompletionSpec::default())),
    LuaValue::Table(t) => {
      let env_var = t
        .get::<Option<String>>("env")?
        .unwrap_or_else(|| DEFAULT_COMPLETION_ENV.to_string());
      let shells = match t.get::<Option<Vec<String>>>("shells")? {
        Some(names) => names
          .iter()
          .map(|name| name.parse::<Shell>())
          .collect::<Result<Vec<_>, _>>()
          .map_err(|e| config_error(&config.path, &e.to_string()))?,
        None => CompletionSpec::default().shells,
      };
      Ok(Some(CompletionSpec { env_var, shells }))
    }
    other => Err(config_error(
      &config.path,
      &format!("'completions' must be a boolean or table, got {}", other.type_name()),
    )),
  }
}

fn parse_dev_spec(table: &LuaTable, config: &PipelineConfig) -> Result<DevEnvSpec, EvalError> {
  let mut spec = DevEnvSpec::default();
  if let Some(tools) = table.get::<Option<LuaTable>>("tools")? {
    spec.tools = package_names(Some(tools), config)?;
  }

  spec.std_source = match table.get::<LuaValue>("rust_src")? {
    LuaValue::Nil => spec.std_source,
    LuaValue::Boolean(false) => None,
    LuaValue::Table(t) => {
      let defaults = StdSource::default();
      Some(StdSource {
        var: t.get::<Option<String>>("var")?.unwrap_or(defaults.var),
        package: t.get::<Option<String>>("package")?.unwrap_or(defaults.package),
        subpath: t
          .get::<Option<String>>("subpath")?
          .map(PathBuf::from)
          .unwrap_or(defaults.subpath),
      })
    }
    other => {
      return Err(config_error(
        &config.path,
        &format!("'rust_src' must be false or a table, got {}", other.type_name()),
      ));
    }
  };

  Ok(spec)
}
