use std::path::Path;

use mlua::prelude::*;

use crate::platform::Platform;

/// Create a Lua runtime for evaluating a configuration in `config_dir`.
///
/// Modules under `<config_dir>/lua/` are `require`-able, and the `drv`
/// global exposes `drv.dir` (the configuration directory) and `drv.host`
/// (the host platform tag, or nil on an unsupported host).
pub fn create_runtime(config_dir: &Path) -> LuaResult<Lua> {
  let lua = Lua::new();

  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  let lua_dir = config_dir.join("lua").to_string_lossy().replace('\\', "/");
  package.set(
    "path",
    format!("{dir}/?.lua;{dir}/?/init.lua;{rest}", dir = lua_dir, rest = package_path),
  )?;

  let drv = lua.create_table()?;
  drv.set("dir", config_dir.to_string_lossy().to_string())?;
  drv.set("host", Platform::host().ok().map(|p| p.triple()))?;
  lua.globals().set("drv", drv)?;

  Ok(lua)
}

/// Load and execute a Lua file, returning its value.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<LuaValue> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", path.display(), e)))?;

  lua
    .load(&content)
    .set_name(format!("@{}", path.display()))
    .eval::<LuaValue>()
}

/// The `platform` argument handed to configuration functions.
pub fn platform_table(lua: &Lua, platform: &Platform) -> LuaResult<LuaTable> {
  let table = lua.create_table()?;
  table.set("system", platform.triple())?;
  table.set("arch", platform.arch.as_str())?;
  table.set("os", platform.os.as_str())?;
  Ok(table)
}
