//! The read-only `pkgs` table.
//!
//! Configuration functions receive the platform's package index as a proxy
//! table: indexing a missing name raises an error instead of yielding nil, and
//! assignments are rejected.

use mlua::prelude::*;

use crate::index::{IndexError, PackageDescriptor, PackageIndex};

/// Marks descriptor tables so they can be passed back as inputs.
pub const PACKAGE_TYPE: &str = "drvpipe.package";

pub fn packages_table(lua: &Lua, index: &PackageIndex) -> LuaResult<LuaTable> {
  let inner = lua.create_table()?;
  for package in index.iter() {
    inner.set(package.name.as_str(), descriptor_table(lua, package)?)?;
  }

  let platform = *index.platform();
  let lookup = inner.clone();
  let index_fn = lua.create_function(move |_, (_, key): (LuaTable, String)| {
    match lookup.raw_get::<Option<LuaTable>>(key.as_str())? {
      Some(package) => Ok(package),
      None => Err(LuaError::external(IndexError::UnknownPackage { name: key, platform })),
    }
  })?;
  let newindex_fn = lua.create_function(|_, (_, key): (LuaTable, LuaValue)| -> LuaResult<()> {
    Err(LuaError::external(format!(
      "package index is read-only (assigning '{}')",
      key.to_string().unwrap_or_default()
    )))
  })?;
  let next: LuaFunction = lua.globals().get("next")?;
  let pairs_inner = inner.clone();
  let pairs_fn = lua.create_function(move |_, _: LuaTable| Ok((next.clone(), pairs_inner.clone(), LuaValue::Nil)))?;
  let len_inner = inner.clone();
  let len_fn = lua.create_function(move |_, _: LuaTable| Ok(len_inner.pairs::<LuaValue, LuaValue>().count()))?;

  let meta = lua.create_table()?;
  meta.set("__index", index_fn)?;
  meta.set("__newindex", newindex_fn)?;
  meta.set("__pairs", pairs_fn)?;
  meta.set("__len", len_fn)?;
  meta.set("__metatable", false)?;

  let proxy = lua.create_table()?;
  proxy.set_metatable(Some(meta))?;
  Ok(proxy)
}

fn descriptor_table(lua: &Lua, package: &PackageDescriptor) -> LuaResult<LuaTable> {
  let table = lua.create_table()?;
  table.set("name", package.name.as_str())?;
  table.set("path", package.path.to_string_lossy().to_string())?;
  table.set("version", package.version.clone())?;
  table.set("bins", lua.create_sequence_from(package.bins.iter().map(String::as_str))?)?;

  let meta = lua.create_table()?;
  meta.set("__type", PACKAGE_TYPE)?;
  table.set_metatable(Some(meta))?;
  Ok(table)
}
