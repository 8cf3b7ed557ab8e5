//! Lua runtime for `drvpipe.lua` configurations.
//!
//! - [`runtime`] - VM setup, the `drv` global and the `platform` argument
//! - [`packages`] - the read-only `pkgs` table

pub mod packages;
pub mod runtime;
