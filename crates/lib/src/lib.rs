//! drvpipe-lib: declarative multi-platform package builds.
//!
//! One configuration describes how to build a command-line program for a set
//! of platforms:
//! - `matrix`: lazily evaluated per-platform results
//! - `index`: the pinned package set each platform resolves inputs from
//! - `build`: sandboxed, staged builds published into a content-addressed store
//! - `augment`: shell completions and manual pages added before publishing
//! - `devenv`: development shells assembled from the same package set
//! - `pipeline`: the driver tying configuration evaluation to builds

pub mod augment;
pub mod build;
pub mod consts;
pub mod devenv;
pub mod eval;
pub mod index;
pub mod lua;
pub mod matrix;
pub mod pipeline;
pub mod platform;
pub mod shell;
pub mod util;
