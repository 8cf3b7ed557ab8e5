//! Derivation builder.
//!
//! Turns a [`BuildSpec`] plus the platform's [`PackageIndex`](crate::index::PackageIndex)
//! into an [`InstalledArtifactTree`] in the store. See [`Builder`].

mod execute;
mod sandbox;
mod stage;
pub mod store;
mod types;

pub use execute::Builder;
pub use sandbox::{HOMELESS_SHELTER, PATH_NOT_SET};
pub use stage::LOG_TAIL_LINES;
pub(crate) use stage::STAGE_SHELL;
pub use store::{BUILD_COMPLETE_MARKER, BuildMarker, StoreError, Verification, verify_output};
pub use types::*;
