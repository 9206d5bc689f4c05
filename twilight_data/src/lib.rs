//! Shared data model for Twilight Marches content packs.
//!
//! Definitions, manifests, the `.pack` container and the validators used by both the pack
//! compiler and the runtime registry.

pub mod balance;
pub mod defs;
pub mod error;
pub mod expression;
pub mod manifest;
pub mod pack;
pub mod pack_file;
pub mod validate;

pub use balance::BalanceConfiguration;
pub use defs::*;
pub use error::PackLoadError;
pub use expression::{ExpressionError, ExpressionValidator};
pub use manifest::{CORE_VERSION, PackDependency, PackManifest, PackType, core_version};
pub use pack::{ContentCounts, ContentSet, LoadedPack, PackContent};
pub use pack_file::{PackFileError, PackFileInfo};
pub use validate::{ContentValidationError, Severity, validate_content};
