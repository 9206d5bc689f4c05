//! Offline compiler for Twilight Marches content packs.
//!
//! Reads a pack source directory (`manifest.json` plus JSON content files in the authoring
//! schemas of [`authoring`]), validates it and writes a `.pack` container that the runtime
//! registry loads. Gameplay code never reads the JSON sources directly.

pub mod authoring;
pub mod compiler;
pub mod error;
pub mod source;

pub use compiler::{CompilationResult, PackCompiler, ValidationResult};
pub use error::CompileError;
pub use source::{PackSource, SourceContent};
