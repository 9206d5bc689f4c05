//! Errors raised while reading, checking or registering a pack.

use std::path::PathBuf;

use semver::Version;
use thiserror::Error;

use crate::pack_file::PackFileError;

/// Fatal failure for a single pack load, compile or reload.
///
/// A pack that fails with any of these is never merged into registry state.
#[derive(Debug, Error)]
pub enum PackLoadError {
    #[error("manifest not found at {}", .0.display())]
    ManifestNotFound(PathBuf),
    #[error("invalid manifest for pack '{pack_id}': {reason}")]
    InvalidManifest { pack_id: String, reason: String },
    #[error("pack '{pack_id}' requires core version {required}, running {current}")]
    IncompatibleCoreVersion {
        pack_id: String,
        required: String,
        current: Version,
    },
    #[error("pack '{pack_id}' depends on '{dependency}', which is not loaded")]
    MissingDependency { pack_id: String, dependency: String },
    #[error("pack '{pack_id}' requires '{dependency}' {required}, found {found}")]
    DependencyVersionMismatch {
        pack_id: String,
        dependency: String,
        required: String,
        found: Version,
    },
    #[error("failed to load content from {}: {reason}", file.display())]
    ContentLoadFailed { file: PathBuf, reason: String },
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", file.display())]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("pack '{0}' is already loaded")]
    PackAlreadyLoaded(String),
    #[error("pack '{0}' is not loaded")]
    PackNotLoaded(String),
    #[error("circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
    #[error("unreadable pack file {}", file.display())]
    Format {
        file: PathBuf,
        #[source]
        source: PackFileError,
    },
}

impl PackLoadError {
    /// Attach a file path to a container error, lifting checksum and missing-file failures
    /// into their dedicated variants.
    pub fn from_pack_file(file: impl Into<PathBuf>, err: PackFileError) -> Self {
        let file = file.into();
        match err {
            PackFileError::ChecksumMismatch { expected, actual } => PackLoadError::ChecksumMismatch {
                file,
                expected,
                actual,
            },
            PackFileError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => PackLoadError::FileNotFound(file),
            source => PackLoadError::Format { file, source },
        }
    }
}
