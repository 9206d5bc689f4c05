use std::path::PathBuf;

use thiserror::Error;
use twilight_data::{ContentValidationError, PackFileError, PackLoadError};

/// Failure to turn a pack source directory into a `.pack` file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Load(#[from] PackLoadError),
    #[error(transparent)]
    Format(#[from] PackFileError),
    #[error("duplicate {kind} id '{id}' in {}", file.display())]
    DuplicateId { kind: &'static str, id: String, file: PathBuf },
    #[error("{} validation error(s), first: {}", .0.len(), first_entry(.0))]
    ValidationFailed(Vec<ContentValidationError>),
    #[error("could not write {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn first_entry(errors: &[ContentValidationError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}
