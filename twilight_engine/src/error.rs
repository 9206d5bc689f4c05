//! Failures returned by the registry's explicit-failure accessors.

use thiserror::Error;
use twilight_data::ContentValidationError;

/// A query that needed content to be present (or valid) and found it wasn't.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentAccessError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} '{id}' is incomplete, missing: {}", .missing.join(", "))]
    IncompleteContent {
        kind: &'static str,
        id: String,
        /// Missing referenced ids, or the name of an empty required field.
        missing: Vec<String>,
    },
    #[error("need at least {required} {kind} definitions, have {available}")]
    InsufficientContent {
        kind: &'static str,
        required: usize,
        available: usize,
    },
    #[error("no playable content loaded: {0}")]
    NoPlayableContent(String),
    #[error("content failed validation with {} error(s)", .0.len())]
    ValidationFailed(Vec<ContentValidationError>),
}

impl ContentAccessError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        ContentAccessError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
