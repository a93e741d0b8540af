//! Error kinds surfaced by an extraction call.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure of the remote completion collaborator.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum RemoteServiceError {
    #[error("{backend} request timed out after {after:?}")]
    Timeout { backend: String, after: Duration },

    /// The request never produced a response (connection, credentials, SDK errors).
    #[error("{backend} request failed: {message}")]
    Request { backend: String, message: String },

    /// The service answered but refused the request (quota, bad model id, malformed request).
    #[error("{backend} rejected the request: {message}")]
    Rejected { backend: String, message: String },
}

/// One field-level problem found while validating a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending mention; `None` for top-level problems.
    pub index: Option<usize>,
    pub field: &'static str,
    pub reason: String,
}

impl Violation {
    pub fn top_level(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            index: None,
            field,
            reason: reason.into(),
        }
    }

    pub fn at(index: usize, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "mentions[{}].{}: {}", index, self.field, self.reason),
            None => write!(f, "{}: {}", self.field, self.reason),
        }
    }
}

/// The model reply could not be turned into a valid mentions list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaValidationError {
    #[error("reply is not a JSON object: {0}")]
    Malformed(String),

    #[error("reply failed validation: {}", join_violations(.0))]
    Invalid(Vec<Violation>),
}

impl SchemaValidationError {
    /// Field-level violations, empty for malformed replies.
    pub fn violations(&self) -> &[Violation] {
        match self {
            SchemaValidationError::Malformed(_) => &[],
            SchemaValidationError::Invalid(violations) => violations,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything `Extractor::extract` can fail with.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    #[error(transparent)]
    Schema(#[from] SchemaValidationError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} has an invalid value: {reason}")]
    Invalid { field: &'static str, reason: String },
}
