//! Typed errors for the cleanup lifecycle.
//!
//! Collaborator failures arrive as [`ProviderError`] and are wrapped with the
//! bucket, stack or physical resource id they relate to. The underlying cause is
//! always kept as the `source` so callers can walk the chain.

use std::fmt;

use thiserror::Error;

/// Failure of a single provider call (S3 or CloudFormation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct ProviderError {
    pub operation: &'static str,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Step of the erase loop that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPhase {
    ListVersions,
    DeleteBatch,
}

impl DeletionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListVersions => "list object versions",
            Self::DeleteBatch => "delete objects",
        }
    }
}

impl fmt::Display for DeletionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One object a quiet batch delete reported as not deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub version_id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl fmt::Display for DeleteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(version_id) = &self.version_id {
            write!(f, "@{version_id}")?;
        }
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, " ({code}: {message})"),
            (Some(code), None) => write!(f, " ({code})"),
            (None, Some(message)) => write!(f, " ({message})"),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StackStatusError {
    #[error("could not describe the stack {stack_id}")]
    Describe {
        stack_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("no stack matched {stack_id}")]
    NotFound { stack_id: String },
}

#[derive(Debug, Error)]
pub enum EraseError {
    #[error("could not {phase} for the bucket {bucket}")]
    Provider {
        bucket: String,
        phase: DeletionPhase,
        #[source]
        source: ProviderError,
    },

    /// A truncated page that cannot make progress.
    #[error(
        "listing of bucket {bucket} (prefix '{prefix}') returned a truncated page without progress"
    )]
    InconsistentPage { bucket: String, prefix: String },

    #[error(
        "{} object version(s) could not be deleted from the bucket {bucket}, first: {}",
        .failures.len(),
        .failures.first().map(ToString::to_string).unwrap_or_default()
    )]
    ObjectFailures {
        bucket: String,
        failures: Vec<DeleteFailure>,
    },
}

impl EraseError {
    pub fn phase(&self) -> DeletionPhase {
        match self {
            Self::Provider { phase, .. } => *phase,
            Self::InconsistentPage { .. } => DeletionPhase::ListVersions,
            Self::ObjectFailures { .. } => DeletionPhase::DeleteBatch,
        }
    }
}

/// Error kinds surfaced by [`crate::engine::CleanupEngine`].
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("{message}")]
    Validation { message: String },

    #[error("could not fetch the stack for the resource {physical_resource_id}")]
    StatusQuery {
        physical_resource_id: String,
        #[source]
        source: StackStatusError,
    },

    #[error("could not delete the objects of the resource {physical_resource_id}")]
    Deletion {
        physical_resource_id: String,
        #[source]
        source: EraseError,
    },

    #[error("unknown request type {request_type}")]
    UnknownRequestType { request_type: String },
}

impl CleanupError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        rendered.push_str(": ");
        rendered.push_str(&inner.to_string());
        cause = inner.source();
    }
    rendered
}
