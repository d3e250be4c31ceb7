//! Error handling module
//!
//! Provides the unified error type for the resolution engine.
//! Every variant except `RoleOrdering` is entity-scoped: it is caught at the
//! entity boundary and recorded as an inconsistency instead of failing the
//! batch. `RoleOrdering` is a precondition violation and always fatal.

use thiserror::Error;

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid remote schema definition: {0}")]
    Validation(String),

    #[error("Introspection request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Introspection fetch failed: {0}")]
    Fetch(String),

    #[error("Could not stitch stored introspection: {0}")]
    Stitch(String),

    #[error("Invalid introspection payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed introspection: {0}")]
    Introspection(String),

    #[error("{0}")]
    Permission(String),

    #[error("remote schema permissions: {0}")]
    RoleOrdering(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MetadataError {
    /// Whether this error must abort the whole batch instead of being
    /// recorded against a single entity
    pub fn is_fatal(&self) -> bool {
        matches!(self, MetadataError::RoleOrdering(_))
    }
}

/// Result type alias for resolution operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> MetadataError {
    MetadataError::Validation(msg.into())
}

/// Helper function to create a fetch error
pub fn fetch_error(msg: impl Into<String>) -> MetadataError {
    MetadataError::Fetch(msg.into())
}
