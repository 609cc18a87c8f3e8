//! Error handling for the engine
//!
//! This module defines all error types used throughout the engine.
//! Errors are `Clone` so an in-flight computation can deliver a single
//! failure to every waiter subscribed to it.

use thiserror::Error;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Main error type for the engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Role or flag store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AuthzError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error represents a transient store-level failure.
    ///
    /// Callers use this to tell "authorization system degraded" apart from
    /// "access denied" when mapping to upstream status codes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Timeout(_) | Self::Cache(_))
    }
}
