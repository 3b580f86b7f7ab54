//! Core error model.

use thiserror::Error;

/// Result type used across the core primitives.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core-level error.
///
/// Keep this focused on deterministic parsing/validation failures of shared
/// primitives. Transport and storage concerns belong to the crates that own them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A run mode string was not recognised.
    #[error("invalid run mode '{0}' (expected 'production' or 'development')")]
    InvalidRunMode(String),

    /// A route rule could not be parsed.
    #[error("invalid route rule: {0}")]
    InvalidRouteRule(String),

    /// A value failed validation (e.g. empty site name).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_route_rule(msg: impl Into<String>) -> Self {
        Self::InvalidRouteRule(msg.into())
    }
}
