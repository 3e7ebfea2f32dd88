//! Core error model.

use thiserror::Error;

/// Result type used by the pure building blocks.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure of a pure, deterministic operation (parsing, validation).
///
/// Transport and storage failures belong to the client crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A page number outside `1..=total_pages` was requested.
    #[error("page {requested} is out of range (total pages: {total})")]
    PageOutOfRange { requested: u32, total: u32 },
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
