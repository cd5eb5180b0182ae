//! # Store Errors
//!
//! Error types for the document store access layer.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required argument was missing or had the wrong shape.
    ///
    /// Raised before any round trip to the store.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store accepted the request but refused it (duplicate key, bad operator)
    #[error("Rejected by store: {0}")]
    Rejected(String),

    /// The store could not be reached or the driver failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be converted to or from the store's wire format
    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::InvalidArgument`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }

    /// Shorthand for [`StoreError::Rejected`]
    pub fn rejected(msg: impl Into<String>) -> Self {
        StoreError::Rejected(msg.into())
    }

    /// True for caller errors detected before touching the store
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StoreError::InvalidArgument(_))
    }
}
