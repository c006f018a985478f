//! # Error Types
//!
//! Errors raised by the container.

use thiserror::Error;

/// Errors that can occur while registering, resolving or injecting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    /// Malformed dependency list or injection spec.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The registered value is not of the requested type.
    #[error("Type mismatch: '{name}' does not resolve to {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

impl ContainerError {
    /// Shorthand for [`ContainerError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
