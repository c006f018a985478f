//! # Error Types
//!
//! One error enum for the whole core. Callers that only care about the
//! category match on [`FluxError::kind`].

use crate::render::RenderError;
use fluxone_container::ContainerError;
use thiserror::Error;

/// Errors raised by the application core.
#[derive(Debug, Clone, Error)]
pub enum FluxError {
    /// A value did not satisfy the capability the call required.
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Lookup of an unregistered name.
    #[error("{0}")]
    NotFound(String),

    /// A required extension hook was not provided.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Malformed input shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The container rejected a request.
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Error category, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ContractViolation,
    NotFound,
    NotImplemented,
    InvalidArgument,
    Render,
}

impl FluxError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractViolation(_) => ErrorKind::ContractViolation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Render(_) => ErrorKind::Render,
            Self::Container(ContainerError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            Self::Container(ContainerError::TypeMismatch { .. }) => ErrorKind::ContractViolation,
        }
    }
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, FluxError>;
