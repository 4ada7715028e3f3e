//! Error types for the Prism engine
//!
//! This module defines the error types used throughout the engine,
//! including device access, resource decoding and manager bookkeeping.

use std::fmt;

/// Result type for Prism engine operations
pub type PrismResult<T> = std::result::Result<T, PrismError>;

/// Short names used inside the crate and by the `prism` facade
pub use self::PrismError as Error;
pub type Result<T> = PrismResult<T>;

/// Prism engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrismError {
    /// Graphics device error (backend call rejected, lock poisoned, etc.)
    BackendError(String),

    /// Pool allocator budget exhausted
    OutOfMemory,

    /// Invalid resource (malformed bytes, unknown format, wrong type code)
    InvalidResource(String),

    /// Initialization failed (engine, managers, factories)
    InitializationFailed(String),

    /// A registry already holds an entry under this name
    NameCollision(String),

    /// Lookup by name, id or handle found nothing
    NotFound(String),

    /// Operation called in the wrong lifecycle state
    InvalidState(String),

    /// File system access failed
    Io(String),
}

impl fmt::Display for PrismError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrismError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            PrismError::OutOfMemory => write!(f, "Out of pool memory"),
            PrismError::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            PrismError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            PrismError::NameCollision(name) => write!(f, "Name '{}' already exists", name),
            PrismError::NotFound(what) => write!(f, "Not found: {}", what),
            PrismError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            PrismError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PrismError {}

impl From<std::io::Error> for PrismError {
    fn from(err: std::io::Error) -> Self {
        PrismError::Io(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
