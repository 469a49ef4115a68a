//! Hash Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A hash error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The name does not match any registered algorithm.
    #[display("unknown hash type '{_0}'")]
    UnknownHashAlgorithm(#[error(not(source))] String),
    /// A hash-names value with more than one `:` delimiter.
    #[display("invalid hashnames value '{_0}'")]
    MalformedHashNames(#[error(not(source))] String),
    /// Could not reserve memory for an encoded hash-names value.
    #[display("failed to allocate hashnames buffer")]
    Allocation,
    /// Reading input for a digest failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Allocation | ErrorKind::Io)
    }
}
