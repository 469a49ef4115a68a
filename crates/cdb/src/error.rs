//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An I/O operation on the underlying file failed.
    #[display("I/O error")]
    Io,
    /// The file ended before a structure that should be there.
    #[display("unexpected end of database")]
    Truncated,
    /// A structure points somewhere it can't.
    #[display("corrupt database: {_0}")]
    Corrupt(#[error(not(source))] &'static str),
    /// The database would exceed the 4 GiB addressable by the format.
    #[display("database too large")]
    TooLarge,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
