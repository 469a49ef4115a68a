//! Database Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! There are two deliberately separate channels. [`Error`] is returned for
//! everything a caller can reasonably handle by abandoning the current build
//! or open. [`Fatal`] is reserved for a store that can't be attached at all,
//! or a version record that exists but can't be read; the binary hands those
//! to [`terminate`](crate::fatal::terminate).

use derive_more::{Display, Error};

/// A recoverable database error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for recoverable database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An unrecoverable database error.
pub type Fatal = exn::Exn<FatalKind>;
/// Result type alias for operations that may fail fatally.
pub type FatalResult<T> = std::result::Result<T, Fatal>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Adding to or reading from the underlying store failed.
    #[display("store error")]
    Store,
    /// The hash names could not be encoded for writing.
    #[display("failed to encode hash names")]
    Encode,
    /// The stored hash names are malformed or name an unknown algorithm.
    #[display("invalid hash names")]
    HashNames,
    /// Content records can't use a key the header reserves.
    #[display("reserved key: {_0}")]
    ReservedKey(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Store)
    }
}

/// The step that failed, for the diagnostic printed on termination.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    #[display("failed to initialise database store")]
    StoreInit,
    #[display("failed to read database version")]
    VersionRead,
}

impl FatalKind {
    /// Process exit status used when terminating on this error.
    pub fn exit_code(&self) -> i32 {
        crate::fatal::EXIT_FAILURE
    }
}
