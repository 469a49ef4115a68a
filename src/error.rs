//! Command Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("unknown hash algorithm: {_0}")]
    UnknownHash(#[error(not(source))] String),
    #[display("database already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    #[display("database is newer than this version of vigil understands")]
    Incompatible,
    #[display("failed to build database")]
    Build,
    #[display("failed to read database")]
    Read,
}
