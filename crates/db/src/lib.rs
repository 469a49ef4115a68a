//! Integrity database header negotiation.
//!
//! An integrity database records, for every file in a tree, the fingerprint(s)
//! computed by one or two hash algorithms. Before any of those records can be
//! compared, the reader has to know whether it understands the database at
//! all, and which algorithm(s) produced the fingerprints. That is what the
//! header records are for; see [`version`] for their layout.
//!
//! # Opening
//! [`Database::open`] attaches to the store and reads the version once. A
//! missing version record is a legacy database and is accepted. A store that
//! can't be attached, or a version record that's present but unreadable, is a
//! [`Fatal`](error::Fatal) error, kept apart from ordinary
//! [`Error`](error::Error)s so that callers can't accidentally treat
//! corruption as a recoverable condition.
//!
//! # Building
//! [`DatabaseBuilder`] appends content records, then writes the header with
//! [`write_db_version`] when finished.

mod database;
pub mod error;
pub mod fatal;
pub mod version;

pub use crate::database::{Database, DatabaseBuilder};
pub use crate::version::{DB_VERSION, DbVersion, compat_db_version, read_db_version, write_db_version};
