//! Constant key-value database.
//!
//! A database is written once, front to back, by a [`CdbMake`] and then only
//! ever read through a [`Cdb`]. Keys and values are arbitrary byte strings
//! with explicit lengths; nothing is null-terminated.
//!
//! # Format
//! All integers are little-endian `u32`.
//! - A 2048-byte header of 256 `(table position, slot count)` pairs.
//! - The records, each `key length, data length, key, data`.
//! - 256 open-addressed hash tables of `(hash, record position)` slots.
//!
//! A key hashes to a table by its low byte, and to a starting slot within that
//! table by the remaining bits. Lookups probe linearly from there until they
//! find the key or an empty slot.
//!
//! The version layer in `vigil-db` is written against the [`RecordReader`]
//! and [`RecordWriter`] traits rather than these concrete types.

pub mod error;
mod make;
mod read;

pub use crate::make::CdbMake;
pub use crate::read::Cdb;
use crate::error::Result;

const TABLE_COUNT: usize = 256;
const HEADER_LEN: u64 = (TABLE_COUNT * 8) as u64;

/// The cdb hash function (`h = h * 33 ^ byte`, starting at 5381).
pub fn hash(key: &[u8]) -> u32 {
    key.iter().fold(5381u32, |h, &b| (h << 5).wrapping_add(h) ^ u32::from(b))
}

/// Read access to a store: locate a record, then read its data.
pub trait RecordReader {
    /// Locate the first record stored under `key`.
    ///
    /// Returns `false` if there is no such record. After `true`, the record is
    /// described by [`data_position`](Self::data_position) and
    /// [`data_len`](Self::data_len).
    fn find(&mut self, key: &[u8]) -> Result<bool>;

    /// Offset of the data of the record found by the last successful `find`.
    fn data_position(&self) -> u64;

    /// Length of the data of the record found by the last successful `find`.
    fn data_len(&self) -> u32;

    /// Fill `buf` exactly, starting at `position`.
    ///
    /// Running out of data is [`Truncated`](crate::error::ErrorKind::Truncated).
    fn read(&mut self, buf: &mut [u8], position: u64) -> Result<()>;
}

/// Append-only write access to a store under construction.
pub trait RecordWriter {
    /// Append a record. Existing records are never modified.
    fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"", 5381)]
    #[case(b"a", 177604)]
    #[case(b"version", 0x2fb2_d3bf)]
    fn test_hash(#[case] key: &[u8], #[case] expected: u32) {
        assert_eq!(hash(key), expected);
    }
}
