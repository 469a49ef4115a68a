//! The database header: a format version and the hash algorithm names.
//!
//! Both are ordinary records under reserved keys, written once when a
//! database is built and read once when it is opened:
//!
//! | Key         | Value                                          |
//! |-------------|------------------------------------------------|
//! | `version`   | [`DbVersion`], 4 bytes little-endian           |
//! | `hashnames` | `new` or `new:old`, see [`vigil_hash::codec`]  |
//!
//! A database without a `version` record predates versioning. That is not an
//! error: it is opened without a version. A `version` record that exists but
//! can't be read means the database is corrupt, and that is [`Fatal`].
//!
//! [`Fatal`]: crate::error::Fatal

use crate::error::{ErrorKind, FatalKind, FatalResult, Result};
use derive_more::Display;
use exn::ResultExt;
use std::io::{Read, Seek};
use tracing::instrument;
use vigil_cdb::error::ErrorKind as StoreErrorKind;
use vigil_cdb::{Cdb, RecordReader, RecordWriter};
use vigil_hash::{HashAlgorithm, codec};

/// Key of the format version record.
pub const VERSION_KEY: &[u8] = b"version";
/// Key of the hash algorithm names record.
pub const HASHNAMES_KEY: &[u8] = b"hashnames";

/// Format revision written by this version of vigil.
pub const DB_VERSION: DbVersion = DbVersion(4);

/// A database format revision.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbVersion(i32);

impl DbVersion {
    /// Size of the stored value in bytes.
    pub const LEN: usize = 4;

    pub const fn new(version: i32) -> Self {
        Self(version)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub fn to_le_bytes(self) -> [u8; Self::LEN] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(i32::from_le_bytes(bytes))
    }
}

/// Attach to a store and read its format version.
///
/// Returns the store alongside the version so that the caller holds both;
/// `None` means the database predates versioning. Failing to attach, or a
/// version record that can't be read in full, is fatal.
pub fn compat_db_version<R: Read + Seek>(handle: R) -> FatalResult<(Cdb<R>, Option<DbVersion>)> {
    let mut store = Cdb::init(handle).or_raise(|| FatalKind::StoreInit)?;
    let version = read_db_version(&mut store)?;
    Ok((store, version))
}

/// Read the format version from an attached store.
///
/// See [`compat_db_version`].
#[instrument(level = "debug", skip(store))]
pub fn read_db_version<S: RecordReader>(store: &mut S) -> FatalResult<Option<DbVersion>> {
    if !store.find(VERSION_KEY).or_raise(|| FatalKind::VersionRead)? {
        tracing::debug!("no version record; database predates versioning");
        return Ok(None);
    }
    if (store.data_len() as usize) < DbVersion::LEN {
        let truncated = exn::Exn::from(StoreErrorKind::Truncated);
        return Err(truncated.raise(FatalKind::VersionRead));
    }
    let mut buf = [0u8; DbVersion::LEN];
    let position = store.data_position();
    store.read(&mut buf, position).or_raise(|| FatalKind::VersionRead)?;
    let version = DbVersion::from_le_bytes(buf);
    tracing::debug!(%version, "read database version");
    Ok(Some(version))
}

/// Append the version and hash names records to a store under construction.
///
/// `secondary` is dropped if it has the same name as `primary`. Failures are
/// logged and returned; if the second record fails, the first has already
/// been written and the store should be discarded.
#[instrument(level = "debug", skip_all, fields(%primary, secondary = secondary.map(HashAlgorithm::name)))]
pub fn write_db_version<B: RecordWriter>(
    builder: &mut B,
    primary: &HashAlgorithm,
    secondary: Option<&HashAlgorithm>,
) -> Result<()> {
    write_header(builder, || codec::encode(primary, secondary))
}

fn write_header<B, F>(builder: &mut B, encode_names: F) -> Result<()>
where
    B: RecordWriter,
    F: FnOnce() -> vigil_hash::error::Result<String>,
{
    builder
        .add(VERSION_KEY, &DB_VERSION.to_le_bytes())
        .inspect_err(|e| tracing::error!(error = ?e, "failed to add version record"))
        .or_raise(|| ErrorKind::Store)?;
    let names = encode_names()
        .inspect_err(|e| tracing::error!(error = ?e, "failed to allocate hashnames buffer"))
        .or_raise(|| ErrorKind::Encode)?;
    builder
        .add(HASHNAMES_KEY, names.as_bytes())
        .inspect_err(|e| tracing::error!(error = ?e, "failed to add hashnames record"))
        .or_raise(|| ErrorKind::Store)?;
    Ok(())
}
