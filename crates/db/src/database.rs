//! Opening and building whole databases.

use crate::error::{ErrorKind, FatalKind, FatalResult, Result};
use crate::version::{DB_VERSION, DbVersion, HASHNAMES_KEY, VERSION_KEY, compat_db_version, write_db_version};
use exn::ResultExt;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use tracing::instrument;
use vigil_cdb::{Cdb, CdbMake, RecordWriter};
use vigil_hash::{HashAlgorithm, HashNames};

/// An opened, read-only database.
///
/// The format version is read exactly once, when the database is opened, and
/// carried by the handle from then on.
pub struct Database<R> {
    store: Cdb<R>,
    version: Option<DbVersion>,
}

impl Database<File> {
    /// Open a database file.
    ///
    /// A file that can't be opened is treated like a store that can't be
    /// initialised: fatal.
    pub fn open_path(path: impl AsRef<Path>) -> FatalResult<Self> {
        let file = File::open(path.as_ref()).or_raise(|| FatalKind::StoreInit)?;
        Self::open(file)
    }
}

impl<R: Read + Seek> Database<R> {
    /// Attach to a store and read its version.
    #[instrument(level = "debug", skip(handle))]
    pub fn open(handle: R) -> FatalResult<Self> {
        let (store, version) = compat_db_version(handle)?;
        Ok(Self { store, version })
    }

    /// The format version, or `None` if the database predates versioning.
    pub fn version(&self) -> Option<DbVersion> {
        self.version
    }

    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// Whether this version of vigil understands the format.
    ///
    /// Unversioned databases are considered compatible; anything newer than
    /// [`DB_VERSION`] is not. Refusing an incompatible database is up to the
    /// caller.
    pub fn is_compatible(&self) -> bool {
        self.version.is_none_or(|v| v <= DB_VERSION)
    }

    /// The hash algorithm(s) the database was built with.
    ///
    /// `None` if there is no `hashnames` record.
    pub fn hash_names(&mut self) -> Result<Option<HashNames>> {
        let Some(value) = self.store.get(HASHNAMES_KEY).or_raise(|| ErrorKind::Store)? else {
            return Ok(None);
        };
        HashNames::decode(&value).map(Some).or_raise(|| ErrorKind::HashNames)
    }

    /// Look up a content record.
    pub fn get(&mut self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.store.get(key.as_ref()).or_raise(|| ErrorKind::Store)
    }
}

/// Builds a new database.
///
/// Content records are added first; [`finish`](Self::finish) appends the
/// version header and finalises the store.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use vigil_db::{Database, DatabaseBuilder, DB_VERSION};
/// use vigil_hash::lookup;
///
/// let sha256 = lookup("sha256").unwrap();
/// let mut builder = DatabaseBuilder::new(Cursor::new(Vec::new())).unwrap();
/// builder.add("/etc/hostname", b"...").unwrap();
/// let file = builder.finish(sha256, None).unwrap();
///
/// let mut db = Database::open(file).unwrap();
/// assert_eq!(db.version(), Some(DB_VERSION));
/// assert_eq!(db.hash_names().unwrap().unwrap().new.name(), "sha256");
/// ```
pub struct DatabaseBuilder<W: Write + Seek> {
    store: CdbMake<W>,
}

impl DatabaseBuilder<File> {
    /// Create (or truncate) a database file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let store = CdbMake::create(path).or_raise(|| ErrorKind::Store)?;
        Ok(Self { store })
    }
}

impl<W: Write + Seek> DatabaseBuilder<W> {
    pub fn new(writer: W) -> Result<Self> {
        let store = CdbMake::new(writer).or_raise(|| ErrorKind::Store)?;
        Ok(Self { store })
    }

    /// Add a content record.
    ///
    /// The header keys are reserved and rejected here.
    pub fn add(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        if key == VERSION_KEY || key == HASHNAMES_KEY {
            exn::bail!(ErrorKind::ReservedKey(String::from_utf8_lossy(key).into_owned()));
        }
        self.store.add(key, value.as_ref()).or_raise(|| ErrorKind::Store)
    }

    /// Number of content records added so far.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Write the header and finalise the store.
    #[instrument(level = "debug", skip_all, fields(records = self.store.len()))]
    pub fn finish(mut self, primary: &HashAlgorithm, secondary: Option<&HashAlgorithm>) -> Result<W> {
        write_db_version(&mut self.store, primary, secondary)?;
        self.store.finish().or_raise(|| ErrorKind::Store)
    }
}
