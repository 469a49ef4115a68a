//! Hash algorithm registry.
//!
//! Descriptors live in a static table for the lifetime of the process, so
//! everything handed out by [`lookup`] is a `&'static` borrow. Nothing here
//! allocates a descriptor or copies one out of the table.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{Read, Write};

/// Name of the algorithm used when nothing else is configured.
pub const DEFAULT_ALGORITHM: &str = "sha256";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Kind {
    Sha1,
    Sha256,
    Sha512,
    Blake3,
}

/// An entry in the hash registry.
///
/// Two descriptors are the same algorithm if and only if their names are
/// equal; the name is the only part of a descriptor that is ever persisted.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct HashAlgorithm {
    name: &'static str,
    digest_len: usize,
    kind: Kind,
}

// Names must never contain ':', it delimits the hashnames record.
const TABLE: [HashAlgorithm; 4] = [
    HashAlgorithm { name: "sha1", digest_len: 20, kind: Kind::Sha1 },
    HashAlgorithm { name: "sha256", digest_len: 32, kind: Kind::Sha256 },
    HashAlgorithm { name: "sha512", digest_len: 64, kind: Kind::Sha512 },
    HashAlgorithm { name: "blake3", digest_len: 32, kind: Kind::Blake3 },
];

static ALGORITHMS: [HashAlgorithm; 4] = TABLE;

// Fails to compile if DEFAULT_ALGORITHM is not in the table.
const DEFAULT_INDEX: usize = position(DEFAULT_ALGORITHM);

const fn position(name: &str) -> usize {
    let name = name.as_bytes();
    let mut i = 0;
    while i < TABLE.len() {
        let candidate = TABLE[i].name.as_bytes();
        if candidate.len() == name.len() {
            let mut j = 0;
            while j < name.len() && candidate[j] == name[j] {
                j += 1;
            }
            if j == name.len() {
                return i;
            }
        }
        i += 1;
    }
    panic!("algorithm is not registered");
}

/// Iterate over every registered algorithm, in registration order.
pub fn algorithms() -> impl Iterator<Item = &'static HashAlgorithm> {
    ALGORITHMS.iter()
}

/// Find a registered algorithm by its exact name.
///
/// The name is compared byte-for-byte: no case folding, no trimming, and no
/// assumption that the input is UTF-8 or null-terminated.
///
/// # Examples
///
/// ```
/// use vigil_hash::lookup;
///
/// assert_eq!(lookup(b"sha256").map(|alg| alg.name()), Some("sha256"));
/// assert!(lookup(b"SHA256").is_none());
/// assert!(lookup(b"").is_none());
/// ```
pub fn lookup(name: impl AsRef<[u8]>) -> Option<&'static HashAlgorithm> {
    let name = name.as_ref();
    ALGORITHMS.iter().find(|alg| alg.name.as_bytes() == name)
}

impl HashAlgorithm {
    /// Like [`lookup`], but an unknown name is an error.
    pub fn by_name(name: &str) -> Result<&'static Self> {
        match lookup(name) {
            Some(alg) => Ok(alg),
            None => exn::bail!(ErrorKind::UnknownHashAlgorithm(name.to_string())),
        }
    }

    /// The algorithm used when nothing else is configured.
    pub fn default_algorithm() -> &'static Self {
        &ALGORITHMS[DEFAULT_INDEX]
    }

    /// Canonical name, as stored in the database.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Length of a digest in bytes.
    #[inline]
    #[must_use]
    pub fn digest_len(&self) -> usize {
        self.digest_len
    }

    /// Start an incremental hash.
    pub fn hasher(&self) -> Hasher {
        match self.kind {
            Kind::Sha1 => Hasher::Sha1(Sha1::new()),
            Kind::Sha256 => Hasher::Sha256(Sha256::new()),
            Kind::Sha512 => Hasher::Sha512(Sha512::new()),
            Kind::Blake3 => Hasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Hash a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_hash::HashAlgorithm;
    ///
    /// let sha1 = HashAlgorithm::by_name("sha1").unwrap();
    /// assert_eq!(sha1.digest(b"abc").len(), sha1.digest_len());
    /// ```
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash everything a reader yields until EOF.
    #[tracing::instrument(skip(self, reader), fields(algorithm = self.name))]
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<Vec<u8>> {
        let mut hasher = self.hasher();
        std::io::copy(&mut reader, &mut hasher).or_raise(|| ErrorKind::Io)?;
        Ok(hasher.finalize())
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

impl AsRef<str> for HashAlgorithm {
    fn as_ref(&self) -> &str {
        self.name
    }
}

/// Incremental hash state for one of the registered algorithms.
///
/// Implements [`Write`] so it can be the sink of [`std::io::copy`].
pub enum Hasher {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    // The BLAKE3 state is much larger than the others.
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(h) => Digest::update(h, data),
            Hasher::Sha256(h) => Digest::update(h, data),
            Hasher::Sha512(h) => Digest::update(h, data),
            Hasher::Blake3(h) => {
                h.update(data);
            },
        }
    }

    pub fn finalize(self) -> Vec<u8> {
        match self {
            Hasher::Sha1(h) => h.finalize().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
            Hasher::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

impl Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
