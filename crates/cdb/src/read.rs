use crate::error::{ErrorKind, Result};
use crate::{HEADER_LEN, RecordReader, TABLE_COUNT, hash};
use exn::ResultExt;
use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::instrument;

/// A position and length, both as stored in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Span {
    position: u32,
    len: u32,
}

/// Read-only handle on a constant database.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use vigil_cdb::{Cdb, CdbMake, RecordWriter};
///
/// let mut make = CdbMake::new(Cursor::new(Vec::new())).unwrap();
/// make.add(b"key", b"value").unwrap();
/// let file = make.finish().unwrap();
///
/// let mut cdb = Cdb::init(file).unwrap();
/// assert_eq!(cdb.get(b"key").unwrap().as_deref(), Some(b"value".as_slice()));
/// assert_eq!(cdb.get(b"nope").unwrap(), None);
/// ```
pub struct Cdb<R> {
    reader: R,
    size: u64,
    tables: Vec<Span>,
    found: Option<(u64, u32)>,
}

impl Cdb<File> {
    /// Open a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::init(file)
    }
}

impl<R: Read + Seek> Cdb<R> {
    /// Attach to a database, reading and checking its header.
    #[instrument(level = "debug", skip(reader), fields(size))]
    pub fn init(mut reader: R) -> Result<Self> {
        let size = reader.seek(SeekFrom::End(0)).or_raise(|| ErrorKind::Io)?;
        tracing::Span::current().record("size", size);
        if size < HEADER_LEN {
            exn::bail!(ErrorKind::Truncated);
        }
        let mut cdb = Self { reader, size, tables: Vec::with_capacity(TABLE_COUNT), found: None };
        let mut header = [0u8; HEADER_LEN as usize];
        cdb.read(&mut header, 0)?;
        for pair in header.chunks_exact(8) {
            let table = Span { position: le_u32(&pair[..4]), len: le_u32(&pair[4..]) };
            if table.len > 0 {
                let start = u64::from(table.position);
                let end = start + u64::from(table.len) * 8;
                if start < HEADER_LEN || end > size {
                    exn::bail!(ErrorKind::Corrupt("hash table out of bounds"));
                }
            }
            cdb.tables.push(table);
        }
        Ok(cdb)
    }

    /// Find a record and read all of its data.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if !self.find(key)? {
            return Ok(None);
        }
        let mut data = vec![0u8; self.data_len() as usize];
        let position = self.data_position();
        self.read(&mut data, position)?;
        Ok(Some(data))
    }

    fn read_pair(&mut self, position: u64) -> Result<(u32, u32)> {
        let mut buf = [0u8; 8];
        self.read(&mut buf, position)?;
        Ok((le_u32(&buf[..4]), le_u32(&buf[4..])))
    }

    fn key_matches(&mut self, record: u64, key: &[u8]) -> Result<bool> {
        let (key_len, data_len) = self.read_pair(record)?;
        if key_len as usize != key.len() {
            return Ok(false);
        }
        let data = record + 8 + u64::from(key_len);
        if data + u64::from(data_len) > self.size {
            exn::bail!(ErrorKind::Corrupt("record out of bounds"));
        }
        let mut stored = vec![0u8; key.len()];
        self.read(&mut stored, record + 8)?;
        if stored != key {
            return Ok(false);
        }
        self.found = Some((data, data_len));
        Ok(true)
    }
}

impl<R: Read + Seek> RecordReader for Cdb<R> {
    fn find(&mut self, key: &[u8]) -> Result<bool> {
        self.found = None;
        let hashed = hash(key);
        let table = self.tables[(hashed & 0xff) as usize];
        if table.len == 0 {
            return Ok(false);
        }
        let start = (hashed >> 8) % table.len;
        for probe in 0..table.len {
            let slot = (start + probe) % table.len;
            let (slot_hash, record) = self.read_pair(u64::from(table.position) + u64::from(slot) * 8)?;
            if record == 0 {
                return Ok(false);
            }
            if slot_hash == hashed && self.key_matches(u64::from(record), key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn data_position(&self) -> u64 {
        self.found.map_or(0, |(position, _)| position)
    }

    fn data_len(&self) -> u32 {
        self.found.map_or(0, |(_, len)| len)
    }

    fn read(&mut self, buf: &mut [u8], position: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position)).or_raise(|| ErrorKind::Io)?;
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::UnexpectedEof => Err(e).or_raise(|| ErrorKind::Truncated),
            Err(e) => Err(e).or_raise(|| ErrorKind::Io),
        }
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
