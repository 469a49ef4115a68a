use crate::error::{ErrorKind, Result};
use crate::{HEADER_LEN, RecordWriter, TABLE_COUNT, hash};
use exn::{OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::instrument;

/// Builds a constant database, one record at a time.
///
/// Records are streamed to the writer as they are added; only the hash and
/// position of each record is kept in memory until [`finish`](Self::finish)
/// writes the hash tables and fills in the header.
pub struct CdbMake<W: Write + Seek> {
    writer: BufWriter<W>,
    position: u32,
    records: usize,
    buckets: Vec<Vec<(u32, u32)>>,
}

impl CdbMake<File> {
    /// Create (or truncate) a database file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::new(file)
    }
}

impl<W: Write + Seek> CdbMake<W> {
    /// Start a database at the beginning of `writer`.
    pub fn new(mut writer: W) -> Result<Self> {
        writer.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        let mut writer = BufWriter::new(writer);
        // Placeholder, rewritten by finish().
        writer.write_all(&[0u8; HEADER_LEN as usize]).or_raise(|| ErrorKind::Io)?;
        Ok(Self {
            writer,
            position: HEADER_LEN as u32,
            records: 0,
            buckets: vec![Vec::new(); TABLE_COUNT],
        })
    }

    /// Number of records added so far.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    fn advance(&mut self, by: u64) -> Result<()> {
        self.position = u64::from(self.position)
            .checked_add(by)
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_raise(|| ErrorKind::TooLarge)?;
        Ok(())
    }

    fn write_pair(&mut self, a: u32, b: u32) -> Result<()> {
        self.writer.write_all(&a.to_le_bytes()).or_raise(|| ErrorKind::Io)?;
        self.writer.write_all(&b.to_le_bytes()).or_raise(|| ErrorKind::Io)
    }

    /// Write the hash tables and header, returning the underlying writer.
    #[instrument(level = "debug", skip(self), fields(records = self.records))]
    pub fn finish(mut self) -> Result<W> {
        let mut header = Vec::with_capacity(TABLE_COUNT);
        let buckets = std::mem::take(&mut self.buckets);
        for bucket in buckets {
            let slots = bucket.len() * 2;
            let mut table = vec![(0u32, 0u32); slots];
            for (hashed, record) in bucket {
                let mut slot = (hashed >> 8) as usize % slots;
                while table[slot].1 != 0 {
                    slot = (slot + 1) % slots;
                }
                table[slot] = (hashed, record);
            }
            let slots = u32::try_from(slots).or_raise(|| ErrorKind::TooLarge)?;
            header.push((self.position, slots));
            for (hashed, record) in table {
                self.write_pair(hashed, record)?;
            }
            self.advance(u64::from(slots) * 8)?;
        }
        self.writer.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        for (position, slots) in header {
            self.write_pair(position, slots)?;
        }
        let mut writer = self.writer.into_inner().map_err(|e| e.into_error()).or_raise(|| ErrorKind::Io)?;
        writer.flush().or_raise(|| ErrorKind::Io)?;
        Ok(writer)
    }
}

impl<W: Write + Seek> RecordWriter for CdbMake<W> {
    fn add(&mut self, key: &[u8], data: &[u8]) -> Result<()> {
        let key_len = u32::try_from(key.len()).or_raise(|| ErrorKind::TooLarge)?;
        let data_len = u32::try_from(data.len()).or_raise(|| ErrorKind::TooLarge)?;
        let record = self.position;
        self.advance(8 + u64::from(key_len) + u64::from(data_len))?;
        self.write_pair(key_len, data_len)?;
        self.writer.write_all(key).or_raise(|| ErrorKind::Io)?;
        self.writer.write_all(data).or_raise(|| ErrorKind::Io)?;
        let hashed = hash(key);
        self.buckets[(hashed & 0xff) as usize].push((hashed, record));
        self.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cdb, RecordReader};
    use std::io::Cursor;

    #[test]
    fn test_layout() {
        let mut make = CdbMake::new(Cursor::new(Vec::new())).unwrap();
        make.add(b"k", b"vv").unwrap();
        assert_eq!(make.len(), 1);
        let bytes = make.finish().unwrap().into_inner();
        // header + record (8 + 1 + 2) + one table of two slots
        assert_eq!(bytes.len(), 2048 + 11 + 16);
        assert_eq!(&bytes[2048..2059], b"\x01\0\0\0\x02\0\0\0kvv");
        let table = (hash(b"k") & 0xff) as usize * 8;
        assert_eq!(&bytes[table..table + 4], &2059u32.to_le_bytes());
        assert_eq!(&bytes[table + 4..table + 8], &2u32.to_le_bytes());
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.cdb");
        let mut make = CdbMake::create(&path).unwrap();
        assert!(make.is_empty());
        make.add(b"hello", b"world").unwrap();
        make.finish().unwrap();
        let mut cdb = Cdb::open(&path).unwrap();
        assert!(cdb.find(b"hello").unwrap());
        assert_eq!(cdb.data_len(), 5);
    }

    #[test]
    fn test_failing_writer() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        impl Seek for Full {
            fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
                Ok(0)
            }
        }
        // The header placeholder is buffered, so the failure shows up on finish.
        let result = CdbMake::new(Full).and_then(|make| make.finish());
        let err = result.err().unwrap();
        assert_eq!(*err, ErrorKind::Io);
    }
}
