//! The `hashnames` record codec.
//!
//! A database remembers which algorithm(s) fingerprinted it as either `new`
//! or `new:old`. The segment before the delimiter is always the current
//! algorithm and the segment after it is the legacy one; comparisons of
//! current against historical fingerprints depend on that order.

use crate::HashAlgorithm;
use crate::error::{ErrorKind, Result};
use crate::registry::lookup;
use exn::ResultExt;

/// Separates the new algorithm name from the old one.
pub const DELIMITER: u8 = b':';

/// The algorithm(s) a database was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashNames {
    /// The current algorithm, always present.
    pub new: &'static HashAlgorithm,
    /// The previous algorithm, kept while a database is migrated between
    /// algorithms. Never the same name as `new`.
    pub old: Option<&'static HashAlgorithm>,
}

impl HashNames {
    /// Pair two algorithms, dropping `secondary` if it has the same name as
    /// `primary`.
    pub fn new(primary: &'static HashAlgorithm, secondary: Option<&'static HashAlgorithm>) -> Self {
        Self {
            new: primary,
            old: distinct(primary, secondary),
        }
    }

    /// Encode as stored in the `hashnames` record.
    pub fn encode(&self) -> Result<String> {
        encode(self.new, self.old)
    }

    /// Decode a stored `hashnames` record.
    pub fn decode(bytes: impl AsRef<[u8]>) -> Result<Self> {
        decode(bytes.as_ref())
    }
}

fn distinct<'a>(primary: &HashAlgorithm, secondary: Option<&'a HashAlgorithm>) -> Option<&'a HashAlgorithm> {
    secondary.filter(|s| s.name() != primary.name())
}

/// Encode one or two algorithms as `primary` or `primary:secondary`.
///
/// A `secondary` with the same name as `primary` is redundant and dropped.
/// The buffer is reserved fallibly, so running out of memory is reported as
/// [`ErrorKind::Allocation`] rather than aborting the process.
///
/// # Examples
///
/// ```
/// use vigil_hash::{codec::encode, lookup};
///
/// let sha256 = lookup("sha256").unwrap();
/// let sha1 = lookup("sha1").unwrap();
/// assert_eq!(encode(sha256, Some(sha1)).unwrap(), "sha256:sha1");
/// assert_eq!(encode(sha256, Some(sha256)).unwrap(), "sha256");
/// assert_eq!(encode(sha256, None).unwrap(), "sha256");
/// ```
pub fn encode(primary: &HashAlgorithm, secondary: Option<&HashAlgorithm>) -> Result<String> {
    let secondary = distinct(primary, secondary);
    let len = primary.name().len() + secondary.map_or(0, |s| s.name().len() + 1);
    let mut buffer = String::new();
    buffer.try_reserve_exact(len).or_raise(|| ErrorKind::Allocation)?;
    buffer.push_str(primary.name());
    if let Some(secondary) = secondary {
        buffer.push(char::from(DELIMITER));
        buffer.push_str(secondary.name());
    }
    Ok(buffer)
}

/// Decode a `hashnames` value into `(new, old)` algorithms.
///
/// The whole value is validated: at most one delimiter is allowed, and every
/// segment must name a registered algorithm. The reported span is exactly the
/// one that failed, bounded by the input length. A stored `A:A` decodes the
/// same as `A`.
///
/// # Examples
///
/// ```
/// use vigil_hash::codec::decode;
///
/// let names = decode(b"sha256:sha1").unwrap();
/// assert_eq!(names.new.name(), "sha256");
/// assert_eq!(names.old.map(|alg| alg.name()), Some("sha1"));
///
/// assert!(decode(b"sha256:sha1:sha512").is_err());
/// ```
pub fn decode(bytes: &[u8]) -> Result<HashNames> {
    let Some(delim) = bytes.iter().position(|&b| b == DELIMITER) else {
        let new = resolve(bytes)?;
        return Ok(HashNames { new, old: None });
    };
    let (head, tail) = (&bytes[..delim], &bytes[delim + 1..]);
    if tail.contains(&DELIMITER) {
        let value = String::from_utf8_lossy(bytes).into_owned();
        tracing::error!(value = %value, "invalid hashnames value");
        exn::bail!(ErrorKind::MalformedHashNames(value));
    }
    let old = resolve(tail)?;
    let new = resolve(head)?;
    Ok(HashNames::new(new, Some(old)))
}

fn resolve(span: &[u8]) -> Result<&'static HashAlgorithm> {
    match lookup(span) {
        Some(alg) => Ok(alg),
        None => {
            let name = String::from_utf8_lossy(span).into_owned();
            tracing::error!(name = %name, "unknown hash type");
            exn::bail!(ErrorKind::UnknownHashAlgorithm(name))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms;
    use rstest::rstest;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// Formatted log output collected while running a closure.
    #[derive(Clone, Default)]
    struct Logs(Arc<Mutex<Vec<u8>>>);

    impl Write for Logs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` under a capturing subscriber and return the `ERROR` lines.
    fn errors_logged<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        let logs = Logs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        let errors = output.lines().filter(|line| line.starts_with("ERROR")).map(str::to_string).collect();
        (value, errors)
    }

    fn alg(name: &str) -> &'static HashAlgorithm {
        lookup(name).unwrap()
    }

    #[rstest]
    #[case("sha256", Some("sha1"), "sha256:sha1")]
    #[case("sha1", Some("sha256"), "sha1:sha256")]
    #[case("blake3", Some("sha512"), "blake3:sha512")]
    #[case("sha256", None, "sha256")]
    #[case("sha256", Some("sha256"), "sha256")]
    fn test_encode(#[case] primary: &str, #[case] secondary: Option<&str>, #[case] expected: &str) {
        let encoded = encode(alg(primary), secondary.map(alg)).unwrap();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_length() {
        for a in algorithms() {
            assert_eq!(encode(a, None).unwrap().len(), a.name().len());
            for b in algorithms().filter(|b| b.name() != a.name()) {
                let encoded = encode(a, Some(b)).unwrap();
                assert_eq!(encoded.len(), a.name().len() + b.name().len() + 1);
                assert_eq!(encoded.matches(':').count(), 1);
            }
        }
    }

    #[test]
    fn test_dedup_law() {
        for a in algorithms() {
            let same = encode(a, Some(a)).unwrap();
            assert_eq!(same, encode(a, None).unwrap());
            assert_eq!(same, a.name());
            assert_eq!(HashNames::new(a, Some(a)).old, None);
        }
    }

    #[test]
    fn test_round_trip() {
        for a in algorithms() {
            let single = decode(encode(a, None).unwrap().as_bytes()).unwrap();
            assert_eq!(single, HashNames { new: a, old: None });
            for b in algorithms().filter(|b| b.name() != a.name()) {
                let pair = decode(encode(a, Some(b)).unwrap().as_bytes()).unwrap();
                assert!(std::ptr::eq(pair.new, a));
                assert!(std::ptr::eq(pair.old.unwrap(), b));
            }
        }
    }

    #[rstest]
    #[case(b"sha256:sha1:sha512".as_slice())]
    #[case(b"a:b:c".as_slice())]
    #[case(b"sha256::".as_slice())]
    #[case(b"::".as_slice())]
    fn test_decode_malformed(#[case] value: &[u8]) {
        let err = decode(value).unwrap_err();
        let expected = String::from_utf8_lossy(value).into_owned();
        assert_eq!(*err, ErrorKind::MalformedHashNames(expected));
    }

    #[rstest]
    #[case(b"unknown_algo".as_slice(), "unknown_algo")]
    #[case(b"sha256:unknown_algo".as_slice(), "unknown_algo")]
    #[case(b"unknown_algo:sha256".as_slice(), "unknown_algo")]
    // The old segment is resolved first.
    #[case(b"first:second".as_slice(), "second")]
    #[case(b"sha256:".as_slice(), "")]
    #[case(b":sha1".as_slice(), "")]
    #[case(b"".as_slice(), "")]
    fn test_decode_unknown(#[case] value: &[u8], #[case] span: &str) {
        let err = decode(value).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownHashAlgorithm(span.to_string()));
    }

    #[rstest]
    #[case(b"sha256:sha256".as_slice(), "sha256")]
    #[case(b"sha1:sha1".as_slice(), "sha1")]
    fn test_decode_same_name_twice(#[case] value: &[u8], #[case] name: &str) {
        let names = decode(value).unwrap();
        assert_eq!(names.new.name(), name);
        assert!(names.old.is_none());
        assert_eq!(names, decode(name.as_bytes()).unwrap());
    }

    #[rstest]
    #[case(b"sha256:unknown_algo".as_slice(), "unknown_algo")]
    #[case(b"unknown_algo".as_slice(), "unknown_algo")]
    #[case(b"sha256:sha1:sha512".as_slice(), "sha256:sha1:sha512")]
    fn test_decode_failure_logs_span(#[case] value: &[u8], #[case] span: &str) {
        let (result, errors) = errors_logged(|| decode(value));
        assert!(result.is_err());
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains(span), "{errors:?}");
    }

    #[test]
    fn test_decode_success_logs_no_error() {
        let (result, errors) = errors_logged(|| decode(b"sha256:sha1"));
        assert!(result.is_ok());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_decode_is_bounded_by_length() {
        // Only the given span is considered, whatever follows it in memory.
        let record = b"sha256:sha1sha512";
        let names = decode(&record[..11]).unwrap();
        assert_eq!(names.new.name(), "sha256");
        assert_eq!(names.old.unwrap().name(), "sha1");
    }

    #[test]
    fn test_decode_discarding_old() {
        // Callers that only care about the current algorithm still get the
        // old segment validated.
        let HashNames { new, .. } = HashNames::decode("sha512:sha1").unwrap();
        assert_eq!(new.name(), "sha512");
        assert!(HashNames::decode("sha512:nope").is_err());
    }

    #[test]
    fn test_decode_non_utf8() {
        let err = decode(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownHashAlgorithm(name) if name == "\u{fffd}\u{fffd}"));
    }

    #[test]
    fn test_hash_names_encode() {
        let names = HashNames::new(alg("sha256"), Some(alg("sha1")));
        assert_eq!(names.encode().unwrap(), "sha256:sha1");
        assert_eq!(HashNames::decode(names.encode().unwrap()).unwrap(), names);
    }
}
