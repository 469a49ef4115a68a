//! Build databases on disk and reopen them.

use rstest::rstest;
use std::path::Path;
use vigil_cdb::{Cdb, CdbMake, RecordWriter};
use vigil_db::error::FatalKind;
use vigil_db::version::{HASHNAMES_KEY, VERSION_KEY};
use vigil_db::{DB_VERSION, Database, DatabaseBuilder, compat_db_version};
use vigil_hash::lookup;

fn build(path: &Path, primary: &str, secondary: Option<&str>) {
    let mut builder = DatabaseBuilder::create(path).unwrap();
    builder.add("/usr/bin/env", lookup(primary).unwrap().digest(b"#!")).unwrap();
    builder.finish(lookup(primary).unwrap(), secondary.map(|s| lookup(s).unwrap())).unwrap();
}

fn stored_hash_names(path: &Path) -> Vec<u8> {
    Cdb::open(path).unwrap().get(HASHNAMES_KEY).unwrap().unwrap()
}

#[rstest]
#[case("sha256", Some("sha1"), "sha256:sha1", Some("sha1"))]
#[case("sha256", None, "sha256", None)]
#[case("sha256", Some("sha256"), "sha256", None)]
#[case("blake3", Some("sha512"), "blake3:sha512", Some("sha512"))]
fn test_write_and_reopen(
    #[case] primary: &str,
    #[case] secondary: Option<&str>,
    #[case] stored: &str,
    #[case] old: Option<&str>,
) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("osec.db");
    build(&path, primary, secondary);
    assert_eq!(stored_hash_names(&path), stored.as_bytes());

    let mut db = Database::open_path(&path).unwrap();
    assert_eq!(db.version(), Some(DB_VERSION));
    let names = db.hash_names().unwrap().unwrap();
    assert_eq!(names.new.name(), primary);
    assert_eq!(names.old.map(|alg| alg.name()), old);
    assert!(db.get("/usr/bin/env").unwrap().is_some());
}

#[test]
fn test_legacy_database_has_no_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    let mut make = CdbMake::create(&path).unwrap();
    make.add(b"/usr/bin/env", b"\0\0\0\0").unwrap();
    make.finish().unwrap();

    let (_store, version) = compat_db_version(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(version, None);
}

#[test]
fn test_truncated_version_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("truncated.db");
    let mut make = CdbMake::create(&path).unwrap();
    make.add(VERSION_KEY, b"\x04\0").unwrap();
    make.finish().unwrap();

    let fatal = Database::open_path(&path).err().unwrap();
    assert_eq!(*fatal, FatalKind::VersionRead);
}

#[test]
fn test_truncated_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.db");
    build(&path, "sha256", None);
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..1024]).unwrap();

    let fatal = Database::open_path(&path).err().unwrap();
    assert_eq!(*fatal, FatalKind::StoreInit);
}
