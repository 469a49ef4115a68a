//! Subcommand implementations.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use vigil_config::Config;
use vigil_db::{Database, DatabaseBuilder, fatal};
use vigil_hash::{HashAlgorithm, algorithms as registered};

fn resolve(name: &str) -> Result<&'static HashAlgorithm> {
    HashAlgorithm::by_name(name).or_raise(|| ErrorKind::UnknownHash(name.to_string()))
}

pub fn init(
    config: &Config,
    hash: Option<&str>,
    old_hash: Option<&str>,
    force: bool,
    database: Option<PathBuf>,
) -> Result<()> {
    let (mut primary, mut secondary) = config.hashes().or_raise(|| ErrorKind::Config)?;
    if let Some(name) = hash {
        primary = resolve(name)?;
    }
    if let Some(name) = old_hash {
        secondary = Some(resolve(name)?);
    }
    let path = database.unwrap_or_else(|| config.database.clone());
    if path.exists() && !force {
        exn::bail!(ErrorKind::AlreadyExists(path));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Build)?;
    }
    let builder = DatabaseBuilder::create(&path).or_raise(|| ErrorKind::Build)?;
    builder.finish(primary, secondary).or_raise(|| ErrorKind::Build)?;
    tracing::info!(path = %path.display(), %primary, "created database");
    Ok(())
}

pub fn info(config: &Config, database: Option<PathBuf>) -> Result<()> {
    let path = database.unwrap_or_else(|| config.database.clone());
    let mut db = Database::open_path(&path).unwrap_or_else(|err| fatal::terminate(err));
    println!("database: {}", path.display());
    match db.version() {
        Some(version) => println!("version:  {version}"),
        None => println!("version:  unversioned"),
    }
    if !db.is_compatible() {
        exn::bail!(ErrorKind::Incompatible);
    }
    match db.hash_names().or_raise(|| ErrorKind::Read)? {
        Some(names) => {
            println!("hash:     {}", names.new);
            if let Some(old) = names.old {
                println!("old hash: {old}");
            }
        },
        None => println!("hash:     unknown"),
    }
    Ok(())
}

pub fn get(database: &Path, key: &str) -> Result<()> {
    let mut db = Database::open_path(database).unwrap_or_else(|err| fatal::terminate(err));
    match db.get(key).or_raise(|| ErrorKind::Read)? {
        Some(value) => println!("{}", hex::encode(value)),
        None => tracing::warn!(key, "no such record"),
    }
    Ok(())
}

pub fn algorithms(config: &Config) {
    for alg in registered() {
        let marker = if alg.name() == config.hash { " (configured)" } else { "" };
        println!("{:<8} {:>3} bytes{marker}", alg.name(), alg.digest_len());
    }
}
