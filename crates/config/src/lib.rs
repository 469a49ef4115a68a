//! Layered configuration for vigil.
//!
//! Sources are merged in order, later ones winning:
//! 1. Built-in defaults.
//! 2. A configuration file: either the one given explicitly, or every
//!    `config.{toml,yaml,yml,json}` found in the platform config directory.
//! 3. Environment variables prefixed with `VIGIL_` (e.g. `VIGIL_HASH=sha512`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vigil_hash::{DEFAULT_ALGORITHM, HashAlgorithm};

const ENV_PREFIX: &str = "VIGIL_";
const FILE_NAMES: [&str; 4] = ["config.toml", "config.yaml", "config.yml", "config.json"];
const DATABASE_FILE: &str = "vigil.db";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "vigil")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database used when a command isn't given one.
    pub database: PathBuf,
    /// Name of the algorithm new databases are built with.
    pub hash: String,
    /// Name of a second algorithm to record alongside `hash`, while
    /// migrating from one to the other.
    pub old_hash: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let database = match project_dirs() {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        };
        Self {
            database,
            hash: DEFAULT_ALGORITHM.to_string(),
            old_hash: None,
        }
    }
}

impl Config {
    /// Load configuration from every source, then validate it.
    #[tracing::instrument(level = "debug")]
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                let found = project_dirs()
                    .map(|dirs| FILE_NAMES.iter().map(|name| dirs.config_dir().join(name)).collect::<Vec<_>>())
                    .unwrap_or_default();
                for path in found.iter().filter(|path| path.is_file()) {
                    figment = merge_file(figment, path)?;
                }
            },
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ErrorKind::Load(e.to_string()))?;
        config.hashes()?;
        Ok(config)
    }

    /// Resolve the configured algorithm names through the registry.
    pub fn hashes(&self) -> Result<(&'static HashAlgorithm, Option<&'static HashAlgorithm>)> {
        let resolve = |field: &'static str, name: &str| {
            vigil_hash::lookup(name).ok_or_else(|| ErrorKind::InvalidValue { field, value: name.to_string() })
        };
        let primary = resolve("hash", &self.hash)?;
        let secondary = self.old_hash.as_deref().map(|name| resolve("old_hash", name)).transpose()?;
        Ok((primary, secondary))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    tracing::debug!(path = %path.display(), "merging configuration file");
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
