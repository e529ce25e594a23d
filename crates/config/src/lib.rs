//! Configuration loading and validation.
//!
//! Configuration is layered with `figment`: built-in defaults, then an
//! optional YAML or TOML file, then `CROSSREF_`-prefixed environment
//! variables (`CROSSREF_CACHE__EXPIRATION=30`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "CROSSREF_";
/// Extension of the cache database derived from a configuration file path.
pub const CACHE_EXTENSION: &str = "cache";
const DEFAULT_EXPIRATION_DAYS: u32 = 60;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Settings for the cross-reference cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether lookups go through the cache at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Days a cached entry stays fresh.
    #[serde(default = "default_expiration")]
    pub expiration: u32,
    /// Explicit location of the cache database.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            expiration: default_expiration(),
            path: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_expiration() -> u32 {
    DEFAULT_EXPIRATION_DAYS
}

/// Configuration together with the file it was read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loaded {
    pub config: Config,
    pub source: Option<PathBuf>,
}
impl Loaded {
    /// Location of the cache database.
    ///
    /// An explicit `cache.path` wins. Otherwise the database sits next to the
    /// configuration file, sharing its name (`config.yml` → `config.cache`).
    /// Without a configuration file it lives in the user's cache directory.
    pub fn cache_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.cache.path {
            return Ok(path.clone());
        }
        if let Some(source) = &self.source {
            return Ok(source.with_extension(CACHE_EXTENSION));
        }
        let dirs = ProjectDirs::from("", "", "crossref").ok_or_raise(|| ErrorKind::NoCacheLocation)?;
        Ok(dirs.cache_dir().join("crossref").with_extension(CACHE_EXTENSION))
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Files ending in `.yml` or `.yaml` are read as YAML, anything else as TOML.
    pub fn load(path: Option<&Path>) -> Result<Loaded> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Loading configuration from file");
            figment = match is_yaml(path) {
                true => figment.merge(Yaml::file_exact(path)),
                false => figment.merge(Toml::file_exact(path)),
            };
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(Loaded {
            config,
            source: path.map(Path::to_path_buf),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.enabled && self.cache.expiration == 0 {
            exn::bail!(ErrorKind::Invalid("cache.expiration must be at least 1 day".to_string()));
        }
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
}
