//! Persisted configuration: the selected backend plus one opaque settings
//! map per backend name. The core never interprets those maps beyond
//! handing them to `BackendRegistry::create`.

use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::BackendConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub selected_backend: Option<String>,
    #[serde(default)]
    pub backends: std::collections::BTreeMap<String, BackendConfig>,
}

impl Config {
    /// Settings for one backend; empty map when never configured.
    pub fn backend(&self, name: &str) -> BackendConfig {
        self.backends.get(name).cloned().unwrap_or_default()
    }

    pub fn is_configured(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }
}

/// Config file path, creating the directory if necessary.
pub fn path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join("quill");
    std::fs::create_dir_all(&base).map_err(ConfigError::Write)?;
    Ok(base.join("config.json"))
}

/// Load from disk; a missing file is the default configuration.
pub fn load() -> Result<Config, ConfigError> {
    load_from(&path()?)
}

pub(crate) fn load_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::Read(e)),
    };
    serde_json::from_slice(&bytes).map_err(ConfigError::Parse)
}

/// Write atomically: serialize into a temp file in the same directory, then
/// persist over the destination.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_to(&path()?, config)
}

pub(crate) fn save_to(path: &std::path::Path, config: &Config) -> Result<(), ConfigError> {
    let dir = path.parent().ok_or(ConfigError::NoConfigDir)?;
    let json = serde_json::to_vec_pretty(config).map_err(ConfigError::Parse)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(ConfigError::Write)?;
    tmp.write_all(&json).map_err(ConfigError::Write)?;
    tmp.persist(path)
        .map_err(|e| ConfigError::Write(e.error))?;
    Ok(())
}
