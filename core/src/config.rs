//! Configuration models and loaders for the inspector.

use crate::store::{read_source, DataStore, MatchMode};
use crate::{DuplicatePolicy, Error, Result};
use std::path::{Path, PathBuf};

/// File name looked up inside the data directory when no config path is given.
pub const CONFIG_FILE_NAME: &str = "buildsys.toml";

/// Settings shared by the CLI and library callers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tasks document, relative to the data directory.
    pub tasks_file: PathBuf,
    /// Builds document, relative to the data directory.
    pub builds_file: PathBuf,
    /// How task and build names are looked up.
    pub match_mode: MatchMode,
    /// Whether repeated tasks stay in resolved lists.
    pub duplicates: DuplicatePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_file: PathBuf::from("tasks.yaml"),
            builds_file: PathBuf::from("builds.yaml"),
            match_mode: MatchMode::default(),
            duplicates: DuplicatePolicy::default(),
        }
    }
}

impl Config {
    /// Tasks document inside `dir`.
    pub fn tasks_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.tasks_file)
    }

    /// Builds document inside `dir`.
    pub fn builds_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.builds_file)
    }

    /// Load both documents found under `dir` with this config's lookup policy.
    pub fn load_store(&self, dir: &Path) -> Result<DataStore> {
        let store = DataStore::load(self.tasks_path(dir), self.builds_path(dir))?;
        Ok(store.with_match_mode(self.match_mode))
    }
}

/// Load configuration from the provided path.
///
/// Expected TOML keys, all optional:
/// - `tasks_file` / `builds_file` as paths relative to the data directory
/// - `match_mode` as `"exact"` or `"substring"`
/// - `duplicates` as `"keep"` or `"first-occurrence"`
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let text = read_source(path)?;
    toml::from_str(&text).map_err(|err| Error::Config {
        path: path.to_path_buf(),
        reason: err.message().to_string(),
    })
}

/// Load `dir/buildsys.toml` when present, defaults otherwise.
pub fn discover_config(dir: impl AsRef<Path>) -> Result<Config> {
    let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        tracing::debug!(path = %candidate.display(), "using config file");
        load_config(candidate)
    } else {
        Ok(Config::default())
    }
}
