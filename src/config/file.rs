//! Layered configuration file discovery.
//!
//! Candidate files are searched in order and only the first one found is
//! loaded; files are never merged with each other.

use super::env::Environment;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Directory name that makes `./.env` eligible as a project-local config file
pub const PROJECT_DIR_NAME: &str = "docker-ctp";

/// Config file name inside every search location
pub const CONFIG_FILE_NAME: &str = ".env";

/// System-wide config file
pub const SYSTEM_CONFIG_PATH: &str = "/etc/docker-ctp/.env";

/// User-level config file, also the target of `--generate-config`.
pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("docker-ctp").join(CONFIG_FILE_NAME)
}

/// Ordered list of candidate configuration files
#[derive(Debug, Clone, Default)]
pub struct ConfigSearch {
    candidates: Vec<PathBuf>,
}

impl ConfigSearch {
    /// Standard search order:
    ///
    /// 1. `./.env`, only when the working directory is named `docker-ctp`
    /// 2. `~/.config/docker-ctp/.env`
    /// 3. `~/.docker-ctp/.env`
    /// 4. `/etc/docker-ctp/.env`
    pub fn standard(cwd: &Path, home: Option<&Path>) -> Self {
        let mut candidates = Vec::new();

        if cwd.file_name().is_some_and(|name| name == PROJECT_DIR_NAME) {
            candidates.push(cwd.join(CONFIG_FILE_NAME));
        } else {
            log::debug!(
                "Not considering {} (working directory is not named '{}')",
                cwd.join(CONFIG_FILE_NAME).display(),
                PROJECT_DIR_NAME
            );
        }

        if let Some(home) = home {
            candidates.push(user_config_path(home));
            candidates.push(home.join(".docker-ctp").join(CONFIG_FILE_NAME));
        }
        candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));

        Self { candidates }
    }

    /// Search list made of exactly `candidates`.
    pub fn from_paths(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Candidate paths in search order
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that is an existing regular file.
    pub fn find(&self) -> Option<&Path> {
        self.candidates
            .iter()
            .map(PathBuf::as_path)
            .find(|p| p.is_file())
    }
}

/// Values loaded from one `key="value"` configuration file
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    values: Environment,
}

impl ConfigFile {
    /// Loads the first file found by `search`, if any.
    pub fn discover(search: &ConfigSearch) -> Result<Option<Self>> {
        match search.find() {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::load(path).map(Some)
            }
            None => {
                log::debug!("No configuration file found; using flags, environment and defaults");
                Ok(None)
            }
        }
    }

    /// Parses `path`. Keys are case-insensitive and stored uppercased.
    pub fn load(path: &Path) -> Result<Self> {
        let unreadable = |reason: String| ConfigError::ConfigFile {
            path: path.display().to_string(),
            reason,
        };

        let iter = dotenvy::from_path_iter(path).map_err(|e| unreadable(e.to_string()))?;
        let mut pairs = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| unreadable(e.to_string()))?;
            pairs.push((key.trim().to_ascii_uppercase(), value));
        }

        Ok(Self {
            path: path.to_path_buf(),
            values: pairs.into_iter().collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blank value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key)
    }

    /// First non-blank value among `keys`, with the key that supplied it.
    pub fn first_of<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &str)> {
        self.values.first_of(keys)
    }

    /// Every key in the file, as an environment snapshot
    pub fn values(&self) -> &Environment {
        &self.values
    }
}
