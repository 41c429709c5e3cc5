//! Execution configuration: the single validated value handed to every stage.
//!
//! # Module Structure
//!
//! - `env` - Environment snapshot and boolean parsing
//! - `file` - Layered `.env` file discovery and loading
//! - `resolver` - CLI > environment > file > default merge
//! - `validation` - One pure validator per field

pub mod env;
pub mod file;
pub mod resolver;
pub mod validation;

pub use env::Environment;
pub use file::{ConfigFile, ConfigSearch};
pub use resolver::{CliOverrides, ConfigResolver};

use crate::error::{ConfigError, CtpError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Host prefix for the GitHub container registry
pub const GHCR_HOST: &str = "ghcr.io";

/// Target registry family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registry {
    /// Docker Hub: `username/image:tag`, default tag `latest`
    Docker,
    /// GitHub Container Registry: `ghcr.io/username/image:tag`, default tag `main`
    Github,
}

impl Registry {
    /// Literal accepted on the command line and in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Docker => "docker",
            Registry::Github => "github",
        }
    }

    /// Tag used when none is configured
    pub fn default_tag(&self) -> &'static str {
        match self {
            Registry::Docker => "latest",
            Registry::Github => "main",
        }
    }

    /// Variable holding the registry-specific username
    pub fn username_var(&self) -> &'static str {
        match self {
            Registry::Docker => "DOCKER_USERNAME",
            Registry::Github => "GITHUB_USERNAME",
        }
    }

    /// Variable holding the registry-specific default tag
    pub fn default_tag_var(&self) -> &'static str {
        match self {
            Registry::Docker => "DEFAULT_DOCKERHUB_TAG",
            Registry::Github => "DEFAULT_GITHUB_TAG",
        }
    }

    /// Token variables, primary first
    pub fn token_vars(&self) -> [&'static str; 2] {
        match self {
            Registry::Docker => ["DOCKER_TOKEN", "DOCKER_PASSWORD"],
            Registry::Github => ["GITHUB_TOKEN", "GHCR_TOKEN"],
        }
    }

    /// Server argument for `docker login`; Docker Hub is the engine default
    pub fn login_server(&self) -> Option<&'static str> {
        match self {
            Registry::Docker => None,
            Registry::Github => Some(GHCR_HOST),
        }
    }

    /// Human-readable registry name for log lines
    pub fn display_name(&self) -> &'static str {
        match self {
            Registry::Docker => "Docker Hub",
            Registry::Github => "GitHub Container Registry",
        }
    }
}

impl FromStr for Registry {
    type Err = CtpError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "docker" => Ok(Registry::Docker),
            "github" => Ok(Registry::Github),
            other => Err(ConfigError::UnknownRegistry {
                value: other.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl LogLevel {
    /// Maximum `log` level for this verbosity
    pub fn filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Quiet => log::LevelFilter::Error,
            LogLevel::Normal => log::LevelFilter::Info,
            LogLevel::Verbose => log::LevelFilter::Debug,
        }
    }
}

impl FromStr for LogLevel {
    type Err = CtpError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(LogLevel::Quiet),
            "normal" => Ok(LogLevel::Normal),
            "verbose" => Ok(LogLevel::Verbose),
            _ => Err(ConfigError::InvalidValue {
                key: "LOG_LEVEL".to_string(),
                value: value.to_string(),
                expected: "one of quiet, normal, verbose",
            }
            .into()),
        }
    }
}

/// Merged but not yet validated configuration values
#[derive(Debug, Clone)]
pub struct RawConfig {
    pub registry: Registry,
    pub username: String,
    pub image_name: String,
    pub tag: String,
    pub dockerfile_dir: PathBuf,
    pub use_cache: bool,
    pub force_rebuild: bool,
    pub dry_run: bool,
    pub cleanup_on_exit: bool,
    pub log_level: LogLevel,
}

/// Validated configuration for one run.
///
/// Built only through [`ExecutionConfig::new`], which runs every field
/// validator, so holding a value means every string field is well-formed and
/// the Dockerfile directory has been canonicalized and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    registry: Registry,
    username: String,
    image_name: String,
    tag: String,
    dockerfile_dir: PathBuf,
    use_cache: bool,
    force_rebuild: bool,
    dry_run: bool,
    cleanup_on_exit: bool,
    log_level: LogLevel,
}

impl ExecutionConfig {
    /// Validates `raw` and freezes it.
    pub fn new(raw: RawConfig) -> Result<Self> {
        let username = validation::validate_username(&raw.username)?;
        let image_name = validation::validate_image_name(&raw.image_name)?;
        let tag = validation::validate_tag(&raw.tag)?;
        let dockerfile_dir = validation::validate_dockerfile_dir(&raw.dockerfile_dir)?;

        Ok(Self {
            registry: raw.registry,
            username,
            image_name,
            tag,
            dockerfile_dir,
            use_cache: raw.use_cache,
            force_rebuild: raw.force_rebuild,
            dry_run: raw.dry_run,
            cleanup_on_exit: raw.cleanup_on_exit,
            log_level: raw.log_level,
        })
    }

    pub fn registry(&self) -> Registry {
        self.registry
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn dockerfile_dir(&self) -> &Path {
        &self.dockerfile_dir
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn force_rebuild(&self) -> bool {
        self.force_rebuild
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn cleanup_on_exit(&self) -> bool {
        self.cleanup_on_exit
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// `username/image_name`
    pub fn repo_path(&self) -> String {
        format!("{}/{}", self.username, self.image_name)
    }

    /// Local reference produced by the build: `image_name:tag`
    pub fn local_ref(&self) -> String {
        format!("{}:{}", self.image_name, self.tag)
    }

    /// Registry-qualified reference that gets pushed
    pub fn remote_ref(&self) -> String {
        match self.registry {
            Registry::Docker => format!("{}:{}", self.repo_path(), self.tag),
            Registry::Github => format!("{}/{}:{}", GHCR_HOST, self.repo_path(), self.tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn raw(dir: &Path, registry: Registry) -> RawConfig {
        RawConfig {
            registry,
            username: "alice".into(),
            image_name: "app".into(),
            tag: registry.default_tag().into(),
            dockerfile_dir: dir.to_path_buf(),
            use_cache: true,
            force_rebuild: false,
            dry_run: false,
            cleanup_on_exit: true,
            log_level: LogLevel::Normal,
        }
    }

    #[test]
    fn references_depend_on_registry() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();

        let docker = ExecutionConfig::new(raw(tmp.path(), Registry::Docker)).unwrap();
        assert_eq!(docker.repo_path(), "alice/app");
        assert_eq!(docker.local_ref(), "app:latest");
        assert_eq!(docker.remote_ref(), "alice/app:latest");

        let github = ExecutionConfig::new(raw(tmp.path(), Registry::Github)).unwrap();
        assert_eq!(github.local_ref(), "app:main");
        assert_eq!(github.remote_ref(), "ghcr.io/alice/app:main");
    }

    #[test]
    fn construction_fails_without_dockerfile() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ExecutionConfig::new(raw(tmp.path(), Registry::Docker)).unwrap_err();
        assert!(matches!(
            err,
            CtpError::Validation {
                field: "dockerfile directory",
                ..
            }
        ));
    }

    #[test]
    fn registry_literals_are_exact() {
        assert_eq!("docker".parse::<Registry>().unwrap(), Registry::Docker);
        assert_eq!("github".parse::<Registry>().unwrap(), Registry::Github);
        for bad in ["Docker", "ghcr", "", "github "] {
            assert!(matches!(
                bad.parse::<Registry>(),
                Err(CtpError::Config(ConfigError::UnknownRegistry { .. }))
            ));
        }
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("VERBOSE".parse::<LogLevel>().unwrap(), LogLevel::Verbose);
        assert_eq!(LogLevel::Quiet.filter(), log::LevelFilter::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
