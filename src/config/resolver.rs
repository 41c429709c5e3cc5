//! Configuration resolution.
//!
//! Each field is resolved on its own: command-line flag, then process
//! environment, then the loaded config file, then the built-in default. The
//! first layer that supplies a non-blank value wins for that field only.

use super::env::{Environment, parse_bool};
use super::file::ConfigFile;
use super::{ExecutionConfig, LogLevel, RawConfig, Registry};
use crate::error::{ConfigError, Result};
use path_absolutize::Absolutize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Layer that supplied a resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    Cli,
    Environment,
    File,
    Default,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigLayer::Cli => "command line",
            ConfigLayer::Environment => "environment",
            ConfigLayer::File => "config file",
            ConfigLayer::Default => "default",
        })
    }
}

/// Values supplied on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub username: Option<String>,
    pub image_name: Option<String>,
    pub tag: Option<String>,
    pub dockerfile_dir: Option<PathBuf>,
    pub registry: Option<String>,
    pub no_cache: bool,
    pub force_rebuild: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub no_cleanup: bool,
}

/// Merges CLI flags, environment, config file and defaults.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    cli: CliOverrides,
    env: Environment,
    file: Option<ConfigFile>,
    cwd: PathBuf,
}

/// A value found in the environment or file layer
struct Found<'a> {
    layer: ConfigLayer,
    key: &'static str,
    value: &'a str,
}

impl ConfigResolver {
    /// Resolver over explicit inputs, with no config file loaded.
    pub fn new(cli: CliOverrides, env: Environment, cwd: PathBuf) -> Self {
        Self {
            cli,
            env,
            file: None,
            cwd,
        }
    }

    /// Uses `file` as the config file layer.
    pub fn with_config_file(mut self, file: Option<ConfigFile>) -> Self {
        self.file = file;
        self
    }

    /// Resolves and validates every field.
    pub fn resolve(&self) -> Result<ExecutionConfig> {
        let raw = self.resolve_raw()?;
        ExecutionConfig::new(raw)
    }

    /// Resolves every field without running the validators.
    ///
    /// The registry is resolved first; an unknown literal fails here before
    /// any other field is looked at.
    pub fn resolve_raw(&self) -> Result<RawConfig> {
        let registry = self.resolve_registry()?;
        let username = self.resolve_username(registry)?;
        let tag = self.resolve_tag(registry);
        let dockerfile_dir = self.resolve_dockerfile_dir();
        let image_name = self.resolve_image_name(&dockerfile_dir)?;

        let use_cache = if self.cli.no_cache {
            trace("use_cache", &false, ConfigLayer::Cli);
            false
        } else {
            self.resolve_bool("use_cache", "USE_CACHE", true)?
        };
        let force_rebuild = if self.cli.force_rebuild {
            trace("force_rebuild", &true, ConfigLayer::Cli);
            true
        } else {
            self.resolve_bool("force_rebuild", "FORCE_REBUILD", false)?
        };
        let dry_run = if self.cli.dry_run {
            trace("dry_run", &true, ConfigLayer::Cli);
            true
        } else {
            self.resolve_bool("dry_run", "DRY_RUN", false)?
        };

        Ok(RawConfig {
            registry,
            username,
            image_name,
            tag,
            dockerfile_dir,
            use_cache,
            force_rebuild,
            dry_run,
            cleanup_on_exit: self.resolve_cleanup()?,
            log_level: self.resolve_log_level()?,
        })
    }

    /// Environment first, then config file; within a layer, `keys` in order.
    fn lookup(&self, keys: &[&'static str]) -> Option<Found<'_>> {
        if let Some((key, value)) = self.env.first_of(keys) {
            return Some(Found {
                layer: ConfigLayer::Environment,
                key,
                value,
            });
        }
        self.file
            .as_ref()
            .and_then(|file| file.first_of(keys))
            .map(|(key, value)| Found {
                layer: ConfigLayer::File,
                key,
                value,
            })
    }

    fn cli_value(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn resolve_registry(&self) -> Result<Registry> {
        let (value, layer) = match Self::cli_value(&self.cli.registry) {
            Some(v) => (v, ConfigLayer::Cli),
            None => match self.lookup(&["REGISTRY"]) {
                Some(found) => (found.value, found.layer),
                None => (Registry::Docker.as_str(), ConfigLayer::Default),
            },
        };
        let registry: Registry = value.parse()?;
        trace("registry", &registry, layer);
        Ok(registry)
    }

    fn resolve_username(&self, registry: Registry) -> Result<String> {
        if let Some(v) = Self::cli_value(&self.cli.username) {
            trace("username", &v, ConfigLayer::Cli);
            return Ok(v.to_string());
        }
        if let Some(found) = self.lookup(&[registry.username_var()]) {
            trace("username", &found.value, found.layer);
            return Ok(found.value.to_string());
        }
        if let Some(user) = self.env.get("USER") {
            trace("username", &user, ConfigLayer::Default);
            return Ok(user.to_string());
        }
        Err(ConfigError::MissingField {
            field: "username",
            source_hint: format!("--username or {}", registry.username_var()),
        }
        .into())
    }

    fn resolve_tag(&self, registry: Registry) -> String {
        if let Some(v) = Self::cli_value(&self.cli.tag) {
            trace("tag", &v, ConfigLayer::Cli);
            return v.to_string();
        }
        if let Some(found) = self.lookup(&["IMAGE_TAG", registry.default_tag_var()]) {
            log::debug!("tag = {} (from {} {})", found.value, found.layer, found.key);
            return found.value.to_string();
        }
        trace("tag", &registry.default_tag(), ConfigLayer::Default);
        registry.default_tag().to_string()
    }

    fn resolve_dockerfile_dir(&self) -> PathBuf {
        let (dir, layer) = match self.cli.dockerfile_dir.as_ref() {
            Some(dir) if !dir.as_os_str().is_empty() => (dir.clone(), ConfigLayer::Cli),
            _ => match self.lookup(&["DOCKERFILE_DIR"]) {
                Some(found) => (PathBuf::from(found.value), found.layer),
                None => (PathBuf::from("."), ConfigLayer::Default),
            },
        };
        let joined = self.cwd.join(dir);
        let dir = joined
            .absolutize()
            .map(|p| p.into_owned())
            .unwrap_or(joined);
        trace("dockerfile_dir", &dir.display(), layer);
        dir
    }

    fn resolve_image_name(&self, dockerfile_dir: &Path) -> Result<String> {
        if let Some(v) = Self::cli_value(&self.cli.image_name) {
            trace("image_name", &v, ConfigLayer::Cli);
            return Ok(v.to_string());
        }
        if let Some(found) = self.lookup(&["IMAGE_NAME"]) {
            trace("image_name", &found.value, found.layer);
            return Ok(found.value.to_string());
        }

        let dynamic = self.resolve_bool("dynamic_image_name", "DYNAMIC_IMAGE_NAME", true)?;
        let derived = if dynamic {
            basename(dockerfile_dir).or_else(|| basename(&self.cwd))
        } else {
            basename(&self.cwd)
        };

        match derived {
            Some(name) => {
                let name = name.to_lowercase();
                log::debug!("image_name = {} (derived from directory name)", name);
                Ok(name)
            }
            None => Err(ConfigError::MissingField {
                field: "image name",
                source_hint: "--image-name or IMAGE_NAME".to_string(),
            }
            .into()),
        }
    }

    fn resolve_bool(&self, field: &str, key: &'static str, default: bool) -> Result<bool> {
        match self.lookup(&[key]) {
            Some(found) => {
                let value = parse_bool(found.key, found.value)?;
                trace(field, &value, found.layer);
                Ok(value)
            }
            None => {
                trace(field, &default, ConfigLayer::Default);
                Ok(default)
            }
        }
    }

    fn resolve_cleanup(&self) -> Result<bool> {
        if self.cli.no_cleanup {
            trace("cleanup_on_exit", &false, ConfigLayer::Cli);
            return Ok(false);
        }
        match self.lookup(&["CLEANUP_ON_EXIT", "NO_CLEANUP"]) {
            Some(found) => {
                let flag = parse_bool(found.key, found.value)?;
                let value = if found.key == "NO_CLEANUP" { !flag } else { flag };
                trace("cleanup_on_exit", &value, found.layer);
                Ok(value)
            }
            None => {
                trace("cleanup_on_exit", &true, ConfigLayer::Default);
                Ok(true)
            }
        }
    }

    fn resolve_log_level(&self) -> Result<LogLevel> {
        if self.cli.verbose {
            return Ok(LogLevel::Verbose);
        }
        if self.cli.quiet {
            return Ok(LogLevel::Quiet);
        }
        match self.lookup(&["LOG_LEVEL"]) {
            Some(found) => found.value.parse(),
            None => Ok(LogLevel::default()),
        }
    }
}

fn trace(field: &str, value: &dyn fmt::Display, layer: ConfigLayer) {
    log::debug!("{} = {} (from {})", field, value, layer);
}

fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}
