//! Starter configuration and ignore-file generation.
//!
//! Existing files are never overwritten: a target that already exists is
//! skipped with a warning.

mod templates;

pub use templates::{DOCKERIGNORE_TEMPLATE, ENV_TEMPLATE};

use crate::config::file::user_config_path;
use crate::context::IGNORE_FILE;
use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Files written by the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorTargets {
    /// User configuration file
    pub config_file: PathBuf,
    /// Ignore file for the current project
    pub ignore_file: PathBuf,
}

impl GeneratorTargets {
    /// `~/.config/docker-ctp/.env` and `<cwd>/.dockerignore`.
    pub fn standard(cwd: &Path, home: Option<&Path>) -> Result<Self> {
        let home = home.ok_or_else(|| ConfigError::MissingField {
            field: "home directory",
            source_hint: "HOME".to_string(),
        })?;
        Ok(Self {
            config_file: user_config_path(home),
            ignore_file: cwd.join(IGNORE_FILE),
        })
    }
}

/// What the generator did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Files written (or that would be written, in a dry run)
    pub created: Vec<PathBuf>,
    /// Files left alone because they already exist
    pub skipped: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Writes each target that does not exist yet.
///
/// # Arguments
///
/// * `targets` - Where to write the config and ignore files
/// * `dry_run` - Report what would be written without touching the disk
///
/// # Returns
///
/// * `Ok(GenerationReport)` - Created and skipped files
/// * `Err` - A directory or file could not be written
pub fn generate_config_files(targets: &GeneratorTargets, dry_run: bool) -> Result<GenerationReport> {
    log::info!("Generating default configuration files...");
    let mut report = GenerationReport {
        dry_run,
        ..Default::default()
    };

    for (path, contents) in [
        (&targets.config_file, ENV_TEMPLATE),
        (&targets.ignore_file, DOCKERIGNORE_TEMPLATE),
    ] {
        if write_template(path, contents, dry_run)? {
            report.created.push(path.clone());
        } else {
            report.skipped.push(path.clone());
        }
    }

    log_next_steps(&report, targets);
    Ok(report)
}

/// Returns `false` when `path` already exists.
fn write_template(path: &Path, contents: &str, dry_run: bool) -> Result<bool> {
    if path.exists() {
        log::warn!(
            "{} already exists; skipping to avoid overwriting it",
            path.display()
        );
        return Ok(false);
    }

    if dry_run {
        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            log::info!("DRY-RUN: would create directory {}", parent.display());
        }
        log::info!("DRY-RUN: would write {}", path.display());
        return Ok(true);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    log::info!("Generated {}", path.display());
    Ok(true)
}

fn log_next_steps(report: &GenerationReport, targets: &GeneratorTargets) {
    if report.created.is_empty() {
        log::info!("No new configuration files were generated");
        return;
    }
    if report.dry_run {
        log::info!("DRY-RUN: no files were written");
        return;
    }

    log::info!("Next steps:");
    log::info!(
        "  1. Edit {} with your registry usernames",
        targets.config_file.display()
    );
    log::info!("  2. Export DOCKER_TOKEN or GITHUB_TOKEN (or uncomment them in the file)");
    log::info!(
        "  3. Review {} for your project",
        targets.ignore_file.display()
    );
    log::info!("  4. Run 'docker-ctp --dry-run' to check the configuration");
    log::warn!("Keep .env files out of version control; they may hold tokens");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(root: &Path) -> GeneratorTargets {
        GeneratorTargets::standard(&root.join("project"), Some(&root.join("home"))).unwrap()
    }

    #[test]
    fn standard_targets() {
        let t = GeneratorTargets::standard(Path::new("/work/app"), Some(Path::new("/home/alice")))
            .unwrap();
        assert_eq!(
            t.config_file,
            PathBuf::from("/home/alice/.config/docker-ctp/.env")
        );
        assert_eq!(t.ignore_file, PathBuf::from("/work/app/.dockerignore"));
        assert!(GeneratorTargets::standard(Path::new("/work"), None).is_err());
    }

    #[test]
    fn second_run_skips_and_keeps_contents() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("project")).unwrap();
        let targets = targets(tmp.path());

        let first = generate_config_files(&targets, false).unwrap();
        assert_eq!(
            first.created,
            [targets.config_file.clone(), targets.ignore_file.clone()]
        );
        assert!(first.skipped.is_empty());
        assert_eq!(fs::read_to_string(&targets.config_file).unwrap(), ENV_TEMPLATE);

        fs::write(&targets.ignore_file, "custom\n").unwrap();
        let second = generate_config_files(&targets, false).unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(fs::read_to_string(&targets.ignore_file).unwrap(), "custom\n");
        assert_eq!(fs::read_to_string(&targets.config_file).unwrap(), ENV_TEMPLATE);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("project")).unwrap();
        let targets = targets(tmp.path());

        let report = generate_config_files(&targets, true).unwrap();
        assert_eq!(report.created.len(), 2);
        assert!(report.dry_run);
        assert!(!targets.config_file.exists());
        assert!(!tmp.path().join("home").exists());
        assert!(!targets.ignore_file.exists());
    }

    #[test]
    fn templates_cover_every_setting() {
        for key in [
            "REGISTRY",
            "DOCKER_USERNAME",
            "GITHUB_USERNAME",
            "DOCKERFILE_DIR",
            "IMAGE_NAME",
            "IMAGE_TAG",
            "DEFAULT_DOCKERHUB_TAG",
            "DEFAULT_GITHUB_TAG",
            "USE_CACHE",
            "FORCE_REBUILD",
            "DRY_RUN",
            "CLEANUP_ON_EXIT",
            "LOG_LEVEL",
            "DYNAMIC_IMAGE_NAME",
        ] {
            assert!(ENV_TEMPLATE.contains(key), "{key}");
        }
        // tokens are present but commented out
        for token in ["DOCKER_TOKEN", "DOCKER_PASSWORD", "GITHUB_TOKEN", "GHCR_TOKEN"] {
            assert!(ENV_TEMPLATE.contains(&format!("# {}=", token)), "{token}");
        }
        assert!(DOCKERIGNORE_TEMPLATE.contains(".git\n"));
        assert!(DOCKERIGNORE_TEMPLATE.contains("node_modules/"));
    }

    #[test]
    fn generated_env_file_is_loadable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("project")).unwrap();
        let targets = targets(tmp.path());
        generate_config_files(&targets, false).unwrap();

        let file = crate::config::ConfigFile::load(&targets.config_file).unwrap();
        assert_eq!(file.get("REGISTRY"), Some("docker"));
        assert_eq!(file.get("DEFAULT_GITHUB_TAG"), Some("main"));
        assert_eq!(file.get("DOCKER_TOKEN"), None);
    }
}
