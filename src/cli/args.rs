//! Command line argument parsing.

use crate::config::CliOverrides;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Build, tag and push a container image
#[derive(Parser, Debug)]
#[command(
    name = "docker-ctp",
    version,
    about = "Build, tag and push a container image to Docker Hub or GitHub Container Registry",
    long_about = "Builds the image from the Dockerfile directory, tags it for the selected registry and pushes it.

Settings are taken from command-line flags, then environment variables, then the first
configuration file found (./.env when run from a directory named docker-ctp,
~/.config/docker-ctp/.env, ~/.docker-ctp/.env, /etc/docker-ctp/.env), then defaults.

Usage:
  docker-ctp --dry-run
  docker-ctp -u alice -d ./app -t v1.0.0
  docker-ctp --registry github --force-rebuild
  docker-ctp --generate-config

Registry tokens are read from DOCKER_TOKEN / DOCKER_PASSWORD or GITHUB_TOKEN / GHCR_TOKEN,
or prompted for when running in a terminal."
)]
pub struct Args {
    /// Registry username
    #[arg(short = 'u', long, value_name = "USERNAME")]
    pub username: Option<String>,

    /// Image name (defaults to the Dockerfile directory name)
    #[arg(short = 'i', long, value_name = "NAME")]
    pub image_name: Option<String>,

    /// Image tag (defaults to "latest" for docker, "main" for github)
    #[arg(short = 't', long, value_name = "TAG")]
    pub image_tag: Option<String>,

    /// Directory containing the Dockerfile
    #[arg(short = 'd', long, value_name = "DIR")]
    pub dockerfile_dir: Option<PathBuf>,

    /// Target registry: docker or github
    #[arg(short = 'g', long, value_name = "REGISTRY")]
    pub registry: Option<String>,

    /// Build without the layer cache
    #[arg(long)]
    pub no_cache: bool,

    /// Build even if the image already exists locally
    #[arg(long)]
    pub force_rebuild: bool,

    /// Log the engine commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Show engine output and debug details
    #[arg(long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show errors
    #[arg(long)]
    pub quiet: bool,

    /// Keep the images created by this run
    #[arg(long)]
    pub no_cleanup: bool,

    /// Write a starter config file and .dockerignore, then exit
    #[arg(long)]
    pub generate_config: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level requested by `--verbose` / `--quiet`
    pub fn log_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Error
        } else {
            LevelFilter::Info
        }
    }
}

impl From<&Args> for CliOverrides {
    fn from(args: &Args) -> Self {
        Self {
            username: args.username.clone(),
            image_name: args.image_name.clone(),
            tag: args.image_tag.clone(),
            dockerfile_dir: args.dockerfile_dir.clone(),
            registry: args.registry.clone(),
            no_cache: args.no_cache,
            force_rebuild: args.force_rebuild,
            dry_run: args.dry_run,
            verbose: args.verbose,
            quiet: args.quiet,
            no_cleanup: args.no_cleanup,
        }
    }
}
