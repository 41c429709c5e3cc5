//! Command line interface for docker-ctp.
//!
//! Wires the pieces together: logging, configuration, dependency checks,
//! build-context audit, the pipeline raced against termination signals, and
//! a single cleanup drain on every exit path.

mod args;

pub use args::Args;

use crate::config::{CliOverrides, ConfigFile, ConfigResolver, ConfigSearch, Environment, ExecutionConfig};
use crate::context::audit_build_context;
use crate::engine::DockerCli;
use crate::engine::availability::check_dependencies;
use crate::error::{CtpError, Result};
use crate::generate::{GeneratorTargets, generate_config_files};
use crate::pipeline::{CleanupManager, CredentialProvider, Pipeline, restore_terminal};
use log::{Level, LevelFilter};
use std::io::Write;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(args.log_filter());

    let cwd = std::env::current_dir()?;
    let home = dirs::home_dir();

    if args.generate_config {
        let targets = GeneratorTargets::standard(&cwd, home.as_deref())?;
        generate_config_files(&targets, args.dry_run)?;
        return Ok(0);
    }

    let env = Environment::from_process();
    let file = ConfigFile::discover(&ConfigSearch::standard(&cwd, home.as_deref()))?;
    // Tokens may live in the config file; real environment variables win
    let credential_env = match &file {
        Some(file) => env.with_fallback(file.values()),
        None => env.clone(),
    };
    let config = ConfigResolver::new(CliOverrides::from(&args), env, cwd)
        .with_config_file(file)
        .resolve()?;
    set_verbosity(config.log_level().filter());
    log_config(&config);

    check_dependencies(config.dry_run()).await?;
    audit_build_context(config.dockerfile_dir()).log();

    let engine = DockerCli::new();
    let credentials = CredentialProvider::new(config.registry(), config.username(), credential_env);
    let mut cleanup = CleanupManager::new(config.cleanup_on_exit(), config.dry_run());

    let outcome = {
        let pipeline = Pipeline::new(&config, &engine, credentials);
        tokio::select! {
            result = pipeline.run(&mut cleanup) => result,
            signal = shutdown_signal() => {
                restore_terminal();
                log::warn!("Received {}, stopping...", signal);
                Err(CtpError::Interrupted { signal })
            }
        }
    };

    if let Ok(summary) = &outcome {
        summary.log();
    }

    // Runs for success, stage failure and interrupt alike
    cleanup.drain(&engine).await;

    outcome?;
    Ok(0)
}

/// Initializes the stderr logger.
///
/// Warnings and errors carry a level prefix; everything else is printed as
/// plain text. `RUST_LOG`, when set, takes precedence over `filter`.
pub fn init_logging(filter: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Trace)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| match record.level() {
            Level::Error => writeln!(buf, "ERROR: {}", record.args()),
            Level::Warn => writeln!(buf, "WARNING: {}", record.args()),
            _ => writeln!(buf, "{}", record.args()),
        })
        .parse_default_env();

    if let Err(e) = builder.try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
    set_verbosity(filter);
}

/// Applies `filter` unless `RUST_LOG` chose the level.
pub fn set_verbosity(filter: LevelFilter) {
    if std::env::var_os("RUST_LOG").is_none() {
        log::set_max_level(filter);
    }
}

fn log_config(config: &ExecutionConfig) {
    log::info!(
        "Registry: {} | Image: {}",
        config.registry().display_name(),
        config.remote_ref()
    );
    log::debug!("Dockerfile directory: {}", config.dockerfile_dir().display());
    log::debug!(
        "Use cache: {} | Force rebuild: {} | Cleanup on exit: {} | Dry run: {}",
        config.use_cache(),
        config.force_rebuild(),
        config.cleanup_on_exit(),
        config.dry_run()
    );
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            log::debug!("Cannot listen for SIGTERM: {}", e);
            None
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => "SIGINT",
            Err(e) => {
                log::debug!("Cannot listen for SIGINT: {}", e);
                std::future::pending().await
            }
        },
        Some(()) = async {
            match terminate.as_mut() {
                Some(stream) => stream.recv().await,
                None => std::future::pending().await,
            }
        } => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::debug!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    "Ctrl-C"
}
