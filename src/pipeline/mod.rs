//! Build, tag and push pipeline.
//!
//! Stages run strictly in order: login, existence check, build, tag, push.
//! The first failing stage stops the run; references created before the
//! failure stay registered with the [`CleanupManager`] so the caller can
//! remove them.
//!
//! # Module Structure
//!
//! - `cleanup` - Image references to remove at exit
//! - `credentials` - Registry token lookup

pub mod cleanup;
pub mod credentials;

pub use cleanup::{CleanupManager, CleanupReport};
pub use credentials::{CredentialProvider, CredentialSource, Secret, restore_terminal};

use crate::config::ExecutionConfig;
use crate::engine::{ContainerEngine, EngineCommand, EngineOutput};
use crate::error::{CtpError, Result, Stage};

/// What happened to the local image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Built by this run
    Built,
    /// Already present; the build was skipped
    Reused,
    /// Dry run, nothing was built
    Simulated,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub build: BuildOutcome,
    pub local_ref: String,
    pub remote_ref: String,
    pub dry_run: bool,
}

impl PipelineSummary {
    /// Logs the final status lines.
    pub fn log(&self) {
        if self.dry_run {
            log::info!(
                "DRY-RUN complete: {} would be built, tagged {} and pushed",
                self.local_ref,
                self.remote_ref
            );
            log::info!("DRY-RUN: no real operation occurred");
            return;
        }
        match self.build {
            BuildOutcome::Built => log::info!("Built {}", self.local_ref),
            BuildOutcome::Reused => log::info!("Reused existing {}", self.local_ref),
            BuildOutcome::Simulated => {}
        }
        log::info!("Successfully pushed {}", self.remote_ref);
    }
}

/// One build-tag-push run over an engine
pub struct Pipeline<'a, E> {
    config: &'a ExecutionConfig,
    engine: &'a E,
    credentials: CredentialProvider,
}

impl<'a, E: ContainerEngine> Pipeline<'a, E> {
    pub fn new(config: &'a ExecutionConfig, engine: &'a E, credentials: CredentialProvider) -> Self {
        Self {
            config,
            engine,
            credentials,
        }
    }

    /// Runs every stage, registering created references with `cleanup`.
    ///
    /// # Returns
    ///
    /// * `Ok(PipelineSummary)` - The remote reference was pushed (or simulated)
    /// * `Err` - [`CtpError::Stage`] or [`CtpError::Credential`] from the first failing stage
    pub async fn run(&self, cleanup: &mut CleanupManager) -> Result<PipelineSummary> {
        let local_ref = self.config.local_ref();
        let remote_ref = self.config.remote_ref();

        if self.config.dry_run() {
            log::info!("DRY-RUN mode: engine commands are logged, not executed");
        }

        self.login().await?;

        let build = if self.image_exists(&local_ref).await? {
            log::info!("Image {} already exists; skipping build", local_ref);
            BuildOutcome::Reused
        } else {
            self.build(&local_ref, cleanup).await?
        };

        self.tag(&local_ref, &remote_ref, cleanup).await?;
        self.push(&remote_ref).await?;

        Ok(PipelineSummary {
            build,
            local_ref,
            remote_ref,
            dry_run: self.config.dry_run(),
        })
    }

    async fn login(&self) -> Result<()> {
        let registry = self.config.registry();
        let command = EngineCommand::Login {
            server: registry.login_server(),
            username: self.config.username(),
        };

        if self.config.dry_run() {
            log::info!("DRY-RUN: would run {}", command);
            match self.credentials.describe() {
                Some(source) => log::info!("DRY-RUN: token would be read from {}", source),
                None => log::warn!(
                    "DRY-RUN: no token available; a real run would fail (set {})",
                    self.credentials.primary_variable()
                ),
            }
            return Ok(());
        }

        let token = self.credentials.resolve().await?;
        log::info!(
            "Logging in to {} as {}...",
            registry.display_name(),
            self.config.username()
        );
        let target = registry.login_server().unwrap_or(registry.display_name());
        let output = self
            .invoke(Stage::Login, target, &command, Some(&token))
            .await?;
        Self::check(Stage::Login, target, "login failed", &output)
    }

    /// `true` when the local image already exists and can be reused.
    async fn image_exists(&self, local_ref: &str) -> Result<bool> {
        if self.config.force_rebuild() {
            log::info!("Force rebuild requested; skipping existence check");
            return Ok(false);
        }

        let command = EngineCommand::Inspect {
            reference: local_ref,
        };
        if self.config.dry_run() {
            log::info!("DRY-RUN: would run {}", command);
            return Ok(false);
        }

        let output = self
            .invoke(Stage::ExistenceCheck, local_ref, &command, None)
            .await?;
        Ok(output.success())
    }

    async fn build(&self, local_ref: &str, cleanup: &mut CleanupManager) -> Result<BuildOutcome> {
        let command = EngineCommand::Build {
            reference: local_ref,
            context: self.config.dockerfile_dir(),
            use_cache: self.config.use_cache(),
        };

        if self.config.dry_run() {
            log::info!("DRY-RUN: would run {}", command);
            cleanup.register(local_ref);
            return Ok(BuildOutcome::Simulated);
        }

        log::info!(
            "Building {} from {}...",
            local_ref,
            self.config.dockerfile_dir().display()
        );
        let output = self.invoke(Stage::Build, local_ref, &command, None).await?;
        Self::check(Stage::Build, local_ref, "build failed", &output)?;
        cleanup.register(local_ref);
        Ok(BuildOutcome::Built)
    }

    async fn tag(
        &self,
        local_ref: &str,
        remote_ref: &str,
        cleanup: &mut CleanupManager,
    ) -> Result<()> {
        let command = EngineCommand::Tag {
            source: local_ref,
            target: remote_ref,
        };

        if self.config.dry_run() {
            log::info!("DRY-RUN: would run {}", command);
            cleanup.register(remote_ref);
            return Ok(());
        }

        let output = self.invoke(Stage::Tag, remote_ref, &command, None).await?;
        Self::check(Stage::Tag, remote_ref, "tag failed", &output)?;
        cleanup.register(remote_ref);
        log::info!("Tagged {} as {}", local_ref, remote_ref);
        Ok(())
    }

    async fn push(&self, remote_ref: &str) -> Result<()> {
        let command = EngineCommand::Push {
            reference: remote_ref,
        };

        if self.config.dry_run() {
            log::info!("DRY-RUN: would run {}", command);
            return Ok(());
        }

        log::info!("Pushing {}...", remote_ref);
        let output = self.invoke(Stage::Push, remote_ref, &command, None).await?;
        Self::check(Stage::Push, remote_ref, "push failed", &output)
    }

    /// Runs `command`, reporting spawn failures as a failure of `stage`.
    async fn invoke(
        &self,
        stage: Stage,
        target: &str,
        command: &EngineCommand<'_>,
        stdin: Option<&Secret>,
    ) -> Result<EngineOutput> {
        self.engine
            .run(command, stdin)
            .await
            .map_err(|e| CtpError::Stage {
                stage,
                target: target.to_string(),
                reason: e.to_string(),
            })
    }

    fn check(stage: Stage, target: &str, what: &str, output: &EngineOutput) -> Result<()> {
        if output.success() {
            return Ok(());
        }
        Err(CtpError::Stage {
            stage,
            target: target.to_string(),
            reason: format!("{} ({})", what, output.failure_reason()),
        })
    }
}
