//! Tracks image references created during a run and removes them at exit.

use crate::engine::constants::ENGINE_BINARY;
use crate::engine::{ContainerEngine, EngineCommand};
use std::process::{Command, Stdio};

/// Result of draining the tracked references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// References the engine removed
    pub removed: Vec<String>,
    /// References whose removal failed
    pub failed: Vec<String>,
}

impl CleanupReport {
    /// One-line count of removed and failed references
    pub fn summary(&self) -> String {
        format!(
            "Cleanup: {} removed, {} failed",
            self.removed.len(),
            self.failed.len()
        )
    }
}

/// Append-only list of image references to remove when the run ends.
///
/// [`drain`](Self::drain) is the normal path. If the manager is dropped
/// while references are still tracked (a panic unwound past the drain), they
/// are removed synchronously from `Drop`.
#[derive(Debug)]
pub struct CleanupManager {
    enabled: bool,
    dry_run: bool,
    tracked: Vec<String>,
}

impl CleanupManager {
    pub fn new(enabled: bool, dry_run: bool) -> Self {
        Self {
            enabled,
            dry_run,
            tracked: Vec::new(),
        }
    }

    /// Tracks `reference` for removal. Registering twice tracks it once.
    pub fn register(&mut self, reference: impl Into<String>) {
        let reference = reference.into();
        if self.tracked.contains(&reference) {
            return;
        }
        log::debug!("Tracking {} for cleanup", reference);
        self.tracked.push(reference);
    }

    /// References tracked so far, in registration order
    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }

    /// Removes every tracked reference. Failures are logged, never returned.
    ///
    /// The list is taken, so a second drain does nothing.
    pub async fn drain<E: ContainerEngine>(&mut self, engine: &E) -> CleanupReport {
        let tracked = std::mem::take(&mut self.tracked);
        let mut report = CleanupReport::default();

        if tracked.is_empty() {
            return report;
        }
        if !self.enabled {
            log::info!(
                "Cleanup disabled; keeping {} image reference(s): {}",
                tracked.len(),
                tracked.join(", ")
            );
            return report;
        }

        log::info!("Cleaning up {} image reference(s)...", tracked.len());
        if self.dry_run {
            for reference in &tracked {
                let command = EngineCommand::RemoveImage {
                    reference: reference.as_str(),
                };
                log::info!("DRY-RUN: would run {}", command);
            }
            return report;
        }

        for reference in tracked {
            let command = EngineCommand::RemoveImage {
                reference: &reference,
            };
            match engine.run(&command, None).await {
                Ok(output) if output.success() => {
                    log::debug!("Removed {}", reference);
                    report.removed.push(reference);
                }
                Ok(output) => {
                    log::warn!(
                        "Failed to remove {}: {}",
                        reference,
                        output.failure_reason()
                    );
                    report.failed.push(reference);
                }
                Err(e) => {
                    log::warn!("Failed to remove {}: {}", reference, e);
                    report.failed.push(reference);
                }
            }
        }

        if !report.failed.is_empty() {
            log::warn!(
                "{} image reference(s) could not be removed; remove them with: docker rmi {}",
                report.failed.len(),
                report.failed.join(" ")
            );
        }
        log::info!("{}", report.summary());
        report
    }
}

impl Drop for CleanupManager {
    fn drop(&mut self) {
        if self.tracked.is_empty() || !self.enabled || self.dry_run {
            return;
        }
        log::warn!(
            "Removing {} image reference(s) left after an abnormal exit",
            self.tracked.len()
        );
        for reference in self.tracked.drain(..) {
            let status = Command::new(ENGINE_BINARY)
                .args(["rmi", reference.as_str()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            match status {
                Ok(status) if status.success() => {}
                _ => log::warn!("Failed to remove {}", reference),
            }
        }
    }
}
