//! Tool and daemon availability checking.

use crate::error::{CtpError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;

use super::constants::{
    DOCKER_INFO_TIMEOUT, DOCKER_INSTALL_HELP, DOCKER_START_HELP, ENGINE_BINARY, REQUIRED_TOOLS,
};

/// Checks that every tool in `tools` is on `PATH`.
///
/// # Returns
///
/// * `Ok(())` - All tools found
/// * `Err` - One [`CtpError::Dependency`] listing every missing tool
pub fn probe_tools(tools: &[&str]) -> Result<()> {
    let missing: Vec<&str> = tools
        .iter()
        .copied()
        .filter(|tool| match which::which(tool) {
            Ok(path) => {
                log::debug!("Found {} at {}", tool, path.display());
                false
            }
            Err(_) => true,
        })
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let hint = if missing.contains(&ENGINE_BINARY) {
        DOCKER_INSTALL_HELP.to_string()
    } else {
        "Install the missing tools with your system package manager (coreutils)".to_string()
    };
    Err(CtpError::Dependency {
        reason: format!("required tools not found on PATH: {}", missing.join(", ")),
        hint,
    })
}

/// Checks that the engine daemon answers `docker info`.
///
/// # Returns
///
/// * `Ok(())` - Daemon is reachable
/// * `Err` - Daemon not running, not responding, or the client is missing
pub async fn check_daemon_available() -> Result<()> {
    let status_result = timeout(
        DOCKER_INFO_TIMEOUT,
        Command::new(ENGINE_BINARY)
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status(),
    )
    .await;

    match status_result {
        // Timeout occurred
        Err(_) => Err(CtpError::Dependency {
            reason: format!(
                "Docker daemon check timed out after {} seconds",
                DOCKER_INFO_TIMEOUT.as_secs()
            ),
            hint: format!("{}. If Docker is running, check: docker ps", DOCKER_START_HELP),
        }),

        Ok(Ok(status)) if status.success() => {
            log::debug!("Docker daemon is available");
            Ok(())
        }

        // Client exists but the daemon isn't responding
        Ok(Ok(status)) => Err(CtpError::Dependency {
            reason: format!(
                "Docker daemon is not responding (exit code: {})",
                status.code().unwrap_or(-1)
            ),
            hint: DOCKER_START_HELP.to_string(),
        }),

        Ok(Err(e)) => Err(CtpError::Dependency {
            reason: format!("Docker command could not be run: {}", e),
            hint: DOCKER_INSTALL_HELP.to_string(),
        }),
    }
}

/// Runs the tool probe, then the daemon check unless `dry_run`.
pub async fn check_dependencies(dry_run: bool) -> Result<()> {
    probe_tools(REQUIRED_TOOLS)?;
    if dry_run {
        log::debug!("Dry run: skipping Docker daemon check");
        return Ok(());
    }
    check_daemon_available().await
}
