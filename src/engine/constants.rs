//! Engine constants and platform help texts.

use std::time::Duration;

/// Container engine executable
pub const ENGINE_BINARY: &str = "docker";

/// Tools that must be on `PATH` before anything runs
///
/// `realpath` and `basename` are never invoked by this crate; they are probed
/// so hosts without the usual coreutils fail the dependency check up front.
pub const REQUIRED_TOOLS: &[&str] = &[ENGINE_BINARY, "realpath", "basename"];

/// Timeout for the `docker info` daemon probe (5 seconds)
/// A responsive daemon answers well within this
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period for reaping a killed engine process
pub const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of trailing stderr lines kept for error messages
pub const STDERR_TAIL_LINES: usize = 20;

/// Where to get the engine when it is missing
pub const DOCKER_INSTALL_HELP: &str = "Install Docker from https://docs.docker.com/get-docker/";

/// Platform-specific Docker startup instructions
#[cfg(target_os = "macos")]
pub const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(target_os = "linux")]
pub const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

#[cfg(target_os = "windows")]
pub const DOCKER_START_HELP: &str = "Start Docker Desktop from the Start menu";

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
pub const DOCKER_START_HELP: &str = "Start the Docker daemon for your platform";
