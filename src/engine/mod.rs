//! Container engine seam.
//!
//! The pipeline and cleanup manager talk to the engine only through
//! [`ContainerEngine`]. [`DockerCli`] is the real implementation, spawning the
//! `docker` binary with `tokio::process`.
//!
//! # Module Structure
//!
//! - `availability` - Tool and daemon probes
//! - `commands` - Engine command lines
//! - `constants` - Timeouts and platform help texts

pub mod availability;
pub mod commands;
pub mod constants;

#[cfg(test)]
pub(crate) mod testing;

pub use commands::EngineCommand;

use crate::error::{CtpError, Result};
use crate::pipeline::credentials::Secret;
use constants::{ENGINE_BINARY, KILL_REAP_TIMEOUT, STDERR_TAIL_LINES};
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Outcome of one engine invocation that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Last lines the engine wrote to stderr
    pub stderr_tail: Vec<String>,
}

impl EngineOutput {
    /// Output of a successful run with no diagnostics
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            stderr_tail: Vec::new(),
        }
    }

    /// Output of a run that exited with `code` after writing `stderr`
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            code: Some(code),
            stderr_tail: stderr.lines().map(str::to_string).collect(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short failure description: exit code plus the last stderr line.
    pub fn failure_reason(&self) -> String {
        let code = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        match self.stderr_tail.iter().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{}: {}", code, line.trim()),
            None => code,
        }
    }
}

/// Runs engine commands.
///
/// Implementations report a non-zero exit through [`EngineOutput`]; `Err` is
/// reserved for commands that could not be started or awaited.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Runs `command`, writing `stdin` to the process when given.
    async fn run(
        &self,
        command: &EngineCommand<'_>,
        stdin: Option<&Secret>,
    ) -> Result<EngineOutput>;
}

/// The `docker` command-line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: ENGINE_BINARY.to_string(),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client that runs `program` instead of `docker`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn spawn_error(&self, command: &EngineCommand<'_>, e: std::io::Error) -> CtpError {
        CtpError::Engine {
            command: command.to_string(),
            reason: e.to_string(),
        }
    }
}

impl ContainerEngine for DockerCli {
    async fn run(
        &self,
        command: &EngineCommand<'_>,
        stdin: Option<&Secret>,
    ) -> Result<EngineOutput> {
        log::debug!("Running: {}", command);

        // kill_on_drop: an interrupted pipeline drops this future mid-wait
        let mut child = Command::new(&self.program)
            .args(command.args())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(command, e))?;

        if let (Some(secret), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // The engine may exit before reading everything (e.g. bad flags)
            match pipe.write_all(secret.expose().as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(self.spawn_error(command, e));
                }
                _ => {}
            }
            drop(pipe);
        }

        let show = command.streams_output();
        let emit = |line: &str| {
            if show {
                log::info!("  {}", line);
            } else {
                log::debug!("  {}", line);
            }
        };

        // Stream both stdout and stderr concurrently
        let mut stderr_tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let (stdout, stderr) = (child.stdout.take(), child.stderr.take());
        tokio::join!(
            async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        emit(&line);
                    }
                }
            },
            async {
                if let Some(stderr) = stderr {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        emit(&line);
                        if stderr_tail.len() == STDERR_TAIL_LINES {
                            stderr_tail.pop_front();
                        }
                        stderr_tail.push_back(line);
                    }
                }
            }
        );

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                let _ = child.start_kill();
                let _ = tokio::time::timeout(KILL_REAP_TIMEOUT, child.wait()).await;
                return Err(self.spawn_error(command, e));
            }
        };

        Ok(EngineOutput {
            code: status.code(),
            stderr_tail: stderr_tail.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_uses_last_non_blank_stderr_line() {
        let output = EngineOutput::failed(1, "step 1\nerror: denied\n\n");
        assert!(!output.success());
        assert_eq!(output.failure_reason(), "exit code 1: error: denied");

        let silent = EngineOutput {
            code: None,
            stderr_tail: vec![],
        };
        assert_eq!(silent.failure_reason(), "terminated by signal");
        assert!(EngineOutput::ok().success());
    }

    #[tokio::test]
    async fn missing_binary_is_an_engine_error() {
        let engine = DockerCli::with_program("docker-ctp-no-such-engine");
        let err = engine.run(&EngineCommand::Info, None).await.unwrap_err();
        match err {
            CtpError::Engine { command, .. } => {
                assert_eq!(command, "docker info");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_status_and_stderr_are_captured() {
        // `sh info` tries to run a script named "info" and fails
        let engine = DockerCli::with_program("sh");
        let output = engine.run(&EngineCommand::Info, None).await.unwrap();
        assert!(!output.success());
        assert!(output.code.is_some());
        assert!(!output.stderr_tail.is_empty());
    }
}
