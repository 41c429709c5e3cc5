//! Engine command lines.
//!
//! Every `docker` invocation the tool makes is described here, so the dry-run
//! output and the real invocation are produced from the same argument list.

use super::constants::ENGINE_BINARY;
use std::fmt;
use std::path::Path;

/// A single engine subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand<'a> {
    /// `docker login [server] -u <username> --password-stdin`
    Login {
        server: Option<&'a str>,
        username: &'a str,
    },
    /// `docker image inspect <reference>`
    Inspect { reference: &'a str },
    /// `docker build [--no-cache] -t <reference> <context>`
    Build {
        reference: &'a str,
        context: &'a Path,
        use_cache: bool,
    },
    /// `docker tag <source> <target>`
    Tag { source: &'a str, target: &'a str },
    /// `docker push <reference>`
    Push { reference: &'a str },
    /// `docker rmi <reference>`
    RemoveImage { reference: &'a str },
    /// `docker info`
    Info,
}

impl EngineCommand<'_> {
    /// Arguments passed to the engine binary
    pub fn args(&self) -> Vec<String> {
        match self {
            EngineCommand::Login { server, username } => {
                let mut args = vec!["login".to_string()];
                if let Some(server) = server {
                    args.push(server.to_string());
                }
                args.extend([
                    "-u".to_string(),
                    username.to_string(),
                    "--password-stdin".to_string(),
                ]);
                args
            }
            EngineCommand::Inspect { reference } => {
                vec!["image".into(), "inspect".into(), reference.to_string()]
            }
            EngineCommand::Build {
                reference,
                context,
                use_cache,
            } => {
                let mut args = vec!["build".to_string()];
                if !use_cache {
                    args.push("--no-cache".to_string());
                }
                args.extend([
                    "-t".to_string(),
                    reference.to_string(),
                    context.display().to_string(),
                ]);
                args
            }
            EngineCommand::Tag { source, target } => {
                vec!["tag".into(), source.to_string(), target.to_string()]
            }
            EngineCommand::Push { reference } => vec!["push".into(), reference.to_string()],
            EngineCommand::RemoveImage { reference } => {
                vec!["rmi".into(), reference.to_string()]
            }
            EngineCommand::Info => vec!["info".into()],
        }
    }

    /// Whether the engine's output is shown at normal verbosity
    pub fn streams_output(&self) -> bool {
        matches!(
            self,
            EngineCommand::Login { .. } | EngineCommand::Build { .. } | EngineCommand::Push { .. }
        )
    }
}

/// Renders the full command line, e.g. `docker tag app:latest alice/app:latest`.
impl fmt::Display for EngineCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ENGINE_BINARY)?;
        for arg in self.args() {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
