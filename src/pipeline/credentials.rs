//! Registry credential lookup.
//!
//! Tokens come from the registry's primary variable, then its secondary
//! variable, then a masked terminal prompt. The token is only ever handed to
//! the engine on stdin.

use crate::config::{Environment, Registry};
use crate::error::{CtpError, Result};
use std::fmt;
use std::io::IsTerminal;

/// A registry token. Redacted in `Debug`/`Display`, zeroed on drop.
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token, for writing to the engine's stdin only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.fill(0);
        std::hint::black_box(&bytes);
    }
}

/// Where a token would come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment variable holding the token
    Variable(&'static str),
    /// Masked prompt on the controlling terminal
    Prompt,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Variable(name) => write!(f, "environment variable {}", name),
            CredentialSource::Prompt => f.write_str("interactive prompt"),
        }
    }
}

/// Resolves the token for one registry
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    registry: Registry,
    username: String,
    env: Environment,
    interactive: bool,
}

impl CredentialProvider {
    /// Provider that may prompt when stdin is a terminal.
    pub fn new(registry: Registry, username: impl Into<String>, env: Environment) -> Self {
        Self {
            registry,
            username: username.into(),
            env,
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Overrides terminal detection.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Variable the user should set when no token is found
    pub fn primary_variable(&self) -> &'static str {
        self.registry.token_vars()[0]
    }

    /// Source that [`resolve`](Self::resolve) would use, without prompting.
    pub fn describe(&self) -> Option<CredentialSource> {
        if let Some((key, _)) = self.env.first_of(&self.registry.token_vars()) {
            return Some(CredentialSource::Variable(key));
        }
        self.interactive.then_some(CredentialSource::Prompt)
    }

    /// Returns the token, prompting on the terminal as a last resort.
    pub async fn resolve(&self) -> Result<Secret> {
        let vars = self.registry.token_vars();
        if let Some((key, token)) = self.env.first_of(&vars) {
            log::debug!("Using {} token from {}", self.registry.display_name(), key);
            return Ok(Secret::new(token));
        }

        if !self.interactive {
            return Err(self.missing(format!(
                "no {} token found in {} or {} and no terminal to prompt on",
                self.registry.display_name(),
                vars[0],
                vars[1]
            )));
        }

        let prompt = format!(
            "{} token for {}: ",
            self.registry.display_name(),
            self.username
        );
        let token = tokio::task::spawn_blocking(move || read_masked(&prompt))
            .await
            .map_err(|e| self.missing(format!("token prompt failed: {}", e)))?
            .map_err(|e| self.missing(format!("cannot read token from terminal: {}", e)))?;

        if token.is_empty() {
            return Err(self.missing("empty token entered".to_string()));
        }
        Ok(token)
    }

    fn missing(&self, reason: String) -> CtpError {
        CtpError::Credential {
            variable: self.primary_variable(),
            reason,
        }
    }
}

/// Terminal settings saved while a masked prompt has echo turned off
#[cfg(unix)]
static SAVED_TERMINAL: std::sync::Mutex<Option<nix::sys::termios::Termios>> =
    std::sync::Mutex::new(None);

/// Puts back the terminal settings of an unfinished masked prompt.
///
/// The prompt reads on a blocking thread that is never joined when the run
/// is interrupted, so the caller restores echo here before exiting.
#[cfg(unix)]
pub fn restore_terminal() {
    restore_terminal_on(&std::io::stdin());
}

#[cfg(not(unix))]
pub fn restore_terminal() {}

/// Returns `true` when saved settings were applied to `fd`.
#[cfg(unix)]
fn restore_terminal_on(fd: impl std::os::fd::AsFd) -> bool {
    use nix::sys::termios::{self, SetArg};

    let saved = SAVED_TERMINAL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    match saved {
        Some(original) => {
            if let Err(e) = termios::tcsetattr(fd, SetArg::TCSANOW, &original) {
                log::debug!("Cannot restore terminal settings: {}", e);
            }
            true
        }
        None => false,
    }
}

/// Reads one line from the terminal with echo disabled.
#[cfg(unix)]
fn read_masked(prompt: &str) -> std::io::Result<Secret> {
    use nix::sys::termios::{self, LocalFlags, SetArg};
    use std::io::{BufRead, Write};

    let stdin = std::io::stdin();
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;

    let original = termios::tcgetattr(&stdin)?;
    let mut silent = original.clone();
    silent.local_flags.remove(LocalFlags::ECHO);
    silent.local_flags.insert(LocalFlags::ECHONL);
    *SAVED_TERMINAL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(original);
    termios::tcsetattr(&stdin, SetArg::TCSANOW, &silent)?;

    let mut line = Secret::new(String::new());
    let read = stdin.lock().read_line(&mut line.0);
    // Restore echo before reporting a read error
    restore_terminal_on(&stdin);
    read?;

    let trimmed = line.0.trim_end_matches(['\r', '\n']).len();
    line.0.truncate(trimmed);
    Ok(line)
}

#[cfg(not(unix))]
fn read_masked(prompt: &str) -> std::io::Result<Secret> {
    use std::io::{BufRead, Write};

    log::warn!("Input will be visible: terminal echo cannot be disabled on this platform");
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", prompt)?;
    stderr.flush()?;

    let mut line = Secret::new(String::new());
    std::io::stdin().lock().read_line(&mut line.0)?;
    let trimmed = line.0.trim_end_matches(['\r', '\n']).len();
    line.0.truncate(trimmed);
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(registry: Registry, env: &[(&str, &str)]) -> CredentialProvider {
        CredentialProvider::new(registry, "alice", env.iter().copied().collect()).interactive(false)
    }

    #[tokio::test]
    async fn primary_variable_wins() {
        let p = provider(
            Registry::Docker,
            &[("DOCKER_TOKEN", "primary"), ("DOCKER_PASSWORD", "secondary")],
        );
        assert_eq!(p.resolve().await.unwrap().expose(), "primary");
        assert_eq!(p.describe(), Some(CredentialSource::Variable("DOCKER_TOKEN")));
    }

    #[tokio::test]
    async fn secondary_variable_is_fallback() {
        let p = provider(Registry::Github, &[("GHCR_TOKEN", "ghcr"), ("DOCKER_TOKEN", "x")]);
        assert_eq!(p.resolve().await.unwrap().expose(), "ghcr");
        assert_eq!(p.describe(), Some(CredentialSource::Variable("GHCR_TOKEN")));
    }

    #[tokio::test]
    async fn non_interactive_without_token_names_primary_variable() {
        for (registry, expected) in [
            (Registry::Docker, "DOCKER_TOKEN"),
            (Registry::Github, "GITHUB_TOKEN"),
        ] {
            let p = provider(registry, &[("DOCKER_TOKEN", "")]);
            assert_eq!(p.describe(), None);
            match p.resolve().await.unwrap_err() {
                CtpError::Credential { variable, .. } => assert_eq!(variable, expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn interactive_describes_prompt() {
        let p = provider(Registry::Docker, &[]).interactive(true);
        assert_eq!(p.describe(), Some(CredentialSource::Prompt));
    }

    #[cfg(unix)]
    #[test]
    fn saved_terminal_settings_are_restored_once() {
        use nix::pty::openpty;
        use nix::sys::termios::{self, LocalFlags, SetArg};

        let pty = openpty(None, None).unwrap();
        let mut echoing = termios::tcgetattr(&pty.slave).unwrap();
        echoing.local_flags.insert(LocalFlags::ECHO);
        termios::tcsetattr(&pty.slave, SetArg::TCSANOW, &echoing).unwrap();

        let mut silent = echoing.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        *SAVED_TERMINAL.lock().unwrap() = Some(echoing);
        termios::tcsetattr(&pty.slave, SetArg::TCSANOW, &silent).unwrap();

        assert!(restore_terminal_on(&pty.slave));
        let restored = termios::tcgetattr(&pty.slave).unwrap();
        assert!(restored.local_flags.contains(LocalFlags::ECHO));
        // the slot is emptied, a second restore does nothing
        assert!(!restore_terminal_on(&pty.slave));
    }

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert!(!format!("{:?}", secret).contains("hunter2"));
        assert!(!secret.is_empty());
    }
}
