//! Error types for configuration, validation and pipeline operations.
//!
//! Every variant carries enough context to reproduce the failure (field name,
//! offending value, or the engine command and image reference involved).

use std::fmt;
use thiserror::Error;

/// Result type alias for docker-ctp operations
pub type Result<T> = std::result::Result<T, CtpError>;

/// Main error type for all docker-ctp operations
#[derive(Error, Debug)]
pub enum CtpError {
    /// Configuration could not be resolved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A resolved value failed its format rule
    #[error("Invalid {field} '{value}': {rule}")]
    Validation {
        /// Field name (e.g. "tag")
        field: &'static str,
        /// Offending value
        value: String,
        /// Rule that was violated
        rule: String,
    },

    /// External tool or engine service missing
    #[error("Dependency error: {reason}")]
    Dependency {
        /// What is missing or unreachable
        reason: String,
        /// How to fix it
        hint: String,
    },

    /// No registry token available
    #[error("Credential error: {reason}")]
    Credential {
        /// Environment variable the user should set
        variable: &'static str,
        /// Reason for the error
        reason: String,
    },

    /// The engine command could not be spawned or awaited
    #[error("Command execution failed: {command} - {reason}")]
    Engine {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// A pipeline stage reported failure
    #[error("{stage} failed for {target}: {reason}")]
    Stage {
        /// Stage that failed
        stage: Stage,
        /// Image reference or registry involved
        target: String,
        /// Reason for the error
        reason: String,
    },

    /// Run aborted by a termination signal
    #[error("Interrupted by {signal}")]
    Interrupted {
        /// Signal name
        signal: &'static str,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Registry literal not one of the supported values
    #[error("Unknown registry '{value}' (expected 'docker' or 'github')")]
    UnknownRegistry {
        /// Value as supplied
        value: String,
    },

    /// Required field empty after every layer was consulted
    #[error("Missing required value for {field} (set it with {source_hint})")]
    MissingField {
        /// Field name
        field: &'static str,
        /// Flag or variable that would supply it
        source_hint: String,
    },

    /// Value present but unparseable
    #[error("Invalid value for {key}: '{value}' ({expected})")]
    InvalidValue {
        /// Variable or flag name
        key: String,
        /// Value as supplied
        value: String,
        /// What was expected instead
        expected: &'static str,
    },

    /// Config file found but unreadable
    #[error("Cannot read configuration file {path}: {reason}")]
    ConfigFile {
        /// File path
        path: String,
        /// Reason for the error
        reason: String,
    },
}

/// Execution pipeline stages, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    ExistenceCheck,
    Build,
    Tag,
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Login => "Login",
            Stage::ExistenceCheck => "Existence check",
            Stage::Build => "Build",
            Stage::Tag => "Tag",
            Stage::Push => "Push",
        };
        f.write_str(name)
    }
}

impl CtpError {
    /// Builds a validation error for `field`.
    pub fn validation(field: &'static str, value: &str, rule: impl Into<String>) -> Self {
        CtpError::Validation {
            field,
            value: value.to_string(),
            rule: rule.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CtpError::Config(_) | CtpError::Validation { .. } => 2,
            CtpError::Dependency { .. } => 3,
            CtpError::Credential { .. } => 4,
            CtpError::Engine { .. } | CtpError::Stage { .. } => 5,
            CtpError::Interrupted { .. } => 130,
            CtpError::Io(_) => 1,
        }
    }

    /// Actionable remediation for this error, if one is known
    pub fn hint(&self) -> Option<String> {
        match self {
            CtpError::Config(ConfigError::UnknownRegistry { .. }) => {
                Some("Use --registry docker or --registry github".to_string())
            }
            CtpError::Config(ConfigError::MissingField { source_hint, .. }) => {
                Some(format!("Provide a value via {}", source_hint))
            }
            CtpError::Config(_) => {
                Some("Run with --generate-config to see every supported setting".to_string())
            }
            CtpError::Validation { .. } => None,
            CtpError::Dependency { hint, .. } => Some(hint.clone()),
            CtpError::Credential { variable, .. } => Some(format!(
                "Export {} or run from an interactive terminal",
                variable
            )),
            CtpError::Stage {
                stage: Stage::Login,
                ..
            } => Some("Check the username and token for the selected registry".to_string()),
            CtpError::Stage {
                stage: Stage::Push, ..
            } => Some(
                "Login succeeded; check that the token has write access to the repository"
                    .to_string(),
            ),
            CtpError::Stage { .. } | CtpError::Engine { .. } => {
                Some("Re-run with --verbose to see the full engine output".to_string())
            }
            CtpError::Interrupted { .. } | CtpError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let config = CtpError::from(ConfigError::UnknownRegistry {
            value: "quay".into(),
        });
        assert_eq!(config.exit_code(), 2);
        assert_eq!(CtpError::validation("tag", "a--b", "x").exit_code(), 2);
        let stage = CtpError::Stage {
            stage: Stage::Push,
            target: "alice/app:latest".into(),
            reason: "exit code 1".into(),
        };
        assert_eq!(stage.exit_code(), 5);
        assert_eq!(CtpError::Interrupted { signal: "SIGINT" }.exit_code(), 130);
    }

    #[test]
    fn push_and_login_failures_read_differently() {
        let login = CtpError::Stage {
            stage: Stage::Login,
            target: "ghcr.io".into(),
            reason: "exit code 1".into(),
        };
        let push = CtpError::Stage {
            stage: Stage::Push,
            target: "ghcr.io/alice/app:main".into(),
            reason: "exit code 1".into(),
        };
        assert!(login.to_string().starts_with("Login failed"));
        assert!(push.to_string().starts_with("Push failed"));
        assert_ne!(login.hint(), push.hint());
    }
}
