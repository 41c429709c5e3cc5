//! Environment variable snapshot.
//!
//! The resolver and the credential provider read variables through an
//! [`Environment`] instead of `std::env`, so tests can hand them a fixed map.

use crate::error::{ConfigError, Result};
use std::collections::HashMap;

/// Captured set of environment variables
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Returns the value of `key` when it is set and not blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// This environment with `fallback` filling in unset or blank variables.
    ///
    /// Used to expose config file values (tokens included) to lookups that
    /// only consult the environment.
    pub fn with_fallback(&self, fallback: &Environment) -> Self {
        let mut vars = fallback.vars.clone();
        for (key, value) in &self.vars {
            if !value.trim().is_empty() || !vars.contains_key(key) {
                vars.insert(key.clone(), value.clone());
            }
        }
        Self { vars }
    }

    /// Returns the first non-blank value among `keys`, with the key that supplied it.
    pub fn first_of<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &str)> {
        keys.iter().find_map(|k| self.get(k).map(|v| (*k, v)))
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parses a boolean flag value from the environment or a config file.
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "true or false",
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_unset() {
        let env: Environment = [("A", ""), ("B", "  "), ("C", " x ")].into_iter().collect();
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B"), None);
        assert_eq!(env.get("C"), Some("x"));
        assert_eq!(env.get("D"), None);
    }

    #[test]
    fn first_of_respects_key_order() {
        let env: Environment = [("SECOND", "2"), ("THIRD", "3")].into_iter().collect();
        assert_eq!(env.first_of(&["FIRST", "SECOND", "THIRD"]), Some(("SECOND", "2")));
        assert_eq!(env.first_of(&["NONE"]), None);
    }

    #[test]
    fn fallback_fills_only_missing_values() {
        let process: Environment = [("DOCKER_TOKEN", "from-env"), ("GITHUB_TOKEN", " ")]
            .into_iter()
            .collect();
        let file: Environment = [
            ("DOCKER_TOKEN", "from-file"),
            ("GITHUB_TOKEN", "gh-file"),
            ("GHCR_TOKEN", "ghcr-file"),
        ]
        .into_iter()
        .collect();

        let merged = process.with_fallback(&file);
        assert_eq!(merged.get("DOCKER_TOKEN"), Some("from-env"));
        assert_eq!(merged.get("GITHUB_TOKEN"), Some("gh-file"));
        assert_eq!(merged.get("GHCR_TOKEN"), Some("ghcr-file"));
        let empty = Environment::default().with_fallback(&file);
        assert_eq!(empty.get("DOCKER_TOKEN"), Some("from-file"));
    }

    #[test]
    fn booleans() {
        for t in ["true", "TRUE", "1", "yes", "On"] {
            assert!(parse_bool("K", t).unwrap());
        }
        for f in ["false", "0", "No", "off"] {
            assert!(!parse_bool("K", f).unwrap());
        }
        assert!(parse_bool("USE_CACHE", "maybe").is_err());
    }
}
