//! Field validators.
//!
//! One pure function per field. Each returns the accepted (normalized) value
//! or a [`CtpError::Validation`] naming the field, the value and the rule.

use crate::error::{CtpError, Result};
use path_absolutize::Absolutize;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// File the engine builds from
pub const BUILD_DESCRIPTOR: &str = "Dockerfile";

/// Maximum image name and tag length
pub const MAX_REFERENCE_LEN: usize = 128;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,37}$").expect("valid regex"));

static IMAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:[._-][a-z0-9]+)*$").expect("valid regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid regex"));

/// Registry username: 1-38 chars, alphanumeric first, then `[A-Za-z0-9._-]`.
pub fn validate_username(username: &str) -> Result<String> {
    if username.is_empty() {
        return Err(CtpError::validation("username", username, "must not be empty"));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(CtpError::validation(
            "username",
            username,
            "must be 1-38 characters, start with a letter or digit, and contain only letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(username.to_string())
}

/// Image name: lowercase alphanumeric segments joined by single `.`, `_` or `-`.
pub fn validate_image_name(name: &str) -> Result<String> {
    if name.is_empty() || name.len() > MAX_REFERENCE_LEN {
        return Err(CtpError::validation(
            "image name",
            name,
            format!("must be 1-{} characters", MAX_REFERENCE_LEN),
        ));
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(CtpError::validation(
            "image name",
            name,
            "must be lowercase",
        ));
    }
    if !IMAGE_NAME_RE.is_match(name) {
        return Err(CtpError::validation(
            "image name",
            name,
            "must be lowercase letters and digits separated by single '.', '_' or '-' (no leading, trailing or repeated separators)",
        ));
    }
    Ok(name.to_string())
}

/// Image tag: username charset, 1-128 chars, no doubled separators.
pub fn validate_tag(tag: &str) -> Result<String> {
    if tag.is_empty() || tag.len() > MAX_REFERENCE_LEN {
        return Err(CtpError::validation(
            "tag",
            tag,
            format!("must be 1-{} characters", MAX_REFERENCE_LEN),
        ));
    }
    if !TAG_RE.is_match(tag) {
        return Err(CtpError::validation(
            "tag",
            tag,
            "must start with a letter or digit and contain only letters, digits, '.', '_' or '-'",
        ));
    }
    if let Some(doubled) = ["..", "--", "__"].iter().find(|sep| tag.contains(*sep)) {
        return Err(CtpError::validation(
            "tag",
            tag,
            format!("consecutive separator '{}' is not allowed", doubled),
        ));
    }
    Ok(tag.to_string())
}

/// Dockerfile directory: must exist, be a readable directory and contain a
/// readable `Dockerfile`. Returns the canonical path.
pub fn validate_dockerfile_dir(dir: &Path) -> Result<PathBuf> {
    const FIELD: &str = "dockerfile directory";

    let shown = dir
        .absolutize()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| dir.display().to_string());

    if !dir.exists() {
        return Err(CtpError::validation(FIELD, &shown, "directory does not exist"));
    }
    if !dir.is_dir() {
        return Err(CtpError::validation(FIELD, &shown, "not a directory"));
    }
    if let Err(e) = std::fs::read_dir(dir) {
        return Err(CtpError::validation(
            FIELD,
            &shown,
            format!("directory is not readable: {}", e),
        ));
    }

    let canonical = dir.canonicalize().map_err(|e| {
        CtpError::validation(FIELD, &shown, format!("cannot resolve path: {}", e))
    })?;
    if canonical
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(CtpError::validation(
            FIELD,
            &canonical.display().to_string(),
            "path still contains '..' after resolution",
        ));
    }

    let descriptor = canonical.join(BUILD_DESCRIPTOR);
    if !descriptor.is_file() {
        return Err(CtpError::validation(
            FIELD,
            &canonical.display().to_string(),
            format!("{} not found", BUILD_DESCRIPTOR),
        ));
    }
    if let Err(e) = std::fs::File::open(&descriptor) {
        return Err(CtpError::validation(
            FIELD,
            &canonical.display().to_string(),
            format!("{} is not readable: {}", BUILD_DESCRIPTOR, e),
        ));
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_of(err: CtpError) -> (&'static str, String) {
        match err {
            CtpError::Validation { field, rule, .. } => (field, rule),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn usernames() {
        let longest = "a".repeat(38);
        let too_long = "a".repeat(39);
        for ok in ["alice", "a", "Bob-99", "x.y_z", longest.as_str()] {
            assert!(validate_username(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-alice", ".alice", "al ice", "al/ice", too_long.as_str()] {
            let (field, _) = rule_of(validate_username(bad).unwrap_err());
            assert_eq!(field, "username");
        }
    }

    #[test]
    fn image_names() {
        let longest = "a".repeat(128);
        let too_long = "a".repeat(129);
        for ok in ["app", "my-app", "my_app.v2", "a1-b2_c3.d4", longest.as_str()] {
            assert!(validate_image_name(ok).is_ok(), "{ok}");
        }
        for bad in ["", "-app", "app-", "my--app", "my._app", "my app", too_long.as_str()] {
            assert!(validate_image_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn image_names_reject_uppercase() {
        for bad in ["App", "myAPP", "A"] {
            let (field, rule) = rule_of(validate_image_name(bad).unwrap_err());
            assert_eq!(field, "image name");
            assert_eq!(rule, "must be lowercase");
        }
    }

    #[test]
    fn tags() {
        for ok in ["latest", "main", "v1.0", "V1_0-rc.1", "2024.01.01"] {
            assert!(validate_tag(ok).is_ok(), "{ok}");
        }
        let too_long = "a".repeat(129);
        for bad in ["", ".hidden", "-x", "v1/0", "v 1", too_long.as_str()] {
            assert!(validate_tag(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn tags_reject_doubled_separators() {
        for bad in ["v1..0", "v1--0", "v1__0", "release--candidate"] {
            let (field, rule) = rule_of(validate_tag(bad).unwrap_err());
            assert_eq!(field, "tag");
            assert!(rule.contains("consecutive separator"), "{rule}");
        }
    }

    #[test]
    fn dockerfile_dir_requires_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let (_, rule) = rule_of(validate_dockerfile_dir(tmp.path()).unwrap_err());
        assert!(rule.contains("Dockerfile not found"));

        std::fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        let canonical = validate_dockerfile_dir(tmp.path()).unwrap();
        assert!(canonical.is_absolute());
        assert_eq!(canonical, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn dockerfile_dir_is_canonicalized() {
        let tmp = tempfile::tempdir().unwrap();
        let app = tmp.path().join("app");
        std::fs::create_dir(&app).unwrap();
        std::fs::write(app.join("Dockerfile"), "FROM scratch\n").unwrap();

        let dotted = tmp.path().join("app").join("..").join("app");
        let canonical = validate_dockerfile_dir(&dotted).unwrap();
        assert_eq!(canonical, app.canonicalize().unwrap());
        assert!(!canonical.components().any(|c| matches!(c, Component::ParentDir)));
    }

    #[test]
    fn dockerfile_dir_rejects_missing_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let (_, rule) = rule_of(validate_dockerfile_dir(&tmp.path().join("nope")).unwrap_err());
        assert_eq!(rule, "directory does not exist");

        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let (_, rule) = rule_of(validate_dockerfile_dir(&file).unwrap_err());
        assert_eq!(rule, "not a directory");
    }
}
