//! Build-context auditing.
//!
//! Looks at the directory the engine will send as build context and reports
//! problems that make builds slow or leak files into the image. Findings are
//! advisory: the audit never fails and never changes what the pipeline does.

use crate::utils::humanize_bytes;
use glob::Pattern;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Ignore file read by the engine
pub const IGNORE_FILE: &str = ".dockerignore";

/// Files above this size are reported (50 MiB)
pub const LARGE_FILE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Levels below the context root that are scanned
pub const SCAN_DEPTH: usize = 2;

/// Content that rarely belongs in an image
pub const COMMON_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "*.log",
    "*.tmp",
    ".DS_Store",
    "Thumbs.db",
    "*.swp",
    "*.swo",
    ".vscode",
    ".idea",
    "coverage",
    "*.md",
    "README*",
];

static COMMON_PATTERNS: LazyLock<Vec<(&'static str, Pattern)>> = LazyLock::new(|| {
    COMMON_EXCLUDES
        .iter()
        .filter_map(|p| Pattern::new(p).ok().map(|compiled| (*p, compiled)))
        .collect()
});

/// One audit observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingIgnoreFile,
    UnreadableIgnoreFile { reason: String },
    /// Line number of a pattern that excludes the whole context
    IgnoresEverything { line: usize },
    Excludable {
        pattern: &'static str,
        paths: Vec<PathBuf>,
    },
    LargeFile { path: PathBuf, size: u64 },
}

impl Finding {
    /// What to do about it
    pub fn suggestion(&self) -> String {
        match self {
            Finding::MissingIgnoreFile => format!(
                "Create a {} (docker-ctp --generate-config writes a starter file)",
                IGNORE_FILE
            ),
            Finding::UnreadableIgnoreFile { .. } => {
                format!("Check the permissions of {}", IGNORE_FILE)
            }
            Finding::IgnoresEverything { .. } => {
                "Re-include needed files with '!' patterns, or remove the line".to_string()
            }
            Finding::Excludable { pattern, .. } => {
                format!("Add '{}' to {}", pattern, IGNORE_FILE)
            }
            Finding::LargeFile { path, .. } => format!(
                "Exclude {} or fetch it in a multi-stage build",
                path.display()
            ),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingIgnoreFile => write!(f, "No {} found in build context", IGNORE_FILE),
            Finding::UnreadableIgnoreFile { reason } => {
                write!(f, "Could not read {}: {}", IGNORE_FILE, reason)
            }
            Finding::IgnoresEverything { line } => write!(
                f,
                "{} line {} may exclude everything",
                IGNORE_FILE, line
            ),
            Finding::Excludable { pattern, paths } => {
                let shown: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "Found '{}' in build context: {}",
                    pattern,
                    shown.join(", ")
                )
            }
            Finding::LargeFile { path, size } => write!(
                f,
                "Large file in build context: {} ({})",
                path.display(),
                humanize_bytes(*size)
            ),
        }
    }
}

/// Audit outcome
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Logs every finding with its suggestion, then a summary line.
    pub fn log(&self) {
        for finding in &self.findings {
            log::warn!("{}", finding);
            log::warn!("  Suggestion: {}", finding.suggestion());
        }
        if self.is_clean() {
            log::info!("Build context check passed with no issues");
        } else {
            log::warn!(
                "Build context check completed with {} warning(s)",
                self.findings.len()
            );
        }
    }
}

/// Patterns from the ignore file
#[derive(Debug, Default)]
struct IgnoreRules {
    patterns: Vec<(Pattern, bool)>,
}

impl IgnoreRules {
    fn parse(contents: &str) -> Self {
        let patterns = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('!'))
            .filter_map(|l| {
                let l = l.trim_start_matches("./").trim_start_matches('/');
                let l = l.trim_end_matches('/');
                let anchored = l.contains('/');
                Pattern::new(l).ok().map(|p| (p, anchored))
            })
            .collect();
        Self { patterns }
    }

    /// Whether `rel` or one of its parent directories is excluded.
    fn is_excluded(&self, rel: &Path) -> bool {
        rel.ancestors()
            .filter(|a| !a.as_os_str().is_empty())
            .any(|ancestor| {
                let name = ancestor
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default();
                self.patterns.iter().any(|(pattern, anchored)| {
                    pattern.matches_path(ancestor) || (!anchored && pattern.matches(&name))
                })
            })
    }
}

/// Audits the build context rooted at `dir`.
pub fn audit_build_context(dir: &Path) -> AuditReport {
    log::info!("Checking build context in {}...", dir.display());
    let mut findings = Vec::new();

    let ignore_path = dir.join(IGNORE_FILE);
    let rules = if !ignore_path.is_file() {
        findings.push(Finding::MissingIgnoreFile);
        IgnoreRules::default()
    } else {
        match std::fs::read_to_string(&ignore_path) {
            Ok(contents) => {
                for (idx, line) in contents.lines().enumerate() {
                    if matches!(line.trim(), "*" | "**") {
                        findings.push(Finding::IgnoresEverything { line: idx + 1 });
                    }
                }
                IgnoreRules::parse(&contents)
            }
            Err(e) => {
                findings.push(Finding::UnreadableIgnoreFile {
                    reason: e.to_string(),
                });
                IgnoreRules::default()
            }
        }
    };

    let mut excludable: Vec<Vec<PathBuf>> = vec![Vec::new(); COMMON_PATTERNS.len()];
    let mut large = Vec::new();

    let mut walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(SCAN_DEPTH)
        .sort_by_file_name()
        .into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_path_buf();
        let is_dir = entry.file_type().is_dir();

        if rules.is_excluded(&rel) {
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_file() {
            match entry.metadata() {
                Ok(meta) if meta.len() > LARGE_FILE_THRESHOLD => {
                    large.push(Finding::LargeFile {
                        path: rel.clone(),
                        size: meta.len(),
                    });
                }
                Ok(_) => {}
                Err(e) => log::debug!("Cannot stat {}: {}", rel.display(), e),
            }
        }

        let name = entry.file_name().to_string_lossy();
        if let Some(idx) = COMMON_PATTERNS
            .iter()
            .position(|(_, pattern)| pattern.matches(&name))
        {
            excludable[idx].push(rel);
            if is_dir {
                walker.skip_current_dir();
            }
        }
    }

    findings.extend(
        COMMON_PATTERNS
            .iter()
            .zip(excludable)
            .filter(|(_, paths)| !paths.is_empty())
            .map(|((pattern, _), paths)| Finding::Excludable {
                pattern: *pattern,
                paths,
            }),
    );
    findings.extend(large);

    AuditReport { findings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        tmp
    }

    #[test]
    fn missing_ignore_file_is_reported() {
        let tmp = context();
        let report = audit_build_context(tmp.path());
        assert_eq!(report.findings, [Finding::MissingIgnoreFile]);
        assert!(report.findings[0].suggestion().contains("--generate-config"));
    }

    #[test]
    fn clean_context_has_no_findings() {
        let tmp = context();
        fs::write(tmp.path().join(IGNORE_FILE), ".git\n").unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("main.rs"), "fn main() {}\n").unwrap();
        assert!(audit_build_context(tmp.path()).is_clean());
    }

    #[test]
    fn ignore_everything_lines_are_flagged() {
        let tmp = context();
        fs::write(tmp.path().join(IGNORE_FILE), "# all\n*\n!Dockerfile\n**\n").unwrap();
        let report = audit_build_context(tmp.path());
        assert_eq!(
            report.findings,
            [
                Finding::IgnoresEverything { line: 2 },
                Finding::IgnoresEverything { line: 4 },
            ]
        );
    }

    #[test]
    fn excludable_content_respects_ignore_file() {
        let tmp = context();
        fs::write(tmp.path().join(IGNORE_FILE), "node_modules/\n*.log\n").unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git").join("HEAD"), "ref: main\n").unwrap();
        fs::create_dir(tmp.path().join("node_modules")).unwrap();
        fs::write(tmp.path().join("debug.log"), "x").unwrap();
        fs::write(tmp.path().join("notes.md"), "x").unwrap();
        fs::create_dir(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("docs").join("guide.md"), "x").unwrap();

        let report = audit_build_context(tmp.path());
        assert_eq!(
            report.findings,
            [
                Finding::Excludable {
                    pattern: ".git",
                    paths: vec![PathBuf::from(".git")],
                },
                Finding::Excludable {
                    pattern: "*.md",
                    paths: vec![PathBuf::from("docs/guide.md"), PathBuf::from("notes.md")],
                },
            ]
        );
    }

    #[test]
    fn scan_stops_two_levels_down() {
        let tmp = context();
        fs::write(tmp.path().join(IGNORE_FILE), "").unwrap();
        let deep = tmp.path().join("a").join("b");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("deep.log"), "x").unwrap();
        assert!(audit_build_context(tmp.path()).is_clean());
    }

    #[test]
    fn large_files_are_reported_with_size() {
        let tmp = context();
        fs::write(tmp.path().join(IGNORE_FILE), "").unwrap();
        let file = fs::File::create(tmp.path().join("large_file.bin")).unwrap();
        file.set_len(60 * 1024 * 1024).unwrap();

        let report = audit_build_context(tmp.path());
        assert_eq!(
            report.findings,
            [Finding::LargeFile {
                path: PathBuf::from("large_file.bin"),
                size: 60 * 1024 * 1024,
            }]
        );
        assert_eq!(
            report.findings[0].to_string(),
            "Large file in build context: large_file.bin (60.0 MiB)"
        );
    }
}
