//! Build metadata reported to the frontend.

use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct AppMetadata {
    pub app_version: String,
    /// Short git commit hash, when the server runs from a checkout.
    pub commit_hash: Option<String>,
}

impl AppMetadata {
    pub fn collect() -> AppMetadata {
        AppMetadata {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            commit_hash: read_commit_hash(),
        }
    }

    /// Version string for display, with the commit appended when known.
    pub fn display_version(&self) -> String {
        match &self.commit_hash {
            Some(hash) => format!("{} ({hash})", self.app_version),
            None => self.app_version.clone(),
        }
    }
}

fn commit_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]+$").unwrap())
}

/// Missing git or a non-repo working directory is normal in deployment;
/// the hash is simply absent then.
fn read_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        debug!("git rev-parse failed, omitting commit hash");
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?.trim().to_string();
    if commit_hash_pattern().is_match(&hash) {
        Some(hash)
    } else {
        debug!("unexpected git output, omitting commit hash");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_never_fails() {
        let metadata = AppMetadata::collect();
        assert_eq!(metadata.app_version, env!("CARGO_PKG_VERSION"));
        if let Some(hash) = &metadata.commit_hash {
            assert!(commit_hash_pattern().is_match(hash));
        }
    }

    #[test]
    fn test_display_version_includes_hash() {
        let metadata = AppMetadata {
            app_version: "1.2.3".to_string(),
            commit_hash: Some("abc123".to_string()),
        };
        assert_eq!(metadata.display_version(), "1.2.3 (abc123)");
    }

    #[test]
    fn test_hash_pattern_rejects_noise() {
        assert!(commit_hash_pattern().is_match("deadbeef"));
        assert!(!commit_hash_pattern().is_match("fatal: not a git repository"));
        assert!(!commit_hash_pattern().is_match(""));
    }
}
