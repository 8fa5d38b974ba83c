//! Server configuration resolution.
//!
//! Precedence for every setting: CLI flag, then `SIMDASH_*` environment
//! variable, then built-in default.

use std::path::PathBuf;

pub const ENV_RESOURCES_DIR: &str = "SIMDASH_RESOURCES_DIR";
pub const ENV_LISTEN_ADDR: &str = "SIMDASH_LISTEN_ADDR";
pub const ENV_STATIC_DIR: &str = "SIMDASH_STATIC_DIR";
pub const ENV_APP_TITLE: &str = "SIMDASH_APP_TITLE";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_APP_TITLE: &str = "Simdash";

const FETCH_INTERVAL_MIN_MS: u32 = 50;
const FETCH_INTERVAL_MAX_MS: u32 = 5000;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding templates, source models, and notices.
    pub resources_dir: PathBuf,
    /// Address the API server binds to.
    pub listen_addr: String,
    /// Optional directory of static frontend files served at `/`.
    pub static_dir: Option<PathBuf>,
    /// Title baked into generated HTML pages.
    pub app_title: String,
}

impl Settings {
    pub fn resolve(
        resources_dir: Option<&str>,
        listen_addr: Option<&str>,
        static_dir: Option<&str>,
    ) -> Settings {
        Settings {
            resources_dir: resolve_resources_dir(resources_dir),
            listen_addr: listen_addr
                .map(str::to_string)
                .or_else(|| std::env::var(ENV_LISTEN_ADDR).ok())
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            static_dir: static_dir
                .map(PathBuf::from)
                .or_else(|| std::env::var(ENV_STATIC_DIR).ok().map(PathBuf::from)),
            app_title: std::env::var(ENV_APP_TITLE)
                .unwrap_or_else(|_| DEFAULT_APP_TITLE.to_string()),
        }
    }
}

fn resolve_resources_dir(explicit: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var(ENV_RESOURCES_DIR) {
        return PathBuf::from(dir);
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

/// Fetch intervals outside the supported window are clamped, not rejected:
/// below 50 ms the page hammers the embedded server, above 5 s the gauges
/// go stale.
pub fn clamp_fetch_interval(interval_ms: u32) -> u32 {
    interval_ms.clamp(FETCH_INTERVAL_MIN_MS, FETCH_INTERVAL_MAX_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_resources_dir_wins() {
        let settings = Settings::resolve(Some("/tmp/res"), None, None);
        assert_eq!(settings.resources_dir, PathBuf::from("/tmp/res"));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(Some("/tmp/res"), None, None);
        assert_eq!(settings.listen_addr, DEFAULT_LISTEN_ADDR);
        assert!(settings.resources_dir.is_absolute());
    }

    #[test]
    fn test_fetch_interval_clamped() {
        assert_eq!(clamp_fetch_interval(10), 50);
        assert_eq!(clamp_fetch_interval(200), 200);
        assert_eq!(clamp_fetch_interval(60_000), 5000);
    }
}
