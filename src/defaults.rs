//! Default values for forkpatch configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "forkpatch.yaml";

/// Directory under the project root holding sync state and the work tree.
pub const STATE_DIR_NAME: &str = ".forkpatch";

/// Environment variable holding the publish username.
pub const PUBLISH_USERNAME_ENV: &str = "REPO_USER";

/// Environment variable holding the publish password.
pub const PUBLISH_PASSWORD_ENV: &str = "REPO_PASSWORD";

/// Returns the default upstream checkout cache root.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/forkpatch` (XDG Base Directory)
/// - macOS: `~/Library/Caches/forkpatch`
/// - Windows: `{FOLDERID_LocalAppData}\forkpatch`
///
/// Falls back to `.forkpatch-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `FORKPATCH_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".forkpatch-cache"))
        .join("forkpatch")
}

/// Build cache directories removed by `clean-build-cache`.
pub fn default_cache_dirs() -> Vec<String> {
    vec![".gradle/caches".to_string(), ".gradle/build-cache".to_string()]
}

/// Location of the report written by `build-report`.
pub fn default_report_path() -> String {
    "build/reports/build-report.txt".to_string()
}

pub fn default_java_release() -> u32 {
    21
}

pub fn default_encoding() -> String {
    "UTF-8".to_string()
}

pub fn default_compiler_args() -> Vec<String> {
    vec!["-Xlint:-deprecation".to_string(), "-Xlint:-removal".to_string()]
}

pub fn default_true() -> bool {
    true
}

pub fn default_username_env() -> String {
    PUBLISH_USERNAME_ENV.to_string()
}

pub fn default_password_env() -> String {
    PUBLISH_PASSWORD_ENV.to_string()
}

/// Branch compared against the pinned ref by `check-upstream-updates`.
pub fn default_upstream_branch() -> String {
    "main".to_string()
}
