/// Centralized platform-specific path computation
///
/// Clones live under the cache directory (they can always be re-fetched), result
/// stores under the data directory, and the config file under the config directory.
use std::path::{Path, PathBuf};

const APP_DIR: &str = "surch";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Cache directory for the current platform, falling back to `.`
    ///
    /// - Windows: %LOCALAPPDATA%
    /// - macOS: ~/Library/Caches
    /// - Linux/Unix: $XDG_CACHE_HOME or ~/.cache
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Data directory for the current platform, falling back to `.`
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Config directory for the current platform, falling back to `.`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {cache_dir}/surch/clones
    pub fn default_clones_dir() -> PathBuf {
        Self::cache_dir().join(APP_DIR).join("clones")
    }

    /// Returns: {data_dir}/surch/results
    pub fn default_results_dir() -> PathBuf {
        Self::data_dir().join(APP_DIR).join("results")
    }

    /// Returns: {config_dir}/surch/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join(APP_DIR).join("config.toml")
    }

    /// Location of a working copy: `{root}/{organization}/{name}`
    pub fn clone_path(root: &Path, organization: &str, name: &str) -> PathBuf {
        root.join(organization).join(name)
    }

    /// Location of the result store for a run
    ///
    /// An explicit directory holds `results.json` directly; otherwise the store
    /// goes under `{results_root}/{organization}/results.json`.
    pub fn results_file(explicit: Option<&Path>, results_root: &Path, organization: &str) -> PathBuf {
        match explicit {
            Some(dir) => dir.join("results.json"),
            None => results_root.join(organization).join("results.json"),
        }
    }
}
