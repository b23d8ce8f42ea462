/// Configuration system for surch
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, SurchError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Hosting service used for shorthand references and blob links
    #[serde(default)]
    pub hosting: HostingConfig,

    /// Clone and result locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-commit scanning
    #[serde(default)]
    pub scan: ScanConfig,

    /// Clone/pull retry policy
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Hosting service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    /// Base web URL, e.g. "https://github.com"
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory for clones, laid out as `{org}/{repo}`
    #[serde(default = "default_clones_dir")]
    pub clones_dir: PathBuf,

    /// Root directory for result stores, laid out as `{org}/results.json`
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

/// Scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of commits searched concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Deadline for the whole scan in seconds (0 disables it)
    #[serde(default)]
    pub timeout_secs: u64,
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Total clone/pull attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

// Default value functions
fn default_base_url() -> String {
    "https://github.com".to_string()
}

fn default_clones_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_clones_dir()
}

fn default_results_dir() -> PathBuf {
    crate::paths::PlatformPaths::default_results_dir()
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            clones_dir: default_clones_dir(),
            results_dir: default_results_dir(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: 0,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, SurchError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, SurchError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), SurchError> {
        let base_url = self.hosting.base_url.trim_end_matches('/');
        if !base_url.contains("://") || base_url.ends_with(':') {
            return Err(ConfigError::InvalidValue {
                key: "hosting.base_url".to_string(),
                reason: format!("must be an absolute URL, got '{}'", self.hosting.base_url),
            }
            .into());
        }

        if self.scan.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scan.workers".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.sync.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sync.max_attempts".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SURCH_BASE_URL") {
            self.hosting.base_url = url;
        }

        if let Ok(path) = std::env::var("SURCH_CLONES_DIR") {
            self.paths.clones_dir = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SURCH_RESULTS_DIR") {
            self.paths.results_dir = PathBuf::from(path);
        }

        if let Ok(workers) = std::env::var("SURCH_WORKERS")
            && let Ok(n) = workers.parse()
        {
            self.scan.workers = n;
        }

        if let Ok(timeout) = std::env::var("SURCH_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse()
        {
            self.scan.timeout_secs = secs;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, SurchError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Base web URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.hosting.base_url.trim_end_matches('/')
    }
}
