/// Centralized error types for surch using thiserror
///
/// Fatal errors (reference resolution, synchronization, invalid input) abort a run.
/// Per-commit scan failures are never represented here; they are collected into
/// the [`crate::types::SearchReport`] instead.
use crate::types::SearchReport;
use thiserror::Error;

/// Main error type for surch
#[derive(Error, Debug)]
pub enum SurchError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Result store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "Search interrupted after scanning {} of {} commits ({} records written)",
        .0.commits_scanned,
        .0.commits_total,
        .0.records_written
    )]
    Interrupted(Box<SearchReport>),

    #[error("{0}")]
    Other(String),
}

/// Errors resolving or synchronizing the repository to scan
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Invalid repository reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Not a git working copy: {0}")]
    NotARepository(String),

    #[error("Working copy at '{0}' has no origin remote configured")]
    MissingRemote(String),

    #[error("Failed to synchronize '{source_ref}' after {attempts} attempt(s): {reason}")]
    SyncFailed {
        source_ref: String,
        attempts: u32,
        reason: String,
    },
}

/// Errors from invoking the git executable
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Spawn(String),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected commit header for {commit}: {reason}")]
    MetadataParse { commit: String, reason: String },
}

/// Errors related to the JSON result store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open result store '{path}': {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to write result store '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Result store '{0}' is not a JSON document collection")]
    Corrupted(String),

    #[error("Failed to lock result store: {0}")]
    LockFailed(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to caller input
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<anyhow::Error> for SurchError {
    fn from(err: anyhow::Error) -> Self {
        SurchError::Other(format!("{:#}", err))
    }
}

impl SurchError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        SurchError::Other(msg.into())
    }

    /// Shorthand for an [`ValidationError::InvalidInput`]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        SurchError::Validation(ValidationError::InvalidInput(msg.into()))
    }

    /// Check if this is a user error (bad reference or input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SurchError::Validation(_)
                | SurchError::Repo(RepoError::InvalidReference { .. })
                | SurchError::Repo(RepoError::NotARepository(_))
                | SurchError::Config(ConfigError::InvalidValue { .. })
        )
    }

    /// The partial report of an interrupted run, if any
    pub fn partial_report(&self) -> Option<&SearchReport> {
        match self {
            SurchError::Interrupted(report) => Some(report),
            _ => None,
        }
    }
}

pub type Result<T, E = SurchError> = std::result::Result<T, E>;
