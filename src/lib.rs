//! # surch - search a repository's full git history for literal strings
//!
//! Given a repository reference (clone URL, local working copy, or `:org/repo`
//! shorthand) and one or more literal strings, surch brings a working copy up to
//! date, searches the tree of every commit reachable from any ref, and appends
//! one record per matching file to a JSON result store: who authored the
//! commit, when, which file, and a web link to the file at that commit.
//!
//! ## Pipeline
//!
//! ```text
//! reference ──► RepositoryProperties ──► Synchronizer ──► list_commits
//!                                                              │
//!          results.json ◄── ResultWriter ◄── ContentMatcher ◄──┘
//!                                 ▲
//!                          CommitMetadata
//! ```
//!
//! ## Modules
//!
//! - [`client`]: [`SurchClient`], the entry point running the pipeline
//! - [`repo`]: reference resolution and clone/pull synchronization
//! - [`scan`]: commit enumeration and per-commit content matching
//! - [`git`]: the [`git::GitBackend`] seam and commit header parsing
//! - [`store`]: the JSON result store and record writer
//! - [`config`]: configuration file and environment overrides
//! - [`error`]: error types and result aliases
//!
//! ## Usage Example
//!
//! ```no_run
//! use surch::{SearchRequest, SurchClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SurchClient::new()?;
//!     let mut request = SearchRequest::new(
//!         "https://github.com/nir0s/surch.git",
//!         vec!["password".to_string(), "secret_key".to_string()],
//!     );
//!     request.remove_clone = true;
//!
//!     let report = client.search(request, CancellationToken::new()).await?;
//!     println!("{} matches", report.records_written);
//!     Ok(())
//! }
//! ```

/// Search client running the full pipeline
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Git command-line access and commit parsing
pub mod git;

/// Platform directories for clones, results and configuration
pub mod paths;

/// Repository reference resolution and synchronization
pub mod repo;

/// Bounded retry of transient failures
pub mod retry;

/// Commit enumeration and content matching
pub mod scan;

/// JSON result store
pub mod store;

/// Request, report and record types
pub mod types;

pub use client::SurchClient;
pub use config::Config;
pub use error::{Result, SurchError};
pub use types::{ResultRecord, SearchReport, SearchRequest};
