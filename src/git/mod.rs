//! Git plumbing for history search
//!
//! All repository access goes through the [`GitBackend`] trait. The production
//! implementation, [`GitCli`], drives the `git` executable as a subprocess.

/// Subprocess-backed git operations
pub mod backend;
/// Commit identifiers
pub mod commit;
/// Commit header parsing (author, email, date)
pub mod header;

pub use backend::{GitBackend, GitCli};
pub use commit::CommitId;
pub use header::CommitMetadata;

#[cfg(test)]
pub(crate) mod fake;
