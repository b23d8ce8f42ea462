//! History scanning: commit enumeration and per-commit content matching

/// Commit enumeration over every ref
pub mod commits;
/// Literal content search per commit
pub mod matcher;

pub use commits::list_commits;
pub use matcher::{CommitScan, ContentMatcher, ScanReport, SearchTerms, split_match_line};
