use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request to search the history of one repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Clone URL, local working copy path, or `:org/repo` shorthand
    pub reference: String,
    /// Literal strings to search for; a file matches if it contains any of them
    pub search_terms: Vec<String>,
    /// Directory for `results.json` (default: `{results_dir}/{organization}`)
    #[serde(default)]
    pub results_dir: Option<PathBuf>,
    /// Root under which clones are placed as `{org}/{repo}`
    #[serde(default)]
    pub clone_dir: Option<PathBuf>,
    /// Use an existing working copy as-is, without pulling
    #[serde(default)]
    pub skip_update: bool,
    /// Move an existing result store aside before writing
    #[serde(default)]
    pub rotate_results: bool,
    /// Delete the clone once results are written
    #[serde(default)]
    pub remove_clone: bool,
}

impl SearchRequest {
    /// Request with default options for the given reference and terms
    pub fn new(reference: impl Into<String>, search_terms: Vec<String>) -> Self {
        Self {
            reference: reference.into(),
            search_terms,
            results_dir: None,
            clone_dir: None,
            skip_update: false,
            rotate_results: false,
            remove_clone: false,
        }
    }
}

/// A commit whose content search failed and was treated as having no matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFailure {
    pub commit: String,
    pub reason: String,
}

/// Summary of one search run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchReport {
    pub organization: String,
    pub repository: String,
    pub local_path: PathBuf,
    pub results_path: PathBuf,
    /// Commits reachable from any ref
    pub commits_total: usize,
    /// Commits whose content search ran (successfully or not)
    pub commits_scanned: usize,
    /// Commits with at least one matching file
    pub commits_matched: usize,
    /// Content searches that failed; counted as "no matches"
    #[serde(default)]
    pub failed_commits: Vec<CommitFailure>,
    pub records_written: usize,
    /// Matcher output lines without a `sha:path` shape
    pub lines_skipped: usize,
    /// Records dropped because the commit header could not be parsed
    pub metadata_failures: usize,
    /// Records this run appended, in write order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ResultRecord>,
    pub duration_ms: u64,
}

/// One persisted match: a file at a commit that contains a search term
///
/// Field names are the persisted keys; the store sorts them on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub email: String,
    pub username: String,
    pub filepath: String,
    pub commit_sha: String,
    pub commit_time: String,
    pub repository_name: String,
    pub organization_name: String,
    pub blob_url: String,
}
