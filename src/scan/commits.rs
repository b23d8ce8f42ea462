use crate::git::{CommitId, GitBackend};
use std::collections::HashSet;
use std::path::Path;

/// Every commit reachable from any ref, in `rev-list --all` order
///
/// Unreadable history (not a working copy, corrupt objects) yields an empty list;
/// downstream there is no difference between "no commits" and "could not read".
pub fn list_commits<B: GitBackend + ?Sized>(backend: &B, repo_path: &Path) -> Vec<CommitId> {
    tracing::debug!("Retrieving list of commits in {}", repo_path.display());

    let output = match backend.rev_list_all(repo_path) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(
                "Could not list commits in {}, treating history as empty: {}",
                repo_path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut commits = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        match CommitId::parse(line) {
            Some(id) if seen.insert(id.clone()) => commits.push(id),
            Some(id) => tracing::debug!("Duplicate commit {} in rev-list output", id),
            None => tracing::debug!("Ignoring rev-list line {:?}", line),
        }
    }

    tracing::info!("Found {} commits in {}", commits.len(), repo_path.display());
    commits
}
