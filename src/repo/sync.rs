use crate::error::{GitError, RepoError};
use crate::git::GitBackend;
use crate::retry::{Exhausted, retry};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Makes sure a working copy exists and is current
pub struct Synchronizer<'a, B: GitBackend + ?Sized> {
    backend: &'a B,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a, B: GitBackend + ?Sized> Synchronizer<'a, B> {
    pub fn new(backend: &'a B, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            backend,
            max_attempts,
            retry_delay,
        }
    }

    /// Clone `source` into `local_path`, or pull if it is already there
    ///
    /// With `skip_update`, an existing working copy is used as-is and no network
    /// operation happens. The clone-or-pull is attempted up to `max_attempts`
    /// times before failing with [`RepoError::SyncFailed`].
    pub fn sync(&self, source: &str, local_path: &Path, skip_update: bool) -> Result<PathBuf, RepoError> {
        if local_path.exists() {
            if !self.backend.is_repository(local_path) {
                return Err(RepoError::NotARepository(local_path.display().to_string()));
            }
            if skip_update {
                tracing::info!("Using {} as-is (skip update)", local_path.display());
                return Ok(local_path.to_path_buf());
            }
        }

        retry(self.max_attempts, self.retry_delay, |attempt| {
            self.sync_once(source, local_path, attempt)
        })
        .map_err(|Exhausted { attempts, last_error }| RepoError::SyncFailed {
            source_ref: source.to_string(),
            attempts,
            reason: last_error.to_string(),
        })?;

        Ok(local_path.to_path_buf())
    }

    fn sync_once(&self, source: &str, local_path: &Path, attempt: u32) -> Result<(), GitError> {
        if local_path.exists() {
            tracing::info!("Pulling {} (attempt {})", local_path.display(), attempt);
            return self.backend.pull(local_path);
        }

        tracing::info!(
            "Cloning {} to {} (attempt {})",
            source,
            local_path.display(),
            attempt
        );
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GitError::CommandFailed {
                command: "clone".to_string(),
                stderr: format!("cannot create {}: {}", parent.display(), e),
            })?;
        }

        let result = self.backend.clone_repo(source, local_path);
        if result.is_err() && local_path.exists() {
            // A half-written clone would be mistaken for a working copy next attempt
            if let Err(e) = std::fs::remove_dir_all(local_path) {
                tracing::warn!(
                    "Failed to remove partial clone {}: {}",
                    local_path.display(),
                    e
                );
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGit;

    fn synchronizer(git: &FakeGit) -> Synchronizer<'_, FakeGit> {
        Synchronizer::new(git, 3, Duration::ZERO)
    }

    #[test]
    fn test_clones_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("org/repo");
        let git = FakeGit::new();

        let path = synchronizer(&git).sync("https://h/org/repo", &dest, false).unwrap();
        assert_eq!(path, dest);
        assert_eq!(git.count("clone"), 1);
        assert_eq!(git.count("pull"), 0);
    }

    #[test]
    fn test_pulls_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new();

        synchronizer(&git).sync("src", dir.path(), false).unwrap();
        assert_eq!(git.count("clone"), 0);
        assert_eq!(git.count("pull"), 1);
    }

    #[test]
    fn test_skip_update_never_touches_network() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("org/repo");
        let git = FakeGit::new();
        let sync = synchronizer(&git);

        sync.sync("https://h/org/repo", &dest, true).unwrap();
        let network_calls = git.count("clone") + git.count("pull");

        sync.sync("https://h/org/repo", &dest, true).unwrap();
        assert_eq!(git.count("clone") + git.count("pull"), network_calls);
        assert_eq!(git.count("pull"), 0);
    }

    #[test]
    fn test_retries_transient_clone_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("org/repo");
        let git = FakeGit::new().failing_sync(2);

        synchronizer(&git).sync("src", &dest, false).unwrap();
        // Partial clones were removed, so every attempt cloned again
        assert_eq!(git.count("clone"), 3);
        assert_eq!(git.count("pull"), 0);
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new().failing_sync(10);

        let err = synchronizer(&git).sync("src", dir.path(), false).unwrap_err();
        match err {
            RepoError::SyncFailed { attempts, reason, .. } => {
                assert_eq!(attempts, 3);
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(git.count("pull"), 3);
    }

    #[test]
    fn test_existing_non_repository_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit {
            not_repository: true,
            ..FakeGit::new()
        };

        let err = synchronizer(&git).sync("src", dir.path(), true).unwrap_err();
        assert!(matches!(err, RepoError::NotARepository(_)));
        assert_eq!(git.count("pull"), 0);
    }
}
