use super::SurchClient;
use crate::error::{Result, SurchError};
use crate::git::GitBackend;
use crate::paths::PlatformPaths;
use crate::repo::{RepositoryProperties, Synchronizer};
use crate::scan::{ContentMatcher, SearchTerms, list_commits};
use crate::store::{JsonStore, ResultWriter};
use crate::types::{SearchReport, SearchRequest};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

impl<B: GitBackend + 'static> SurchClient<B> {
    /// Synchronous core of [`SurchClient::search`]
    pub fn search_blocking(&self, request: &SearchRequest, cancel: &CancellationToken) -> Result<SearchReport> {
        let _entered = self.span.enter();
        let start = Instant::now();

        let terms = SearchTerms::new(request.search_terms.clone())?;
        let backend = self.backend.as_ref();

        let version = backend.version()?;
        tracing::debug!("Using {}", version);

        let clones_root = request
            .clone_dir
            .as_deref()
            .unwrap_or(self.config.paths.clones_dir.as_path());
        let repo = RepositoryProperties::resolve(
            &request.reference,
            backend,
            self.config.base_url(),
            clones_root,
        )?;
        tracing::info!(
            "Searching {}/{} ({})",
            repo.organization,
            repo.name,
            repo.source
        );

        let repo_path = Synchronizer::new(
            backend,
            self.config.sync.max_attempts,
            Duration::from_millis(self.config.sync.retry_delay_ms),
        )
        .sync(&repo.source, &repo.local_path, request.skip_update)?;

        let commits = list_commits(backend, &repo_path);
        let scan = ContentMatcher::new(backend, self.config.scan.workers).scan(
            &repo_path,
            &terms,
            &commits,
            cancel,
        );

        let results_path = PlatformPaths::results_file(
            request.results_dir.as_deref(),
            &self.config.paths.results_dir,
            &repo.organization,
        );
        if request.rotate_results {
            JsonStore::rotate(&results_path)?;
        }

        let written = {
            let store = JsonStore::open(&results_path)?;
            ResultWriter::new(backend, &store, self.config.base_url()).write(
                &scan.scans,
                &repo_path,
                &repo.name,
                &repo.organization,
            )?
        };

        if request.remove_clone {
            remove_clone(&repo, &repo_path);
        }

        let report = SearchReport {
            organization: repo.organization,
            repository: repo.name,
            local_path: repo_path,
            results_path,
            commits_total: commits.len(),
            commits_scanned: scan.scans.len(),
            commits_matched: scan.matched().count(),
            failed_commits: scan.failures.clone(),
            records_written: written.written(),
            lines_skipped: written.lines_skipped,
            metadata_failures: written.metadata_failures,
            records: written.records,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Search of {}/{} done in {}ms: {}/{} commits scanned, {} matched, {} failed, {} records written to {}",
            report.organization,
            report.repository,
            report.duration_ms,
            report.commits_scanned,
            report.commits_total,
            report.commits_matched,
            report.failed_commits.len(),
            report.records_written,
            report.results_path.display()
        );

        if scan.interrupted() {
            tracing::warn!(
                "Search interrupted, {} commits were not scanned",
                scan.skipped
            );
            return Err(SurchError::Interrupted(Box::new(report)));
        }

        Ok(report)
    }
}

/// Delete a working copy the pipeline manages; user-supplied paths are kept
fn remove_clone(repo: &RepositoryProperties, path: &Path) {
    if repo.is_local {
        tracing::info!(
            "Keeping {}: it is a local working copy, not a managed clone",
            path.display()
        );
        return;
    }

    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::info!("Removed clone {}", path.display()),
        Err(e) => tracing::warn!("Failed to remove clone {}: {}", path.display(), e),
    }
}
