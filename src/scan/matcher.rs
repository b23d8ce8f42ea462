use crate::error::ValidationError;
use crate::git::{CommitId, GitBackend};
use crate::types::CommitFailure;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

const PROGRESS_EVERY: usize = 500;

/// Validated, non-empty list of literal search strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerms(Vec<String>);

impl SearchTerms {
    /// Reject an empty list, empty terms, and terms spanning lines
    ///
    /// An empty term would match every file; a line break would be split by git
    /// into several patterns.
    pub fn new(terms: Vec<String>) -> Result<Self, ValidationError> {
        if terms.is_empty() {
            return Err(ValidationError::InvalidInput(
                "at least one search term is required".to_string(),
            ));
        }
        if let Some(i) = terms.iter().position(|t| t.is_empty()) {
            return Err(ValidationError::InvalidInput(format!(
                "search term #{} is empty",
                i + 1
            )));
        }
        if let Some(term) = terms.iter().find(|t| t.contains(['\n', '\r'])) {
            return Err(ValidationError::InvalidInput(format!(
                "search term {:?} contains a line break",
                term
            )));
        }
        Ok(Self(terms))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for SearchTerms {
    type Error = ValidationError;

    fn try_from(terms: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(terms)
    }
}

/// Split a `grep -l` output line into `(commit, path)`
///
/// Lines without a commit prefix (a bare filename, an empty line) give `None`.
/// Commit names never contain a colon, so the split happens at the colon that
/// ends the commit name rather than at the last colon of the line. A path such
/// as `dir/a:b.txt` is therefore kept whole instead of being cut at its own
/// colon.
pub fn split_match_line(line: &str) -> Option<(&str, &str)> {
    let (commit, path) = line.split_once(':')?;
    if !CommitId::is_valid(commit) || path.is_empty() {
        return None;
    }
    Some((commit, path))
}

/// Raw matcher output for one commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitScan {
    pub commit: CommitId,
    /// `grep -l` lines as printed, normally `<commit>:<path>`
    pub lines: Vec<String>,
}

impl CommitScan {
    /// Matched repository-relative paths, in output order
    pub fn files(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| split_match_line(line))
            .map(|(_, path)| path)
            .collect()
    }

    pub fn is_match(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Outcome of scanning a list of commits
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// One entry per scanned commit, in enumeration order, matched or not
    pub scans: Vec<CommitScan>,
    /// Commits whose search failed; they also appear in `scans` with no lines
    pub failures: Vec<CommitFailure>,
    /// Commits left unscanned because the scan was cancelled
    pub skipped: usize,
}

impl ScanReport {
    pub fn interrupted(&self) -> bool {
        self.skipped > 0
    }

    pub fn matched(&self) -> impl Iterator<Item = &CommitScan> {
        self.scans.iter().filter(|scan| scan.is_match())
    }
}

enum Outcome {
    Done(CommitScan),
    Failed(CommitScan, String),
    Skipped,
}

/// Runs the literal content search for each commit on a bounded worker pool
pub struct ContentMatcher<'a, B: GitBackend + ?Sized> {
    backend: &'a B,
    workers: usize,
}

impl<'a, B: GitBackend + ?Sized> ContentMatcher<'a, B> {
    pub fn new(backend: &'a B, workers: usize) -> Self {
        Self {
            backend,
            workers: workers.max(1),
        }
    }

    /// Search every commit's tree for files containing any of `terms`
    ///
    /// A failed search counts as "no matches" and is recorded in
    /// [`ScanReport::failures`]. Once `cancel` fires no new commit is started;
    /// searches already running finish.
    pub fn scan(
        &self,
        repo_path: &Path,
        terms: &SearchTerms,
        commits: &[CommitId],
        cancel: &CancellationToken,
    ) -> ScanReport {
        tracing::info!(
            "Scanning {} commits of {} for {} string(s) with {} worker(s)",
            commits.len(),
            repo_path.display(),
            terms.len(),
            self.workers
        );

        let done = AtomicUsize::new(0);
        let run = || -> Vec<Outcome> {
            commits
                .par_iter()
                .map(|commit| {
                    if cancel.is_cancelled() {
                        return Outcome::Skipped;
                    }
                    let outcome = self.scan_commit(repo_path, terms, commit);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if n % PROGRESS_EVERY == 0 {
                        tracing::info!("Scanned {}/{} commits", n, commits.len());
                    }
                    outcome
                })
                .collect()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!("Falling back to the global thread pool: {}", e);
                run()
            }
        };

        let mut report = ScanReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Done(scan) => report.scans.push(scan),
                Outcome::Failed(scan, reason) => {
                    report.failures.push(CommitFailure {
                        commit: scan.commit.to_string(),
                        reason,
                    });
                    report.scans.push(scan);
                }
                Outcome::Skipped => report.skipped += 1,
            }
        }

        tracing::info!(
            "Scan finished: {} commits with matches, {} failed, {} skipped",
            report.matched().count(),
            report.failures.len(),
            report.skipped
        );
        report
    }

    fn scan_commit(&self, repo_path: &Path, terms: &SearchTerms, commit: &CommitId) -> Outcome {
        match self.backend.grep(repo_path, terms.as_slice(), commit) {
            Ok(lines) => Outcome::Done(CommitScan {
                commit: commit.clone(),
                lines,
            }),
            Err(e) => {
                tracing::debug!("Search of commit {} failed: {}", commit.short(), e);
                Outcome::Failed(
                    CommitScan {
                        commit: commit.clone(),
                        lines: Vec::new(),
                    },
                    e.to_string(),
                )
            }
        }
    }
}
