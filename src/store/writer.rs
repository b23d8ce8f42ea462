use super::JsonStore;
use crate::error::StoreError;
use crate::git::{CommitMetadata, GitBackend};
use crate::scan::{CommitScan, split_match_line};
use crate::types::ResultRecord;
use std::collections::HashMap;
use std::path::Path;

/// Web link to a file at a commit: `{base}/{org}/{repo}/blob/{sha}/{path}`
pub fn blob_url(base_url: &str, organization: &str, repository: &str, commit: &str, path: &str) -> String {
    format!(
        "{}/{}/{}/blob/{}/{}",
        base_url.trim_end_matches('/'),
        organization,
        repository,
        commit,
        path
    )
}

/// What a [`ResultWriter::write`] call produced
#[derive(Debug, Clone, Default)]
pub struct WriteSummary {
    /// Records persisted, in write order
    pub records: Vec<ResultRecord>,
    /// Matcher lines that were not `sha:path`
    pub lines_skipped: usize,
    /// Matches dropped because their commit header was unreadable
    pub metadata_failures: usize,
}

impl WriteSummary {
    pub fn written(&self) -> usize {
        self.records.len()
    }
}

/// Turns matcher output into [`ResultRecord`]s and appends them to a store
pub struct ResultWriter<'a, B: GitBackend + ?Sized> {
    backend: &'a B,
    store: &'a JsonStore,
    base_url: &'a str,
}

impl<'a, B: GitBackend + ?Sized> ResultWriter<'a, B> {
    pub fn new(backend: &'a B, store: &'a JsonStore, base_url: &'a str) -> Self {
        Self {
            backend,
            store,
            base_url,
        }
    }

    /// Persist one record per matched file, commits in scan order
    ///
    /// Commit metadata is looked up once per commit. A commit whose header can't
    /// be parsed has its records skipped; the rest of the run continues. Store
    /// failures abort.
    pub fn write(
        &self,
        scans: &[CommitScan],
        repo_path: &Path,
        repository: &str,
        organization: &str,
    ) -> Result<WriteSummary, StoreError> {
        let mut summary = WriteSummary::default();
        let mut metadata: HashMap<String, Option<CommitMetadata>> = HashMap::new();

        for scan in scans.iter().filter(|scan| scan.is_match()) {
            for line in &scan.lines {
                let Some((commit, filepath)) = split_match_line(line) else {
                    tracing::debug!("Skipping matcher line {:?} of {}", line, scan.commit);
                    summary.lines_skipped += 1;
                    continue;
                };

                let meta = metadata.entry(commit.to_string()).or_insert_with(|| {
                    CommitMetadata::describe(self.backend, repo_path, commit)
                        .inspect_err(|e| tracing::warn!("Skipping matches in {}: {}", commit, e))
                        .ok()
                });
                let Some(meta) = meta else {
                    summary.metadata_failures += 1;
                    continue;
                };

                let record = ResultRecord {
                    email: meta.author_email.clone(),
                    username: meta.author_name.clone(),
                    filepath: filepath.to_string(),
                    commit_sha: commit.to_string(),
                    commit_time: meta.commit_time.clone(),
                    repository_name: repository.to_string(),
                    organization_name: organization.to_string(),
                    blob_url: blob_url(self.base_url, organization, repository, commit, filepath),
                };
                self.store.insert(&record)?;
                summary.records.push(record);
            }
        }

        tracing::info!(
            "Wrote {} records to {}",
            summary.written(),
            self.store.path().display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommitId;
    use crate::git::fake::FakeGit;
    use tempfile::tempdir;

    const BASE: &str = "https://github.com";

    fn scan(commit: &str, lines: &[&str]) -> CommitScan {
        CommitScan {
            commit: CommitId::parse(commit).unwrap(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_blob_url() {
        assert_eq!(
            blob_url("https://github.com/", "org", "repo", "abc123", "dir/foo.txt"),
            "https://github.com/org/repo/blob/abc123/dir/foo.txt"
        );
    }

    #[test]
    fn test_single_match_becomes_record() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("results.json")).unwrap();
        let git = FakeGit::new().with_author("abc123", "A", "a@x.com", "2020-01-01");

        let summary = ResultWriter::new(&git, &store, BASE)
            .write(&[scan("abc123", &["abc123:foo.txt"])], Path::new("/r"), "repo", "org")
            .unwrap();

        assert_eq!(
            summary.records,
            vec![ResultRecord {
                email: "a@x.com".to_string(),
                username: "A".to_string(),
                filepath: "foo.txt".to_string(),
                commit_sha: "abc123".to_string(),
                commit_time: "2020-01-01".to_string(),
                repository_name: "repo".to_string(),
                organization_name: "org".to_string(),
                blob_url: "https://github.com/org/repo/blob/abc123/foo.txt".to_string(),
            }]
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("results.json")).unwrap();
        let git = FakeGit::new().with_author("abc123", "A", "a@x.com", "2020-01-01");

        let summary = ResultWriter::new(&git, &store, BASE)
            .write(
                &[scan("abc123", &["abc123:foo.txt", "bar.txt", ""])],
                Path::new("/r"),
                "repo",
                "org",
            )
            .unwrap();

        assert_eq!(summary.written(), 1);
        assert_eq!(summary.lines_skipped, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_metadata_looked_up_once_per_commit() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("results.json")).unwrap();
        let git = FakeGit::new()
            .with_author("aaaa1111", "A", "a@x.com", "Wed Jan 1 12:00:00 2020")
            .with_author("bbbb2222", "B", "b@x.com", "Thu Jan 2 12:00:00 2020");

        let scans = [
            scan("aaaa1111", &["aaaa1111:a.txt", "aaaa1111:b.txt"]),
            scan("cccc3333", &[]),
            scan("bbbb2222", &["bbbb2222:c.txt"]),
        ];
        let summary = ResultWriter::new(&git, &store, BASE)
            .write(&scans, Path::new("/r"), "repo", "org")
            .unwrap();

        let files: Vec<&str> = summary.records.iter().map(|r| r.filepath.as_str()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(git.count("show aaaa1111"), 1);
        assert_eq!(git.count("show cccc3333"), 0);
        assert_eq!(summary.records[2].username, "B");
    }

    #[test]
    fn test_unreadable_header_skips_only_that_commit() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("results.json")).unwrap();
        let git = FakeGit::new().with_author("bbbb2222", "B", "b@x.com", "2020-01-02");

        let scans = [
            scan("aaaa1111", &["aaaa1111:a.txt", "aaaa1111:b.txt"]),
            scan("bbbb2222", &["bbbb2222:c.txt"]),
        ];
        let summary = ResultWriter::new(&git, &store, BASE)
            .write(&scans, Path::new("/r"), "repo", "org")
            .unwrap();

        assert_eq!(summary.written(), 1);
        assert_eq!(summary.metadata_failures, 2);
        assert_eq!(git.count("show aaaa1111"), 1);
    }

    #[test]
    fn test_no_matches_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let store = JsonStore::open(&path).unwrap();

        let summary = ResultWriter::new(&FakeGit::new(), &store, BASE)
            .write(&[scan("aaaa1111", &[])], Path::new("/r"), "repo", "org")
            .unwrap();

        assert_eq!(summary.written(), 0);
        assert!(store.is_empty());
    }
}
