//! Scriptable in-memory [`GitBackend`] for unit tests

use super::{CommitId, GitBackend};
use crate::error::GitError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Default)]
pub(crate) struct FakeGit {
    pub calls: Mutex<Vec<String>>,
    pub remote: Option<String>,
    pub not_repository: bool,
    /// Number of upcoming clone/pull calls that fail
    pub sync_failures: AtomicU32,
    /// `rev-list --all` output; `None` makes the command fail
    pub rev_list: Option<String>,
    /// Per-commit grep output; a missing commit has no matches
    pub grep: HashMap<String, Result<Vec<String>, String>>,
    pub headers: HashMap<String, String>,
    /// How long each grep takes
    pub grep_delay: Duration,
}

impl FakeGit {
    pub fn new() -> Self {
        Self {
            rev_list: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, url: &str) -> Self {
        self.remote = Some(url.to_string());
        self
    }

    pub fn with_commits(mut self, commits: &[&str]) -> Self {
        let mut out = commits.join("\n");
        out.push('\n');
        self.rev_list = Some(out);
        self
    }

    pub fn with_grep(mut self, commit: &str, lines: &[&str]) -> Self {
        self.grep.insert(
            commit.to_string(),
            Ok(lines.iter().map(|l| l.to_string()).collect()),
        );
        self
    }

    pub fn with_grep_failure(mut self, commit: &str, reason: &str) -> Self {
        self.grep.insert(commit.to_string(), Err(reason.to_string()));
        self
    }

    pub fn with_author(mut self, commit: &str, name: &str, email: &str, date: &str) -> Self {
        self.headers.insert(
            commit.to_string(),
            format!("commit {commit}\nAuthor: {name} <{email}>\nDate:   {date} +0000\n\n    message\n"),
        );
        self
    }

    pub fn with_grep_delay(mut self, delay: Duration) -> Self {
        self.grep_delay = delay;
        self
    }

    pub fn failing_sync(self, times: u32) -> Self {
        self.sync_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_sync_failure(&self) -> bool {
        self.sync_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn failed(command: &str, stderr: &str) -> GitError {
        GitError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

impl GitBackend for FakeGit {
    fn version(&self) -> Result<String, GitError> {
        Ok("git version 0.0.0-fake".to_string())
    }

    fn is_repository(&self, path: &Path) -> bool {
        self.record(format!("is_repository {}", path.display()));
        !self.not_repository
    }

    fn remote_url(&self, _path: &Path) -> Result<Option<String>, GitError> {
        Ok(self.remote.clone())
    }

    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), GitError> {
        self.record(format!("clone {} {}", source, dest.display()));
        if self.take_sync_failure() {
            // Leave a half-written directory behind, like an interrupted clone
            std::fs::create_dir_all(dest).unwrap();
            return Err(Self::failed("clone", "connection reset"));
        }
        std::fs::create_dir_all(dest).unwrap();
        Ok(())
    }

    fn pull(&self, path: &Path) -> Result<(), GitError> {
        self.record(format!("pull {}", path.display()));
        if self.take_sync_failure() {
            return Err(Self::failed("fetch", "connection reset"));
        }
        Ok(())
    }

    fn rev_list_all(&self, _path: &Path) -> Result<String, GitError> {
        self.record("rev_list".to_string());
        self.rev_list
            .clone()
            .ok_or_else(|| Self::failed("rev-list", "bad object"))
    }

    fn grep(&self, _path: &Path, _terms: &[String], commit: &CommitId) -> Result<Vec<String>, GitError> {
        self.record(format!("grep {}", commit));
        if !self.grep_delay.is_zero() {
            std::thread::sleep(self.grep_delay);
        }
        match self.grep.get(commit.as_str()) {
            Some(Ok(lines)) => Ok(lines.clone()),
            Some(Err(reason)) => Err(Self::failed("grep", reason)),
            None => Ok(Vec::new()),
        }
    }

    fn show_header(&self, _path: &Path, commit: &str) -> Result<String, GitError> {
        self.record(format!("show {}", commit));
        self.headers
            .get(commit)
            .cloned()
            .ok_or_else(|| Self::failed("show", "unknown revision"))
    }
}
