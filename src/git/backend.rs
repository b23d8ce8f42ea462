use super::CommitId;
use crate::error::GitError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// The git operations the search pipeline depends on
///
/// Each method mirrors one command-line contract. Implementations must be safe
/// to call concurrently for read-only operations (`grep`, `show_header`) against
/// the same working copy.
pub trait GitBackend: Send + Sync {
    /// Version string of the backend, used to check it is runnable
    fn version(&self) -> Result<String, GitError>;

    /// Cheap check: is `path` inside a git working copy
    fn is_repository(&self, path: &Path) -> bool;

    /// URL of the `origin` remote, if one is configured
    fn remote_url(&self, path: &Path) -> Result<Option<String>, GitError>;

    /// Full clone of `source` into `dest`
    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), GitError>;

    /// Fetch all remotes and fast-forward the checked-out branch
    fn pull(&self, path: &Path) -> Result<(), GitError>;

    /// Raw `rev-list --all` output: one commit name per line
    fn rev_list_all(&self, path: &Path) -> Result<String, GitError>;

    /// Raw `grep -l` output entries (`<commit>:<path>`) for files at `commit`
    /// containing any of `terms` literally
    ///
    /// Paths are returned unquoted, exactly as stored in the tree.
    ///
    /// "No matches" is `Ok` with no lines, not an error.
    fn grep(&self, path: &Path, terms: &[String], commit: &CommitId) -> Result<Vec<String>, GitError>;

    /// The medium-format header of a commit (`show -s`)
    fn show_header(&self, path: &Path, commit: &str) -> Result<String, GitError>;
}

/// [`GitBackend`] that runs the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, repo: Option<&Path>) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(repo) = repo {
            cmd.arg("-C").arg(repo);
        }
        // Never block on a credential prompt
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn output<I, S>(&self, repo: Option<&Path>, args: I) -> Result<Output, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(repo);
        cmd.args(args);
        tracing::trace!("Running {:?}", cmd);
        cmd.output()
            .map_err(|e| GitError::Spawn(format!("{}: {}", self.program.display(), e)))
    }

    /// Run and require a zero exit status, returning stdout
    fn run<I, S>(&self, repo: Option<&Path>, name: &str, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(repo, args)?;
        if !output.status.success() {
            return Err(command_failed(name, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn command_failed(name: &str, output: &Output) -> GitError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stderr = if stderr.is_empty() {
        match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    } else {
        stderr
    };

    GitError::CommandFailed {
        command: name.to_string(),
        stderr,
    }
}

impl GitBackend for GitCli {
    fn version(&self) -> Result<String, GitError> {
        self.run(None, "--version", ["--version"])
            .map(|out| out.trim().to_string())
    }

    fn is_repository(&self, path: &Path) -> bool {
        matches!(
            self.output(Some(path), ["rev-parse", "--git-dir"]),
            Ok(output) if output.status.success()
        )
    }

    fn remote_url(&self, path: &Path) -> Result<Option<String>, GitError> {
        let output = self.output(Some(path), ["config", "--get", "remote.origin.url"])?;
        match output.status.code() {
            Some(0) => {
                let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
                Ok((!url.is_empty()).then_some(url))
            }
            // Key not set
            Some(1) => Ok(None),
            _ => Err(command_failed("config", &output)),
        }
    }

    fn clone_repo(&self, source: &str, dest: &Path) -> Result<(), GitError> {
        let args: [&OsStr; 5] = [
            OsStr::new("clone"),
            OsStr::new("--quiet"),
            OsStr::new("--"),
            OsStr::new(source),
            dest.as_os_str(),
        ];
        self.run(None, "clone", args).map(|_| ())
    }

    fn pull(&self, path: &Path) -> Result<(), GitError> {
        self.run(
            Some(path),
            "fetch",
            ["fetch", "--all", "--tags", "--prune", "--quiet"],
        )?;

        // Every ref is scanned, so a checkout that cannot fast-forward (detached
        // HEAD, no upstream, local commits) still has fresh history.
        let output = self.output(Some(path), ["merge", "--ff-only", "--quiet", "@{upstream}"])?;
        if !output.status.success() {
            tracing::debug!(
                "Skipping fast-forward of {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn rev_list_all(&self, path: &Path) -> Result<String, GitError> {
        self.run(Some(path), "rev-list", ["rev-list", "--all"])
    }

    fn grep(&self, path: &Path, terms: &[String], commit: &CommitId) -> Result<Vec<String>, GitError> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("-c"),
            OsStr::new("core.quotePath=false"),
            OsStr::new("grep"),
            OsStr::new("-l"),
            OsStr::new("-z"),
            OsStr::new("--fixed-strings"),
        ];
        for term in terms {
            args.push(OsStr::new("-e"));
            args.push(OsStr::new(term));
        }
        args.push(OsStr::new(commit.as_str()));
        args.push(OsStr::new("--"));

        let output = self.output(Some(path), args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match output.status.code() {
            // NUL-terminated names are printed verbatim, never C-quoted
            Some(0) => Ok(stdout
                .split('\0')
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()),
            // Exit 1 with nothing printed means no file matched
            Some(1) if stdout.trim().is_empty() => Ok(Vec::new()),
            _ => Err(command_failed("grep", &output)),
        }
    }

    fn show_header(&self, path: &Path, commit: &str) -> Result<String, GitError> {
        self.run(
            Some(path),
            "show",
            [
                "-c",
                "log.showSignature=false",
                "show",
                "-s",
                "--no-decorate",
                "--no-color",
                "--format=medium",
                "--date=default",
                commit,
            ],
        )
    }
}
