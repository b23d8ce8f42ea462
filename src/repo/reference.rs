use crate::error::RepoError;
use crate::git::GitBackend;
use crate::paths::PlatformPaths;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const SHORTHAND_MARKER: char = ':';
const BUNDLE_SUFFIX: &str = ".git";

/// `[user@]host:path`, the scp-like remote syntax
static SCP_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/\s]+@)?[^:/\s]+:(?P<path>[^\s]+)$").expect("valid scp remote regex")
});

/// Where a repository comes from and where its working copy lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryProperties {
    pub name: String,
    pub organization: String,
    /// Working copy location (existing or to be created)
    pub local_path: PathBuf,
    /// What to clone from; the reference itself for local working copies
    pub source: String,
    /// The reference named an existing working copy rather than a remote
    pub is_local: bool,
}

impl RepositoryProperties {
    /// Resolve a user-supplied reference
    ///
    /// Recognized, in order:
    /// 1. a clone URL (`scheme://host/org/repo[.git]`)
    /// 2. `:org/repo` shorthand, expanded against `base_url`
    /// 3. a path to an existing working copy, named after its `origin` remote
    ///
    /// Clones are placed at `{clones_root}/{org}/{repo}`.
    pub fn resolve<B: GitBackend + ?Sized>(
        reference: &str,
        backend: &B,
        base_url: &str,
        clones_root: &Path,
    ) -> Result<Self, RepoError> {
        if reference.contains("://") {
            let (organization, name) = split_url_path(reference)
                .and_then(org_and_name)
                .ok_or_else(|| invalid(reference, "URL has no organization/repository path"))?;

            return Ok(Self {
                local_path: PlatformPaths::clone_path(clones_root, &organization, &name),
                source: reference.to_string(),
                is_local: false,
                name,
                organization,
            });
        }

        if let Some(shorthand) = reference.strip_prefix(SHORTHAND_MARKER) {
            let (organization, name) = parse_shorthand(shorthand)
                .ok_or_else(|| invalid(reference, "expected ':organization/repository'"))?;

            return Ok(Self {
                local_path: PlatformPaths::clone_path(clones_root, &organization, &name),
                source: format!(
                    "{}/{}/{}",
                    base_url.trim_end_matches('/'),
                    organization,
                    name
                ),
                is_local: false,
                name,
                organization,
            });
        }

        let path = Path::new(reference);
        if path.is_dir() {
            if !backend.is_repository(path) {
                return Err(RepoError::NotARepository(path.display().to_string()));
            }

            let remote = backend
                .remote_url(path)
                .map_err(|e| invalid(reference, &e.to_string()))?
                .ok_or_else(|| RepoError::MissingRemote(path.display().to_string()))?;

            let (organization, name) = parse_remote(&remote).ok_or_else(|| {
                invalid(
                    reference,
                    &format!("cannot derive organization/repository from remote '{}'", remote),
                )
            })?;

            return Ok(Self {
                name,
                organization,
                local_path: path.to_path_buf(),
                source: reference.to_string(),
                is_local: true,
            });
        }

        Err(invalid(
            reference,
            "not a URL, ':org/repo' shorthand, or existing directory",
        ))
    }
}

fn invalid(reference: &str, reason: &str) -> RepoError {
    RepoError::InvalidReference {
        reference: reference.to_string(),
        reason: reason.to_string(),
    }
}

/// Normalize a remote URL (URL-style, scp-style, or plain path) to `(org, name)`
///
/// `https://github.com/nir0s/surch.git`, `git@github.com:nir0s/surch.git` and
/// `/srv/git/nir0s/surch.git` all yield `("nir0s", "surch")`.
pub fn parse_remote(remote: &str) -> Option<(String, String)> {
    let remote = remote.trim();
    if remote.contains("://") {
        return split_url_path(remote).and_then(org_and_name);
    }
    if let Some(captures) = SCP_REMOTE.captures(remote) {
        return org_and_name(captures.name("path")?.as_str());
    }
    org_and_name(remote)
}

/// Path part of `scheme://host/path`
fn split_url_path(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let (_, path) = rest.split_once('/')?;
    Some(path)
}

fn parse_shorthand(shorthand: &str) -> Option<(String, String)> {
    let (organization, name) = shorthand.split_once('/')?;
    if name.contains('/') {
        return None;
    }
    org_and_name(&format!("{}/{}", organization, name))
}

/// Last two path segments, minus a `.git` suffix on the repository name
fn org_and_name(path: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .collect();
    let &[.., organization, name] = segments.as_slice() else {
        return None;
    };
    let name = name.strip_suffix(BUNDLE_SUFFIX).unwrap_or(name);

    let usable = |s: &str| !s.is_empty() && s != "." && s != "..";
    if !usable(organization) || !usable(name) {
        return None;
    }

    Some((organization.to_string(), name.to_string()))
}
