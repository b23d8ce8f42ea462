use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex object name of a commit
///
/// Full SHA-1 (40) and SHA-256 (64) names are accepted, as are abbreviated
/// names of at least 4 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    const MIN_LEN: usize = 4;
    const MAX_LEN: usize = 64;

    /// Parse a commit name, ignoring surrounding whitespace
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !Self::is_valid(raw) {
            return None;
        }
        Some(Self(raw.to_ascii_lowercase()))
    }

    /// Whether `raw` looks like a hex object name
    pub fn is_valid(raw: &str) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&raw.len())
            && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
