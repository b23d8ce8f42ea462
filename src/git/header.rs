use super::GitBackend;
use crate::error::GitError;
use std::path::Path;

const AUTHOR_MARKER: &str = "Author: ";
const DATE_MARKER: &str = "Date:   ";

/// Author identity and timestamp of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub author_name: String,
    pub author_email: String,
    /// Date exactly as git prints it, minus the timezone offset
    pub commit_time: String,
}

impl CommitMetadata {
    /// Look up and parse the header of `commit`
    pub fn describe<B: GitBackend + ?Sized>(
        backend: &B,
        repo_path: &Path,
        commit: &str,
    ) -> Result<Self, GitError> {
        let header = backend.show_header(repo_path, commit)?;
        Self::parse(commit, &header)
    }

    /// Parse a medium-format header:
    ///
    /// ```text
    /// commit 3f786850e387550fdab836ed7e6dc881de23001b
    /// Author: Jane Doe <jane@example.com>
    /// Date:   Wed Jan 1 12:00:00 2020 +0100
    /// ```
    pub fn parse(commit: &str, header: &str) -> Result<Self, GitError> {
        let parse_error = |reason: &str| GitError::MetadataParse {
            commit: commit.to_string(),
            reason: reason.to_string(),
        };

        let author_start = header
            .find(AUTHOR_MARKER)
            .ok_or_else(|| parse_error("missing 'Author: ' line"))?;
        let author = &header[author_start + AUTHOR_MARKER.len()..];

        let author_name = between(author, "", " <")
            .ok_or_else(|| parse_error("author has no ' <' before the email"))?;
        let author_email =
            between(author, "<", ">").ok_or_else(|| parse_error("author email is not in <...>"))?;

        let date_start = header
            .find(DATE_MARKER)
            .ok_or_else(|| parse_error("missing 'Date:   ' line"))?;
        let date_line = header[date_start + DATE_MARKER.len()..]
            .lines()
            .next()
            .unwrap_or_default();
        let commit_time = strip_offset(date_line);
        if commit_time.is_empty() {
            return Err(parse_error("empty date"));
        }

        Ok(Self {
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
            commit_time: commit_time.to_string(),
        })
    }
}

/// Text between the first `start` and the following `end`
fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some(&text[from..from + len])
}

/// Drop a trailing `+hhmm` / `-hhmm` offset and surrounding whitespace
fn strip_offset(date: &str) -> &str {
    let date = date.trim();
    match date.rsplit_once(char::is_whitespace) {
        Some((rest, offset))
            if offset.len() > 1
                && offset.starts_with(['+', '-'])
                && offset[1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest.trim_end()
        }
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "commit 3f786850e387550fdab836ed7e6dc881de23001b\n\
                          Author: Jane Doe <jane@example.com>\n\
                          Date:   Wed Jan 1 12:00:00 2020 +0100\n\
                          \n    Add config + secrets\n";

    #[test]
    fn test_parse_header() {
        let meta = CommitMetadata::parse("3f78", HEADER).unwrap();
        assert_eq!(meta.author_name, "Jane Doe");
        assert_eq!(meta.author_email, "jane@example.com");
        assert_eq!(meta.commit_time, "Wed Jan 1 12:00:00 2020");
    }

    #[test]
    fn test_parse_merge_header() {
        let header = "commit abcd\nMerge: 1111111 2222222\nAuthor: A <a@x.com>\nDate:   Thu Feb 6 09:30:00 2020 +0000\n";
        let meta = CommitMetadata::parse("abcd", header).unwrap();
        assert_eq!(meta.author_name, "A");
        assert_eq!(meta.commit_time, "Thu Feb 6 09:30:00 2020");
    }

    #[test]
    fn test_negative_offset_is_stripped() {
        let header = "commit abcd\nAuthor: B <b@x.com>\nDate:   Mon Mar 2 08:00:00 2020 -0500\n\n    msg with + sign\n";
        let meta = CommitMetadata::parse("abcd", header).unwrap();
        assert_eq!(meta.commit_time, "Mon Mar 2 08:00:00 2020");
    }

    #[test]
    fn test_missing_author_fails() {
        let err = CommitMetadata::parse("abcd", "commit abcd\nDate:   today +0000\n").unwrap_err();
        assert!(matches!(err, GitError::MetadataParse { .. }));
    }

    #[test]
    fn test_missing_email_brackets_fails() {
        let header = "commit abcd\nAuthor: nobody\nDate:   Mon Mar 2 08:00:00 2020 +0000\n";
        assert!(CommitMetadata::parse("abcd", header).is_err());
    }

    #[test]
    fn test_missing_date_fails() {
        let header = "commit abcd\nAuthor: A <a@x.com>\n";
        let err = CommitMetadata::parse("abcd", header).unwrap_err();
        assert!(err.to_string().contains("Date"));
    }

    #[test]
    fn test_between() {
        assert_eq!(between("Author: A <a@x>", "<", ">"), Some("a@x"));
        assert_eq!(between("no markers", "<", ">"), None);
    }
}
