//! Source-control revision recorded in a bundle manifest.
//!
//! CI systems hand the revision over in several spellings (full or
//! abbreviated, sometimes upper-case, sometimes with stray whitespace).
//! [`CommitSha`] normalizes those and rejects anything that is not a
//! 7–40 character hexadecimal object name.

use super::error::{ArtefactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest abbreviated object name accepted.
const MIN_LEN: usize = 7;

/// Length of a full SHA-1 object name.
const MAX_LEN: usize = 40;

/// A validated, lowercase commit SHA.
///
/// # Examples
///
/// ```
/// use offline_bundler::artefact::commit_sha::CommitSha;
///
/// let sha = CommitSha::try_from(" ABC1234\n").expect("valid SHA");
/// assert_eq!(sha.as_str(), "abc1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitSha(String);

impl CommitSha {
    /// Return the SHA as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for CommitSha {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        validate(&normalized)?;
        Ok(Self(normalized))
    }
}

impl TryFrom<String> for CommitSha {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<CommitSha> for String {
    fn from(sha: CommitSha) -> Self {
        sha.0
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate(value: &str) -> Result<()> {
    let invalid = |reason: String| ArtefactError::InvalidGitSha {
        value: value.to_owned(),
        reason,
    };
    if !(MIN_LEN..=MAX_LEN).contains(&value.len()) {
        return Err(invalid(format!(
            "expected {MIN_LEN} to {MAX_LEN} characters, got {}",
            value.len()
        )));
    }
    match value.chars().find(|c| !c.is_ascii_hexdigit()) {
        Some(bad) => Err(invalid(format!("non-hex character '{bad}'"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::abbreviated("abc1234", "abc1234")]
    #[case::full(&"f".repeat(40), &"f".repeat(40))]
    #[case::uppercase("DEADBEEF", "deadbeef")]
    #[case::padded("  0123abc\n", "0123abc")]
    fn accepts_and_normalizes(#[case] input: &str, #[case] expected: &str) {
        let sha = CommitSha::try_from(input).expect("valid SHA");
        assert_eq!(sha.as_str(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::too_short("abc123")]
    #[case::too_long(&"a".repeat(41))]
    #[case::non_hex("abc123g")]
    fn rejects_malformed(#[case] input: &str) {
        let err = CommitSha::try_from(input).expect_err("invalid SHA");
        assert!(matches!(err, ArtefactError::InvalidGitSha { .. }));
    }

    #[test]
    fn serializes_as_plain_string() {
        let sha = CommitSha::try_from("abc1234").expect("valid SHA");
        let json = serde_json::to_string(&sha).expect("serialize");
        assert_eq!(json, "\"abc1234\"");
    }

    #[test]
    fn deserialization_runs_validation() {
        let result: std::result::Result<CommitSha, _> = serde_json::from_str("\"xyz\"");
        assert!(result.is_err());
    }
}
