//! Error types for artefact-related value validation.
//!
//! Each variant provides a descriptive message identifying the invalid input
//! and the constraint that was violated.

use thiserror::Error;

/// Errors arising from invalid artefact-related values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtefactError {
    /// The operating system and architecture pair cannot be bundled.
    #[error("unsupported platform \"{platform}-{arch}\"; expected one of: {expected}")]
    UnsupportedPlatform {
        /// The rejected operating system identifier.
        platform: String,
        /// The rejected architecture identifier.
        arch: String,
        /// Comma-separated list of accepted pairs.
        expected: String,
    },

    /// A git SHA is empty, too long, or contains non-hex characters.
    #[error("invalid git SHA \"{value}\": {reason}")]
    InvalidGitSha {
        /// The rejected SHA string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A manifest schema version this build cannot read.
    #[error("unsupported manifest version \"{value}\"; this build reads {supported}")]
    UnsupportedSchemaVersion {
        /// The rejected version string.
        value: String,
        /// The version this build writes.
        supported: String,
    },
}

/// Result type alias using [`ArtefactError`].
pub type Result<T> = std::result::Result<T, ArtefactError>;
