//! Manifest format identifier.
//!
//! The manifest carries a semantic version string in its `version` field.
//! Additive changes bump the minor component and remain readable; a
//! different major component means the document cannot be interpreted by
//! this build.

use super::error::{ArtefactError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The format version written by this build.
const CURRENT: &str = "1.0.0";

/// Major component shared by every readable version.
const CURRENT_MAJOR: &str = "1";

/// A validated manifest schema version.
///
/// # Examples
///
/// ```
/// use offline_bundler::artefact::schema_version::SchemaVersion;
///
/// assert_eq!(SchemaVersion::current().as_str(), "1.0.0");
/// assert!(SchemaVersion::try_from("1.3.0").is_ok());
/// assert!(SchemaVersion::try_from("2.0.0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion(String);

impl SchemaVersion {
    /// Return the version this build writes.
    #[must_use]
    pub fn current() -> Self {
        Self(CURRENT.to_owned())
    }

    /// Return the version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SchemaVersion {
    type Error = ArtefactError;

    fn try_from(value: &str) -> Result<Self> {
        let mut parts = value.split('.');
        let major = parts.next().unwrap_or_default();
        let rest_numeric = parts.all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        if major != CURRENT_MAJOR || !rest_numeric {
            return Err(ArtefactError::UnsupportedSchemaVersion {
                value: value.to_owned(),
                supported: CURRENT.to_owned(),
            });
        }
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = ArtefactError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
