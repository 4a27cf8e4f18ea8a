//! Provenance manifest for an offline dependency set.
//!
//! The manifest is the single source of truth for what a bundle contains:
//! the resolved version of every fetched tool and package, the platform the
//! set was built for, and when it was generated. Acquisition writes it last,
//! so its presence means every dependency was materialized. The assembler
//! may annotate it with a release version and source revision:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "created": "2026-10-17T12:00:00Z",
//!   "platform": "linux",
//!   "arch": "x64",
//!   "components": {
//!     "ripgrep": "14.1.1",
//!     "clangd": "19.1.2",
//!     "rustAnalyzer": "2026-10-13",
//!     "npmPackages": { "pyright": "1.1.390", "typescript": "5.7.2" }
//!   },
//!   "bundleVersion": "1.2.3",
//!   "commitSha": "abc1234"
//! }
//! ```

use super::commit_sha::CommitSha;
use super::layout::DepsLayout;
use super::platform::TargetPlatform;
use super::schema_version::SchemaVersion;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors arising from manifest I/O and validation.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Reading or writing the manifest file failed.
    #[error("manifest I/O error at {path}")]
    Io {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON or a field failed validation.
    #[error("invalid manifest at {path}")]
    Json {
        /// The manifest path.
        path: Utf8PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A component listed in the manifest is absent from the dependency root.
    #[error("manifest lists {component} but {path} does not exist")]
    MissingComponent {
        /// Logical component name.
        component: String,
        /// The path that should have been materialized.
        path: Utf8PathBuf,
    },
}

/// An ISO 8601 UTC timestamp recording when the manifest was generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatedAt(String);

impl CreatedAt {
    /// Wrap an already formatted timestamp.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Stamp the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is before the Unix epoch.
    pub fn now() -> Result<Self, std::time::SystemTimeError> {
        crate::timestamp::now_utc_iso8601().map(Self)
    }

    /// Return the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolved versions of every bundled dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Pinned ripgrep release.
    pub ripgrep: String,
    /// Resolved clangd release tag.
    pub clangd: String,
    /// Resolved rust-analyzer release tag.
    pub rust_analyzer: String,
    /// Package name to installed version, sorted by name.
    pub npm_packages: BTreeMap<String, String>,
}

/// The provenance record for one dependency set or bundle.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use offline_bundler::artefact::manifest::{Components, CreatedAt, Manifest};
/// use offline_bundler::artefact::platform::TargetPlatform;
///
/// let platform = TargetPlatform::parse("linux", "x64").expect("supported");
/// let components = Components {
///     ripgrep: "14.1.1".to_owned(),
///     clangd: "19.1.2".to_owned(),
///     rust_analyzer: "2026-10-13".to_owned(),
///     npm_packages: BTreeMap::new(),
/// };
/// let manifest = Manifest::generate(platform, components, CreatedAt::new("2026-10-17T00:00:00Z"));
/// assert_eq!(manifest.platform(), "linux");
/// assert!(manifest.bundle_version().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    version: SchemaVersion,
    created: CreatedAt,
    platform: String,
    arch: String,
    components: Components,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bundle_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    commit_sha: Option<CommitSha>,
}

impl Manifest {
    /// Assemble a manifest from acquisition results.
    #[must_use]
    pub fn generate(platform: TargetPlatform, components: Components, created: CreatedAt) -> Self {
        Self {
            version: SchemaVersion::current(),
            created,
            platform: platform.node_platform().to_owned(),
            arch: platform.node_arch().to_owned(),
            components,
            bundle_version: None,
            commit_sha: None,
        }
    }

    /// Return a copy annotated with release metadata.
    ///
    /// `None` arguments leave the corresponding field as it was; no other
    /// field is touched.
    #[must_use]
    pub fn with_release(
        mut self,
        bundle_version: Option<String>,
        commit_sha: Option<CommitSha>,
    ) -> Self {
        if bundle_version.is_some() {
            self.bundle_version = bundle_version;
        }
        if commit_sha.is_some() {
            self.commit_sha = commit_sha;
        }
        self
    }

    /// Check that every listed component exists under `deps_root`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingComponent`] naming the first
    /// component whose directory is absent.
    pub fn verify_layout(&self, deps_root: &Utf8Path) -> Result<(), ManifestError> {
        let layout = DepsLayout::new(deps_root);
        let tools = [
            ("ripgrep", layout.ripgrep_dir()),
            ("clangd", layout.clangd_dir()),
            ("rustAnalyzer", layout.rust_analyzer_dir()),
        ];
        let packages = self
            .components
            .npm_packages
            .keys()
            .map(|name| (name.as_str(), layout.package_dir(name)));

        for (component, path) in tools.into_iter().chain(packages) {
            if !path.is_dir() {
                return Err(ManifestError::MissingComponent {
                    component: component.to_owned(),
                    path,
                });
            }
        }
        Ok(())
    }

    /// Return the schema version.
    #[must_use]
    pub fn version(&self) -> &SchemaVersion {
        &self.version
    }

    /// Return the generation timestamp.
    #[must_use]
    pub fn created(&self) -> &CreatedAt {
        &self.created
    }

    /// Return the Node-style platform name.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Return the Node-style architecture name.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Return the resolved component versions.
    #[must_use]
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Return the release version, if one was injected.
    #[must_use]
    pub fn bundle_version(&self) -> Option<&str> {
        self.bundle_version.as_deref()
    }

    /// Return the source revision, if one was injected.
    #[must_use]
    pub fn commit_sha(&self) -> Option<&CommitSha> {
        self.commit_sha.as_ref()
    }
}

/// Serialize a manifest to pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`ManifestError::Json`] if serialization fails.
pub fn manifest_json(manifest: &Manifest, path: &Utf8Path) -> Result<String, ManifestError> {
    let mut json = serde_json::to_string_pretty(manifest).map_err(|source| ManifestError::Json {
        path: path.to_owned(),
        source,
    })?;
    json.push('\n');
    Ok(json)
}

/// Write `manifest` to `path`.
///
/// # Errors
///
/// Returns [`ManifestError`] if serialization or the write fails.
pub fn write_manifest(path: &Utf8Path, manifest: &Manifest) -> Result<(), ManifestError> {
    let json = manifest_json(manifest, path)?;
    std::fs::write(path, json).map_err(|source| ManifestError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Read and validate the manifest at `path`.
///
/// # Errors
///
/// Returns [`ManifestError::Io`] if the file cannot be read and
/// [`ManifestError::Json`] if it is malformed or carries an unsupported
/// schema version or commit SHA.
pub fn read_manifest(path: &Utf8Path) -> Result<Manifest, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ManifestError::Json {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
