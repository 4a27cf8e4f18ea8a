//! Release tag resolution and asset selection.
//!
//! Dependencies published as GitHub releases are resolved to a concrete tag
//! and asset list through a [`ReleaseSource`]. The production source queries
//! the GitHub REST API; [`PinnedReleases`] serves fixed releases so runs can
//! be made deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use super::download::{DownloadError, get_text};

const GITHUB_API: &str = "https://api.github.com";

/// A published release: its tag and downloadable assets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// The release tag, e.g. `19.1.2` or `2026-10-13`.
    #[serde(rename = "tag_name")]
    pub tag: String,
    /// Assets in the order the API lists them.
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// A single downloadable release asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    /// The asset's filename.
    pub name: String,
    /// Direct download URL.
    #[serde(rename = "browser_download_url")]
    pub url: String,
}

impl Asset {
    /// Construct an asset from a name and download URL.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Errors arising from release resolution.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// The release metadata could not be fetched or parsed.
    #[error("failed to fetch latest release of {repo}: {reason}")]
    Fetch {
        /// The `owner/name` repository.
        repo: String,
        /// Description of the failure.
        reason: String,
    },

    /// No asset satisfied the selection predicate.
    #[error("no release asset matches {predicate}")]
    AssetNotFound {
        /// Rendering of the predicate that failed to match.
        predicate: String,
    },
}

/// Source of release metadata.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource {
    /// Return the latest release of `repo` (`owner/name`).
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Fetch`] when the source is unreachable or
    /// answers with a non-success status.
    fn latest_release(&self, repo: &str) -> Result<Release, ReleaseError>;
}

/// Resolve only the latest tag of `repo`.
///
/// # Errors
///
/// Propagates [`ReleaseError::Fetch`] from the source.
pub fn resolve_tag(source: &dyn ReleaseSource, repo: &str) -> Result<String, ReleaseError> {
    source.latest_release(repo).map(|release| release.tag)
}

/// Release source backed by the GitHub REST API.
///
/// Sends `GITHUB_TOKEN` (or `GH_TOKEN`) as a bearer token when set, which
/// lifts the anonymous rate limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubReleases;

impl ReleaseSource for GitHubReleases {
    fn latest_release(&self, repo: &str) -> Result<Release, ReleaseError> {
        let url = format!("{GITHUB_API}/repos/{repo}/releases/latest");
        log::debug!("resolving latest release via {url}");

        let mut headers = vec![("Accept", "application/vnd.github+json".to_owned())];
        if let Some(token) = auth_token() {
            headers.push(("Authorization", format!("Bearer {token}")));
        }

        let body = get_text(&url, &headers).map_err(|e| fetch_error(repo, &e))?;
        parse_release(repo, &body)
    }
}

fn auth_token() -> Option<String> {
    ["GITHUB_TOKEN", "GH_TOKEN"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|token| !token.is_empty())
}

fn fetch_error(repo: &str, err: &DownloadError) -> ReleaseError {
    ReleaseError::Fetch {
        repo: repo.to_owned(),
        reason: err.to_string(),
    }
}

/// Parse a release document as returned by the GitHub API.
///
/// # Errors
///
/// Returns [`ReleaseError::Fetch`] when the body is not a release document.
pub fn parse_release(repo: &str, body: &str) -> Result<Release, ReleaseError> {
    serde_json::from_str(body).map_err(|e| ReleaseError::Fetch {
        repo: repo.to_owned(),
        reason: format!("invalid release JSON: {e}"),
    })
}

/// Release source answering from a fixed table.
///
/// # Examples
///
/// ```
/// use offline_bundler::artefact::release::{PinnedReleases, Release, ReleaseSource};
///
/// let source = PinnedReleases::default().with_release(
///     "clangd/clangd",
///     Release { tag: "19.1.2".to_owned(), assets: Vec::new() },
/// );
/// assert_eq!(source.latest_release("clangd/clangd")?.tag, "19.1.2");
/// assert!(source.latest_release("other/repo").is_err());
/// # Ok::<(), offline_bundler::artefact::release::ReleaseError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PinnedReleases {
    releases: BTreeMap<String, Release>,
}

impl PinnedReleases {
    /// Register `release` as the latest release of `repo`.
    #[must_use]
    pub fn with_release(mut self, repo: impl Into<String>, release: Release) -> Self {
        self.releases.insert(repo.into(), release);
        self
    }
}

impl ReleaseSource for PinnedReleases {
    fn latest_release(&self, repo: &str) -> Result<Release, ReleaseError> {
        self.releases
            .get(repo)
            .cloned()
            .ok_or_else(|| ReleaseError::Fetch {
                repo: repo.to_owned(),
                reason: "no pinned release".to_owned(),
            })
    }
}

/// Predicate used to pick an asset from a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetPredicate {
    /// The filename equals this string.
    Exact(String),
    /// The filename contains `marker` and `tag` and ends with `extension`.
    Contains {
        /// Platform marker, e.g. `linux` or `mac`.
        marker: String,
        /// Release tag.
        tag: String,
        /// Required suffix, e.g. `.zip`.
        extension: String,
    },
}

impl AssetPredicate {
    /// Returns `true` if `name` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => name == expected,
            Self::Contains {
                marker,
                tag,
                extension,
            } => {
                name.contains(marker.as_str())
                    && name.contains(tag.as_str())
                    && name.ends_with(extension.as_str())
            }
        }
    }
}

impl fmt::Display for AssetPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => write!(f, "name == {name:?}"),
            Self::Contains {
                marker,
                tag,
                extension,
            } => write!(
                f,
                "name containing {marker:?} and {tag:?} ending in {extension:?}"
            ),
        }
    }
}

/// Select the first asset, in listed order, that satisfies `predicate`.
///
/// # Errors
///
/// Returns [`ReleaseError::AssetNotFound`] when nothing matches.
pub fn select_asset<'a>(
    assets: &'a [Asset],
    predicate: &AssetPredicate,
) -> Result<&'a Asset, ReleaseError> {
    assets
        .iter()
        .find(|asset| predicate.matches(&asset.name))
        .ok_or_else(|| ReleaseError::AssetNotFound {
            predicate: predicate.to_string(),
        })
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
