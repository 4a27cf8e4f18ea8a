//! Remote file retrieval.
//!
//! Provides a trait-based abstraction for downloading release assets so the
//! acquisition pipeline can be exercised without network access. There is
//! deliberately no retry and no request timeout: a single failure aborts the
//! run.

use std::path::Path;
use std::sync::OnceLock;

/// User agent sent with every request; the GitHub API rejects anonymous
/// clients without one.
const USER_AGENT: &str = concat!("offline-bundler/", env!("CARGO_PKG_VERSION"));

/// Trait for downloading a URL to a local file.
///
/// # Examples
///
/// ```no_run
/// use offline_bundler::artefact::download::{Fetcher, HttpFetcher};
/// use std::path::Path;
///
/// HttpFetcher.fetch("https://example.com/rg.tar.gz", Path::new("/tmp/rg.tar.gz"))?;
/// # Ok::<(), offline_bundler::artefact::download::DownloadError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher {
    /// Download `url` into `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Status`] for a non-success HTTP response,
    /// [`DownloadError::Transport`] when the request cannot be completed and
    /// [`DownloadError::Io`] when the body cannot be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The server answered with a non-success status.
    #[error("download of {url} failed with HTTP status {status}")]
    Status {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request could not be sent or the response could not be read.
    #[error("download of {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based fetcher using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("GET {url} -> {}", dest.display());
        let response = http_agent()
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
        Ok(())
    }
}

/// Fetch `url` and return the body as text, attaching any extra headers.
pub(crate) fn get_text(url: &str, headers: &[(&str, String)]) -> Result<String, DownloadError> {
    let mut request = http_agent().get(url).header("User-Agent", USER_AGENT);
    for (name, value) in headers {
        request = request.header(*name, value.as_str());
    }
    let response = request.call().map_err(|e| map_ureq_error(url, &e))?;
    response
        .into_body()
        .read_to_string()
        .map_err(|e| DownloadError::Transport {
            url: url.to_owned(),
            reason: e.to_string(),
        })
}

/// Shared `ureq` agent. Status codes surface as errors so every non-success
/// response is reported with its code.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(true)
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(status) => DownloadError::Status {
            url: url.to_owned(),
            status: *status,
        },
        other => DownloadError::Transport {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
