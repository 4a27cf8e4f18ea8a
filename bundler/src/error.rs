//! Top-level error type for the offline bundler.
//!
//! Each stage owns a focused error enum; [`BundlerError`] gathers them so the
//! CLI can report any failure uniformly. Messages name the failing stage and
//! leave the underlying cause to the source chain.

use crate::acquire::AcquireError;
use crate::artefact::error::ArtefactError;
use crate::bundle::BundleError;
use crate::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while fetching dependencies or packaging a bundle.
#[derive(Debug, Error)]
pub enum BundlerError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A platform, commit SHA, or schema value was rejected.
    #[error(transparent)]
    Artefact(#[from] ArtefactError),

    /// Dependency acquisition failed.
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// Bundle assembly or packaging failed.
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Result type alias using [`BundlerError`].
pub type Result<T> = std::result::Result<T, BundlerError>;
