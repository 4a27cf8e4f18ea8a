//! Dependency acquisition.
//!
//! The [`Acquirer`] materializes every offline dependency for one target
//! platform under a freshly wiped dependency root, strictly in order:
//!
//! 1. ripgrep, pinned, from a `.tar.gz` with the top directory stripped;
//! 2. clangd, latest release, from a `.zip` whose versioned directory is
//!    renamed to `lsp/clangd`;
//! 3. rust-analyzer, latest release, from a raw `.gz` binary;
//! 4. npm packages, via the configured installer command;
//! 5. `manifest.json`, written last so its presence marks a complete root.
//!
//! A failing step aborts the run; nothing is retried.

pub mod packages;

use crate::artefact::download::{DownloadError, Fetcher};
use crate::artefact::extraction::{ExtractionError, Extractor, make_executable};
use crate::artefact::layout::DepsLayout;
use crate::artefact::manifest::{Components, CreatedAt, Manifest, ManifestError, write_manifest};
use crate::artefact::platform::TargetPlatform;
use crate::artefact::release::{AssetPredicate, ReleaseError, ReleaseSource, select_asset};
use crate::config::{PackagesConfig, ToolsConfig};
use crate::exec::CommandExecutor;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// Errors arising from dependency acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// A named acquisition step failed.
    #[error("failed to acquire {component}")]
    Step {
        /// The dependency being acquired.
        component: &'static str,
        /// What went wrong.
        source: Box<AcquireError>,
    },

    /// Downloading an artefact failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Resolving a release or selecting its asset failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// Unpacking an artefact failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The package installer exited unsuccessfully.
    #[error("package install `{command}` failed: {message}")]
    PackageInstall {
        /// The command line that was run.
        command: String,
        /// Captured diagnostic output.
        message: String,
    },

    /// The package installer could not be started.
    #[error("failed to run package installer `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An installed package's metadata is missing or unreadable.
    #[error("cannot determine installed version of {package}: {reason}")]
    PackageMetadata {
        /// The package name.
        package: String,
        /// Description of the failure.
        reason: String,
    },

    /// An artefact did not unpack to the expected shape.
    #[error("expected {path} after unpacking {artefact}")]
    Layout {
        /// The artefact that was unpacked.
        artefact: String,
        /// The path that should exist.
        path: Utf8PathBuf,
    },

    /// Writing the manifest failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A filesystem operation on the dependency root failed.
    #[error("I/O error at {path}")]
    Io {
        /// The path being operated on.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The system clock could not be read for the manifest timestamp.
    #[error("system clock is before the Unix epoch")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Result type alias using [`AcquireError`].
pub type Result<T> = std::result::Result<T, AcquireError>;

/// Inputs to [`Acquirer::run`].
#[derive(Debug, Clone, Copy)]
pub struct AcquireParams<'a> {
    /// Dependency root to wipe and populate.
    pub deps_root: &'a Utf8Path,
    /// Platform the dependencies are fetched for.
    pub platform: TargetPlatform,
    /// Release-hosted tool settings.
    pub tools: &'a ToolsConfig,
    /// Package installer settings.
    pub packages: &'a PackagesConfig,
}

/// Runs the acquisition steps against injected collaborators.
pub struct Acquirer<'a> {
    fetcher: &'a dyn Fetcher,
    extractor: &'a dyn Extractor,
    releases: &'a dyn ReleaseSource,
    executor: &'a dyn CommandExecutor,
}

impl<'a> Acquirer<'a> {
    /// Create an acquirer from its collaborators.
    #[must_use]
    pub fn new(
        fetcher: &'a dyn Fetcher,
        extractor: &'a dyn Extractor,
        releases: &'a dyn ReleaseSource,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            releases,
            executor,
        }
    }

    /// Populate the dependency root and return the manifest written there.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::Step`] naming the first dependency that
    /// failed, or [`AcquireError::Manifest`] if the manifest cannot be
    /// written. A failed run leaves no `manifest.json` behind.
    pub fn run(&self, params: &AcquireParams<'_>) -> Result<Manifest> {
        let layout = DepsLayout::new(params.deps_root);
        reset_dir(layout.root())?;
        let platform = params.platform;
        log::info!("acquiring dependencies for {platform} into {}", layout.root());

        let ripgrep = step("ripgrep", || {
            self.acquire_ripgrep(&layout, platform, params.tools)
        })?;
        let clangd = step("clangd", || {
            self.acquire_clangd(&layout, platform, &params.tools.clangd_repo)
        })?;
        let rust_analyzer = step("rust-analyzer", || {
            self.acquire_rust_analyzer(&layout, platform, &params.tools.rust_analyzer_repo)
        })?;
        let npm_packages = step("npm packages", || {
            packages::install_packages(self.executor, &layout, params.packages)
        })?;

        let components = Components {
            ripgrep,
            clangd,
            rust_analyzer,
            npm_packages,
        };
        let manifest = Manifest::generate(platform, components, CreatedAt::now()?);
        write_manifest(&layout.manifest(), &manifest)?;
        log::info!("wrote {}", layout.manifest());
        Ok(manifest)
    }

    /// Fetch the pinned ripgrep release into `ripgrep/`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] if the download or extraction fails.
    pub fn acquire_ripgrep(
        &self,
        layout: &DepsLayout,
        platform: TargetPlatform,
        tools: &ToolsConfig,
    ) -> Result<String> {
        let version = &tools.ripgrep_version;
        let file_name = format!("ripgrep-{version}-{}.tar.gz", platform.ripgrep_triple());
        let url = format!(
            "https://github.com/{}/releases/download/{version}/{file_name}",
            tools.ripgrep_repo
        );

        let scratch = scratch_dir()?;
        let archive = scratch.path().join(&file_name);
        self.download(&url, &archive)?;
        self.extractor
            .extract_tar_gz(&archive, layout.ripgrep_dir().as_std_path(), 1)?;
        mark_executable(&layout.ripgrep_binary(), &file_name)?;
        Ok(version.clone())
    }

    /// Fetch the latest clangd release into `lsp/clangd/`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] if resolution, download, or extraction
    /// fails, or the archive lacks the `clangd_<tag>` directory.
    pub fn acquire_clangd(
        &self,
        layout: &DepsLayout,
        platform: TargetPlatform,
        repo: &str,
    ) -> Result<String> {
        let release = self.releases.latest_release(repo)?;
        let predicate = AssetPredicate::Contains {
            marker: platform.clangd_marker().to_owned(),
            tag: release.tag.clone(),
            extension: ".zip".to_owned(),
        };
        let asset = select_asset(&release.assets, &predicate)?;
        log::info!("clangd {} ({})", release.tag, asset.name);

        let scratch = scratch_dir()?;
        let archive = scratch.path().join(&asset.name);
        self.download(&asset.url, &archive)?;

        let lsp_dir = layout.lsp_dir();
        create_dir(&lsp_dir)?;
        self.extractor
            .extract_zip(&archive, lsp_dir.as_std_path())?;

        let extracted = layout.clangd_versioned_dir(&release.tag);
        if !extracted.is_dir() {
            return Err(AcquireError::Layout {
                artefact: asset.name.clone(),
                path: extracted,
            });
        }
        let target = layout.clangd_dir();
        if target.exists() {
            remove_dir(&target)?;
        }
        fs::rename(&extracted, &target).map_err(|source| AcquireError::Io {
            path: extracted.clone(),
            source,
        })?;
        mark_executable(&layout.clangd_binary(), &asset.name)?;
        Ok(release.tag)
    }

    /// Fetch the latest rust-analyzer release into
    /// `lsp/rust-analyzer/bin/`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] if resolution, download, or decompression
    /// fails.
    pub fn acquire_rust_analyzer(
        &self,
        layout: &DepsLayout,
        platform: TargetPlatform,
        repo: &str,
    ) -> Result<String> {
        let release = self.releases.latest_release(repo)?;
        let predicate = AssetPredicate::Exact(format!(
            "rust-analyzer-{}.gz",
            platform.rust_analyzer_triple()
        ));
        let asset = select_asset(&release.assets, &predicate)?;
        log::info!("rust-analyzer {} ({})", release.tag, asset.name);

        let scratch = scratch_dir()?;
        let archive = scratch.path().join(&asset.name);
        self.download(&asset.url, &archive)?;

        let binary = layout.rust_analyzer_binary();
        if let Some(parent) = binary.parent() {
            create_dir(parent)?;
        }
        self.extractor.gunzip(&archive, binary.as_std_path())?;
        mark_executable(&binary, &asset.name)?;
        Ok(release.tag)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        log::debug!("downloading {url}");
        self.fetcher.fetch(url, dest)?;
        Ok(())
    }
}

/// Run one acquisition step, attributing any failure to `component`.
fn step<T>(component: &'static str, run: impl FnOnce() -> Result<T>) -> Result<T> {
    log::info!("acquiring {component}");
    run().map_err(|source| AcquireError::Step {
        component,
        source: Box::new(source),
    })
}

fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("offline-bundler-")
        .tempdir()
        .map_err(|source| AcquireError::Io {
            path: Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().as_ref()),
            source,
        })
}

fn mark_executable(path: &Utf8Path, artefact: &str) -> Result<()> {
    if !path.is_file() {
        return Err(AcquireError::Layout {
            artefact: artefact.to_owned(),
            path: path.to_owned(),
        });
    }
    make_executable(path.as_std_path()).map_err(|source| AcquireError::Io {
        path: path.to_owned(),
        source,
    })
}

fn reset_dir(path: &Utf8Path) -> Result<()> {
    if path.exists() {
        log::debug!("removing previous dependency root {path}");
        remove_dir(path)?;
    }
    create_dir(path)
}

fn remove_dir(path: &Utf8Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|source| AcquireError::Io {
        path: path.to_owned(),
        source,
    })
}

fn create_dir(path: &Utf8Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| AcquireError::Io {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "acquire_tests.rs"]
mod tests;
