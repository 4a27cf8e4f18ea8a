//! Bundle assembly and distribution packaging.
//!
//! The [`Assembler`] turns a populated dependency root and a built host
//! binary into the bundle tree:
//!
//! ```text
//! <bundle>/
//!   bin/<host-binary>
//!   deps/                 copy of the dependency root
//!   deps/opentui/<native library>
//!   manifest.json
//! ```
//!
//! The bundle directory is removed and recreated on every run, so repeated
//! runs with the same inputs produce identical trees. The launcher, README
//! and final archive are produced by [`launcher`] and [`archive`].

pub mod archive;
pub mod launcher;

use crate::artefact::commit_sha::CommitSha;
use crate::artefact::extraction::make_executable;
use crate::artefact::layout::{BundleLayout, DepsLayout};
use crate::artefact::manifest::{Manifest, ManifestError, read_manifest, write_manifest};
use crate::exec::{CommandExecutor, failure_message};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Errors arising from bundle assembly and packaging.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Packaging was invoked before its inputs exist.
    #[error("{reason}")]
    Precondition {
        /// What is missing and how to produce it.
        reason: String,
    },

    /// The host build command exited unsuccessfully.
    #[error("host build `{command}` failed: {message}")]
    HostBuild {
        /// The command line that was run.
        command: String,
        /// Captured diagnostic output.
        message: String,
    },

    /// The host build command could not be started.
    #[error("failed to run host build `{command}`")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Copying an input into the bundle failed.
    #[error("failed to copy {from} to {to}")]
    Copy {
        /// Source path.
        from: Utf8PathBuf,
        /// Destination path.
        to: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Reading, verifying, or writing the manifest failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Creating the distribution archive failed.
    #[error(transparent)]
    Archive(#[from] archive::ArchiveError),

    /// Any other filesystem operation on the bundle failed.
    #[error("bundle I/O error at {path}")]
    Io {
        /// The path being operated on.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// Result type alias using [`BundleError`].
pub type Result<T> = std::result::Result<T, BundleError>;

/// A host build step run before assembly.
#[derive(Debug, Clone, Copy)]
pub struct HostBuild<'a> {
    /// Program followed by its arguments.
    pub command: &'a [String],
    /// Working directory for the build.
    pub cwd: &'a Utf8Path,
}

/// Inputs to [`Assembler::assemble`].
#[derive(Debug, Clone)]
pub struct AssembleParams<'a> {
    /// Populated dependency root containing `manifest.json`.
    pub deps_root: &'a Utf8Path,
    /// Bundle directory to (re)create.
    pub bundle_dir: &'a Utf8Path,
    /// Host checkout, which the bundle directory must neither be nor
    /// contain.
    pub host_repo_dir: &'a Utf8Path,
    /// Build output directory; the binary is read from its `bin/`.
    pub host_dist_dir: Utf8PathBuf,
    /// File name of the host executable.
    pub host_binary: &'a str,
    /// Platform native library placed under `deps/opentui/`.
    pub native_library: Utf8PathBuf,
    /// Optional host build run after the bundle directory is reset.
    pub host_build: Option<HostBuild<'a>>,
    /// Release version injected into the manifest.
    pub bundle_version: Option<String>,
    /// Source revision injected into the manifest.
    pub commit_sha: Option<CommitSha>,
}

/// Assembles bundle trees.
pub struct Assembler<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> Assembler<'a> {
    /// Create an assembler that runs host builds through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Assemble the bundle described by `params` and return the manifest
    /// written at its root.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Precondition`] when the dependency root or its
    /// manifest is missing, [`BundleError::HostBuild`] when the build fails,
    /// and [`BundleError::Copy`] or [`BundleError::Manifest`] when any input
    /// cannot be placed. Nothing is recovered after a failure.
    pub fn assemble(&self, params: &AssembleParams<'_>) -> Result<Manifest> {
        check_preconditions(params.deps_root, params.bundle_dir, &[params.host_repo_dir])?;
        let layout = BundleLayout::new(params.bundle_dir);
        reset_dir(layout.root())?;

        if let Some(build) = params.host_build {
            self.run_host_build(build)?;
        }

        let host_source = params.host_dist_dir.join("bin").join(params.host_binary);
        log::info!("copying host binary from {host_source}");
        create_dir(&layout.bin_dir())?;
        let host_dest = layout.bin_dir().join(params.host_binary);
        copy_file(&host_source, &host_dest)?;
        make_executable(host_dest.as_std_path()).map_err(|source| BundleError::Io {
            path: host_dest.clone(),
            source,
        })?;

        log::info!("copying dependency root {}", params.deps_root);
        copy_tree(params.deps_root, &layout.deps_dir())?;

        log::info!("placing native library {}", params.native_library);
        create_dir(&layout.native_dir())?;
        let library_name = params.native_library.file_name().ok_or_else(|| {
            BundleError::Precondition {
                reason: format!("native library path {} has no file name", params.native_library),
            }
        })?;
        copy_file(&params.native_library, &layout.native_dir().join(library_name))?;

        let manifest = read_manifest(&DepsLayout::new(params.deps_root).manifest())?;
        manifest.verify_layout(params.deps_root)?;
        let manifest =
            manifest.with_release(params.bundle_version.clone(), params.commit_sha.clone());
        write_manifest(&layout.manifest(), &manifest)?;
        Ok(manifest)
    }

    /// Run the host build command.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Spawn`] if the command cannot start and
    /// [`BundleError::HostBuild`] if it exits unsuccessfully.
    pub fn run_host_build(&self, build: HostBuild<'_>) -> Result<()> {
        let Some((program, args)) = build.command.split_first() else {
            return Ok(());
        };
        let command = build.command.join(" ");
        log::info!("building host: {command}");

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .executor
            .run(program, &args, build.cwd.as_std_path())
            .map_err(|source| BundleError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(BundleError::HostBuild {
                command,
                message: failure_message(&output),
            });
        }
        Ok(())
    }
}

/// Fail fast when acquisition has not produced a complete dependency root,
/// or when resetting the bundle directory would destroy an input.
///
/// Paths are compared after resolving symlinks, so the same directory
/// spelled relatively and absolutely is still caught. The bundle directory
/// may not overlap the dependency root in either direction, and may not be
/// or contain the working directory or any of `protected`.
///
/// # Errors
///
/// Returns [`BundleError::Precondition`] describing the missing input or
/// the conflicting directory.
pub fn check_preconditions(
    deps_root: &Utf8Path,
    bundle_dir: &Utf8Path,
    protected: &[&Utf8Path],
) -> Result<()> {
    if !deps_root.is_dir() {
        return Err(BundleError::Precondition {
            reason: format!(
                "dependency root {deps_root} does not exist; run `offline-bundler fetch` first"
            ),
        });
    }
    let manifest = DepsLayout::new(deps_root).manifest();
    if !manifest.is_file() {
        return Err(BundleError::Precondition {
            reason: format!(
                "{manifest} is missing; the last fetch did not complete, run `offline-bundler fetch` again"
            ),
        });
    }

    let deps = resolve_path(deps_root)?;
    let bundle = resolve_path(bundle_dir)?;
    if deps.starts_with(&bundle) || bundle.starts_with(&deps) {
        return Err(BundleError::Precondition {
            reason: format!(
                "bundle directory {bundle_dir} and dependency root {deps_root} must not contain each other"
            ),
        });
    }

    let working_dir = Utf8PathBuf::from(".");
    for dir in std::iter::once(working_dir.as_path()).chain(protected.iter().copied()) {
        if resolve_path(dir)?.starts_with(&bundle) {
            return Err(BundleError::Precondition {
                reason: format!(
                    "bundle directory {bundle_dir} would replace {dir}; choose a dedicated output directory"
                ),
            });
        }
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved up to its nearest
/// existing ancestor.
fn resolve_path(path: &Utf8Path) -> Result<PathBuf> {
    let io_err = |source| BundleError::Io {
        path: path.to_owned(),
        source,
    };
    let absolute = std::path::absolute(path).map_err(io_err)?;
    let Some(existing) = absolute.ancestors().find(|ancestor| ancestor.exists()) else {
        return Ok(absolute);
    };
    let resolved = existing.canonicalize().map_err(io_err)?;
    Ok(absolute
        .strip_prefix(existing)
        .map_or_else(|_| resolved.clone(), |rest| resolved.join(rest)))
}

/// Remove `path` if present and recreate it empty.
fn reset_dir(path: &Utf8Path) -> Result<()> {
    if path.exists() {
        log::debug!("removing previous bundle at {path}");
        fs::remove_dir_all(path).map_err(|source| BundleError::Io {
            path: path.to_owned(),
            source,
        })?;
    }
    create_dir(path)
}

fn create_dir(path: &Utf8Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| BundleError::Io {
        path: path.to_owned(),
        source,
    })
}

fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| BundleError::Copy {
            from: from.to_owned(),
            to: to.to_owned(),
            source,
        })
}

/// Recursively copy `from` into `to`, preserving file modes and symlinks.
///
/// # Errors
///
/// Returns [`BundleError::Copy`] naming the first entry that failed.
pub fn copy_tree(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    let copy_err = |source| BundleError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    };
    fs::create_dir_all(to).map_err(copy_err)?;

    for entry in from.read_dir_utf8().map_err(copy_err)? {
        let entry = entry.map_err(copy_err)?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(copy_err)?;

        if file_type.is_dir() {
            copy_tree(source, &dest)?;
        } else if file_type.is_symlink() {
            copy_symlink(source, &dest)?;
        } else {
            copy_file(source, &dest)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    fs::read_link(from)
        .and_then(|target| std::os::unix::fs::symlink(target, to))
        .map_err(|source| BundleError::Copy {
            from: from.to_owned(),
            to: to.to_owned(),
            source,
        })
}

#[cfg(not(unix))]
fn copy_symlink(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    copy_file(from, to)
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
