//! Archive extraction for fetched dependencies.
//!
//! Handles the three upstream packaging styles: gzip tarballs (optionally
//! stripping leading path components), zip archives, and single binaries
//! compressed as a raw gzip stream. Entry paths and link targets are
//! validated before anything is written so that no entry can escape the
//! destination, either directly or through a link.
//!
//! Archive formats do not reliably preserve the executable bit across this
//! round trip, so callers apply [`make_executable`] to every binary they
//! rely on.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Trait for extracting fetched archives, enabling test mocking.
///
/// # Examples
///
/// ```no_run
/// use offline_bundler::artefact::extraction::{ArchiveExtractor, Extractor};
/// use std::path::Path;
///
/// let files = ArchiveExtractor.extract_tar_gz(
///     Path::new("ripgrep.tar.gz"),
///     Path::new("deps/ripgrep"),
///     1,
/// )?;
/// # Ok::<(), offline_bundler::artefact::extraction::ExtractionError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Extractor {
    /// Extract a `.tar.gz` archive into `dest`, dropping the first
    /// `strip_components` components of every entry path.
    ///
    /// Returns the extracted paths relative to `dest`. Entries consisting
    /// only of stripped components are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the archive cannot be read, an entry
    /// escapes `dest`, or nothing remains to extract.
    fn extract_tar_gz(
        &self,
        archive: &Path,
        dest: &Path,
        strip_components: usize,
    ) -> Result<Vec<PathBuf>, ExtractionError>;

    /// Extract a `.zip` archive into `dest`.
    ///
    /// Returns the extracted paths relative to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] if the archive cannot be read, an entry
    /// escapes `dest`, or the archive is empty.
    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, ExtractionError>;

    /// Decompress a raw gzip stream into the single file `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Failed`] if the stream is corrupt or the
    /// output cannot be written.
    fn gunzip(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Reading the archive or writing an entry failed.
    #[error("failed to extract {archive}: {output}")]
    Failed {
        /// The archive being extracted.
        archive: PathBuf,
        /// Diagnostic output captured from the failure.
        output: String,
    },

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected in {archive}: {path}")]
    PathTraversal {
        /// The archive being extracted.
        archive: PathBuf,
        /// The offending entry path.
        path: String,
    },

    /// The archive produced no files.
    #[error("archive {archive} contains no files")]
    EmptyArchive {
        /// The archive being extracted.
        archive: PathBuf,
    },
}

/// Default extractor using the `tar`, `flate2` and `zip` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn extract_tar_gz(
        &self,
        archive: &Path,
        dest: &Path,
        strip_components: usize,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        let fail = |e: io::Error| failed(archive, &e);
        let file = File::open(archive).map_err(fail)?;
        let mut tarball = tar::Archive::new(GzDecoder::new(file));
        fs::create_dir_all(dest).map_err(fail)?;
        let root = dest.canonicalize().map_err(fail)?;

        let mut extracted = Vec::new();
        for entry_result in tarball.entries().map_err(fail)? {
            let mut entry = entry_result.map_err(fail)?;
            let entry_path = entry.path().map_err(fail)?.into_owned();
            let Some(relative) = strip_path(&entry_path, strip_components) else {
                continue;
            };
            validate_entry_path(archive, &relative)?;

            let target = dest.join(&relative);
            ensure_within(archive, &root, &target, &relative)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(fail)?;
            }

            let entry_type = entry.header().entry_type();
            if entry_type.is_hard_link() {
                let link = link_target(archive, &entry, &relative)?;
                let source = validate_entry_path(archive, &link)
                    .ok()
                    .and_then(|()| strip_path(&link, strip_components))
                    .map(|stripped| dest.join(stripped))
                    .ok_or_else(|| traversal(archive, &relative, &link))?;
                ensure_within(archive, &root, &source, &relative)?;
                fs::hard_link(&source, &target).map_err(fail)?;
            } else {
                if entry_type.is_symlink() {
                    let link = link_target(archive, &entry, &relative)?;
                    if !link_stays_within(&relative, &link) {
                        return Err(traversal(archive, &relative, &link));
                    }
                }
                entry.unpack(&target).map_err(fail)?;
            }
            extracted.push(relative);
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive {
                archive: archive.to_owned(),
            });
        }
        Ok(extracted)
    }

    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
        let fail = |e: io::Error| failed(archive, &e);
        let file = File::open(archive).map_err(fail)?;
        let mut zip = zip::ZipArchive::new(file).map_err(|e| failed(archive, &e))?;
        fs::create_dir_all(dest).map_err(fail)?;
        let root = dest.canonicalize().map_err(fail)?;

        let mut extracted = Vec::new();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|e| failed(archive, &e))?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ExtractionError::PathTraversal {
                    archive: archive.to_owned(),
                    path: entry.name().to_owned(),
                })?;
            let target = dest.join(&relative);
            ensure_within(archive, &root, &target, &relative)?;

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(fail)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(fail)?;
            }
            let mut out = File::create(&target).map_err(fail)?;
            io::copy(&mut entry, &mut out).map_err(fail)?;
            apply_unix_mode(&target, entry.unix_mode()).map_err(fail)?;
            extracted.push(relative);
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive {
                archive: archive.to_owned(),
            });
        }
        Ok(extracted)
    }

    fn gunzip(&self, archive: &Path, dest: &Path) -> Result<(), ExtractionError> {
        let fail = |e: io::Error| failed(archive, &e);
        let mut decoder = GzDecoder::new(File::open(archive).map_err(fail)?);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(fail)?;
        }
        let mut out = File::create(dest).map_err(fail)?;
        io::copy(&mut decoder, &mut out).map_err(fail)?;
        Ok(())
    }
}

/// Set mode `0755` on `path`. A no-op on platforms without Unix permissions.
///
/// # Errors
///
/// Returns any I/O error from reading or updating the permissions.
pub fn make_executable(path: &Path) -> io::Result<()> {
    apply_unix_mode(path, Some(0o755))
}

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode else {
        return Ok(());
    };
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(mode & 0o7777);
    fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn apply_unix_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

/// Drop the first `count` components; `None` when nothing remains.
fn strip_path(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path.components().skip(count).collect();
    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Reject absolute entry paths and `..` components.
fn validate_entry_path(archive: &Path, path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(ExtractionError::PathTraversal {
            archive: archive.to_owned(),
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// The target recorded in a symlink or hard link entry.
fn link_target<R: io::Read>(
    archive: &Path,
    entry: &tar::Entry<'_, R>,
    relative: &Path,
) -> Result<PathBuf, ExtractionError> {
    entry
        .link_name()
        .map_err(|e| failed(archive, &e))?
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| {
            failed(
                archive,
                &format!("link {} has no target", relative.display()),
            )
        })
}

/// Whether a symlink at `entry` pointing to `link` resolves inside the
/// destination, judged lexically from the entry's own directory.
fn link_stays_within(entry: &Path, link: &Path) -> bool {
    let mut depth = entry.parent().map_or(0, |parent| {
        parent
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count()
    });
    for component in link.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Reject `path` when its nearest existing ancestor resolves outside
/// `root`, which happens when an earlier link redirects the write.
fn ensure_within(
    archive: &Path,
    root: &Path,
    path: &Path,
    entry: &Path,
) -> Result<(), ExtractionError> {
    let Some(existing) = path.ancestors().skip(1).find(|ancestor| ancestor.exists()) else {
        return Ok(());
    };
    let resolved = existing.canonicalize().map_err(|e| failed(archive, &e))?;
    if resolved.starts_with(root) {
        Ok(())
    } else {
        Err(ExtractionError::PathTraversal {
            archive: archive.to_owned(),
            path: entry.display().to_string(),
        })
    }
}

fn traversal(archive: &Path, entry: &Path, link: &Path) -> ExtractionError {
    ExtractionError::PathTraversal {
        archive: archive.to_owned(),
        path: format!("{} -> {}", entry.display(), link.display()),
    }
}

fn failed(archive: &Path, err: &dyn std::fmt::Display) -> ExtractionError {
    ExtractionError::Failed {
        archive: archive.to_owned(),
        output: err.to_string(),
    }
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
