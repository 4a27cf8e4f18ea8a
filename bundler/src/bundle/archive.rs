//! Distribution archive creation.
//!
//! Compresses an assembled bundle directory into a single `.tar.gz` or
//! `.tar.zst` file whose only top-level entry is the bundle directory
//! itself. Entries are written in sorted order with deterministic headers,
//! so identical bundles produce identical archives.

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};

/// Compression applied to the distribution archive.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, clap::ValueEnum)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball.
    #[default]
    #[serde(rename = "tar.gz")]
    #[value(name = "tar.gz")]
    TarGz,
    /// zstd-compressed tarball.
    #[serde(rename = "tar.zst")]
    #[value(name = "tar.zst")]
    TarZst,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarZst => "tar.zst",
        }
    }
}

/// Errors arising from archive creation.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The directory to archive does not exist.
    #[error("cannot archive {path}: not a directory")]
    MissingSource {
        /// The missing bundle directory.
        path: Utf8PathBuf,
    },

    /// Reading the bundle or writing the archive failed.
    #[error("failed to write archive {path}")]
    Io {
        /// The archive being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// Archive `bundle_dir` into `output` and return the archive size in bytes.
///
/// # Errors
///
/// Returns [`ArchiveError::MissingSource`] if `bundle_dir` is not a
/// directory and [`ArchiveError::Io`] on any read or write failure.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use offline_bundler::bundle::archive::{ArchiveFormat, create_archive, format_size};
///
/// let bytes = create_archive(
///     Utf8Path::new("dist/opencode-offline"),
///     Utf8Path::new("dist/opencode-offline-linux-x64.tar.gz"),
///     ArchiveFormat::TarGz,
/// )?;
/// eprintln!("archive size: {}", format_size(bytes));
/// # Ok::<(), offline_bundler::bundle::archive::ArchiveError>(())
/// ```
pub fn create_archive(
    bundle_dir: &Utf8Path,
    output: &Utf8Path,
    format: ArchiveFormat,
) -> Result<u64, ArchiveError> {
    if !bundle_dir.is_dir() {
        return Err(ArchiveError::MissingSource {
            path: bundle_dir.to_owned(),
        });
    }
    let io_err = |source| ArchiveError::Io {
        path: output.to_owned(),
        source,
    };

    log::debug!("archiving {bundle_dir} into {output} ({})", format.extension());
    write_archive(bundle_dir, output, format).map_err(io_err)?;
    fs::metadata(output).map(|m| m.len()).map_err(io_err)
}

fn write_archive(bundle_dir: &Utf8Path, output: &Utf8Path, format: ArchiveFormat) -> io::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(output)?;
    let prefix = bundle_dir
        .file_name()
        .map_or_else(|| Utf8PathBuf::from("bundle"), Utf8PathBuf::from);

    match format {
        ArchiveFormat::TarGz => {
            let encoder = GzEncoder::new(file, Compression::default());
            append_tree(encoder, bundle_dir, &prefix)?.finish()?;
        }
        ArchiveFormat::TarZst => {
            let encoder = zstd::Encoder::new(file, 0)?;
            append_tree(encoder, bundle_dir, &prefix)?.finish()?;
        }
    }
    Ok(())
}

/// Write every path under `root` (sorted) to a tar stream over `writer`,
/// returning the writer for the caller to finish.
fn append_tree<W: Write>(writer: W, root: &Utf8Path, prefix: &Utf8Path) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.mode(tar::HeaderMode::Deterministic);
    builder.follow_symlinks(false);

    builder.append_path_with_name(root, prefix)?;
    for relative in sorted_entries(root)? {
        builder.append_path_with_name(root.join(&relative), prefix.join(&relative))?;
    }
    builder.into_inner()
}

/// Relative paths of everything below `root` in name order; directories
/// precede their contents and symlinked directories are not descended.
fn sorted_entries(root: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![Utf8PathBuf::new()];
    while let Some(dir) = pending.pop() {
        for entry in root.join(&dir).read_dir_utf8()? {
            let entry = entry?;
            let relative = dir.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                pending.push(relative.clone());
            }
            out.push(relative);
        }
    }
    out.sort();
    Ok(out)
}

/// Render a byte count for humans using binary units.
///
/// # Examples
///
/// ```
/// use offline_bundler::bundle::archive::format_size;
///
/// assert_eq!(format_size(512), "512 B");
/// assert_eq!(format_size(1536), "1.5 KiB");
/// assert_eq!(format_size(150 * 1024 * 1024), "150.0 MiB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut divisor: u128 = 1024;
    let mut unit = "KiB";
    for candidate in UNITS {
        unit = candidate;
        if u128::from(bytes) < divisor * 1024 || candidate == "TiB" {
            break;
        }
        divisor *= 1024;
    }
    let tenths = u128::from(bytes) * 10 / divisor;
    format!("{}.{} {unit}", tenths / 10, tenths % 10)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
