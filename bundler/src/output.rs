//! Human-readable progress and summary output.
//!
//! Progress goes to an injected writer (stderr in the binary) so that it can
//! be captured in tests and silenced with `--quiet`. Structured diagnostics
//! go through the `log` facade instead.

use crate::artefact::manifest::Manifest;
use crate::bundle::archive::format_size;
use camino::Utf8Path;
use std::error::Error;
use std::io::Write;

/// Writes a line to stderr, ignoring write failures.
///
/// This is used for user-facing output where failures to write should not
/// abort the operation.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Summarize a completed fetch.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use camino::Utf8Path;
/// use offline_bundler::artefact::manifest::{Components, CreatedAt, Manifest};
/// use offline_bundler::artefact::platform::TargetPlatform;
/// use offline_bundler::output::fetch_summary;
///
/// let components = Components {
///     ripgrep: "14.1.1".to_owned(),
///     clangd: "19.1.2".to_owned(),
///     rust_analyzer: "2026-10-13".to_owned(),
///     npm_packages: BTreeMap::from([("pyright".to_owned(), "1.1.390".to_owned())]),
/// };
/// let platform = TargetPlatform::parse("linux", "x64").expect("supported");
/// let manifest = Manifest::generate(platform, components, CreatedAt::new("2026-10-17T00:00:00Z"));
///
/// let summary = fetch_summary(&manifest, Utf8Path::new("offline-deps"));
/// assert!(summary.starts_with("Fetched dependencies for linux-x64 into offline-deps"));
/// assert!(summary.contains("  pyright 1.1.390"));
/// ```
#[must_use]
pub fn fetch_summary(manifest: &Manifest, deps_root: &Utf8Path) -> String {
    let components = manifest.components();
    let mut lines = vec![
        format!(
            "Fetched dependencies for {}-{} into {deps_root}:",
            manifest.platform(),
            manifest.arch()
        ),
        format!("  ripgrep {}", components.ripgrep),
        format!("  clangd {}", components.clangd),
        format!("  rust-analyzer {}", components.rust_analyzer),
    ];
    lines.extend(
        components
            .npm_packages
            .iter()
            .map(|(name, version)| format!("  {name} {version}")),
    );
    lines.join("\n")
}

/// Summarize a completed package run.
#[must_use]
pub fn package_summary(bundle_dir: &Utf8Path, archive: &Utf8Path, size: u64) -> String {
    format!(
        "Bundle assembled at {bundle_dir}\nArchive written to {archive} ({})",
        format_size(size)
    )
}

/// Render `err` and its source chain for the terminal.
///
/// The first line is `error: <message>`; each cause follows on its own
/// `caused by:` line.
#[must_use]
pub fn error_report(err: &dyn Error) -> String {
    let mut report = format!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        report.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    report
}
