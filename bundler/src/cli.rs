//! CLI argument definitions for the offline bundler.
//!
//! Defines the command-line interface using clap. Flags here override the
//! matching fields of the loaded configuration file.

use crate::bundle::archive::ArchiveFormat;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Fetch offline dependencies and package self-contained opencode bundles.
#[derive(Parser, Debug)]
#[command(name = "offline-bundler")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch offline dependencies and package self-contained opencode bundles.\n\n",
    "`fetch` downloads ripgrep, clangd, rust-analyzer and the configured npm ",
    "language servers for one platform into a dependency root and records their ",
    "versions in manifest.json. `package` copies the host binary and that ",
    "dependency root into a bundle directory, adds a launcher script that enables ",
    "offline mode, and compresses the result into a single archive.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Fetch dependencies for the current machine:\n",
    "    $ offline-bundler fetch\n\n",
    "  Fetch for another platform:\n",
    "    $ offline-bundler fetch --platform darwin --arch arm64\n\n",
    "  Package a release without rebuilding the host:\n",
    "    $ offline-bundler package --skip-build --bundle-version 1.2.3\n\n",
    "  Do both in one go:\n",
    "    $ offline-bundler all\n\n",
    "Settings are read from offline-bundler.toml when present; RUST_LOG ",
    "controls diagnostic logging.",
))]
pub struct Cli {
    /// Configuration file [default: offline-bundler.toml when present].
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Stage to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download every offline dependency into the dependency root.
    Fetch(TargetArgs),

    /// Assemble and compress the bundle from an existing dependency root.
    Package(PackageArgs),

    /// Run `fetch` followed by `package`.
    All(PackageArgs),
}

/// Target selection shared by every subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetArgs {
    /// Target operating system (`linux` or `darwin`) [default: host].
    #[arg(long, value_name = "OS")]
    pub platform: Option<String>,

    /// Target architecture (`x64` or `arm64`) [default: host].
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Dependency root directory.
    #[arg(short, long, value_name = "DIR")]
    pub deps_dir: Option<Utf8PathBuf>,
}

/// Arguments for `package` and `all`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageArgs {
    /// Target selection.
    #[command(flatten)]
    pub target: TargetArgs,

    /// Packaging options.
    #[command(flatten)]
    pub options: PackageOptions,
}

/// Options controlling bundle assembly.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageOptions {
    /// Release version recorded in the bundle manifest.
    #[arg(long, env = "BUNDLE_VERSION", value_name = "VERSION")]
    pub bundle_version: Option<String>,

    /// Source revision recorded in the bundle manifest.
    #[arg(long, env = "COMMIT_SHA", value_name = "SHA")]
    pub commit_sha: Option<String>,

    /// Use the existing host build instead of running the build command.
    #[arg(long)]
    pub skip_build: bool,

    /// Host build output directory containing `bin/<binary>`.
    #[arg(long, value_name = "DIR")]
    pub host_dist_dir: Option<Utf8PathBuf>,

    /// Native library copied into the bundle.
    #[arg(long, value_name = "FILE")]
    pub native_library: Option<Utf8PathBuf>,

    /// Bundle output directory.
    #[arg(short, long, value_name = "DIR")]
    pub bundle_dir: Option<Utf8PathBuf>,

    /// Archive compression.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<ArchiveFormat>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
