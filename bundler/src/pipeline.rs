//! Fetch and package pipeline orchestration.
//!
//! Ties configuration, CLI overrides and the stage implementations together.
//! Collaborators that touch the network or spawn processes are injected via
//! [`Collaborators`] so the whole pipeline can run against fixtures.

use crate::acquire::{AcquireParams, Acquirer};
use crate::artefact::commit_sha::CommitSha;
use crate::artefact::download::{Fetcher, HttpFetcher};
use crate::artefact::extraction::{ArchiveExtractor, Extractor};
use crate::artefact::layout::BundleLayout;
use crate::artefact::manifest::Manifest;
use crate::artefact::platform::TargetPlatform;
use crate::artefact::release::{GitHubReleases, ReleaseSource};
use crate::bundle::archive::create_archive;
use crate::bundle::launcher::{render_readme, write_launcher};
use crate::bundle::{AssembleParams, Assembler, BundleError, HostBuild};
use crate::cli::{Cli, Command, PackageOptions, TargetArgs};
use crate::config::BundleConfig;
use crate::error::Result;
use crate::exec::{CommandExecutor, SystemCommandExecutor};
use crate::output::{fetch_summary, package_summary, write_stderr_line};
use camino::Utf8PathBuf;
use std::io::Write;

/// External collaborators used by the pipelines.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Downloads artefacts.
    pub fetcher: &'a dyn Fetcher,
    /// Unpacks artefacts.
    pub extractor: &'a dyn Extractor,
    /// Resolves latest releases.
    pub releases: &'a dyn ReleaseSource,
    /// Runs the package installer and host build.
    pub executor: &'a dyn CommandExecutor,
}

impl Collaborators<'static> {
    /// Collaborators backed by the network and the host system.
    #[must_use]
    pub fn system() -> Self {
        Self {
            fetcher: &HttpFetcher,
            extractor: &ArchiveExtractor,
            releases: &GitHubReleases,
            executor: &SystemCommandExecutor,
        }
    }
}

/// Result of a package run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    /// Manifest written at the bundle root.
    pub manifest: Manifest,
    /// Assembled bundle directory.
    pub bundle_dir: Utf8PathBuf,
    /// Written archive.
    pub archive: Utf8PathBuf,
    /// Archive size in bytes.
    pub archive_size: u64,
}

/// Load configuration and dispatch the requested subcommand.
///
/// # Errors
///
/// Returns the first error from configuration loading or any stage.
pub fn run(cli: &Cli, collaborators: Collaborators<'_>, stderr: &mut dyn Write) -> Result<()> {
    let config = BundleConfig::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Fetch(target) => {
            run_fetch(&config, target, collaborators, cli.quiet, stderr)?;
        }
        Command::Package(args) => {
            run_package(
                &config,
                &args.target,
                &args.options,
                collaborators.executor,
                cli.quiet,
                stderr,
            )?;
        }
        Command::All(args) => {
            run_fetch(&config, &args.target, collaborators, cli.quiet, stderr)?;
            run_package(
                &config,
                &args.target,
                &args.options,
                collaborators.executor,
                cli.quiet,
                stderr,
            )?;
        }
    }
    Ok(())
}

/// Populate the dependency root for the selected platform.
///
/// # Errors
///
/// Returns an error if the platform is unsupported or acquisition fails.
pub fn run_fetch(
    config: &BundleConfig,
    target: &TargetArgs,
    collaborators: Collaborators<'_>,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<Manifest> {
    let platform = TargetPlatform::resolve(target.platform.as_deref(), target.arch.as_deref())?;
    let deps_root = target.deps_dir.as_ref().unwrap_or(&config.deps_dir);

    if !quiet {
        write_stderr_line(
            stderr,
            format!("Fetching offline dependencies for {platform} into {deps_root}..."),
        );
    }

    let acquirer = Acquirer::new(
        collaborators.fetcher,
        collaborators.extractor,
        collaborators.releases,
        collaborators.executor,
    );
    let manifest = acquirer.run(&AcquireParams {
        deps_root,
        platform,
        tools: &config.tools,
        packages: &config.packages,
    })?;

    if !quiet {
        write_stderr_line(stderr, fetch_summary(&manifest, deps_root));
    }
    Ok(manifest)
}

/// Assemble the bundle, write its launcher and README, and archive it.
///
/// # Errors
///
/// Returns an error if the platform or commit SHA is invalid, the
/// dependency root is missing, or any assembly or packaging step fails.
pub fn run_package(
    config: &BundleConfig,
    target: &TargetArgs,
    options: &PackageOptions,
    executor: &dyn CommandExecutor,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<PackageOutcome> {
    let platform = TargetPlatform::resolve(target.platform.as_deref(), target.arch.as_deref())?;
    let commit_sha = options
        .commit_sha
        .as_deref()
        .map(CommitSha::try_from)
        .transpose()?;
    let config = apply_overrides(config, target, options);
    let host = &config.host;

    let host_build = (!options.skip_build && !host.build_command.is_empty()).then_some(HostBuild {
        command: &host.build_command,
        cwd: &host.repo_dir,
    });
    let params = AssembleParams {
        deps_root: &config.deps_dir,
        bundle_dir: &config.bundle_dir,
        host_repo_dir: &host.repo_dir,
        host_dist_dir: options
            .host_dist_dir
            .clone()
            .unwrap_or_else(|| host.dist_path(platform)),
        host_binary: &host.binary,
        native_library: options
            .native_library
            .clone()
            .unwrap_or_else(|| host.native_library_path(platform)),
        host_build,
        bundle_version: options.bundle_version.clone(),
        commit_sha,
    };

    if !quiet {
        write_stderr_line(
            stderr,
            format!("Assembling {platform} bundle in {}...", config.bundle_dir),
        );
    }
    let manifest = Assembler::new(executor).assemble(&params)?;

    let layout = BundleLayout::new(&config.bundle_dir);
    let launcher = write_launcher(&layout, &config.launcher, &host.binary).map_err(|source| {
        BundleError::Io {
            path: layout.root().join(&config.launcher.file_name),
            source,
        }
    })?;
    log::info!("wrote launcher {launcher}");
    let readme = layout.readme();
    std::fs::write(&readme, render_readme(&manifest, &config.launcher, &host.name)).map_err(
        |source| BundleError::Io {
            path: readme.clone(),
            source,
        },
    )?;

    let archive = config.archive_path(platform);
    if !quiet {
        write_stderr_line(stderr, format!("Compressing bundle into {archive}..."));
    }
    let archive_size = create_archive(&config.bundle_dir, &archive, config.archive_format)
        .map_err(BundleError::from)?;

    if !quiet {
        write_stderr_line(
            stderr,
            package_summary(&config.bundle_dir, &archive, archive_size),
        );
    }
    Ok(PackageOutcome {
        manifest,
        bundle_dir: config.bundle_dir.clone(),
        archive,
        archive_size,
    })
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(
    config: &BundleConfig,
    target: &TargetArgs,
    options: &PackageOptions,
) -> BundleConfig {
    let mut effective = config.clone();
    if let Some(deps_dir) = &target.deps_dir {
        effective.deps_dir.clone_from(deps_dir);
    }
    if let Some(bundle_dir) = &options.bundle_dir {
        effective.bundle_dir.clone_from(bundle_dir);
    }
    if let Some(format) = options.format {
        effective.archive_format = format;
    }
    effective
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
