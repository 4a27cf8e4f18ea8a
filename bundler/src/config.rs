//! Bundler configuration loaded from `offline-bundler.toml`.
//!
//! Every setting has a default matching the upstream host application, so
//! the file is optional. Values are deserialised from TOML when present and
//! unknown keys are rejected so typos surface immediately. Selected fields
//! can then be overridden from the command line.
//!
//! ```toml
//! deps_dir = "offline-deps"
//! archive_format = "tar.zst"
//!
//! [tools]
//! ripgrep_version = "14.1.1"
//!
//! [packages]
//! installer = ["npm", "install", "--no-save"]
//! specifiers = ["typescript", "pyright@1.1.390"]
//!
//! [host]
//! build_command = []
//! ```

use crate::artefact::platform::TargetPlatform;
use crate::bundle::archive::ArchiveFormat;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Configuration file looked up in the working directory when no explicit
/// path is given.
pub const DEFAULT_CONFIG_FILE: &str = "offline-bundler.toml";

/// Errors arising from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`BundleConfig`].
    #[error("invalid configuration {path}")]
    Parse {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// A setting holds a value the pipeline cannot use.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Dotted name of the offending setting.
        field: &'static str,
        /// Description of the problem.
        reason: String,
    },
}

/// Top-level bundler configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    /// Dependency root populated by `fetch` and read by `package`.
    pub deps_dir: Utf8PathBuf,
    /// Bundle directory assembled by `package`.
    pub bundle_dir: Utf8PathBuf,
    /// Archive file stem, expanded with `{platform}` and `{arch}`. The
    /// archive is written next to the bundle directory.
    pub archive_name: String,
    /// Compression used for the final archive.
    pub archive_format: ArchiveFormat,
    /// Release-hosted tools.
    pub tools: ToolsConfig,
    /// Installable packages.
    pub packages: PackagesConfig,
    /// The host application being bundled.
    pub host: HostConfig,
    /// The generated launcher script.
    pub launcher: LauncherConfig,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            deps_dir: Utf8PathBuf::from("offline-deps"),
            bundle_dir: Utf8PathBuf::from("dist/opencode-offline"),
            archive_name: "opencode-offline-{platform}-{arch}".to_owned(),
            archive_format: ArchiveFormat::default(),
            tools: ToolsConfig::default(),
            packages: PackagesConfig::default(),
            host: HostConfig::default(),
            launcher: LauncherConfig::default(),
        }
    }
}

impl BundleConfig {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in
    /// the working directory when it exists, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file cannot be read,
    /// or if any file found is malformed or fails validation.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        match path {
            Some(explicit) => Self::from_file(explicit),
            None => {
                let implicit = Utf8Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)
                } else {
                    log::debug!("no {DEFAULT_CONFIG_FILE}; using built-in defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse and validate the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or
    /// validated.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        log::debug!("loading configuration from {path}");
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(path, &source)
    }

    /// Parse and validate TOML `source`; `path` is used for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::Invalid`].
    pub fn from_toml(path: &Utf8Path, source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot act on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packages.installer.is_empty() {
            return Err(ConfigError::Invalid {
                field: "packages.installer",
                reason: "the installer command must name a program".to_owned(),
            });
        }
        if self.host.binary.is_empty() || self.host.binary.contains(['/', '"', '$', '`', '\\']) {
            return Err(ConfigError::Invalid {
                field: "host.binary",
                reason: format!("{:?} is not a bare file name", self.host.binary),
            });
        }
        if self.launcher.file_name.is_empty() || self.launcher.file_name.contains('/') {
            return Err(ConfigError::Invalid {
                field: "launcher.file_name",
                reason: format!("{:?} is not a bare file name", self.launcher.file_name),
            });
        }
        if self.archive_name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "archive_name",
                reason: "the archive name must not be empty".to_owned(),
            });
        }
        let env = &self.launcher.env;
        for (field, name) in [
            ("launcher.env.offline_mode", &env.offline_mode),
            ("launcher.env.deps_path", &env.deps_path),
            ("launcher.env.disable_autoupdate", &env.disable_autoupdate),
            ("launcher.env.disable_lsp_download", &env.disable_lsp_download),
            ("launcher.env.disable_models_fetch", &env.disable_models_fetch),
        ] {
            if !is_shell_identifier(name) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{name:?} is not a valid environment variable name"),
                });
            }
        }
        Ok(())
    }

    /// Path of the final archive for `platform`.
    #[must_use]
    pub fn archive_path(&self, platform: TargetPlatform) -> Utf8PathBuf {
        let stem = expand_template(&self.archive_name, platform);
        let file_name = format!("{stem}.{}", self.archive_format.extension());
        match self.bundle_dir.parent() {
            Some(parent) => parent.join(file_name),
            None => Utf8PathBuf::from(file_name),
        }
    }
}

/// Release-hosted tool settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Pinned ripgrep release.
    pub ripgrep_version: String,
    /// ripgrep's `owner/name` repository.
    pub ripgrep_repo: String,
    /// clangd's `owner/name` repository.
    pub clangd_repo: String,
    /// rust-analyzer's `owner/name` repository.
    pub rust_analyzer_repo: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ripgrep_version: "14.1.1".to_owned(),
            ripgrep_repo: "BurntSushi/ripgrep".to_owned(),
            clangd_repo: "clangd/clangd".to_owned(),
            rust_analyzer_repo: "rust-lang/rust-analyzer".to_owned(),
        }
    }
}

/// Installable package settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagesConfig {
    /// Installer program followed by its leading arguments; package
    /// specifiers are appended.
    pub installer: Vec<String>,
    /// Pinned `name` or `name@version` specifiers.
    pub specifiers: Vec<String>,
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            installer: vec!["bun".to_owned(), "add".to_owned()],
            specifiers: [
                "typescript",
                "typescript-language-server@4.3.3",
                "pyright",
                "yaml-language-server",
                "bash-language-server",
                "vscode-langservers-extracted",
                "@vue/language-server",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

/// Host application settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Display name used in the bundle README.
    pub name: String,
    /// File name of the host executable.
    pub binary: String,
    /// Root of the host application's source checkout.
    pub repo_dir: Utf8PathBuf,
    /// Build output directory relative to `repo_dir`, expanded with
    /// `{platform}` and `{arch}`. The binary is read from its `bin/`.
    pub dist_dir: String,
    /// Build command run in `repo_dir` before assembly; empty skips it.
    pub build_command: Vec<String>,
    /// Native library relative to `repo_dir`, expanded with `{platform}`,
    /// `{arch}` and `{ext}`.
    pub native_library: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: "opencode".to_owned(),
            binary: "opencode".to_owned(),
            repo_dir: Utf8PathBuf::from("."),
            dist_dir: "packages/opencode/dist/opencode-{platform}-{arch}".to_owned(),
            build_command: vec![
                "bun".to_owned(),
                "run".to_owned(),
                "--cwd".to_owned(),
                "packages/opencode".to_owned(),
                "build".to_owned(),
            ],
            native_library:
                "packages/opencode/node_modules/@opentui/core-{platform}-{arch}/libopentui{ext}"
                    .to_owned(),
        }
    }
}

impl HostConfig {
    /// Resolved build output directory for `platform`.
    #[must_use]
    pub fn dist_path(&self, platform: TargetPlatform) -> Utf8PathBuf {
        self.repo_dir.join(expand_template(&self.dist_dir, platform))
    }

    /// Resolved native library source for `platform`.
    #[must_use]
    pub fn native_library_path(&self, platform: TargetPlatform) -> Utf8PathBuf {
        self.repo_dir
            .join(expand_template(&self.native_library, platform))
    }
}

/// Launcher script settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// File name of the launcher at the bundle root.
    pub file_name: String,
    /// Names of the environment variables the launcher exports.
    pub env: LauncherEnv,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            file_name: "opencode-offline".to_owned(),
            env: LauncherEnv::default(),
        }
    }
}

/// Environment variable names read by the host application.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherEnv {
    /// Boolean enabling offline mode.
    pub offline_mode: String,
    /// Path to the bundled dependency root.
    pub deps_path: String,
    /// Boolean disabling self-update.
    pub disable_autoupdate: String,
    /// Boolean disabling on-demand language server downloads.
    pub disable_lsp_download: String,
    /// Boolean disabling the remote model list fetch.
    pub disable_models_fetch: String,
}

impl Default for LauncherEnv {
    fn default() -> Self {
        Self {
            offline_mode: "OPENCODE_OFFLINE_MODE".to_owned(),
            deps_path: "OPENCODE_DEPS_PATH".to_owned(),
            disable_autoupdate: "OPENCODE_DISABLE_AUTOUPDATE".to_owned(),
            disable_lsp_download: "OPENCODE_DISABLE_LSP_DOWNLOAD".to_owned(),
            disable_models_fetch: "OPENCODE_DISABLE_MODELS_FETCH".to_owned(),
        }
    }
}

/// Whether `name` matches `[A-Za-z_][A-Za-z0-9_]*`, the names a POSIX
/// shell accepts in `export`.
fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Substitute `{platform}`, `{arch}` and `{ext}` in `template`.
///
/// # Examples
///
/// ```
/// use offline_bundler::artefact::platform::TargetPlatform;
/// use offline_bundler::config::expand_template;
///
/// let target = TargetPlatform::parse("darwin", "arm64")?;
/// assert_eq!(
///     expand_template("core-{platform}-{arch}/libopentui{ext}", target),
///     "core-darwin-arm64/libopentui.dylib"
/// );
/// # Ok::<(), offline_bundler::artefact::error::ArtefactError>(())
/// ```
#[must_use]
pub fn expand_template(template: &str, platform: TargetPlatform) -> String {
    template
        .replace("{platform}", platform.node_platform())
        .replace("{arch}", platform.node_arch())
        .replace("{ext}", platform.library_extension())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
