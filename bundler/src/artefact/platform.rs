//! Target platform identification for dependency selection.
//!
//! Every upstream project names its release assets differently: ripgrep and
//! rust-analyzer use Rust target triples (with ripgrep preferring a static
//! musl build on x86-64 Linux), clangd uses a bare OS marker, and the host
//! application's native packages use Node-style `<platform>-<arch>` pairs.
//! [`TargetPlatform`] maps one validated pair onto each of those spellings.

use super::error::{ArtefactError, Result};
use std::fmt;

/// Operating systems a bundle can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux (glibc or musl userland).
    Linux,
    /// macOS.
    Darwin,
}

/// CPU architectures a bundle can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    X64,
    /// 64-bit ARM.
    Arm64,
}

/// Supported `<platform>-<arch>` pairs in Node-style spelling.
const SUPPORTED: &[&str] = &["linux-x64", "linux-arm64", "darwin-x64", "darwin-arm64"];

/// A validated bundle target.
///
/// # Examples
///
/// ```
/// use offline_bundler::artefact::platform::TargetPlatform;
///
/// let target = TargetPlatform::parse("linux", "x64").expect("supported");
/// assert_eq!(target.ripgrep_triple(), "x86_64-unknown-linux-musl");
/// assert_eq!(target.rust_analyzer_triple(), "x86_64-unknown-linux-gnu");
/// assert_eq!(target.clangd_marker(), "linux");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetPlatform {
    os: Os,
    arch: Arch,
}

impl TargetPlatform {
    /// Build a target from its components.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Parse Node-style or Rust-style platform and architecture names.
    ///
    /// Accepts `linux`/`darwin`/`macos` and `x64`/`x86_64`/`amd64`/
    /// `arm64`/`aarch64`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] for any other value.
    pub fn parse(platform: &str, arch: &str) -> Result<Self> {
        let os = match platform {
            "linux" => Some(Os::Linux),
            "darwin" | "macos" => Some(Os::Darwin),
            _ => None,
        };
        let cpu = match arch {
            "x64" | "x86_64" | "amd64" => Some(Arch::X64),
            "arm64" | "aarch64" => Some(Arch::Arm64),
            _ => None,
        };
        match (os, cpu) {
            (Some(os), Some(cpu)) => Ok(Self::new(os, cpu)),
            _ => Err(ArtefactError::UnsupportedPlatform {
                platform: platform.to_owned(),
                arch: arch.to_owned(),
                expected: SUPPORTED.join(", "),
            }),
        }
    }

    /// Detect the platform this process runs on.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] on hosts that cannot
    /// be bundled for (for example Windows).
    pub fn detect() -> Result<Self> {
        Self::parse(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve optional overrides against the detected host.
    ///
    /// # Errors
    ///
    /// Returns [`ArtefactError::UnsupportedPlatform`] if the resulting pair
    /// is not supported.
    pub fn resolve(platform: Option<&str>, arch: Option<&str>) -> Result<Self> {
        let host = Self::detect();
        match (platform, arch, host) {
            (None, None, host) => host,
            (Some(p), Some(a), _) => Self::parse(p, a),
            (Some(p), None, Ok(host)) => Self::parse(p, host.node_arch()),
            (None, Some(a), Ok(host)) => Self::parse(host.node_platform(), a),
            (Some(p), None, Err(_)) => Self::parse(p, std::env::consts::ARCH),
            (None, Some(a), Err(_)) => Self::parse(std::env::consts::OS, a),
        }
    }

    /// Node-style operating system name recorded in the manifest.
    #[must_use]
    pub const fn node_platform(self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
        }
    }

    /// Node-style architecture name recorded in the manifest.
    #[must_use]
    pub const fn node_arch(self) -> &'static str {
        match self.arch {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
        }
    }

    /// Target triple used in ripgrep release asset names.
    #[must_use]
    pub const fn ripgrep_triple(self) -> &'static str {
        match (self.os, self.arch) {
            (Os::Linux, Arch::X64) => "x86_64-unknown-linux-musl",
            (Os::Linux, Arch::Arm64) => "aarch64-unknown-linux-gnu",
            (Os::Darwin, Arch::X64) => "x86_64-apple-darwin",
            (Os::Darwin, Arch::Arm64) => "aarch64-apple-darwin",
        }
    }

    /// Target triple used in rust-analyzer release asset names.
    #[must_use]
    pub const fn rust_analyzer_triple(self) -> &'static str {
        match (self.os, self.arch) {
            (Os::Linux, Arch::X64) => "x86_64-unknown-linux-gnu",
            (Os::Linux, Arch::Arm64) => "aarch64-unknown-linux-gnu",
            (Os::Darwin, Arch::X64) => "x86_64-apple-darwin",
            (Os::Darwin, Arch::Arm64) => "aarch64-apple-darwin",
        }
    }

    /// OS marker embedded in clangd release asset names.
    ///
    /// clangd publishes a single universal macOS build.
    #[must_use]
    pub const fn clangd_marker(self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Darwin => "mac",
        }
    }

    /// Shared library extension, including the leading dot.
    #[must_use]
    pub const fn library_extension(self) -> &'static str {
        match self.os {
            Os::Linux => ".so",
            Os::Darwin => ".dylib",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.node_platform(), self.node_arch())
    }
}
