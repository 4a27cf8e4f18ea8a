//! Fixed directory layouts for the dependency root and the bundle.
//!
//! The host application's offline path resolver looks dependencies up at
//! these exact relative paths, so every producer and consumer in this crate
//! goes through [`DepsLayout`] and [`BundleLayout`] rather than joining
//! strings ad hoc.

use camino::{Utf8Path, Utf8PathBuf};

/// File name of the provenance manifest in both layouts.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the explanatory document at the bundle root.
pub const README_FILE: &str = "README.md";

/// Paths inside a dependency root.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use offline_bundler::artefact::layout::DepsLayout;
///
/// let layout = DepsLayout::new(Utf8Path::new("/tmp/deps"));
/// assert_eq!(layout.ripgrep_binary(), "/tmp/deps/ripgrep/rg");
/// assert_eq!(layout.clangd_binary(), "/tmp/deps/lsp/clangd/bin/clangd");
/// assert_eq!(layout.package_dir("@vue/language-server"), "/tmp/deps/node_modules/@vue/language-server");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsLayout {
    root: Utf8PathBuf,
}

impl DepsLayout {
    /// Describe the dependency root at `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
        }
    }

    /// The dependency root itself.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding the ripgrep release contents.
    #[must_use]
    pub fn ripgrep_dir(&self) -> Utf8PathBuf {
        self.root.join("ripgrep")
    }

    /// The `rg` executable.
    #[must_use]
    pub fn ripgrep_binary(&self) -> Utf8PathBuf {
        self.ripgrep_dir().join("rg")
    }

    /// Parent directory of all language servers.
    #[must_use]
    pub fn lsp_dir(&self) -> Utf8PathBuf {
        self.root.join("lsp")
    }

    /// Stable clangd directory (after renaming the versioned one).
    #[must_use]
    pub fn clangd_dir(&self) -> Utf8PathBuf {
        self.lsp_dir().join("clangd")
    }

    /// Directory the clangd zip unpacks to for a given release tag.
    #[must_use]
    pub fn clangd_versioned_dir(&self, tag: &str) -> Utf8PathBuf {
        self.lsp_dir().join(format!("clangd_{tag}"))
    }

    /// The `clangd` executable.
    #[must_use]
    pub fn clangd_binary(&self) -> Utf8PathBuf {
        self.clangd_dir().join("bin").join("clangd")
    }

    /// rust-analyzer directory.
    #[must_use]
    pub fn rust_analyzer_dir(&self) -> Utf8PathBuf {
        self.lsp_dir().join("rust-analyzer")
    }

    /// The `rust-analyzer` executable.
    #[must_use]
    pub fn rust_analyzer_binary(&self) -> Utf8PathBuf {
        self.rust_analyzer_dir().join("bin").join("rust-analyzer")
    }

    /// The installer's `package.json`.
    #[must_use]
    pub fn package_json(&self) -> Utf8PathBuf {
        self.root.join("package.json")
    }

    /// The `node_modules` directory.
    #[must_use]
    pub fn node_modules_dir(&self) -> Utf8PathBuf {
        self.root.join("node_modules")
    }

    /// Installed directory of one package (scoped names nest).
    #[must_use]
    pub fn package_dir(&self, name: &str) -> Utf8PathBuf {
        self.node_modules_dir().join(name)
    }

    /// The acquisition manifest.
    #[must_use]
    pub fn manifest(&self) -> Utf8PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}

/// Paths inside an assembled bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
    root: Utf8PathBuf,
}

impl BundleLayout {
    /// Describe the bundle rooted at `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self {
            root: root.to_owned(),
        }
    }

    /// The bundle root itself.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding the host binary.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.root.join("bin")
    }

    /// Copy of the dependency root.
    #[must_use]
    pub fn deps_dir(&self) -> Utf8PathBuf {
        self.root.join("deps")
    }

    /// Pre-placed native library directory.
    #[must_use]
    pub fn native_dir(&self) -> Utf8PathBuf {
        self.deps_dir().join("opentui")
    }

    /// The (possibly annotated) manifest at the bundle root.
    #[must_use]
    pub fn manifest(&self) -> Utf8PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// The explanatory document.
    #[must_use]
    pub fn readme(&self) -> Utf8PathBuf {
        self.root.join(README_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_analyzer_lives_under_lsp_bin() {
        let layout = DepsLayout::new(Utf8Path::new("deps"));
        assert_eq!(
            layout.rust_analyzer_binary(),
            Utf8PathBuf::from("deps/lsp/rust-analyzer/bin/rust-analyzer")
        );
    }

    #[test]
    fn clangd_versioned_dir_embeds_tag() {
        let layout = DepsLayout::new(Utf8Path::new("deps"));
        assert_eq!(
            layout.clangd_versioned_dir("19.1.2"),
            Utf8PathBuf::from("deps/lsp/clangd_19.1.2")
        );
    }

    #[test]
    fn bundle_native_dir_is_inside_deps() {
        let layout = BundleLayout::new(Utf8Path::new("out/bundle"));
        assert!(layout.native_dir().starts_with(layout.deps_dir()));
        assert_eq!(layout.manifest(), Utf8PathBuf::from("out/bundle/manifest.json"));
    }
}
