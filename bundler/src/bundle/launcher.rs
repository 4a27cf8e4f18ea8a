//! Launcher script and README generation for assembled bundles.
//!
//! The launcher is a POSIX `sh` script placed at the bundle root. It locates
//! its own directory, exports the variables that switch the host into
//! offline mode (each overridable from the caller's environment) and execs
//! the bundled host binary with all arguments forwarded.

use crate::artefact::layout::BundleLayout;
use crate::artefact::manifest::Manifest;
use crate::config::LauncherConfig;
use camino::Utf8PathBuf;

/// Render the launcher script for `host_binary`.
///
/// # Examples
///
/// ```
/// use offline_bundler::bundle::launcher::render_launcher;
/// use offline_bundler::config::LauncherConfig;
///
/// let script = render_launcher(&LauncherConfig::default(), "opencode");
/// assert!(script.starts_with("#!/bin/sh"));
/// assert!(script.contains(r#"export OPENCODE_OFFLINE_MODE="${OPENCODE_OFFLINE_MODE:-true}""#));
/// assert!(script.contains(r#"exec "$BUNDLE_DIR/bin/opencode" "$@""#));
/// ```
#[must_use]
pub fn render_launcher(config: &LauncherConfig, host_binary: &str) -> String {
    let env = &config.env;
    let exports = [
        (env.offline_mode.as_str(), "true"),
        (env.deps_path.as_str(), "$BUNDLE_DIR/deps"),
        (env.disable_autoupdate.as_str(), "true"),
        (env.disable_lsp_download.as_str(), "true"),
        (env.disable_models_fetch.as_str(), "true"),
    ];

    let mut script = String::from(concat!(
        "#!/bin/sh\n",
        "# Offline launcher generated by offline-bundler.\n",
        "set -eu\n",
        "BUNDLE_DIR=$(CDPATH= cd -- \"$(dirname -- \"$0\")\" && pwd)\n",
        "\n",
    ));
    for (name, default) in exports {
        script.push_str(&format!("export {name}=\"${{{name}:-{default}}}\"\n"));
    }
    script.push_str(&format!(
        "\nexec \"$BUNDLE_DIR/bin/{host_binary}\" \"$@\"\n"
    ));
    script
}

/// Write the launcher into `layout` with mode `0755` and return its path.
///
/// # Errors
///
/// Returns any I/O error from writing the file or setting its mode.
pub fn write_launcher(
    layout: &BundleLayout,
    config: &LauncherConfig,
    host_binary: &str,
) -> std::io::Result<Utf8PathBuf> {
    let path = layout.root().join(&config.file_name);
    std::fs::write(&path, render_launcher(config, host_binary))?;
    crate::artefact::extraction::make_executable(path.as_std_path())?;
    Ok(path)
}

/// Render the explanatory README placed at the bundle root.
#[must_use]
pub fn render_readme(manifest: &Manifest, config: &LauncherConfig, host_name: &str) -> String {
    let components = manifest.components();
    let env = &config.env;
    let launcher = &config.file_name;

    let mut doc = format!(
        concat!(
            "# {host} offline bundle\n",
            "\n",
            "Self-contained {host} build for `{platform}-{arch}` that runs without\n",
            "network access. Every tool {host} would normally download on demand is\n",
            "included under `deps/`.\n",
            "\n",
            "## Usage\n",
            "\n",
            "Extract the archive anywhere and run:\n",
            "\n",
            "```sh\n",
            "./{launcher} [arguments...]\n",
            "```\n",
            "\n",
            "The launcher exports the variables below and then runs `bin/{host}` with\n",
            "the given arguments. Any variable already set in the environment wins.\n",
            "\n",
            "| Variable | Default |\n",
            "|----------|---------|\n",
            "| `{offline}` | `true` |\n",
            "| `{deps}` | `<bundle>/deps` |\n",
            "| `{autoupdate}` | `true` |\n",
            "| `{lsp}` | `true` |\n",
            "| `{models}` | `true` |\n",
            "\n",
            "## Contents\n",
            "\n",
            "| Component | Version |\n",
            "|-----------|---------|\n",
            "| ripgrep | {ripgrep} |\n",
            "| clangd | {clangd} |\n",
            "| rust-analyzer | {rust_analyzer} |\n",
        ),
        host = host_name,
        platform = manifest.platform(),
        arch = manifest.arch(),
        launcher = launcher,
        offline = env.offline_mode,
        deps = env.deps_path,
        autoupdate = env.disable_autoupdate,
        lsp = env.disable_lsp_download,
        models = env.disable_models_fetch,
        ripgrep = components.ripgrep,
        clangd = components.clangd,
        rust_analyzer = components.rust_analyzer,
    );
    for (name, version) in &components.npm_packages {
        doc.push_str(&format!("| {name} | {version} |\n"));
    }

    doc.push_str(&format!("\nBuilt {}", manifest.created().as_str()));
    if let Some(version) = manifest.bundle_version() {
        doc.push_str(&format!(" as version {version}"));
    }
    if let Some(sha) = manifest.commit_sha() {
        doc.push_str(&format!(" from commit {sha}"));
    }
    doc.push_str(". Full provenance is recorded in `manifest.json`.\n");
    doc
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
