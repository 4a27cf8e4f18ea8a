//! npm package installation into the dependency root.
//!
//! The installer is an opaque external command (`bun add` by default) run
//! with the pinned specifiers inside the dependency root. Installed versions
//! are read back from each package's own `package.json`, so the manifest
//! records what was resolved rather than what was requested.

use super::{AcquireError, Result};
use crate::artefact::layout::DepsLayout;
use crate::config::PackagesConfig;
use crate::exec::{CommandExecutor, failure_message};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
struct PackageMetadata {
    version: String,
}

/// Install every configured package and return name to installed version.
///
/// # Errors
///
/// Returns [`AcquireError::Spawn`] if the installer cannot start,
/// [`AcquireError::PackageInstall`] if it exits unsuccessfully, and
/// [`AcquireError::PackageMetadata`] if an installed package has no
/// readable version.
pub fn install_packages(
    executor: &dyn CommandExecutor,
    layout: &DepsLayout,
    config: &PackagesConfig,
) -> Result<BTreeMap<String, String>> {
    write_package_json(layout)?;

    let Some((program, leading)) = config.installer.split_first() else {
        return Err(AcquireError::PackageInstall {
            command: String::new(),
            message: "no installer command configured".to_owned(),
        });
    };
    let args: Vec<&str> = leading
        .iter()
        .chain(&config.specifiers)
        .map(String::as_str)
        .collect();
    let command = format!("{program} {}", args.join(" "));
    log::info!("installing {} packages with {program}", config.specifiers.len());

    let output = executor
        .run(program, &args, layout.root().as_std_path())
        .map_err(|source| AcquireError::Spawn {
            command: command.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(AcquireError::PackageInstall {
            command,
            message: failure_message(&output),
        });
    }

    config
        .specifiers
        .iter()
        .map(|specifier| {
            let name = package_name(specifier);
            installed_version(layout, name).map(|version| (name.to_owned(), version))
        })
        .collect()
}

/// Write a `package.json` declaring an empty dependency set.
fn write_package_json(layout: &DepsLayout) -> Result<()> {
    let path = layout.package_json();
    let body = serde_json::json!({ "dependencies": {} });
    let mut contents = body.to_string();
    contents.push('\n');
    std::fs::write(&path, contents).map_err(|source| AcquireError::Io { path, source })
}

/// Strip any version suffix from a specifier.
///
/// # Examples
///
/// ```
/// use offline_bundler::acquire::packages::package_name;
///
/// assert_eq!(package_name("pyright"), "pyright");
/// assert_eq!(package_name("typescript-language-server@4.3.3"), "typescript-language-server");
/// assert_eq!(package_name("@vue/language-server@2.1.0"), "@vue/language-server");
/// assert_eq!(package_name("@vue/language-server"), "@vue/language-server");
/// ```
#[must_use]
pub fn package_name(specifier: &str) -> &str {
    // A leading `@` introduces a scope, not a version.
    let name_start = usize::from(specifier.starts_with('@'));
    specifier
        .get(name_start..)
        .and_then(|rest| rest.find('@'))
        .and_then(|at| specifier.get(..name_start + at))
        .unwrap_or(specifier)
}

/// Read the installed version of `name` from `node_modules`.
///
/// # Errors
///
/// Returns [`AcquireError::PackageMetadata`] if the package's
/// `package.json` is missing, malformed, or lacks a version.
pub fn installed_version(layout: &DepsLayout, name: &str) -> Result<String> {
    let path = layout.package_dir(name).join("package.json");
    let metadata_error = |reason: String| AcquireError::PackageMetadata {
        package: name.to_owned(),
        reason,
    };
    let contents =
        std::fs::read_to_string(&path).map_err(|e| metadata_error(format!("{path}: {e}")))?;
    let metadata: PackageMetadata =
        serde_json::from_str(&contents).map_err(|e| metadata_error(format!("{path}: {e}")))?;
    Ok(metadata.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use std::path::Path;
    use tempfile::TempDir;

    #[fixture]
    fn deps() -> (TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, root)
    }

    fn install_package(root: &Path, name: &str, version: &str) {
        let dir = root.join("node_modules").join(name);
        std::fs::create_dir_all(&dir).expect("mkdir package");
        std::fs::write(
            dir.join("package.json"),
            format!(r#"{{"name":"{name}","version":"{version}"}}"#),
        )
        .expect("write package.json");
    }

    fn config(specifiers: &[&str]) -> PackagesConfig {
        PackagesConfig {
            installer: vec!["bun".to_owned(), "add".to_owned()],
            specifiers: specifiers.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[rstest]
    #[case::bare("pyright", "pyright")]
    #[case::versioned("typescript-language-server@4.3.3", "typescript-language-server")]
    #[case::scoped("@vue/language-server", "@vue/language-server")]
    #[case::scoped_versioned("@vue/language-server@2.1.0", "@vue/language-server")]
    #[case::range("yaml-language-server@^1.15", "yaml-language-server")]
    fn package_name_strips_version(#[case] specifier: &str, #[case] expected: &str) {
        assert_eq!(package_name(specifier), expected);
    }

    #[rstest]
    fn records_installed_versions(deps: (TempDir, Utf8PathBuf)) {
        let (_temp, root) = deps;
        let layout = DepsLayout::new(&root);
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(
                "bun",
                vec!["add", "pyright", "@vue/language-server@2.1.0"],
                Ok(success_output()),
            )
            .with_effect(|cwd| {
                install_package(cwd, "pyright", "1.1.390");
                install_package(cwd, "@vue/language-server", "2.1.0");
            }),
        ]);

        let versions = install_packages(
            &executor,
            &layout,
            &config(&["pyright", "@vue/language-server@2.1.0"]),
        )
        .expect("install");

        executor.assert_finished();
        assert_eq!(
            versions,
            BTreeMap::from([
                ("@vue/language-server".to_owned(), "2.1.0".to_owned()),
                ("pyright".to_owned(), "1.1.390".to_owned()),
            ])
        );
        let manifest = std::fs::read_to_string(layout.package_json()).expect("package.json");
        assert_eq!(manifest.trim(), r#"{"dependencies":{}}"#);
    }

    #[rstest]
    fn installer_failure_carries_stderr(deps: (TempDir, Utf8PathBuf)) {
        let (_temp, root) = deps;
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "bun",
            vec!["add", "pyright"],
            Ok(failure_output("error: pyright@99 not found")),
        )]);

        let err = install_packages(&executor, &DepsLayout::new(&root), &config(&["pyright"]))
            .expect_err("install fails");
        assert!(
            matches!(err, AcquireError::PackageInstall { ref message, .. }
                if message == "error: pyright@99 not found"),
            "unexpected error: {err}"
        );
    }

    #[rstest]
    fn missing_installer_is_a_spawn_error(deps: (TempDir, Utf8PathBuf)) {
        let (_temp, root) = deps;
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "bun",
            vec!["add", "pyright"],
            Err(std::io::Error::from(std::io::ErrorKind::NotFound)),
        )]);

        let err = install_packages(&executor, &DepsLayout::new(&root), &config(&["pyright"]))
            .expect_err("spawn fails");
        assert!(matches!(err, AcquireError::Spawn { .. }));
    }

    #[rstest]
    fn package_absent_after_install_is_reported(deps: (TempDir, Utf8PathBuf)) {
        let (_temp, root) = deps;
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "bun",
            vec!["add", "pyright"],
            Ok(success_output()),
        )]);

        let err = install_packages(&executor, &DepsLayout::new(&root), &config(&["pyright"]))
            .expect_err("no metadata");
        assert!(
            matches!(err, AcquireError::PackageMetadata { ref package, .. } if package == "pyright")
        );
    }

    #[rstest]
    fn empty_installer_is_rejected(deps: (TempDir, Utf8PathBuf)) {
        let (_temp, root) = deps;
        let executor = StubExecutor::new(Vec::new());
        let config = PackagesConfig {
            installer: Vec::new(),
            specifiers: vec!["pyright".to_owned()],
        };

        let err = install_packages(&executor, &DepsLayout::new(&root), &config)
            .expect_err("no installer");
        assert!(matches!(err, AcquireError::PackageInstall { .. }));
    }
}
