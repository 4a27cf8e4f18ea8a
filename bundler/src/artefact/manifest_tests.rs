//! Unit tests for the provenance manifest.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn components() -> Components {
    Components {
        ripgrep: "14.1.1".to_owned(),
        clangd: "19.1.2".to_owned(),
        rust_analyzer: "2026-10-13".to_owned(),
        npm_packages: BTreeMap::from([
            ("typescript".to_owned(), "5.7.2".to_owned()),
            ("pyright".to_owned(), "1.1.390".to_owned()),
        ]),
    }
}

#[fixture]
fn manifest(components: Components) -> Manifest {
    let platform = TargetPlatform::parse("linux", "x64").expect("supported");
    Manifest::generate(
        platform,
        components,
        CreatedAt::new("2026-10-17T12:00:00Z"),
    )
}

fn utf8_temp() -> (TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
    (temp, path)
}

#[rstest]
fn serializes_documented_field_names(manifest: Manifest) {
    let value = serde_json::to_value(&manifest).expect("serialize");
    let obj = value.as_object().expect("object");
    for key in ["version", "created", "platform", "arch", "components"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
    assert!(!obj.contains_key("bundleVersion"));
    assert!(!obj.contains_key("commitSha"));

    let components = &value["components"];
    assert_eq!(components["ripgrep"], "14.1.1");
    assert_eq!(components["rustAnalyzer"], "2026-10-13");
    assert_eq!(components["npmPackages"]["pyright"], "1.1.390");
}

#[rstest]
fn npm_packages_serialize_in_name_order(manifest: Manifest) {
    let json = serde_json::to_string(&manifest).expect("serialize");
    let pyright = json.find("pyright").expect("pyright present");
    let typescript = json.find("typescript").expect("typescript present");
    assert!(pyright < typescript);
}

#[rstest]
fn round_trip_preserves_every_field(manifest: Manifest) {
    let (_temp, dir) = utf8_temp();
    let path = dir.join("manifest.json");
    write_manifest(&path, &manifest).expect("write");

    let read = read_manifest(&path).expect("read");
    assert_eq!(read, manifest);
}

#[rstest]
fn release_annotation_adds_fields_only(manifest: Manifest) {
    let sha = CommitSha::try_from("abc1234").expect("valid");
    let annotated = manifest
        .clone()
        .with_release(Some("1.2.3".to_owned()), Some(sha));

    let before = serde_json::to_value(&manifest).expect("serialize");
    let mut after = serde_json::to_value(&annotated).expect("serialize");
    let after_obj = after.as_object_mut().expect("object");
    assert_eq!(after_obj.remove("bundleVersion"), Some("1.2.3".into()));
    assert_eq!(after_obj.remove("commitSha"), Some("abc1234".into()));
    assert_eq!(before, after);
}

#[rstest]
fn release_annotation_with_nothing_is_identity(manifest: Manifest) {
    let annotated = manifest.clone().with_release(None, None);
    assert_eq!(annotated, manifest);
}

#[test]
fn read_rejects_future_major_version() {
    let (_temp, dir) = utf8_temp();
    let path = dir.join("manifest.json");
    let json = r#"{"version":"2.0.0","created":"2026-10-17T12:00:00Z","platform":"linux","arch":"x64","components":{"ripgrep":"14.1.1","clangd":"19","rustAnalyzer":"x","npmPackages":{}}}"#;
    std::fs::write(&path, json).expect("write");

    let err = read_manifest(&path).expect_err("unsupported version");
    assert!(matches!(err, ManifestError::Json { .. }));
}

#[test]
fn read_reports_missing_file() {
    let (_temp, dir) = utf8_temp();
    let err = read_manifest(&dir.join("absent.json")).expect_err("missing");
    assert!(matches!(err, ManifestError::Io { .. }));
}

#[rstest]
fn verify_layout_accepts_materialized_tree(manifest: Manifest) {
    let (_temp, root) = utf8_temp();
    let layout = DepsLayout::new(&root);
    for dir in [
        layout.ripgrep_dir(),
        layout.clangd_dir(),
        layout.rust_analyzer_dir(),
        layout.package_dir("pyright"),
        layout.package_dir("typescript"),
    ] {
        std::fs::create_dir_all(&dir).expect("mkdir");
    }

    manifest.verify_layout(&root).expect("complete layout");
}

#[rstest]
fn verify_layout_names_missing_package(manifest: Manifest) {
    let (_temp, root) = utf8_temp();
    let layout = DepsLayout::new(&root);
    for dir in [
        layout.ripgrep_dir(),
        layout.clangd_dir(),
        layout.rust_analyzer_dir(),
        layout.package_dir("pyright"),
    ] {
        std::fs::create_dir_all(&dir).expect("mkdir");
    }

    let err = manifest.verify_layout(&root).expect_err("typescript missing");
    assert!(
        matches!(err, ManifestError::MissingComponent { ref component, .. } if component == "typescript"),
        "unexpected error: {err}"
    );
}
