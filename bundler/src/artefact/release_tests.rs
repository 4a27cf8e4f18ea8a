//! Unit tests for release resolution and asset selection.

use super::*;
use rstest::{fixture, rstest};

#[fixture]
fn clangd_assets() -> Vec<Asset> {
    vec![
        Asset::new("clangd-mac-19.1.2.zip", "https://example.test/mac.zip"),
        Asset::new("clangd-linux-19.1.2.zip", "https://example.test/linux.zip"),
        Asset::new(
            "clangd_indexing_tools-linux-19.1.2.zip",
            "https://example.test/tools.zip",
        ),
        Asset::new("clangd-linux-19.1.2.tar.xz", "https://example.test/linux.tar.xz"),
    ]
}

fn contains(marker: &str, tag: &str, extension: &str) -> AssetPredicate {
    AssetPredicate::Contains {
        marker: marker.to_owned(),
        tag: tag.to_owned(),
        extension: extension.to_owned(),
    }
}

#[rstest]
fn first_match_in_listed_order_wins(clangd_assets: Vec<Asset>) {
    let asset = select_asset(&clangd_assets, &contains("linux", "19.1.2", ".zip")).expect("match");
    assert_eq!(asset.name, "clangd-linux-19.1.2.zip");
    assert_eq!(asset.url, "https://example.test/linux.zip");
}

#[rstest]
fn exact_predicate_ignores_near_misses() {
    let assets = vec![
        Asset::new("rust-analyzer-x86_64-unknown-linux-gnu.gz.sha256", "u1"),
        Asset::new("rust-analyzer-x86_64-unknown-linux-gnu.gz", "u2"),
    ];
    let predicate = AssetPredicate::Exact("rust-analyzer-x86_64-unknown-linux-gnu.gz".to_owned());
    assert_eq!(select_asset(&assets, &predicate).expect("match").url, "u2");
}

#[rstest]
#[case::wrong_marker(contains("windows", "19.1.2", ".zip"))]
#[case::wrong_tag(contains("linux", "18.0.0", ".zip"))]
#[case::wrong_extension(contains("linux", "19.1.2", ".tar.gz"))]
#[case::exact_absent(AssetPredicate::Exact("clangd.zip".to_owned()))]
fn no_match_names_the_predicate(clangd_assets: Vec<Asset>, #[case] predicate: AssetPredicate) {
    let err = select_asset(&clangd_assets, &predicate).expect_err("no match");
    let ReleaseError::AssetNotFound { predicate: rendered } = &err else {
        panic!("expected AssetNotFound, got {err:?}");
    };
    assert_eq!(rendered, &predicate.to_string());
}

#[test]
fn select_from_empty_list_fails() {
    let err = select_asset(&[], &AssetPredicate::Exact("x".to_owned())).expect_err("empty");
    assert!(matches!(err, ReleaseError::AssetNotFound { .. }));
}

#[test]
fn parse_release_reads_github_shape() {
    let body = r#"{
        "tag_name": "2026-10-13",
        "name": "2026-10-13",
        "assets": [
            {"name": "rust-analyzer-aarch64-apple-darwin.gz", "size": 1, "browser_download_url": "https://example.test/ra.gz"}
        ]
    }"#;
    let release = parse_release("rust-lang/rust-analyzer", body).expect("parse");
    assert_eq!(release.tag, "2026-10-13");
    assert_eq!(
        release.assets,
        vec![Asset::new(
            "rust-analyzer-aarch64-apple-darwin.gz",
            "https://example.test/ra.gz"
        )]
    );
}

#[test]
fn parse_release_rejects_non_release_body() {
    let err = parse_release("clangd/clangd", r#"{"message":"Not Found"}"#).expect_err("no tag");
    assert!(
        matches!(err, ReleaseError::Fetch { ref repo, .. } if repo == "clangd/clangd"),
        "unexpected error: {err}"
    );
}

#[test]
fn resolve_tag_returns_only_the_tag() {
    let mut source = MockReleaseSource::new();
    source
        .expect_latest_release()
        .withf(|repo| repo == "clangd/clangd")
        .times(1)
        .returning(|_| {
            Ok(Release {
                tag: "19.1.2".to_owned(),
                assets: Vec::new(),
            })
        });

    assert_eq!(resolve_tag(&source, "clangd/clangd").expect("tag"), "19.1.2");
}

#[test]
fn pinned_source_reports_unknown_repo() {
    let err = PinnedReleases::default()
        .latest_release("clangd/clangd")
        .expect_err("unknown");
    assert!(matches!(err, ReleaseError::Fetch { .. }));
}

#[rstest]
#[case::github_token_preferred(Some("gh-1"), Some("gh-2"), Some("gh-1"))]
#[case::gh_token_fallback(None, Some("gh-2"), Some("gh-2"))]
#[case::empty_token_skipped(Some(""), Some("gh-2"), Some("gh-2"))]
#[case::no_token(None, None, None)]
fn auth_token_prefers_github_token(
    #[case] github_token: Option<&str>,
    #[case] gh_token: Option<&str>,
    #[case] expected: Option<&str>,
) {
    let token = temp_env::with_vars(
        [("GITHUB_TOKEN", github_token), ("GH_TOKEN", gh_token)],
        auth_token,
    );
    assert_eq!(token.as_deref(), expected);
}
