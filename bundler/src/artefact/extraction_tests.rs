//! Unit tests for archive extraction.

use super::*;
use flate2::Compression;
use flate2::write::GzEncoder;
use rstest::{fixture, rstest};
use std::io::Write;
use tempfile::TempDir;

#[fixture]
fn temp() -> TempDir {
    tempfile::tempdir().expect("temp dir")
}

/// Build a `.tar.gz` holding `(path, contents, mode)` entries.
fn write_tar_gz(path: &Path, entries: &[(&str, &[u8], u32)]) {
    let file = File::create(path).expect("create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *contents)
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

/// Build a `.tar.gz` whose single entry has a raw, unchecked name.
fn write_tar_gz_raw_name(path: &Path, name: &str) {
    let file = File::create(path).expect("create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let mut header = tar::Header::new_old();
    header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
    header.set_size(1);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append(&header, &b"x"[..]).expect("append entry");
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create archive");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (name, contents) in entries {
        zip.start_file(*name, options).expect("start entry");
        zip.write_all(contents).expect("write entry");
    }
    zip.finish().expect("finish zip");
}

#[cfg(unix)]
fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).expect("metadata").permissions().mode() & 0o777
}

#[rstest]
fn strip_one_lifts_wrapped_file_to_destination_root(temp: TempDir) {
    let archive = temp.path().join("rg.tar.gz");
    write_tar_gz(
        &archive,
        &[("ripgrep-14.1.1-x86_64-unknown-linux-musl/rg", b"binary", 0o644)],
    );
    let dest = temp.path().join("out");

    let files = ArchiveExtractor
        .extract_tar_gz(&archive, &dest, 1)
        .expect("extract");
    assert_eq!(files, vec![PathBuf::from("rg")]);

    let binary = dest.join("rg");
    assert_eq!(fs::read(&binary).expect("read"), b"binary");

    make_executable(&binary).expect("chmod");
    #[cfg(unix)]
    assert_eq!(mode_of(&binary), 0o755);
}

#[rstest]
fn strip_zero_keeps_leading_directory(temp: TempDir) {
    let archive = temp.path().join("pkg.tar.gz");
    write_tar_gz(&archive, &[("top/doc/README", b"hello", 0o644)]);
    let dest = temp.path().join("out");

    ArchiveExtractor
        .extract_tar_gz(&archive, &dest, 0)
        .expect("extract");
    assert!(dest.join("top/doc/README").is_file());
}

#[rstest]
fn strip_removing_every_component_reports_empty_archive(temp: TempDir) {
    let archive = temp.path().join("shallow.tar.gz");
    write_tar_gz(&archive, &[("only-file", b"x", 0o644)]);

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("out"), 1)
        .expect_err("nothing left after stripping");
    assert!(matches!(err, ExtractionError::EmptyArchive { .. }));
}

#[rstest]
fn tar_entries_escaping_destination_are_rejected(temp: TempDir) {
    let archive = temp.path().join("evil.tar.gz");
    write_tar_gz_raw_name(&archive, "wrapper/../../escape");

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("out"), 1)
        .expect_err("traversal rejected");
    assert!(
        matches!(err, ExtractionError::PathTraversal { .. }),
        "unexpected error: {err}"
    );
    assert!(!temp.path().join("escape").exists());
}

/// One entry of a tarball built by [`write_tar_gz_with_links`].
enum TarEntry<'a> {
    File(&'a str, &'a [u8]),
    Symlink(&'a str, &'a str),
    HardLink(&'a str, &'a str),
}

fn write_tar_gz_with_links(path: &Path, entries: &[TarEntry<'_>]) {
    let file = File::create(path).expect("create archive");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        match entry {
            TarEntry::File(name, contents) => {
                header.set_size(contents.len() as u64);
                header.set_cksum();
                builder
                    .append_data(&mut header, name, *contents)
                    .expect("append file");
            }
            TarEntry::Symlink(name, target) => {
                header.set_entry_type(tar::EntryType::Symlink);
                header.set_size(0);
                builder
                    .append_link(&mut header, name, target)
                    .expect("append symlink");
            }
            TarEntry::HardLink(name, target) => {
                header.set_entry_type(tar::EntryType::Link);
                header.set_size(0);
                builder
                    .append_link(&mut header, name, target)
                    .expect("append hard link");
            }
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

#[cfg(unix)]
#[rstest]
fn symlink_to_absolute_path_cannot_redirect_later_writes(temp: TempDir) {
    let outside = temp.path().join("outside");
    fs::create_dir_all(&outside).expect("mkdir outside");
    let archive = temp.path().join("evil.tar.gz");
    write_tar_gz_with_links(
        &archive,
        &[
            TarEntry::Symlink("top/link", outside.to_str().expect("UTF-8 temp dir")),
            TarEntry::File("top/link/pwned", b"payload"),
        ],
    );

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("dest"), 1)
        .expect_err("escaping symlink rejected");

    assert!(
        matches!(err, ExtractionError::PathTraversal { .. }),
        "unexpected error: {err}"
    );
    assert!(!outside.join("pwned").exists());
}

#[cfg(unix)]
#[rstest]
#[case::climbs_above_destination("top/bin/link", "../../outside")]
#[case::climbs_from_root("top/link", "../outside")]
fn relative_symlink_leaving_destination_is_rejected(
    temp: TempDir,
    #[case] name: &str,
    #[case] target: &str,
) {
    let archive = temp.path().join("evil.tar.gz");
    write_tar_gz_with_links(&archive, &[TarEntry::Symlink(name, target)]);

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("dest"), 1)
        .expect_err("escaping symlink rejected");
    assert!(matches!(err, ExtractionError::PathTraversal { .. }));
}

#[cfg(unix)]
#[rstest]
fn symlinks_within_destination_are_kept(temp: TempDir) {
    let archive = temp.path().join("links.tar.gz");
    write_tar_gz_with_links(
        &archive,
        &[
            TarEntry::File("top/lib/index.js", b"module"),
            TarEntry::Symlink("top/bin/tool", "../lib/index.js"),
            TarEntry::HardLink("top/lib/copy.js", "top/lib/index.js"),
        ],
    );
    let dest = temp.path().join("dest");

    ArchiveExtractor
        .extract_tar_gz(&archive, &dest, 1)
        .expect("extract");

    let link = dest.join("bin/tool");
    assert_eq!(
        fs::read_link(&link).expect("symlink kept"),
        PathBuf::from("../lib/index.js")
    );
    assert_eq!(fs::read(&link).expect("read through link"), b"module");
    assert_eq!(fs::read(dest.join("lib/copy.js")).expect("hard link"), b"module");
}

#[cfg(unix)]
#[rstest]
fn hard_link_to_path_outside_destination_is_rejected(temp: TempDir) {
    let archive = temp.path().join("evil.tar.gz");
    write_tar_gz_with_links(&archive, &[TarEntry::HardLink("top/passwd", "/etc/passwd")]);

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("dest"), 1)
        .expect_err("escaping hard link rejected");
    assert!(matches!(err, ExtractionError::PathTraversal { .. }));
}

#[cfg(unix)]
#[rstest]
fn existing_symlink_in_destination_cannot_redirect_writes(temp: TempDir) {
    let outside = temp.path().join("outside");
    let dest = temp.path().join("dest");
    fs::create_dir_all(&outside).expect("mkdir outside");
    fs::create_dir_all(&dest).expect("mkdir dest");
    std::os::unix::fs::symlink(&outside, dest.join("link")).expect("symlink");
    let archive = temp.path().join("plain.tar.gz");
    write_tar_gz(&archive, &[("top/link/pwned", b"payload", 0o644)]);

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &dest, 1)
        .expect_err("redirected write rejected");

    assert!(matches!(err, ExtractionError::PathTraversal { .. }));
    assert!(!outside.join("pwned").exists());
}

#[rstest]
fn corrupt_tarball_reports_diagnostic(temp: TempDir) {
    let archive = temp.path().join("broken.tar.gz");
    fs::write(&archive, b"not a gzip stream").expect("write");

    let err = ArchiveExtractor
        .extract_tar_gz(&archive, &temp.path().join("out"), 1)
        .expect_err("corrupt archive");
    let ExtractionError::Failed { archive: path, output } = err else {
        panic!("expected Failed, got {err:?}");
    };
    assert_eq!(path, archive);
    assert!(!output.is_empty());
}

#[rstest]
fn zip_extracts_nested_tree(temp: TempDir) {
    let archive = temp.path().join("clangd.zip");
    write_zip(
        &archive,
        &[
            ("clangd_19.1.2/bin/clangd", b"clangd"),
            ("clangd_19.1.2/lib/clang/19/include/stddef.h", b"header"),
        ],
    );
    let dest = temp.path().join("lsp");

    let files = ArchiveExtractor.extract_zip(&archive, &dest).expect("extract");
    assert_eq!(files.len(), 2);
    let binary = dest.join("clangd_19.1.2/bin/clangd");
    assert_eq!(fs::read(&binary).expect("read"), b"clangd");
    #[cfg(unix)]
    assert_eq!(mode_of(&binary), 0o755);
}

#[rstest]
fn zip_entries_escaping_destination_are_rejected(temp: TempDir) {
    let archive = temp.path().join("evil.zip");
    write_zip(&archive, &[("../escape", b"x")]);

    let err = ArchiveExtractor
        .extract_zip(&archive, &temp.path().join("out"))
        .expect_err("traversal rejected");
    assert!(matches!(err, ExtractionError::PathTraversal { .. }));
}

#[rstest]
fn corrupt_zip_reports_diagnostic(temp: TempDir) {
    let archive = temp.path().join("broken.zip");
    fs::write(&archive, b"PK but not really").expect("write");

    let err = ArchiveExtractor
        .extract_zip(&archive, &temp.path().join("out"))
        .expect_err("corrupt archive");
    assert!(matches!(err, ExtractionError::Failed { .. }));
}

#[rstest]
fn gunzip_writes_single_file(temp: TempDir) {
    let archive = temp.path().join("rust-analyzer.gz");
    let mut encoder = GzEncoder::new(File::create(&archive).expect("create"), Compression::default());
    encoder.write_all(b"rust-analyzer binary").expect("write");
    encoder.finish().expect("finish");

    let dest = temp.path().join("lsp/rust-analyzer/bin/rust-analyzer");
    ArchiveExtractor.gunzip(&archive, &dest).expect("gunzip");
    assert_eq!(fs::read(&dest).expect("read"), b"rust-analyzer binary");
}

#[rstest]
fn gunzip_rejects_plain_file(temp: TempDir) {
    let archive = temp.path().join("plain.gz");
    fs::write(&archive, b"plain text").expect("write");

    let err = ArchiveExtractor
        .gunzip(&archive, &temp.path().join("out"))
        .expect_err("not gzip");
    assert!(matches!(err, ExtractionError::Failed { .. }));
}

#[rstest]
#[case::strip_one("a/b/c", 1, Some("b/c"))]
#[case::strip_two("a/b/c", 2, Some("c"))]
#[case::strip_all("a/b", 2, None)]
#[case::strip_none("a", 0, Some("a"))]
fn strip_path_drops_leading_components(
    #[case] input: &str,
    #[case] count: usize,
    #[case] expected: Option<&str>,
) {
    assert_eq!(strip_path(Path::new(input), count), expected.map(PathBuf::from));
}
