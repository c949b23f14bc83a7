//! Integration tests for wheelcheck-core.
//!
//! These tests build real wheel archives and run them through the reader and
//! the checker end to end.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;
use wheelcheck_core::Check;
use wheelcheck_core::Configuration;
use wheelcheck_core::FailedCheck;
use wheelcheck_core::WheelChecker;
use wheelcheck_core::WheelContents;
use wheelcheck_core::WheelError;
use wheelcheck_core::error::MetadataDirKind;
use wheelcheck_core::error::PathIssue;
use wheelcheck_core::test_utils::WheelBuilder;
use wheelcheck_core::test_utils::create_test_zip;

fn read(builder: WheelBuilder) -> wheelcheck_core::Result<WheelContents> {
    let filename = builder.filename();
    WheelContents::from_reader(&filename, Cursor::new(builder.build()))
}

fn check_all(builder: WheelBuilder) -> Vec<FailedCheck> {
    WheelChecker::default().check_contents(&read(builder).unwrap())
}

fn only(checks: &[Check]) -> WheelChecker {
    WheelChecker::new(checks.iter().copied().collect())
}

#[test]
fn test_minimal_wheel_passes() {
    let failures = check_all(WheelBuilder::new("foo", "1.0").add_file("foo.py", b"x = 1\n"));
    assert_eq!(failures, vec![]);
}

#[test]
fn test_package_wheel_passes() {
    let failures = check_all(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("foo/core.py", b"def main(): pass\n")
            .add_file("foo/py.typed", b""),
    );
    assert_eq!(failures, vec![]);
}

#[test]
fn test_bytecode_detected() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo.py", b"x = 1\n")
            .add_file("foo.pyc", b"\x42\x0d\x0d\x0a compiled"),
    )
    .unwrap();
    let failures = only(&[Check::W001]).check_contents(&contents);
    assert_eq!(failures, vec![FailedCheck::with_args(Check::W001, ["foo.pyc"])]);
}

#[test]
fn test_duplicate_files_in_insertion_order() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo.py", b"print('hello')\n")
            .add_file("foo/dup.py", b"print('hello')\n")
            .add_file("foo/__init__.py", b""),
    )
    .unwrap();
    let checker = only(&[Check::W002]);
    let failures = checker.check_contents(&contents);
    assert_eq!(
        failures,
        vec![FailedCheck::with_args(Check::W002, ["foo.py", "foo/dup.py"])]
    );
}

#[test]
fn test_trivial_duplicates_allowed() {
    let failures = check_all(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("foo/sub/__init__.py", b"")
            .add_file("foo/other/__init__.py", b"\n"),
    );
    assert_eq!(failures, vec![]);
}

#[test]
fn test_non_module_at_toplevel_and_multiple_entries() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("bar.rst", b"Bar\n===\n"),
    )
    .unwrap();
    let failures = WheelChecker::default().check_contents(&contents);
    assert_eq!(
        failures,
        vec![
            FailedCheck::with_args(Check::W003, ["bar.rst"]),
            FailedCheck::with_args(Check::W009, ["foo/", "bar.rst"]),
        ]
    );
}

#[test]
fn test_multiple_entries_suppressed_by_toplevel() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("bar.py", b"x = 1\n"),
    )
    .unwrap();
    let checker = WheelChecker::default().with_toplevel(["foo/", "bar.py"]);
    assert_eq!(checker.check_contents(&contents), vec![]);
}

#[test]
fn test_empty_wheel() {
    let failures = check_all(WheelBuilder::new("foo", "1.0"));
    assert_eq!(
        failures,
        vec![FailedCheck::new(Check::W007), FailedCheck::new(Check::W008)]
    );
}

#[test]
fn test_declared_toplevel() {
    let contents = read(WheelBuilder::new("foo", "1.0").add_file("foo.py", b"x = 1\n")).unwrap();
    let checker = only(&[Check::W201, Check::W202]).with_toplevel(["foo.py", "bar"]);
    assert_eq!(
        checker.check_contents(&contents),
        vec![FailedCheck::with_args(Check::W201, ["bar"])]
    );
}

#[test]
fn test_undeclared_toplevel() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("tests/__init__.py", b"")
            .add_file("foo-nspkg.pth", b"import sys\n"),
    )
    .unwrap();
    let checker = only(&[Check::W005, Check::W202]).with_toplevel(["foo"]);
    assert_eq!(
        checker.check_contents(&contents),
        vec![
            FailedCheck::with_args(Check::W005, ["tests/"]),
            FailedCheck::with_args(Check::W202, ["tests/"]),
        ]
    );
}

#[test]
fn test_missing_root_is_purelib() {
    let err = read(
        WheelBuilder::new("foo", "1.0")
            .without_wheel_file()
            .add_file("foo-1.0.dist-info/WHEEL", b"Wheel-Version: 1.0\nGenerator: test\n")
            .add_file("foo.py", b"x = 1\n"),
    )
    .unwrap_err();
    assert!(matches!(err, WheelError::MissingDescriptorField));
}

#[test]
fn test_invalid_root_is_purelib() {
    let err = read(
        WheelBuilder::new("foo", "1.0")
            .without_wheel_file()
            .add_file("foo-1.0.dist-info/WHEEL", b"Root-Is-Purelib: maybe\n"),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid Root-Is-Purelib value in WHEEL file: 'maybe'"
    );
}

#[test]
fn test_missing_wheel_file() {
    let err = read(WheelBuilder::new("foo", "1.0").without_wheel_file()).unwrap_err();
    assert!(matches!(err, WheelError::MissingMetadataFile { name: "WHEEL" }));
}

#[test]
fn test_missing_record() {
    let err = read(WheelBuilder::new("foo", "1.0").without_record()).unwrap_err();
    assert!(matches!(err, WheelError::MissingMetadataFile { name: "RECORD" }));
    assert_eq!(err.to_string(), "No RECORD file in wheel");
}

#[test]
fn test_invalid_filename() {
    let data = WheelBuilder::new("foo", "1.0").build();
    let err = WheelContents::from_reader("foo.zip", Cursor::new(data)).unwrap_err();
    assert!(err.is_filename_error());
}

#[test]
fn test_not_a_zip() {
    let err = WheelContents::from_reader(
        "foo-1.0-py3-none-any.whl",
        Cursor::new(b"definitely not a zip archive".to_vec()),
    )
    .unwrap_err();
    assert!(matches!(err, WheelError::Zip(_)));
}

#[test]
fn test_missing_dist_info() {
    let data = create_test_zip(vec![("foo.py", b"x = 1\n" as &[u8])]);
    let err = WheelContents::from_reader("foo-1.0-py3-none-any.whl", Cursor::new(data)).unwrap_err();
    assert!(matches!(err, WheelError::MissingMetadataDirectory));
}

#[test]
fn test_dist_info_name_mismatch() {
    let data = WheelBuilder::new("bar", "1.0").build();
    let err = WheelContents::from_reader("foo-1.0-py3-none-any.whl", Cursor::new(data)).unwrap_err();
    assert!(matches!(
        err,
        WheelError::NameVersionMismatch {
            kind: MetadataDirKind::DistInfo,
            ref found,
        } if found == "bar-1.0.dist-info"
    ));
}

#[test]
fn test_normalized_name_and_version_match() {
    let data = WheelBuilder::new("Foo_Bar", "1.0").build();
    let contents = WheelContents::from_reader("foo.bar-1.0.0-py3-none-any.whl", Cursor::new(data)).unwrap();
    assert_eq!(contents.dist_info_dir(), "Foo_Bar-1.0.dist-info");
}

#[test]
fn test_version_spellings_match() {
    let spellings = [
        ("1.0_1", "1.0.post1"),
        ("1.0.post1", "1.0_1"),
        ("1.0a1", "1.0alpha1"),
        ("1.0rc2", "1.0c2"),
        ("1.0.post0", "1.0rev"),
        ("1.0.dev0", "1.0.dev"),
        ("1!2.0", "1!2"),
        ("1.0", "v1.0"),
        ("1.0+ubuntu_01", "1.0+ubuntu.1"),
    ];
    for (filename_version, dir_version) in spellings {
        let builder = WheelBuilder::new("foo", filename_version)
            .dir_version(dir_version)
            .add_file("foo.py", b"x = 1\n")
            .add_file(&format!("foo-{dir_version}.data/scripts/foo"), b"#!python\n");
        let contents = read(builder)
            .unwrap_or_else(|e| panic!("{filename_version} vs {dir_version}: {e}"));
        assert_eq!(
            contents.dist_info_dir(),
            format!("foo-{dir_version}.dist-info")
        );
        assert_eq!(contents.data_dir(), format!("foo-{dir_version}.data"));
    }
}

#[test]
fn test_version_spelling_mismatch() {
    for (filename_version, dir_version) in [("11", "1.0_1"), ("1.0a1", "1.0b1"), ("1.0", "1!1.0")] {
        let builder = WheelBuilder::new("foo", filename_version).dir_version(dir_version);
        let err = read(builder).unwrap_err();
        assert!(
            matches!(
                err,
                WheelError::NameVersionMismatch {
                    kind: MetadataDirKind::DistInfo,
                    ref found,
                } if *found == format!("foo-{dir_version}.dist-info")
            ),
            "{filename_version} vs {dir_version}: {err:?}"
        );
    }
}

#[test]
fn test_data_dir_version_mismatch() {
    let builder = WheelBuilder::new("foo", "1.0_1")
        .dir_version("1.0.post1")
        .add_file("foo-1.0.post2.data/scripts/foo", b"#!python\n");
    let err = read(builder).unwrap_err();
    assert!(matches!(
        err,
        WheelError::NameVersionMismatch {
            kind: MetadataDirKind::Data,
            ref found,
        } if found == "foo-1.0.post2.data"
    ));
}

#[test]
fn test_multiple_dist_info_directories() {
    let data = create_test_zip(vec![
        ("foo-1.0.dist-info/RECORD", b"" as &[u8]),
        ("foo-1.0.0.dist-info/RECORD", b""),
    ]);
    let err = WheelContents::from_reader("foo-1.0-py3-none-any.whl", Cursor::new(data)).unwrap_err();
    assert!(matches!(
        err,
        WheelError::MultipleMetadataDirectories {
            kind: MetadataDirKind::DistInfo
        }
    ));
}

#[test]
fn test_path_conflict_in_record() {
    let err = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo", b"not a directory\n")
            .add_record_row(&["foo/bar.py", "", ""]),
    )
    .unwrap_err();
    assert!(matches!(err, WheelError::PathConflict { ref path } if path == "foo"));
}

#[test]
fn test_absolute_path_in_record() {
    let err = read(WheelBuilder::new("foo", "1.0").add_record_row(&["/etc/passwd", "", ""])).unwrap_err();
    assert!(matches!(
        err,
        WheelError::NonNormalizedPath {
            issue: PathIssue::Absolute,
            ..
        }
    ));
}

#[test]
fn test_parent_component_in_record() {
    let err = read(WheelBuilder::new("foo", "1.0").add_record_row(&["foo/../bar.py", "", ""])).unwrap_err();
    assert!(matches!(
        err,
        WheelError::NonNormalizedPath {
            issue: PathIssue::NonNormalized,
            ..
        }
    ));
}

#[test]
fn test_malformed_record_row() {
    let err = read(WheelBuilder::new("foo", "1.0").add_record_row(&["foo.py", "sha256=abc"])).unwrap_err();
    assert!(matches!(err, WheelError::MalformedManifestRow { .. }));
}

#[test]
fn test_invalid_record_size() {
    let err = read(WheelBuilder::new("foo", "1.0").add_record_row(&["foo.py", "sha256=abc", "ten"])).unwrap_err();
    assert!(matches!(
        err,
        WheelError::InvalidManifestSize { ref size, .. } if size == "ten"
    ));
}

#[test]
fn test_record_is_authoritative() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo.py", b"x = 1\n")
            .add_unrecorded_file("stray.pyc", b"compiled"),
    )
    .unwrap();
    assert!(!contents.filetree().contains("stray.pyc"));
    assert_eq!(WheelChecker::default().check_contents(&contents), vec![]);
}

#[test]
fn test_platlib_wheel_sections() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .root_is_purelib(false)
            .add_file("foo/__init__.py", b"")
            .add_file("foo/_speedups.so", b"\x7fELF")
            .add_file("foo-1.0.data/purelib/bar.py", b"x = 1\n")
            .add_file("foo-1.0.data/scripts/foo-cli", b"#!python\n"),
    )
    .unwrap();
    assert!(!contents.root_is_purelib());
    assert!(contents.platlib_tree().contains("foo"));
    assert!(contents.purelib_tree().contains("bar.py"));
    assert!(!contents.purelib_tree().contains("foo"));

    let failures = only(&[Check::W009]).check_contents(&contents);
    assert_eq!(
        failures,
        vec![FailedCheck::with_args(
            Check::W009,
            ["foo-1.0.data/purelib/bar.py", "foo/"]
        )]
    );
}

#[test]
fn test_purelib_in_purelib_wheel() {
    let err = read(
        WheelBuilder::new("foo", "1.0").add_file("foo-1.0.data/purelib/foo.py", b"x = 1\n"),
    )
    .unwrap_err();
    assert!(err.structural_issue().is_some());
}

#[test]
fn test_check_wheel_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = WheelBuilder::new("foo", "1.0")
        .add_file("foo.py", b"x = 1\n")
        .add_file("foo.pyo", b"optimized")
        .write_to(temp.path());
    let failures = WheelChecker::default().check_wheel(&path).unwrap();
    assert_eq!(
        failures,
        vec![
            FailedCheck::with_args(Check::W001, ["foo.pyo"]),
            FailedCheck::with_args(Check::W003, ["foo.pyo"]),
            FailedCheck::with_args(Check::W009, ["foo.py", "foo.pyo"]),
        ]
    );
}

#[test]
fn test_check_wheel_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = WheelChecker::default()
        .check_wheel(temp.path().join("foo-1.0-py3-none-any.whl"))
        .unwrap_err();
    assert!(matches!(err, WheelError::Io(_)));
}

#[test]
fn test_package_tree_comparison() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("src");
    fs::create_dir_all(src.join("foo")).unwrap();
    fs::write(src.join("foo/__init__.py"), "").unwrap();
    fs::write(src.join("foo/extra.py"), "x = 1\n").unwrap();
    fs::write(src.join("foo/cached.pyc"), "compiled").unwrap();

    let checker = Configuration {
        select: Some([Check::W101, Check::W102].into_iter().collect()),
        src_dirs: Some(vec![src]),
        ..Configuration::default()
    }
    .into_checker()
    .unwrap();

    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo/__init__.py", b"")
            .add_file("foo/stray.py", b"y = 2\n"),
    )
    .unwrap();
    assert_eq!(
        checker.check_contents(&contents),
        vec![
            FailedCheck::with_args(Check::W101, ["foo/extra.py"]),
            FailedCheck::with_args(Check::W102, ["foo/stray.py"]),
        ]
    );
}

#[test]
fn test_empty_selection_never_fails() {
    let contents = read(
        WheelBuilder::new("foo", "1.0")
            .add_file("foo.pyc", b"compiled")
            .add_file("README.rst", b"readme"),
    )
    .unwrap();
    assert!(
        WheelChecker::new(BTreeSet::new())
            .check_contents(&contents)
            .is_empty()
    );
}
