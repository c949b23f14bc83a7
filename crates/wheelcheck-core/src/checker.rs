//! The rule engine.

use crate::checks::Check;
use crate::checks::FailedCheck;
use crate::contents::WheelContents;
use crate::error::Result;
use crate::types::Directory;
use crate::types::Entry;
use crate::types::Signature;
use crate::util::has_module_ext;
use crate::util::is_pth_file;
use crate::util::is_stubs_dir;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

const BYTECODE_SUFFIXES: [&str; 2] = [".pyc", ".pyo"];

const COMMON_NAMES: [&str; 15] = [
    ".eggs", ".nox", ".tox", ".venv", "build", "data", "dist", "doc", "docs", "example",
    "examples", "src", "test", "tests", "venv",
];

/// Signatures of trivial contents that may be duplicated freely.
static ALLOWED_DUPLICATES: LazyLock<HashSet<Signature>> = LazyLock::new(|| {
    let trivial: [&[u8]; 6] = [
        b"",
        b"\n",
        b"\r\n",
        b"# -*- coding: utf-8 -*-",
        b"# -*- coding: utf-8 -*-\n",
        b"# -*- coding: utf-8 -*-\n\r",
    ];
    let mut allowed: HashSet<Signature> = trivial.into_iter().map(Signature::of_bytes).collect();
    allowed.insert(Signature::unknown());
    allowed
});

type Rule = fn(&WheelChecker, &WheelContents) -> Vec<FailedCheck>;

const fn rule(check: Check) -> Rule {
    match check {
        Check::W001 => check_w001,
        Check::W002 => check_w002,
        Check::W003 => check_w003,
        Check::W004 => check_w004,
        Check::W005 => check_w005,
        Check::W006 => check_w006,
        Check::W007 => check_w007,
        Check::W008 => check_w008,
        Check::W009 => check_w009,
        Check::W010 => check_w010,
        Check::W101 => check_w101,
        Check::W102 => check_w102,
        Check::W201 => check_w201,
        Check::W202 => check_w202,
    }
}

/// Evaluates a selection of checks against wheel contents.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::Check;
/// use wheelcheck_core::WheelChecker;
/// use wheelcheck_core::WheelContents;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = WheelContents::builder("foo-1.0.dist-info", "foo-1.0.data", true);
/// builder.add_record_rows([
///     ["foo.py", "sha256=abc", "10"],
///     ["foo.pyc", "sha256=def", "12"],
///     ["foo-1.0.dist-info/RECORD", "", ""],
/// ])?;
/// let contents = builder.build()?;
///
/// let checker = WheelChecker::new(Check::all());
/// let failures = checker.check_contents(&contents);
/// assert_eq!(failures.len(), 1);
/// assert_eq!(failures[0].check, Check::W001);
/// assert_eq!(failures[0].args, vec!["foo.pyc"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WheelChecker {
    selected: BTreeSet<Check>,
    toplevel: Option<Vec<String>>,
    pkgtree: Option<Directory>,
}

impl Default for WheelChecker {
    fn default() -> Self {
        Self::new(Check::all())
    }
}

impl WheelChecker {
    /// Creates a checker running exactly the `selected` checks.
    #[must_use]
    pub const fn new(selected: BTreeSet<Check>) -> Self {
        Self {
            selected,
            toplevel: None,
            pkgtree: None,
        }
    }

    /// Declares the expected top-level library names for the `W2` checks.
    ///
    /// Trailing `/` characters are stripped from each name.
    #[must_use]
    pub fn with_toplevel<I, S>(mut self, toplevel: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.toplevel = Some(
            toplevel
                .into_iter()
                .map(|name| name.as_ref().trim_end_matches('/').to_string())
                .collect(),
        );
        self
    }

    /// Sets the package tree the `W1` checks compare against.
    #[must_use]
    pub fn with_pkgtree(mut self, pkgtree: Directory) -> Self {
        self.pkgtree = Some(pkgtree);
        self
    }

    /// The selected checks.
    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<Check> {
        &self.selected
    }

    /// The declared top-level names, if any.
    #[must_use]
    pub fn toplevel(&self) -> Option<&[String]> {
        self.toplevel.as_deref()
    }

    /// The package tree, if any.
    #[must_use]
    pub const fn pkgtree(&self) -> Option<&Directory> {
        self.pkgtree.as_ref()
    }

    /// Reads the wheel at `path` and runs the selected checks on it.
    ///
    /// # Errors
    ///
    /// Returns any error raised while reading the wheel.
    pub fn check_wheel<P: AsRef<Path>>(&self, path: P) -> Result<Vec<FailedCheck>> {
        let contents = WheelContents::from_wheel(path)?;
        Ok(self.check_contents(&contents))
    }

    /// Runs the selected checks in identifier order and collects every
    /// failure.
    #[must_use]
    pub fn check_contents(&self, contents: &WheelContents) -> Vec<FailedCheck> {
        let mut failures = Vec::new();
        for &check in &self.selected {
            let found = rule(check)(self, contents);
            trace!(%check, failures = found.len(), "evaluated check");
            failures.extend(found);
        }
        failures
    }

    /// Runs one check regardless of the selection.
    #[must_use]
    pub fn run_check(&self, check: Check, contents: &WheelContents) -> Vec<FailedCheck> {
        rule(check)(self, contents)
    }
}

fn failure_if_any(check: Check, paths: Vec<String>) -> Vec<FailedCheck> {
    if paths.is_empty() {
        Vec::new()
    } else {
        vec![FailedCheck::with_args(check, paths)]
    }
}

fn check_w001(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let bad = contents
        .filetree()
        .all_files()
        .filter(|f| BYTECODE_SUFFIXES.contains(&f.extension()))
        .map(|f| f.path())
        .collect();
    failure_if_any(Check::W001, bad)
}

fn check_w002(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    contents
        .by_signature()
        .filter(|(sig, files)| files.len() > 1 && !ALLOWED_DUPLICATES.contains(*sig))
        .map(|(_, files)| FailedCheck::with_args(Check::W002, files.iter().map(|f| f.path())))
        .collect()
}

fn check_w003(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let mut bad = Vec::new();
    for tree in contents.library_trees() {
        for (name, file) in tree.files() {
            if !is_pth_file(name) && !file.has_module_ext() {
                bad.push(file.path());
            }
        }
    }
    failure_if_any(Check::W003, bad)
}

fn check_w004(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let bad = contents
        .library_trees()
        .into_iter()
        .flat_map(Directory::all_files)
        .filter(|f| f.has_module_ext() && !f.is_valid_module_path())
        .map(|f| f.path())
        .collect();
    failure_if_any(Check::W004, bad)
}

fn check_w005(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let declared = checker.toplevel().unwrap_or_default();
    let mut bad = Vec::new();
    for tree in contents.library_trees() {
        for name in COMMON_NAMES {
            if declared.iter().any(|d| d == name) {
                continue;
            }
            if let Some(entry) = tree.get(name) {
                bad.push(entry.path());
            }
        }
    }
    failure_if_any(Check::W005, bad)
}

fn check_w006(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let bad = contents
        .library_trees()
        .into_iter()
        .filter_map(|tree| tree.get("__init__.py").and_then(Entry::as_file))
        .map(|f| f.path())
        .collect();
    failure_if_any(Check::W006, bad)
}

fn check_w007(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    if contents.purelib_tree().is_empty() && contents.platlib_tree().is_empty() {
        vec![FailedCheck::new(Check::W007)]
    } else {
        Vec::new()
    }
}

fn check_w008(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    if contents
        .filetree()
        .entries()
        .all(|(name, _)| name == contents.dist_info_dir())
    {
        vec![FailedCheck::new(Check::W008)]
    } else {
        Vec::new()
    }
}

fn check_w009(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    if checker.toplevel.is_some() || checker.pkgtree.is_some() {
        return Vec::new();
    }
    let toplevels: Vec<String> = contents
        .library_trees()
        .into_iter()
        .flat_map(Directory::entries)
        .filter(|(name, entry)| !name.starts_with('_') && !is_ignored_toplevel(name, entry))
        .map(|(_, entry)| entry.path())
        .collect();
    if toplevels.len() > 1 {
        vec![FailedCheck::with_args(Check::W009, toplevels)]
    } else {
        Vec::new()
    }
}

fn check_w010(_: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let mut bad = Vec::new();
    for tree in contents.library_trees() {
        for (name, subdir) in tree.subdirectories() {
            if !is_stubs_dir(name) && !subdir.all_files().any(|f| has_module_ext(f.name())) {
                bad.push(subdir.path().unwrap_or_default().to_string());
            }
        }
    }
    failure_if_any(Check::W010, bad)
}

fn check_w101(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let Some(pkgtree) = &checker.pkgtree else {
        return Vec::new();
    };
    let mut missing: Vec<String> = pkgtree
        .all_files()
        .filter_map(|f| f.libparts())
        .filter(|lib| {
            !contents
                .library_trees()
                .iter()
                .any(|tree| tree.contains_file(*lib))
        })
        .map(|lib| lib.join("/"))
        .collect();
    missing.sort();
    failure_if_any(Check::W101, missing)
}

fn check_w102(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let Some(pkgtree) = &checker.pkgtree else {
        return Vec::new();
    };
    let extra = contents
        .library_trees()
        .into_iter()
        .flat_map(Directory::all_files)
        .filter(|f| f.libparts().is_some_and(|lib| !pkgtree.contains_file(lib)))
        .map(|f| f.path())
        .collect();
    failure_if_any(Check::W102, extra)
}

fn check_w201(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let Some(toplevel) = checker.toplevel() else {
        return Vec::new();
    };
    let missing = toplevel
        .iter()
        .filter(|name| {
            !contents.purelib_tree().contains(name) && !contents.platlib_tree().contains(name)
        })
        .cloned()
        .collect();
    failure_if_any(Check::W201, missing)
}

fn check_w202(checker: &WheelChecker, contents: &WheelContents) -> Vec<FailedCheck> {
    let Some(toplevel) = checker.toplevel() else {
        return Vec::new();
    };
    let expected: HashSet<&str> = toplevel.iter().map(String::as_str).collect();
    let extra = contents
        .library_trees()
        .into_iter()
        .flat_map(Directory::entries)
        .filter(|(name, entry)| !expected.contains(name) && !is_ignored_toplevel(name, entry))
        .map(|(_, entry)| entry.path())
        .collect();
    failure_if_any(Check::W202, extra)
}

fn is_ignored_toplevel(name: &str, entry: &Entry) -> bool {
    entry.is_file() && is_pth_file(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::File;

    const DIST_INFO: &str = "foo-1.0.dist-info";
    const DATA: &str = "foo-1.0.data";
    const RECORD: [&str; 3] = ["foo-1.0.dist-info/RECORD", "", ""];

    fn contents(rows: &[[&str; 3]]) -> WheelContents {
        contents_with_root(rows, true)
    }

    fn contents_with_root(rows: &[[&str; 3]], root_is_purelib: bool) -> WheelContents {
        let mut builder = WheelContents::builder(DIST_INFO, DATA, root_is_purelib);
        builder.add_record_rows(rows).unwrap();
        builder.add_record_rows([RECORD]).unwrap();
        builder.build().unwrap()
    }

    fn run(check: Check, rows: &[[&str; 3]]) -> Vec<FailedCheck> {
        WheelChecker::default().run_check(check, &contents(rows))
    }

    fn pkgtree(paths: &[&str]) -> Directory {
        let mut tree = Directory::root();
        for path in paths {
            let entry = if path.ends_with('/') {
                Entry::Directory(Directory::new(path).unwrap())
            } else {
                Entry::File(File::new(path, None, None).unwrap())
            };
            tree.add_entry(entry).unwrap();
        }
        tree
    }

    #[test]
    fn test_empty_wheel_trips_only_emptiness_checks() {
        let checker = WheelChecker::new(BTreeSet::new());
        let wheel = contents(&[]);
        // an empty wheel trips W007 and W008 only
        let tripped: Vec<Check> = Check::ALL
            .into_iter()
            .filter(|&c| !checker.run_check(c, &wheel).is_empty())
            .collect();
        assert_eq!(tripped, vec![Check::W007, Check::W008]);
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let checker = WheelChecker::new(BTreeSet::new());
        let wheel = contents(&[["foo.pyc", "sha256=a", "1"], ["bar.pyc", "sha256=a", "1"]]);
        assert!(checker.check_contents(&wheel).is_empty());
    }

    #[test]
    fn test_minimal_wheel_passes() {
        let wheel = contents(&[["foo.py", "sha256=abc", "10"]]);
        assert!(WheelChecker::default().check_contents(&wheel).is_empty());
    }

    #[test]
    fn test_results_sorted_by_check() {
        let wheel = contents(&[]);
        let checker = WheelChecker::new([Check::W008, Check::W007].into_iter().collect());
        let checks: Vec<Check> = checker
            .check_contents(&wheel)
            .into_iter()
            .map(|f| f.check)
            .collect();
        assert_eq!(checks, vec![Check::W007, Check::W008]);
    }

    #[test]
    fn test_w001() {
        let failures = run(
            Check::W001,
            &[
                ["foo.py", "sha256=abc", "10"],
                ["foo.pyc", "sha256=def", "12"],
                ["foo-1.0.data/scripts/x.pyo", "sha256=ghi", "3"],
            ],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(
                Check::W001,
                ["foo.pyc", "foo-1.0.data/scripts/x.pyo"]
            )]
        );
        assert!(run(Check::W001, &[["foo.py", "", ""]]).is_empty());
    }

    #[test]
    fn test_w002() {
        let failures = run(
            Check::W002,
            &[
                ["foo.py", "sha256=dup", "5"],
                ["bar.py", "sha256=other", "5"],
                ["foo/dup.py", "sha256=dup", "5"],
                ["a/__init__.py", "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU", "0"],
                ["b/__init__.py", "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU", "0"],
            ],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(Check::W002, ["foo.py", "foo/dup.py"])]
        );
    }

    #[test]
    fn test_w002_one_failure_per_signature() {
        let rows = [
            ["a.py", "sha256=x", "1"],
            ["b.py", "sha256=y", "1"],
            ["c.py", "sha256=x", "1"],
            ["d.py", "sha256=y", "1"],
        ];
        let failures = run(Check::W002, &rows);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].args, vec!["a.py", "c.py"]);
        assert_eq!(failures[1].args, vec!["b.py", "d.py"]);
        assert_eq!(run(Check::W002, &rows), failures);
    }

    #[test]
    fn test_allowed_duplicates() {
        assert_eq!(ALLOWED_DUPLICATES.len(), 7);
        assert!(ALLOWED_DUPLICATES.contains(&Signature::new(
            Some(1),
            Some("sha256=AbpHGcgLb-kRsJGnwFEktk7uzpZOCcBY74-YBdrKVGs".to_string())
        )));
    }

    #[test]
    fn test_w003() {
        let failures = run(
            Check::W003,
            &[
                ["bar.rst", "", ""],
                ["foo/__init__.py", "", ""],
                ["foo.pth", "", ""],
                ["_x.so", "", ""],
                ["foo-1.0.data/platlib/README", "", ""],
            ],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(
                Check::W003,
                ["bar.rst", "foo-1.0.data/platlib/README"]
            )]
        );
    }

    #[test]
    fn test_w004() {
        let failures = run(
            Check::W004,
            &[
                ["foo/__init__.py", "", ""],
                ["foo-bar/baz.py", "", ""],
                ["foo/class.py", "", ""],
                ["foo/data.json", "", ""],
                ["foo-1.0.data/scripts/bad-name.py", "", ""],
            ],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(
                Check::W004,
                ["foo/class.py", "foo-bar/baz.py"]
            )]
        );
    }

    #[test]
    fn test_w005() {
        let rows = [
            ["tests/__init__.py", "", ""],
            ["build", "", ""],
            ["foo/__init__.py", "", ""],
        ];
        let failures = run(Check::W005, &rows);
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(Check::W005, ["build", "tests/"])]
        );

        let checker = WheelChecker::default().with_toplevel(["tests/", "foo"]);
        let failures = checker.run_check(Check::W005, &contents(&rows));
        assert_eq!(failures[0].args, vec!["build"]);
    }

    #[test]
    fn test_w006() {
        let failures = run(
            Check::W006,
            &[["__init__.py", "", ""], ["foo/__init__.py", "", ""]],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(Check::W006, ["__init__.py"])]
        );
        assert!(run(Check::W006, &[["__init__.py/", "", ""]]).is_empty());
    }

    #[test]
    fn test_w007_w008() {
        let empty = contents(&[]);
        let checker = WheelChecker::default();
        assert_eq!(
            checker.run_check(Check::W007, &empty),
            vec![FailedCheck::new(Check::W007)]
        );
        assert_eq!(
            checker.run_check(Check::W008, &empty),
            vec![FailedCheck::new(Check::W008)]
        );

        let data_only = contents(&[["foo-1.0.data/scripts/foo", "", ""]]);
        assert_eq!(checker.run_check(Check::W007, &data_only).len(), 1);
        assert!(checker.run_check(Check::W008, &data_only).is_empty());
    }

    #[test]
    fn test_w009() {
        let rows = [
            ["bar.rst", "", ""],
            ["foo/__init__.py", "", ""],
            ["_private.py", "", ""],
            ["foo.pth", "", ""],
        ];
        let failures = run(Check::W009, &rows);
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(Check::W009, ["bar.rst", "foo/"])]
        );

        let wheel = contents(&rows);
        let with_toplevel = WheelChecker::default().with_toplevel(["foo"]);
        assert!(with_toplevel.run_check(Check::W009, &wheel).is_empty());
        let with_pkgtree = WheelChecker::default().with_pkgtree(Directory::root());
        assert!(with_pkgtree.run_check(Check::W009, &wheel).is_empty());
    }

    #[test]
    fn test_w009_single_entry() {
        assert!(run(Check::W009, &[["foo/__init__.py", "", ""], ["foo.pth", "", ""]]).is_empty());
    }

    #[test]
    fn test_w010() {
        let failures = run(
            Check::W010,
            &[
                ["foo/__init__.py", "", ""],
                ["assets/logo.png", "", ""],
                ["foo-stubs/__init__.pyi", "", ""],
                ["deep/a/b/mod.so", "", ""],
                ["empty/", "", ""],
            ],
        );
        assert_eq!(
            failures,
            vec![FailedCheck::with_args(Check::W010, ["assets/", "empty/"])]
        );
    }

    #[test]
    fn test_w101_w102() {
        let wheel = contents_with_root(
            &[
                ["foo/__init__.py", "", ""],
                ["foo/extra.py", "", ""],
                ["foo-1.0.data/purelib/foo/lib.py", "", ""],
            ],
            false,
        );
        let checker = WheelChecker::default().with_pkgtree(pkgtree(&[
            "foo/__init__.py",
            "foo/lib.py",
            "foo/sub/zed.py",
            "foo/missing.py",
            "foo/empty/",
        ]));
        assert_eq!(
            checker.run_check(Check::W101, &wheel),
            vec![FailedCheck::with_args(
                Check::W101,
                ["foo/missing.py", "foo/sub/zed.py"]
            )]
        );
        assert_eq!(
            checker.run_check(Check::W102, &wheel),
            vec![FailedCheck::with_args(Check::W102, ["foo/extra.py"])]
        );
    }

    #[test]
    fn test_w1_inactive_without_pkgtree() {
        let wheel = contents(&[["foo.py", "", ""]]);
        let checker = WheelChecker::default();
        assert!(checker.run_check(Check::W101, &wheel).is_empty());
        assert!(checker.run_check(Check::W102, &wheel).is_empty());
    }

    #[test]
    fn test_w201_w202() {
        let wheel = contents(&[["foo.py", "", ""]]);
        let checker = WheelChecker::default().with_toplevel(["foo.py", "bar/"]);
        assert_eq!(checker.toplevel().unwrap(), ["foo.py", "bar"]);
        assert_eq!(
            checker.run_check(Check::W201, &wheel),
            vec![FailedCheck::with_args(Check::W201, ["bar"])]
        );
        assert!(checker.run_check(Check::W202, &wheel).is_empty());
    }

    #[test]
    fn test_w202_reports_undeclared() {
        let wheel = contents(&[
            ["foo/__init__.py", "", ""],
            ["bar/__init__.py", "", ""],
            ["foo.pth", "", ""],
        ]);
        let checker = WheelChecker::default().with_toplevel(["foo"]);
        assert_eq!(
            checker.run_check(Check::W202, &wheel),
            vec![FailedCheck::with_args(Check::W202, ["bar/"])]
        );
        assert!(WheelChecker::default().run_check(Check::W202, &wheel).is_empty());
    }

    #[test]
    fn test_w1_and_w2_gate_independently() {
        let wheel = contents(&[["foo.py", "", ""], ["bar.py", "", ""]]);
        let checker = WheelChecker::default()
            .with_toplevel(["foo.py"])
            .with_pkgtree(pkgtree(&["foo.py"]));
        let checks: Vec<Check> = checker
            .check_contents(&wheel)
            .into_iter()
            .map(|f| f.check)
            .collect();
        assert_eq!(checks, vec![Check::W102, Check::W202]);
    }
}
