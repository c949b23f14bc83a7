//! Name and path helpers shared by the content model and the checks.

use crate::error::PathIssue;
use crate::error::Result;
use crate::error::WheelError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use regex::Regex;
use sha2::Digest;
use sha2::Sha256;
use std::sync::LazyLock;
use unicode_ident::is_xid_continue;
use unicode_ident::is_xid_start;

const PROJECT_RE: &str = r"[A-Za-z0-9](?:[A-Za-z0-9._]*[A-Za-z0-9])?";
const VERSION_RE: &str = r"[A-Za-z0-9_.!+]+";

static DIST_INFO_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\A(?P<project>{PROJECT_RE})-(?P<version>{VERSION_RE})\.dist-info\z"))
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

static DATA_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\A(?P<project>{PROJECT_RE})-(?P<version>{VERSION_RE})\.data\z"))
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

// Public version grammar, including the alternate spellings it normalizes.
static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \A\s*
        v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:
            [-_.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?:
            -(?P<post_n1>[0-9]+)
            |
            [-_.]?
            (?P<post_l>post|rev|r)
            [-_.]?
            (?P<post_n2>[0-9]+)?
        )?
        (?:
            [-_.]?
            (?P<dev_l>dev)
            [-_.]?
            (?P<dev_n>[0-9]+)?
        )?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*\z",
    )
    .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").unwrap_or_else(|e| unreachable!("static regex: {e}")));

/// Python's reserved keywords, sorted.
const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Returns the module name of a Python module filename, or `None` if the
/// filename does not have a module extension.
///
/// Recognized forms are `*.py`, `*.pyd`, `*.so` and `*.<tag>.pyd` /
/// `*.<tag>.so`, where `<tag>` is made of ASCII letters, digits, `-` and
/// `_`. At least one character must precede the extension, and matching is
/// case-sensitive.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::module_basename;
///
/// assert_eq!(module_basename("foo.py"), Some("foo"));
/// assert_eq!(module_basename("_ffi.abi3.so"), Some("_ffi"));
/// assert_eq!(module_basename("ext.cp39-win_amd64.pyd"), Some("ext"));
/// assert_eq!(module_basename("extra.ext.py"), Some("extra.ext"));
/// assert_eq!(module_basename(".py"), None);
/// assert_eq!(module_basename("README.rst"), None);
/// ```
#[must_use]
pub fn module_basename(name: &str) -> Option<&str> {
    let stem = if let Some(stem) = name.strip_suffix(".py") {
        stem
    } else {
        let stem = name
            .strip_suffix(".so")
            .or_else(|| name.strip_suffix(".pyd"))?;
        match stem.rsplit_once('.') {
            Some((base, tag)) if !base.is_empty() && is_extension_tag(tag) => base,
            _ => stem,
        }
    };
    if stem.is_empty() { None } else { Some(stem) }
}

fn is_extension_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Returns `true` if `name` has a Python module file extension.
#[must_use]
pub fn has_module_ext(name: &str) -> bool {
    module_basename(name).is_some()
}

/// Returns `true` if `s` is a Python keyword.
#[must_use]
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.binary_search(&s).is_ok()
}

/// Returns `true` if `s` is a valid Python identifier that is not a keyword.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::is_identifier;
///
/// assert!(is_identifier("foo_bar"));
/// assert!(is_identifier("_private2"));
/// assert!(!is_identifier("2fast"));
/// assert!(!is_identifier("foo-bar"));
/// assert!(!is_identifier("class"));
/// ```
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || is_xid_start(first)) && chars.all(is_xid_continue) && !is_keyword(s)
}

/// Returns `true` if `name` is a stub-only package directory name such as
/// `foo-stubs`.
#[must_use]
pub fn is_stubs_dir(name: &str) -> bool {
    name.strip_suffix("-stubs").is_some_and(is_identifier)
}

/// Returns `true` if `name` is a file named like `X.pth`.
#[must_use]
pub fn is_pth_file(name: &str) -> bool {
    name.len() > ".pth".len() && name.ends_with(".pth")
}

/// Returns `true` if `name` looks like a `.dist-info` directory name.
#[must_use]
pub fn is_dist_info_dir(name: &str) -> bool {
    DIST_INFO_DIR.is_match(name)
}

/// Returns `true` if `name` looks like a `.data` directory name.
#[must_use]
pub fn is_data_dir(name: &str) -> bool {
    DATA_DIR.is_match(name)
}

/// Splits a `.dist-info` or `.data` directory name into its project and
/// version parts.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::split_metadata_dir;
///
/// assert_eq!(
///     split_metadata_dir("foo_bar-1.0.dist-info"),
///     Some(("foo_bar", "1.0"))
/// );
/// assert_eq!(split_metadata_dir("foo-1.0.data"), Some(("foo", "1.0")));
/// assert_eq!(split_metadata_dir("foo"), None);
/// ```
#[must_use]
pub fn split_metadata_dir(name: &str) -> Option<(&str, &str)> {
    let caps = DIST_INFO_DIR
        .captures(name)
        .or_else(|| DATA_DIR.captures(name))?;
    Some((caps.name("project")?.as_str(), caps.name("version")?.as_str()))
}

/// Normalizes a project name: lowercase, with runs of `-`, `_` and `.`
/// collapsed to a single `-`.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::canonicalize_name;
///
/// assert_eq!(canonicalize_name("Foo_Bar"), "foo-bar");
/// assert_eq!(canonicalize_name("zope.interface"), "zope-interface");
/// assert_eq!(canonicalize_name("a--_b"), "a-b");
/// ```
#[must_use]
pub fn canonicalize_name(name: &str) -> String {
    NAME_SEPARATORS
        .replace_all(&name.to_ascii_lowercase(), "-")
        .into_owned()
}

/// Normalizes a version string for equality comparison.
///
/// `_` is read as `-` first, since wheel filenames escape `-` that way.
/// A valid version is then reduced to its canonical form: a nonzero epoch,
/// the release with leading zeros and trailing `.0` segments removed,
/// `a`/`b`/`rc` pre-releases, `.postN`, `.devN` and a dot-separated,
/// lowercase local part. Alternate spellings (`alpha`, `preview`, `rev`,
/// `1.0-1`, implicit numbers) fold onto the same form. A string that is
/// not a valid version is returned unchanged apart from the `_` swap.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::canonicalize_version;
///
/// assert_eq!(canonicalize_version("1.0"), canonicalize_version("1"));
/// assert_eq!(canonicalize_version("v01.2.0"), "1.2");
/// assert_eq!(canonicalize_version("1.0RC1"), "1rc1");
/// assert_eq!(canonicalize_version("1.0_1"), "1.post1");
/// assert_eq!(canonicalize_version("1.0.post1"), "1.post1");
/// ```
#[must_use]
pub fn canonicalize_version(version: &str) -> String {
    let version = version.replace('_', "-");
    normal_version(&version).unwrap_or(version)
}

fn normal_version(version: &str) -> Option<String> {
    let caps = VERSION.captures(version)?;
    let number = |name: &str| {
        caps.name(name)
            .map_or(0, |m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
    };

    let mut out = String::new();
    if number("epoch") != 0 {
        out.push_str(&format!("{}!", number("epoch")));
    }

    let mut release: Vec<String> = caps
        .name("release")
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split('.')
        .map(trim_leading_zeros)
        .collect();
    while release.len() > 1 && release.last().is_some_and(|s| s == "0") {
        release.pop();
    }
    out.push_str(&release.join("."));

    if let Some(label) = caps.name("pre_l") {
        let label = match label.as_str().to_ascii_lowercase().as_str() {
            "alpha" | "a" => "a",
            "beta" | "b" => "b",
            _ => "rc",
        };
        out.push_str(&format!("{label}{}", number("pre_n")));
    }
    if caps.name("post_n1").is_some() {
        out.push_str(&format!(".post{}", number("post_n1")));
    } else if caps.name("post_l").is_some() {
        out.push_str(&format!(".post{}", number("post_n2")));
    }
    if caps.name("dev_l").is_some() {
        out.push_str(&format!(".dev{}", number("dev_n")));
    }
    if let Some(local) = caps.name("local") {
        let parts: Vec<String> = local
            .as_str()
            .to_ascii_lowercase()
            .split(['-', '_', '.'])
            .map(|part| {
                if part.bytes().all(|b| b.is_ascii_digit()) {
                    trim_leading_zeros(part)
                } else {
                    part.to_string()
                }
            })
            .collect();
        out.push('+');
        out.push_str(&parts.join("."));
    }
    Some(out)
}

fn trim_leading_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }.to_string()
}

/// Checks that a RECORD path is relative and normalized.
///
/// Directory paths may carry a single trailing `/`.
///
/// # Errors
///
/// Returns `WheelError::NonNormalizedPath` if the path is absolute, empty,
/// contains `//`, or has a `.` or `..` component.
pub fn validate_path(path: &str) -> Result<()> {
    let issue = if path.starts_with('/') {
        Some(PathIssue::Absolute)
    } else if path.is_empty() {
        Some(PathIssue::Empty)
    } else if path.contains("//")
        || path
            .trim_end_matches('/')
            .split('/')
            .any(|part| part == "." || part == "..")
    {
        Some(PathIssue::NonNormalized)
    } else {
        None
    };
    match issue {
        Some(issue) => Err(WheelError::NonNormalizedPath {
            path: path.to_string(),
            issue,
        }),
        None => Ok(()),
    }
}

/// Splits a comma-separated string, trimming whitespace and dropping empty
/// items.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::comma_split;
///
/// assert_eq!(comma_split(" W001, W002 ,,"), vec!["W001", "W002"]);
/// assert!(comma_split("").is_empty());
/// ```
#[must_use]
pub fn comma_split(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Computes the RECORD-style fingerprint of `data`: `sha256=` followed by
/// the unpadded URL-safe base64 SHA-256 digest.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::util::digest_fingerprint;
///
/// assert_eq!(
///     digest_fingerprint(b""),
///     "sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
/// );
/// ```
#[must_use]
pub fn digest_fingerprint(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("sha256={}", URL_SAFE_NO_PAD.encode(digest))
}
