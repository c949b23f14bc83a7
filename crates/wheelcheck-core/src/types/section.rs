//! Wheel sections and path classification.

use std::fmt;

/// The logical section of a wheel an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Pure-Python library code.
    Purelib,
    /// Platform-specific library code.
    Platlib,
    /// Anything else under the `.data` directory (scripts, headers, data).
    MiscData,
    /// The `.dist-info` metadata directory.
    DistInfo,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Purelib => "purelib",
            Self::Platlib => "platlib",
            Self::MiscData => "data",
            Self::DistInfo => "dist-info",
        };
        f.write_str(name)
    }
}

/// Classifies a raw wheel path into its section and library-relative path.
///
/// Paths under `{data_dir}/purelib/` or `{data_dir}/platlib/` (with at least
/// one component beyond) belong to that library section. Everything else
/// under `data_dir` is [`Section::MiscData`], everything under
/// `dist_info_dir` is [`Section::DistInfo`], and all remaining paths belong
/// to the root library section selected by `root_is_purelib`.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::types::Section;
/// use wheelcheck_core::types::classify_path;
///
/// let parts: Vec<String> = ["foo-1.0.data", "platlib", "foo", "_x.so"]
///     .iter()
///     .map(|s| s.to_string())
///     .collect();
/// let (section, lib) = classify_path(&parts, "foo-1.0.dist-info", "foo-1.0.data", true);
/// assert_eq!(section, Section::Platlib);
/// assert_eq!(lib.unwrap(), ["foo", "_x.so"]);
/// ```
#[must_use]
pub fn classify_path<'a>(
    parts: &'a [String],
    dist_info_dir: &str,
    data_dir: &str,
    root_is_purelib: bool,
) -> (Section, Option<&'a [String]>) {
    match parts {
        [first, lib, rest @ ..] if first == data_dir && !rest.is_empty() && lib == "purelib" => {
            (Section::Purelib, Some(rest))
        }
        [first, lib, rest @ ..] if first == data_dir && !rest.is_empty() && lib == "platlib" => {
            (Section::Platlib, Some(rest))
        }
        [first, ..] if first == data_dir => (Section::MiscData, None),
        [first, ..] if first == dist_info_dir => (Section::DistInfo, None),
        _ if root_is_purelib => (Section::Purelib, Some(parts)),
        _ => (Section::Platlib, Some(parts)),
    }
}
