//! Wheel filename parsing.

use crate::error::Result;
use crate::error::WheelError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static WHEEL_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A(?P<project>[A-Za-z0-9](?:[A-Za-z0-9._]*[A-Za-z0-9])?)",
        r"-(?P<version>[A-Za-z0-9_.!+]+)",
        r"(?:-(?P<build>[0-9][\w.]*))?",
        r"-(?P<python_tags>\w+(?:\.\w+)*)",
        r"-(?P<abi_tags>\w+(?:\.\w+)*)",
        r"-(?P<platform_tags>\w+(?:\.\w+)*)",
        r"\.[Ww][Hh][Ll]\z",
    ))
    .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// The components of a wheel filename.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::WheelFilename;
///
/// let name = WheelFilename::parse("foo_bar-1.0-1-py2.py3-none-any.whl").unwrap();
/// assert_eq!(name.project, "foo_bar");
/// assert_eq!(name.version, "1.0");
/// assert_eq!(name.build.as_deref(), Some("1"));
/// assert_eq!(name.python_tags, vec!["py2", "py3"]);
/// assert_eq!(name.dist_info_dir(), "foo_bar-1.0.dist-info");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    /// Project name as spelled in the filename.
    pub project: String,
    /// Version as spelled in the filename.
    pub version: String,
    /// Optional build tag.
    pub build: Option<String>,
    /// Python tags.
    pub python_tags: Vec<String>,
    /// ABI tags.
    pub abi_tags: Vec<String>,
    /// Platform tags.
    pub platform_tags: Vec<String>,
}

impl WheelFilename {
    /// Parses a wheel filename (without any directory part).
    ///
    /// # Errors
    ///
    /// Returns `WheelError::InvalidArchiveName` if `filename` does not follow
    /// the `{project}-{version}(-{build})?-{python}-{abi}-{platform}.whl`
    /// grammar.
    pub fn parse(filename: &str) -> Result<Self> {
        let invalid = || WheelError::InvalidArchiveName {
            filename: filename.to_string(),
        };
        let caps = WHEEL_FILENAME.captures(filename).ok_or_else(invalid)?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
        let tags = |name: &str| -> Vec<String> {
            caps.name(name)
                .map(|m| m.as_str().split('.').map(String::from).collect())
                .unwrap_or_default()
        };

        Ok(Self {
            project: group("project").ok_or_else(invalid)?,
            version: group("version").ok_or_else(invalid)?,
            build: group("build"),
            python_tags: tags("python_tags"),
            abi_tags: tags("abi_tags"),
            platform_tags: tags("platform_tags"),
        })
    }

    /// Expected name of the wheel's `.dist-info` directory.
    #[must_use]
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.project, self.version)
    }

    /// Expected name of the wheel's `.data` directory.
    #[must_use]
    pub fn data_dir(&self) -> String {
        format!("{}-{}.data", self.project, self.version)
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.project, self.version)?;
        if let Some(build) = &self.build {
            write!(f, "-{build}")?;
        }
        write!(
            f,
            "-{}-{}-{}.whl",
            self.python_tags.join("."),
            self.abi_tags.join("."),
            self.platform_tags.join(".")
        )
    }
}
