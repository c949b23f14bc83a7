//! The check catalogue and failure records.

use crate::error::ConfigError;
use crate::util::comma_split;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A check in the fixed catalogue.
///
/// Variants are ordered by identifier, which is also the order checks are
/// evaluated and reported in. `W0xx` checks are general, `W1xx` checks
/// compare against a package tree, and `W2xx` checks compare against
/// declared top-level names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Check {
    /// Wheel contains .pyc/.pyo files
    W001,
    /// Wheel contains duplicate files
    W002,
    /// Wheel contains non-module at library toplevel
    W003,
    /// Module is not located at importable path
    W004,
    /// Wheel contains common toplevel name in library
    W005,
    /// __init__.py at top level of library
    W006,
    /// Wheel library is empty
    W007,
    /// Wheel is empty
    W008,
    /// Wheel contains multiple toplevel library entries
    W009,
    /// Toplevel library directory contains no Python modules
    W010,
    /// Wheel library is missing files in package tree
    W101,
    /// Wheel library contains files not in package tree
    W102,
    /// Wheel library is missing specified toplevel entry
    W201,
    /// Wheel library has undeclared toplevel entry
    W202,
}

impl Check {
    /// Every check, in identifier order.
    pub const ALL: [Self; 14] = [
        Self::W001,
        Self::W002,
        Self::W003,
        Self::W004,
        Self::W005,
        Self::W006,
        Self::W007,
        Self::W008,
        Self::W009,
        Self::W010,
        Self::W101,
        Self::W102,
        Self::W201,
        Self::W202,
    ];

    /// The check's identifier, e.g. `"W001"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::W001 => "W001",
            Self::W002 => "W002",
            Self::W003 => "W003",
            Self::W004 => "W004",
            Self::W005 => "W005",
            Self::W006 => "W006",
            Self::W007 => "W007",
            Self::W008 => "W008",
            Self::W009 => "W009",
            Self::W010 => "W010",
            Self::W101 => "W101",
            Self::W102 => "W102",
            Self::W201 => "W201",
            Self::W202 => "W202",
        }
    }

    /// The check's one-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::W001 => "Wheel contains .pyc/.pyo files",
            Self::W002 => "Wheel contains duplicate files",
            Self::W003 => "Wheel contains non-module at library toplevel",
            Self::W004 => "Module is not located at importable path",
            Self::W005 => "Wheel contains common toplevel name in library",
            Self::W006 => "__init__.py at top level of library",
            Self::W007 => "Wheel library is empty",
            Self::W008 => "Wheel is empty",
            Self::W009 => "Wheel contains multiple toplevel library entries",
            Self::W010 => "Toplevel library directory contains no Python modules",
            Self::W101 => "Wheel library is missing files in package tree",
            Self::W102 => "Wheel library contains files not in package tree",
            Self::W201 => "Wheel library is missing specified toplevel entry",
            Self::W202 => "Wheel library has undeclared toplevel entry",
        }
    }

    /// The whole catalogue as a set.
    #[must_use]
    pub fn all() -> BTreeSet<Self> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the checks whose identifiers start with `prefix`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownCheck` if `prefix` is empty or matches no
/// check.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::Check;
/// use wheelcheck_core::checks::parse_check_prefix;
///
/// let checks = parse_check_prefix("W1").unwrap();
/// assert_eq!(checks.into_iter().collect::<Vec<_>>(), vec![Check::W101, Check::W102]);
/// assert!(parse_check_prefix("W3").is_err());
/// ```
pub fn parse_check_prefix(prefix: &str) -> Result<BTreeSet<Check>, ConfigError> {
    let checks: BTreeSet<Check> = if prefix.is_empty() {
        BTreeSet::new()
    } else {
        Check::ALL
            .into_iter()
            .filter(|c| c.name().starts_with(prefix))
            .collect()
    };
    if checks.is_empty() {
        return Err(ConfigError::UnknownCheck(prefix.to_string()));
    }
    Ok(checks)
}

/// Returns the union of the checks selected by each prefix.
///
/// # Errors
///
/// Returns the first `ConfigError::UnknownCheck` encountered.
pub fn parse_check_prefixes<I, S>(prefixes: I) -> Result<BTreeSet<Check>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut checks = BTreeSet::new();
    for prefix in prefixes {
        checks.extend(parse_check_prefix(prefix.as_ref())?);
    }
    Ok(checks)
}

/// Parses a comma-separated list of check names and prefixes.
///
/// # Errors
///
/// Returns `ConfigError::UnknownCheck` for an unknown prefix.
pub fn parse_checks_string(s: &str) -> Result<BTreeSet<Check>, ConfigError> {
    parse_check_prefixes(comma_split(s))
}

/// A failed check together with the paths it concerns.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::Check;
/// use wheelcheck_core::FailedCheck;
///
/// let failure = FailedCheck::with_args(Check::W001, ["foo.pyc"]);
/// assert_eq!(
///     failure.show(Some("foo-1.0-py3-none-any.whl")),
///     "foo-1.0-py3-none-any.whl: W001: Wheel contains .pyc/.pyo files:\n  foo.pyc"
/// );
/// assert_eq!(FailedCheck::new(Check::W008).show(None), "W008: Wheel is empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCheck {
    /// The check that failed.
    pub check: Check,
    /// Offending paths, possibly empty.
    pub args: Vec<String>,
}

impl FailedCheck {
    /// Creates a failure without paths.
    #[must_use]
    pub const fn new(check: Check) -> Self {
        Self {
            check,
            args: Vec::new(),
        }
    }

    /// Creates a failure listing `args`.
    #[must_use]
    pub fn with_args<I, S>(check: Check, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            check,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the failure, optionally prefixed by the wheel's name.
    #[must_use]
    pub fn show(&self, filename: Option<&str>) -> String {
        let mut s = String::new();
        if let Some(filename) = filename {
            s.push_str(filename);
            s.push_str(": ");
        }
        s.push_str(&self.to_string());
        s
    }
}

impl fmt::Display for FailedCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.check, self.check.description())?;
        if !self.args.is_empty() {
            f.write_str(":")?;
            for arg in &self.args {
                write!(f, "\n  {arg}")?;
            }
        }
        Ok(())
    }
}
