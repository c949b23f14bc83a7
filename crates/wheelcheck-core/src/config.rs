//! Checker configuration.
//!
//! A [`Configuration`] collects the raw option values from a configuration
//! file and from the command line. Sources are merged with
//! [`Configuration::update`], where set values in the newer source win, and
//! the result is turned into a [`WheelChecker`] with
//! [`Configuration::into_checker`].

use crate::checker::WheelChecker;
use crate::checks::Check;
use crate::checks::parse_check_prefixes;
use crate::error::ConfigError;
use crate::types::Directory;
use crate::util::comma_split;
use glob::Pattern;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;

/// Files searched for configuration, in descending order of preference.
pub const CONFIG_FILES: [&str; 3] = [
    "pyproject.toml",
    "check-wheel-contents.toml",
    ".check-wheel-contents.toml",
];

/// Name of the configuration table.
pub const CONFIG_SECTION: &str = "check-wheel-contents";

/// Default exclusion patterns for traversing `--package` and `--src-dir`.
pub const TRAVERSAL_EXCLUSIONS: [&str; 6] = [".*", "CVS", "RCS", "*.pyc", "*.pyo", "*.egg-info"];

/// A configuration value given either as a comma-separated string or as a
/// list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    Joined(String),
    Items(Vec<String>),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Joined(s) => comma_split(&s),
            Self::Items(items) => items,
        }
    }
}

/// Raw checker configuration values; `None` means "not specified".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    /// Selected checks.
    pub select: Option<BTreeSet<Check>>,
    /// Ignored checks.
    pub ignore: Option<BTreeSet<Check>>,
    /// Expected top-level library names, without trailing `/`.
    pub toplevel: Option<Vec<String>>,
    /// Paths whose own names become top-level package tree entries.
    pub package_paths: Option<Vec<PathBuf>>,
    /// Directories whose children become top-level package tree entries.
    pub src_dirs: Option<Vec<PathBuf>>,
    /// Exclusion patterns used while traversing package paths.
    pub package_omit: Option<Vec<String>>,
}

impl Configuration {
    /// Sets the expected top-level names, stripping trailing `/`.
    #[must_use]
    pub fn with_toplevel<I, S>(mut self, toplevel: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.toplevel = Some(
            toplevel
                .into_iter()
                .map(|t| t.as_ref().trim_end_matches('/').to_string())
                .collect(),
        );
        self
    }

    /// Reads configuration from `path`, or from the first configuration file
    /// found between the current directory and the filesystem root.
    ///
    /// Returns the default configuration if no file provides a
    /// configuration table.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a file cannot be read or holds invalid
    /// values.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, ConfigError> {
        let found = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
                    path: PathBuf::from("."),
                    source,
                })?;
                Self::find_default(&cwd)?
            }
        };
        Ok(found.unwrap_or_default())
    }

    /// Searches `start` and its ancestors for a configuration file.
    ///
    /// The search stops at the first directory containing any of
    /// [`CONFIG_FILES`], even if none of them has a configuration table.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a found file is invalid.
    pub fn find_default(start: &Path) -> Result<Option<Self>, ConfigError> {
        for dir in start.ancestors() {
            let found: Vec<PathBuf> = CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .filter(|p| p.is_file())
                .collect();
            if found.is_empty() {
                continue;
            }
            for path in found {
                if let Some(cfg) = Self::from_file(&path)? {
                    return Ok(Some(cfg));
                }
            }
            return Ok(None);
        }
        Ok(None)
    }

    /// Reads the configuration table from one TOML file.
    ///
    /// In `pyproject.toml` the table is `[tool.check-wheel-contents]`; in any
    /// other file it is `[check-wheel-contents]`. Returns `None` if the file
    /// has no such table.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed, if the
    /// section is not a table, or if any value is invalid.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc: toml::Table = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let is_pyproject = path.file_name().is_some_and(|n| n == "pyproject.toml");
        let (key, section) = if is_pyproject {
            let section = match doc.remove("tool") {
                Some(toml::Value::Table(mut tool)) => tool.remove(CONFIG_SECTION),
                _ => None,
            };
            (format!("tool.{CONFIG_SECTION}"), section)
        } else {
            (CONFIG_SECTION.to_string(), doc.remove(CONFIG_SECTION))
        };

        match section {
            None => Ok(None),
            Some(toml::Value::Table(table)) => {
                debug!(path = %path.display(), "read configuration file");
                Self::from_table(path, &table).map(Some)
            }
            Some(_) => Err(ConfigError::InvalidValue {
                path: path.to_path_buf(),
                key,
                message: "not a table".to_string(),
            }),
        }
    }

    /// Builds a configuration from an already parsed table.
    ///
    /// Relative `package` and `src_dir` paths are resolved against the
    /// directory containing `configpath`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for values of the wrong type,
    /// unknown check prefixes, and missing paths.
    pub fn from_table(configpath: &Path, table: &toml::Table) -> Result<Self, ConfigError> {
        let reader = TableReader { configpath, table };
        let toplevel = reader.comma_list("toplevel")?;
        Ok(Self {
            select: reader.check_set("select")?,
            ignore: reader.check_set("ignore")?,
            toplevel: toplevel
                .map(|t| t.into_iter().map(|n| n.trim_end_matches('/').to_string()).collect()),
            package_paths: reader.path_list("package", false)?,
            src_dirs: reader.path_list("src_dir", true)?,
            package_omit: reader.comma_list("package_omit")?,
        })
    }

    /// Overwrites every field that is set in `other`.
    pub fn update(&mut self, other: Self) {
        if other.select.is_some() {
            self.select = other.select;
        }
        if other.ignore.is_some() {
            self.ignore = other.ignore;
        }
        if other.toplevel.is_some() {
            self.toplevel = other.toplevel;
        }
        if other.package_paths.is_some() {
            self.package_paths = other.package_paths;
        }
        if other.src_dirs.is_some() {
            self.src_dirs = other.src_dirs;
        }
        if other.package_omit.is_some() {
            self.package_omit = other.package_omit;
        }
    }

    /// The final check selection: `select` (default: every check) minus
    /// `ignore`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelcheck_core::Check;
    /// use wheelcheck_core::Configuration;
    ///
    /// let cfg = Configuration {
    ///     ignore: Some([Check::W001].into_iter().collect()),
    ///     ..Configuration::default()
    /// };
    /// let selected = cfg.selected_checks();
    /// assert_eq!(selected.len(), 13);
    /// assert!(!selected.contains(&Check::W001));
    /// ```
    #[must_use]
    pub fn selected_checks(&self) -> BTreeSet<Check> {
        let mut selected = self.select.clone().unwrap_or_else(Check::all);
        if let Some(ignore) = &self.ignore {
            selected.retain(|c| !ignore.contains(c));
        }
        selected
    }

    /// Builds the combined package tree from `package_paths` and
    /// `src_dirs`, or `None` if neither is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateToplevel` if two sources contribute the
    /// same top-level name, `ConfigError::InvalidPattern` for a bad omit
    /// pattern, and any traversal error.
    pub fn package_tree(&self) -> Result<Option<Directory>, ConfigError> {
        if self.package_paths.is_none() && self.src_dirs.is_none() {
            return Ok(None);
        }
        let exclude = self.omit_patterns()?;
        let mut tree = Directory::root();
        let sources = self
            .package_paths
            .iter()
            .flatten()
            .map(|p| ("--package", p, true))
            .chain(self.src_dirs.iter().flatten().map(|p| ("--src-dir", p, false)));

        for (option, path, include_root) in sources {
            if !include_root && path.exists() && !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
            let subtree = Directory::from_local_tree(path, &exclude, include_root)?;
            for (name, entry) in subtree.entries() {
                tree.insert_child(name, entry.clone())
                    .map_err(|_| ConfigError::DuplicateToplevel {
                        option,
                        path: path.clone(),
                        name: name.to_string(),
                    })?;
            }
        }
        debug!(entries = tree.len(), "built package tree");
        Ok(Some(tree))
    }

    fn omit_patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        let patterns: Vec<&str> = match &self.package_omit {
            Some(omit) => omit.iter().map(String::as_str).collect(),
            None => TRAVERSAL_EXCLUSIONS.to_vec(),
        };
        patterns
            .into_iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| ConfigError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect()
    }

    /// Creates the checker described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns any error raised while building the package tree.
    pub fn into_checker(self) -> Result<WheelChecker, ConfigError> {
        let pkgtree = self.package_tree()?;
        let mut checker = WheelChecker::new(self.selected_checks());
        if let Some(toplevel) = self.toplevel {
            checker = checker.with_toplevel(toplevel);
        }
        if let Some(pkgtree) = pkgtree {
            checker = checker.with_pkgtree(pkgtree);
        }
        Ok(checker)
    }
}

struct TableReader<'a> {
    configpath: &'a Path,
    table: &'a toml::Table,
}

impl TableReader<'_> {
    fn invalid(&self, key: &str, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            path: self.configpath.to_path_buf(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    fn comma_list(&self, key: &str) -> Result<Option<Vec<String>>, ConfigError> {
        let Some(value) = self.table.get(key) else {
            return Ok(None);
        };
        value
            .clone()
            .try_into::<StringList>()
            .map(|list| Some(list.into_vec()))
            .map_err(|_| self.invalid(key, "value must be comma-separated string or list of strings"))
    }

    fn check_set(&self, key: &str) -> Result<Option<BTreeSet<Check>>, ConfigError> {
        match self.comma_list(key)? {
            Some(items) => parse_check_prefixes(items)
                .map(Some)
                .map_err(|e| self.invalid(key, e.to_string())),
            None => Ok(None),
        }
    }

    fn path_list(&self, key: &str, require_dir: bool) -> Result<Option<Vec<PathBuf>>, ConfigError> {
        let Some(items) = self.comma_list(key)? else {
            return Ok(None);
        };
        let base = self
            .configpath
            .canonicalize()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let mut paths = Vec::with_capacity(items.len());
        for item in items {
            let path = base.join(item);
            if !path.exists() {
                return Err(self.invalid(
                    key,
                    format!("no such file or directory: '{}'", path.display()),
                ));
            }
            if require_dir && !path.is_dir() {
                return Err(self.invalid(key, format!("not a directory: '{}'", path.display())));
            }
            paths.push(path);
        }
        Ok(Some(paths))
    }
}
