//! Ordered directory trees of wheel entries.

use crate::error::ConfigError;
use crate::error::Result;
use crate::error::WheelError;
use crate::types::File;
use crate::util::validate_path;
use glob::Pattern;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// A node of a directory tree: either a file or a sub-tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A file (leaf).
    File(File),
    /// A directory (sub-tree).
    Directory(Directory),
}

impl Entry {
    /// Returns `true` if this is a file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Returns the file, if this is one.
    #[must_use]
    pub const fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(file) => Some(file),
            Self::Directory(_) => None,
        }
    }

    /// Returns the directory, if this is one.
    #[must_use]
    pub const fn as_directory(&self) -> Option<&Directory> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Raw path components of the entry.
    #[must_use]
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::File(file) => file.parts().iter().map(String::as_str).collect(),
            Self::Directory(dir) => dir.parts(),
        }
    }

    /// Raw path of the entry; directories carry a trailing `/`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::File(file) => file.path(),
            Self::Directory(dir) => dir.path().unwrap_or_default().to_string(),
        }
    }
}

/// An ordered, name-keyed directory tree.
///
/// Children keep the order in which they were first inserted. The root of a
/// tree has no path; every other directory's path ends with `/`.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::types::Directory;
/// use wheelcheck_core::types::Entry;
/// use wheelcheck_core::types::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tree = Directory::root();
/// tree.add_entry(Entry::File(File::new("foo/bar.py", None, None)?))?;
/// tree.add_entry(Entry::File(File::new("foo/baz.py", None, None)?))?;
///
/// let foo = tree.get("foo").and_then(|e| e.as_directory()).unwrap();
/// assert_eq!(foo.path(), Some("foo/"));
/// assert_eq!(tree.all_files().count(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Directory {
    path: Option<String>,
    entries: Vec<(String, Entry)>,
    index: HashMap<String, usize>,
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.entries == other.entries
    }
}

impl Eq for Directory {}

impl Directory {
    /// Creates an empty tree root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates an empty directory at `path`, which must end with `/`.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::NonNormalizedPath` if `path` is not normalized or
    /// lacks the trailing `/`.
    pub fn new(path: &str) -> Result<Self> {
        validate_path(path)?;
        if !path.ends_with('/') {
            return Err(WheelError::NonNormalizedPath {
                path: path.to_string(),
                issue: crate::error::PathIssue::NonNormalized,
            });
        }
        Ok(Self::at(path.to_string()))
    }

    fn at(path: String) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    /// The directory's path with trailing `/`, or `None` for a root.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The directory's path components; empty for a root.
    #[must_use]
    pub fn parts(&self) -> Vec<&str> {
        self.path
            .as_deref()
            .map(|p| p.trim_end_matches('/').split('/').collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the directory has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if a direct child called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks up a direct child by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Looks up a descendant by its path components relative to this
    /// directory.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, parts: &[S]) -> Option<&Entry> {
        let (last, dirs) = parts.split_last()?;
        let mut current = self;
        for part in dirs {
            current = current.get(part.as_ref())?.as_directory()?;
        }
        current.get(last.as_ref())
    }

    /// Returns `true` if the tree contains a file at the given relative
    /// components.
    #[must_use]
    pub fn contains_file<S: AsRef<str>>(&self, parts: &[S]) -> bool {
        self.lookup(parts).is_some_and(Entry::is_file)
    }

    /// Returns `true` if `path`, relative to this directory, names an
    /// existing entry. A trailing `/` requires the entry to be a directory.
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        let want_dir = path.ends_with('/');
        let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        match self.lookup(&parts) {
            Some(Entry::Directory(_)) => true,
            Some(Entry::File(_)) => !want_dir,
            None => false,
        }
    }

    /// Iterates over direct children in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, e)| (name.as_str(), e))
    }

    /// Iterates over direct child directories in insertion order.
    pub fn subdirectories(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.entries()
            .filter_map(|(name, e)| e.as_directory().map(|d| (name, d)))
    }

    /// Iterates over direct child files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &File)> {
        self.entries()
            .filter_map(|(name, e)| e.as_file().map(|f| (name, f)))
    }

    /// Depth-first iterator over every file beneath this directory.
    ///
    /// Siblings are visited in insertion order and each sub-tree is fully
    /// visited before the next sibling.
    #[must_use]
    pub fn all_files(&self) -> AllFiles<'_> {
        AllFiles {
            stack: vec![self.entries.iter()],
        }
    }

    /// Inserts an entry at its raw path, creating intermediate directories.
    ///
    /// Adding a directory where a directory already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::PathConflict` if an intermediate component is a
    /// file, if the final component already exists and the two are not
    /// both directories, or if the entry does not lie beneath this
    /// directory.
    pub fn add_entry(&mut self, entry: Entry) -> Result<()> {
        let parts: Vec<String> = entry.parts().into_iter().map(String::from).collect();
        let prefix_len = self.parts().len();
        let conflict = |path: String| WheelError::PathConflict { path };

        if parts.len() <= prefix_len
            || self
                .parts()
                .iter()
                .zip(&parts)
                .any(|(a, b)| *a != b.as_str())
        {
            return Err(conflict(entry.path()));
        }

        let (basename, dirs) = parts[prefix_len..]
            .split_last()
            .ok_or_else(|| conflict(entry.path()))?;

        let mut current = self;
        for (i, part) in dirs.iter().enumerate() {
            let this_path = parts[..=prefix_len + i].join("/");
            let existing = current.index.get(part.as_str()).copied();
            let idx = match existing {
                Some(idx) => idx,
                None => current.push(
                    part.clone(),
                    Entry::Directory(Self::at(format!("{this_path}/"))),
                ),
            };
            current = match &mut current.entries[idx].1 {
                Entry::Directory(dir) => dir,
                Entry::File(_) => return Err(conflict(this_path)),
            };
        }

        match (current.get(basename).map(Entry::is_directory), entry.is_directory()) {
            (None, _) => {
                current.push(basename.clone(), entry);
                Ok(())
            }
            (Some(true), true) => Ok(()),
            (Some(_), _) => Err(conflict(entry.path().trim_end_matches('/').to_string())),
        }
    }

    /// Inserts a direct child under `name`, failing if the name is taken.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::PathConflict` if `name` already exists.
    pub fn insert_child(&mut self, name: &str, entry: Entry) -> Result<()> {
        if self.contains(name) {
            return Err(WheelError::PathConflict {
                path: name.to_string(),
            });
        }
        self.push(name.to_string(), entry);
        Ok(())
    }

    fn push(&mut self, name: String, entry: Entry) -> usize {
        let idx = self.entries.len();
        self.index.insert(name.clone(), idx);
        self.entries.push((name, entry));
        idx
    }

    /// Returns a root directory holding the direct children of this one
    /// except those named in `exclude`.
    pub(crate) fn without(&self, exclude: &[&str]) -> Self {
        let mut dir = Self::root();
        for (name, entry) in &self.entries {
            if !exclude.contains(&name.as_str()) {
                dir.push(name.clone(), entry.clone());
            }
        }
        dir
    }

    /// Builds a comparison tree from a local file or directory.
    ///
    /// With `include_root`, the path's own name becomes the single top-level
    /// entry; otherwise a directory's children become the top-level
    /// entries. Any file or directory whose name matches one of `exclude`
    /// is skipped, and excluded directories are not descended into.
    /// Children are visited in file-name order. Files carry no size or
    /// fingerprint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoSuchPath` if `path` does not exist and
    /// `ConfigError::Traversal` if walking the tree fails.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use wheelcheck_core::types::Directory;
    /// use std::path::Path;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let tree = Directory::from_local_tree(Path::new("src/foo"), &[], true)?;
    /// assert!(tree.contains("foo"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_local_tree(
        path: &Path,
        exclude: &[Pattern],
        include_root: bool,
    ) -> std::result::Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NoSuchPath {
                path: path.to_path_buf(),
            });
        }
        let traversal = |message: String| ConfigError::Traversal {
            path: path.to_path_buf(),
            message,
        };

        let root_name = path
            .canonicalize()
            .map_err(|e| traversal(e.to_string()))?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let is_dir = path.is_dir();
        let mut tree = Self::root();

        let walker = WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !exclude.iter().any(|p| p.matches(&e.file_name().to_string_lossy()))
            });

        for dent in walker {
            let dent = dent.map_err(|e| traversal(e.to_string()))?;
            let rel = dent
                .path()
                .strip_prefix(path)
                .map_err(|e| traversal(e.to_string()))?;

            let mut parts: Vec<String> = Vec::new();
            if include_root || !is_dir {
                match &root_name {
                    Some(name) => parts.push(name.clone()),
                    None => return Err(traversal("path has no file name".to_string())),
                }
            }
            parts.extend(rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()));
            if parts.is_empty() {
                continue;
            }

            let entry = if dent.file_type().is_dir() {
                Entry::Directory(Self::at(format!("{}/", parts.join("/"))))
            } else {
                Entry::File(File::from_parts(parts, None, None))
            };
            tree.add_entry(entry).map_err(|e| traversal(e.to_string()))?;
        }
        Ok(tree)
    }
}

/// Depth-first iterator returned by [`Directory::all_files`].
#[derive(Debug)]
pub struct AllFiles<'a> {
    stack: Vec<std::slice::Iter<'a, (String, Entry)>>,
}

impl<'a> Iterator for AllFiles<'a> {
    type Item = &'a File;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some((_, Entry::File(file))) => return Some(file),
                Some((_, Entry::Directory(dir))) => self.stack.push(dir.entries.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
