//! File entries and content signatures.

use crate::error::Result;
use crate::error::WheelError;
use crate::util::digest_fingerprint;
use crate::util::is_identifier;
use crate::util::module_basename;
use crate::util::validate_path;
use std::fmt;

/// The `(size, fingerprint)` pair used to detect duplicate file content.
///
/// Two files with equal signatures are assumed to have identical content.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::types::Signature;
///
/// let sig = Signature::of_bytes(b"");
/// assert_eq!(sig.size, Some(0));
/// assert_eq!(
///     sig.hashsum.as_deref(),
///     Some("sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    /// File size in bytes, if recorded.
    pub size: Option<u64>,
    /// RECORD fingerprint (`algorithm=digest`), if recorded.
    pub hashsum: Option<String>,
}

impl Signature {
    /// Creates a signature from its parts.
    #[must_use]
    pub const fn new(size: Option<u64>, hashsum: Option<String>) -> Self {
        Self { size, hashsum }
    }

    /// The signature of a file whose size and fingerprint are both unknown.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new(None, None)
    }

    /// Computes the signature RECORD would carry for a file holding `data`.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self::new(Some(data.len() as u64), Some(digest_fingerprint(data)))
    }
}

/// A file (leaf) in a wheel's file tree.
///
/// A `File` knows its raw path inside the archive and, when it lies inside
/// the purelib or platlib section, where its library-relative path starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    parts: Vec<String>,
    size: Option<u64>,
    hashsum: Option<String>,
    lib_offset: Option<usize>,
}

impl File {
    /// Creates a file at `path` whose library-relative path equals its raw
    /// path.
    ///
    /// This is the form used for comparison trees built from local source
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::NonNormalizedPath` if `path` is not a normalized
    /// relative path, or if it ends with `/`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelcheck_core::types::File;
    ///
    /// let file = File::new("foo/bar.py", Some(10), None).unwrap();
    /// assert_eq!(file.path(), "foo/bar.py");
    /// assert_eq!(file.name(), "bar.py");
    /// assert!(file.is_valid_module_path());
    /// ```
    pub fn new(path: &str, size: Option<u64>, hashsum: Option<String>) -> Result<Self> {
        validate_path(path)?;
        if path.ends_with('/') {
            return Err(WheelError::NonNormalizedPath {
                path: path.to_string(),
                issue: crate::error::PathIssue::NonNormalized,
            });
        }
        Ok(Self::from_parts(
            path.split('/').map(String::from).collect(),
            size,
            hashsum,
        ))
    }

    /// Creates a file from already validated path components.
    pub(crate) fn from_parts(parts: Vec<String>, size: Option<u64>, hashsum: Option<String>) -> Self {
        Self {
            parts,
            size,
            hashsum,
            lib_offset: Some(0),
        }
    }

    /// Parses a RECORD row of the form `[path, hashsum, size]`.
    ///
    /// The returned file has no library-relative path; the content model
    /// assigns one after classifying the path.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::MalformedManifestRow` if the row does not have
    /// three fields, `WheelError::InvalidManifestSize` if the size is not an
    /// integer, and `WheelError::NonNormalizedPath` for bad paths.
    pub fn from_record_row(row: &[String]) -> Result<Self> {
        let [path, hashsum, size] = row else {
            return Err(WheelError::MalformedManifestRow { row: row.to_vec() });
        };
        let size = if size.is_empty() {
            None
        } else {
            Some(
                size.parse::<u64>()
                    .map_err(|_| WheelError::InvalidManifestSize {
                        path: path.clone(),
                        size: size.clone(),
                    })?,
            )
        };
        let mut file = Self::new(path, size, (!hashsum.is_empty()).then(|| hashsum.clone()))?;
        file.lib_offset = None;
        Ok(file)
    }

    /// Sets where the library-relative path starts within the raw path.
    pub(crate) fn set_library_offset(&mut self, offset: Option<usize>) {
        self.lib_offset = offset.filter(|&o| o < self.parts.len());
    }

    /// Raw path components.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Raw path, joined with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        self.parts.join("/")
    }

    /// The last path component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.parts.last().map_or("", String::as_str)
    }

    /// Recorded size, if any.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    /// Recorded fingerprint, if any.
    #[must_use]
    pub fn hashsum(&self) -> Option<&str> {
        self.hashsum.as_deref()
    }

    /// The file's `(size, fingerprint)` signature.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::new(self.size, self.hashsum.clone())
    }

    /// Path components relative to the purelib or platlib root containing
    /// the file, or `None` if the file lies in neither.
    #[must_use]
    pub fn libparts(&self) -> Option<&[String]> {
        self.lib_offset.map(|offset| &self.parts[offset..])
    }

    /// The extension of the last component including its leading dot, or
    /// an empty string.
    ///
    /// Leading dots of the name do not start an extension, so `.bashrc` has
    /// none.
    #[must_use]
    pub fn extension(&self) -> &str {
        let name = self.name();
        let stem_start = name.len() - name.trim_start_matches('.').len();
        match name[stem_start..].rfind('.') {
            Some(idx) => &name[stem_start + idx..],
            None => "",
        }
    }

    /// Returns `true` if the file name has a Python module extension.
    #[must_use]
    pub fn has_module_ext(&self) -> bool {
        module_basename(self.name()).is_some()
    }

    /// Returns `true` if the file is a module whose library-relative path
    /// can be imported: every package component and the module name are
    /// valid, non-keyword identifiers.
    #[must_use]
    pub fn is_valid_module_path(&self) -> bool {
        let Some((basename, pkgs)) = self.libparts().and_then(<[String]>::split_last) else {
            return false;
        };
        let Some(base) = module_basename(basename) else {
            return false;
        };
        pkgs.iter().all(|p| is_identifier(p)) && is_identifier(base)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
