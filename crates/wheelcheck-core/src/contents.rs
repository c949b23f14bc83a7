//! The wheel content model.
//!
//! [`WheelContents`] is built once from a wheel's `WHEEL` descriptor and
//! `RECORD` manifest, validated, and then only read by the checker.

use crate::error::MetadataDirKind;
use crate::error::Result;
use crate::error::StructuralIssue;
use crate::error::WheelError;
use crate::filename::WheelFilename;
use crate::types::Directory;
use crate::types::Entry;
use crate::types::File;
use crate::types::Signature;
use crate::types::classify_path;
use crate::util::canonicalize_name;
use crate::util::canonicalize_version;
use crate::util::is_data_dir;
use crate::util::is_dist_info_dir;
use crate::util::split_metadata_dir;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use tracing::trace;
use zip::ZipArchive;
use zip::result::ZipError;

/// The validated contents of a wheel.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::WheelContents;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut builder = WheelContents::builder("foo-1.0.dist-info", "foo-1.0.data", true);
/// builder.add_record_rows([
///     ["foo.py", "sha256=abc", "10"],
///     ["foo-1.0.dist-info/METADATA", "sha256=def", "20"],
///     ["foo-1.0.dist-info/RECORD", "", ""],
/// ])?;
/// let contents = builder.build()?;
///
/// assert!(contents.purelib_tree().contains("foo.py"));
/// assert!(contents.platlib_tree().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WheelContents {
    dist_info_dir: String,
    data_dir: String,
    root_is_purelib: bool,
    filetree: Directory,
    by_signature: Vec<(Signature, Vec<File>)>,
    purelib_tree: Directory,
    platlib_tree: Directory,
}

impl WheelContents {
    /// Starts building a content model for a wheel with the given special
    /// directory names.
    #[must_use]
    pub fn builder(
        dist_info_dir: impl Into<String>,
        data_dir: impl Into<String>,
        root_is_purelib: bool,
    ) -> WheelContentsBuilder {
        WheelContentsBuilder::new(dist_info_dir, data_dir, root_is_purelib)
    }

    /// Reads and validates the wheel at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a zip archive,
    /// has an invalid filename, or fails any of the checks performed by
    /// [`WheelContents::from_reader`].
    pub fn from_wheel<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // Validate the name before touching the file.
        WheelFilename::parse(&filename)?;
        let file = std::fs::File::open(path)?;
        Self::from_reader(&filename, file)
    }

    /// Reads and validates a wheel from a seekable reader.
    ///
    /// `filename` is the wheel's file name and determines the expected
    /// project and version.
    ///
    /// # Errors
    ///
    /// Returns the first of:
    /// - `InvalidArchiveName` if `filename` is not a wheel filename
    /// - `Zip` if the data is not a zip archive
    /// - `MissingMetadataDirectory`, `MultipleMetadataDirectories` or
    ///   `NameVersionMismatch` for bad `.dist-info`/`.data` directories
    /// - `MissingMetadataFile` if `WHEEL` or `RECORD` is absent
    /// - `MissingDescriptorField` / `InvalidDescriptorValue` for a bad
    ///   `Root-Is-Purelib` line
    /// - any RECORD row, tree or structural error
    pub fn from_reader<R: Read + Seek>(filename: &str, reader: R) -> Result<Self> {
        let whlname = WheelFilename::parse(filename)?;
        debug!(filename, project = %whlname.project, version = %whlname.version, "parsed wheel filename");

        let mut archive = ZipArchive::new(reader)?;
        let (dist_info_dir, data_dir) =
            find_wheel_dirs(archive.file_names(), &whlname.project, &whlname.version)?;
        let data_dir = data_dir.unwrap_or_else(|| {
            dist_info_dir
                .strip_suffix(".dist-info")
                .map_or_else(|| whlname.data_dir(), |stem| format!("{stem}.data"))
        });
        debug!(%dist_info_dir, %data_dir, "located wheel directories");

        let wheel = read_member(&mut archive, &dist_info_dir, "WHEEL")?;
        let root_is_purelib = parse_root_is_purelib(&String::from_utf8_lossy(&wheel))?;
        debug!(root_is_purelib, "read WHEEL descriptor");

        let record = read_member(&mut archive, &dist_info_dir, "RECORD")?;
        let mut builder = Self::builder(dist_info_dir, data_dir, root_is_purelib);
        let rows = builder.add_record_file(record.as_slice())?;
        debug!(rows, "read RECORD manifest");

        builder.build()
    }

    /// Name of the `.dist-info` directory.
    #[must_use]
    pub fn dist_info_dir(&self) -> &str {
        &self.dist_info_dir
    }

    /// Name of the `.data` directory, whether or not the wheel has one.
    #[must_use]
    pub fn data_dir(&self) -> &str {
        &self.data_dir
    }

    /// Whether the wheel root is installed to purelib.
    #[must_use]
    pub const fn root_is_purelib(&self) -> bool {
        self.root_is_purelib
    }

    /// The full file tree described by RECORD.
    #[must_use]
    pub const fn filetree(&self) -> &Directory {
        &self.filetree
    }

    /// The purelib section of the wheel.
    #[must_use]
    pub const fn purelib_tree(&self) -> &Directory {
        &self.purelib_tree
    }

    /// The platlib section of the wheel.
    #[must_use]
    pub const fn platlib_tree(&self) -> &Directory {
        &self.platlib_tree
    }

    /// Both library sections, purelib first.
    #[must_use]
    pub const fn library_trees(&self) -> [&Directory; 2] {
        [&self.purelib_tree, &self.platlib_tree]
    }

    /// Files grouped by signature, in order of first appearance.
    pub fn by_signature(&self) -> impl Iterator<Item = (&Signature, &[File])> {
        self.by_signature
            .iter()
            .map(|(sig, files)| (sig, files.as_slice()))
    }
}

/// Incremental builder for [`WheelContents`].
///
/// Rows and entries are inserted into the file tree as they are added;
/// structural validation and the library sections are computed by
/// [`WheelContentsBuilder::build`].
#[derive(Debug)]
pub struct WheelContentsBuilder {
    dist_info_dir: String,
    data_dir: String,
    root_is_purelib: bool,
    filetree: Directory,
    by_signature: Vec<(Signature, Vec<File>)>,
    signature_index: HashMap<Signature, usize>,
}

impl WheelContentsBuilder {
    /// Creates a builder for a wheel with the given special directory names.
    #[must_use]
    pub fn new(
        dist_info_dir: impl Into<String>,
        data_dir: impl Into<String>,
        root_is_purelib: bool,
    ) -> Self {
        Self {
            dist_info_dir: dist_info_dir.into(),
            data_dir: data_dir.into(),
            root_is_purelib,
            filetree: Directory::root(),
            by_signature: Vec::new(),
            signature_index: HashMap::new(),
        }
    }

    /// Parses a RECORD file and adds every row. Returns the number of rows.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::InvalidManifest` if the data is not valid CSV,
    /// or any error raised by [`WheelContentsBuilder::add_record_row`].
    pub fn add_record_file<R: Read>(&mut self, reader: R) -> Result<usize> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut count = 0;
        for record in csv.records() {
            let record = record.map_err(|e| WheelError::InvalidManifest(e.to_string()))?;
            let row: Vec<String> = record.iter().map(String::from).collect();
            self.add_record_row(&row)?;
            count += 1;
        }
        Ok(count)
    }

    /// Adds every row of an already split RECORD.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first row error.
    pub fn add_record_rows<I, R, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        for row in rows {
            let row: Vec<String> = row
                .as_ref()
                .iter()
                .map(|field| field.as_ref().to_string())
                .collect();
            self.add_record_row(&row)?;
        }
        Ok(())
    }

    /// Adds one RECORD row.
    ///
    /// A path ending in `/` adds an empty directory; any other path adds a
    /// file whose library-relative path is set from its section.
    ///
    /// # Errors
    ///
    /// Returns `MalformedManifestRow`, `InvalidManifestSize`,
    /// `NonNormalizedPath` or `PathConflict`.
    pub fn add_record_row(&mut self, row: &[String]) -> Result<()> {
        let entry = match row.first() {
            Some(path) if path.ends_with('/') => Entry::Directory(Directory::new(path)?),
            _ => {
                let mut file = File::from_record_row(row)?;
                let parts = file.parts();
                let (section, libparts) = classify_path(
                    parts,
                    &self.dist_info_dir,
                    &self.data_dir,
                    self.root_is_purelib,
                );
                trace!(path = %file.path(), %section, "classified RECORD entry");
                let offset = libparts.map(|lib| parts.len() - lib.len());
                file.set_library_offset(offset);
                Entry::File(file)
            }
        };
        self.add_entry(entry)
    }

    /// Inserts an entry into the file tree, indexing files by signature.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::PathConflict` on a path collision.
    pub fn add_entry(&mut self, entry: Entry) -> Result<()> {
        let file = entry.as_file().cloned();
        self.filetree.add_entry(entry)?;
        if let Some(file) = file {
            let signature = file.signature();
            if let Some(&idx) = self.signature_index.get(&signature) {
                self.by_signature[idx].1.push(file);
            } else {
                self.signature_index
                    .insert(signature.clone(), self.by_signature.len());
                self.by_signature.push((signature, vec![file]));
            }
        }
        Ok(())
    }

    /// Validates the tree and computes the library sections.
    ///
    /// # Errors
    ///
    /// Returns `WheelError::StructuralInvariantViolation` for the first
    /// violated invariant.
    pub fn build(self) -> Result<WheelContents> {
        self.validate_tree()
            .map_err(WheelError::StructuralInvariantViolation)?;

        let root = self
            .filetree
            .without(&[self.dist_info_dir.as_str(), self.data_dir.as_str()]);
        let data_lib = |name: &str| {
            self.filetree
                .get(&self.data_dir)
                .and_then(Entry::as_directory)
                .and_then(|data| data.get(name))
                .and_then(Entry::as_directory)
                .cloned()
                .unwrap_or_else(|| placeholder(&self.data_dir, name))
        };
        let (purelib_tree, platlib_tree) = if self.root_is_purelib {
            (root, data_lib("platlib"))
        } else {
            (data_lib("purelib"), root)
        };

        Ok(WheelContents {
            dist_info_dir: self.dist_info_dir,
            data_dir: self.data_dir,
            root_is_purelib: self.root_is_purelib,
            filetree: self.filetree,
            by_signature: self.by_signature,
            purelib_tree,
            platlib_tree,
        })
    }

    fn validate_tree(&self) -> std::result::Result<(), StructuralIssue> {
        let toplevel: Vec<&str> = self.filetree.entries().map(|(name, _)| name).collect();

        let dist_info: Vec<&str> = toplevel
            .iter()
            .copied()
            .filter(|n| is_dist_info_dir(n))
            .collect();
        match dist_info.as_slice() {
            [] => return Err(StructuralIssue::NoDistInfoInRecord),
            [name] if *name != self.dist_info_dir => {
                return Err(StructuralIssue::RecordMismatch {
                    kind: MetadataDirKind::DistInfo,
                    found: (*name).to_string(),
                    expected: self.dist_info_dir.clone(),
                });
            }
            [_] => {}
            _ => {
                return Err(StructuralIssue::MultipleInRecord {
                    kind: MetadataDirKind::DistInfo,
                });
            }
        }

        let data: Vec<&str> = toplevel.iter().copied().filter(|n| is_data_dir(n)).collect();
        match data.as_slice() {
            [] => {}
            [name] if *name != self.data_dir => {
                return Err(StructuralIssue::RecordMismatch {
                    kind: MetadataDirKind::Data,
                    found: (*name).to_string(),
                    expected: self.data_dir.clone(),
                });
            }
            [_] => {}
            _ => {
                return Err(StructuralIssue::MultipleInRecord {
                    kind: MetadataDirKind::Data,
                });
            }
        }

        let Some(data) = self
            .filetree
            .get(&self.data_dir)
            .and_then(Entry::as_directory)
        else {
            return Ok(());
        };
        let (same, other) = if self.root_is_purelib {
            ("purelib", "platlib")
        } else {
            ("platlib", "purelib")
        };
        if data.contains(same) {
            return Err(if self.root_is_purelib {
                StructuralIssue::PurelibInPurelibWheel
            } else {
                StructuralIssue::PlatlibInPlatlibWheel
            });
        }
        if data.get(other).is_some_and(Entry::is_file) {
            return Err(StructuralIssue::LibNotADirectory { name: other });
        }
        Ok(())
    }
}

fn placeholder(data_dir: &str, name: &str) -> Directory {
    Directory::new(&format!("{data_dir}/{name}/")).unwrap_or_default()
}

/// Finds the `.dist-info` and optional `.data` directory among the names in
/// a wheel archive.
///
/// # Errors
///
/// Returns `MissingMetadataDirectory` if there is no `.dist-info`
/// directory, `MultipleMetadataDirectories` if either kind occurs more than
/// once, and `NameVersionMismatch` if a directory's project or version does
/// not normalize to the given ones.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::contents::find_wheel_dirs;
///
/// let names = ["Foo_Bar-1.0.dist-info/RECORD", "foo_bar/__init__.py"];
/// let (dist_info, data) = find_wheel_dirs(names, "foo.bar", "1.0.0").unwrap();
/// assert_eq!(dist_info, "Foo_Bar-1.0.dist-info");
/// assert_eq!(data, None);
/// ```
pub fn find_wheel_dirs<'a, I>(
    namelist: I,
    project: &str,
    version: &str,
) -> Result<(String, Option<String>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let canon_project = canonicalize_name(project);
    let canon_version = canonicalize_version(version);

    let mut dist_info_dirs = BTreeSet::new();
    let mut data_dirs = BTreeSet::new();
    for name in namelist {
        let top = name.split('/').next().unwrap_or_default();
        if is_dist_info_dir(top) {
            dist_info_dirs.insert(top.to_string());
        }
        if is_data_dir(top) {
            data_dirs.insert(top.to_string());
        }
    }

    let matches = |dir: &str| {
        split_metadata_dir(dir).is_some_and(|(p, v)| {
            canonicalize_name(p) == canon_project && canonicalize_version(v) == canon_version
        })
    };
    let pick = |dirs: BTreeSet<String>, kind| -> Result<Option<String>> {
        if dirs.len() > 1 {
            return Err(WheelError::MultipleMetadataDirectories { kind });
        }
        match dirs.into_iter().next() {
            Some(dir) if !matches(&dir) => Err(WheelError::NameVersionMismatch { kind, found: dir }),
            found => Ok(found),
        }
    };

    let dist_info_dir = pick(dist_info_dirs, MetadataDirKind::DistInfo)?
        .ok_or(WheelError::MissingMetadataDirectory)?;
    let data_dir = pick(data_dirs, MetadataDirKind::Data)?;
    Ok((dist_info_dir, data_dir))
}

/// Extracts the `Root-Is-Purelib` flag from a WHEEL descriptor.
///
/// # Errors
///
/// Returns `MissingDescriptorField` if no such line exists and
/// `InvalidDescriptorValue` if its value is not `true` or `false`.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::contents::parse_root_is_purelib;
///
/// let wheel = "Wheel-Version: 1.0\nGenerator: bdist_wheel\nRoot-Is-Purelib: false\n";
/// assert!(!parse_root_is_purelib(wheel).unwrap());
/// ```
pub fn parse_root_is_purelib(descriptor: &str) -> Result<bool> {
    for line in descriptor.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("Root-Is-Purelib") {
            continue;
        }
        let value = value.trim();
        return if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(WheelError::InvalidDescriptorValue {
                value: value.to_string(),
            })
        };
    }
    Err(WheelError::MissingDescriptorField)
}

fn read_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dist_info_dir: &str,
    name: &'static str,
) -> Result<Vec<u8>> {
    let mut member = match archive.by_name(&format!("{dist_info_dir}/{name}")) {
        Ok(member) => member,
        Err(ZipError::FileNotFound) => return Err(WheelError::MissingMetadataFile { name }),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::new();
    member.read_to_end(&mut data)?;
    Ok(data)
}
