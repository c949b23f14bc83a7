//! Test utilities for building wheel archives.
//!
//! These helpers assemble complete in-memory wheels, with a `WHEEL`
//! descriptor and a `RECORD` manifest carrying real digests, so tests can
//! exercise the reader and the checks without fixture files.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::util::digest_fingerprint;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;
use zip::write::ZipWriter;

/// Creates an in-memory ZIP archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are stored uncompressed.
/// No `RECORD` or `WHEEL` is synthesized.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("foo.py", b"x = 1\n"), ("bar.py", b"y = 2\n")]);
/// assert!(!zip_data.is_empty());
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (path, data) in entries {
        zip.start_file(path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Builder for complete wheel archives.
///
/// Library files are added with [`WheelBuilder::add_file`]; the builder
/// appends `METADATA`, `WHEEL` and `RECORD` under the `.dist-info`
/// directory when [`WheelBuilder::build`] is called.
///
/// # Examples
///
/// ```
/// use wheelcheck_core::WheelContents;
/// use wheelcheck_core::test_utils::WheelBuilder;
/// use std::io::Cursor;
///
/// let builder = WheelBuilder::new("foo", "1.0").add_file("foo/__init__.py", b"");
/// let filename = builder.filename();
/// let contents = WheelContents::from_reader(&filename, Cursor::new(builder.build())).unwrap();
/// assert!(contents.purelib_tree().contains("foo"));
/// ```
#[derive(Debug, Clone)]
pub struct WheelBuilder {
    project: String,
    version: String,
    dir_version: Option<String>,
    root_is_purelib: bool,
    files: Vec<(String, Vec<u8>)>,
    unrecorded: Vec<(String, Vec<u8>)>,
    extra_rows: Vec<Vec<String>>,
    write_wheel: bool,
    write_record: bool,
}

impl WheelBuilder {
    /// Starts a pure-Python wheel for `project` at `version`.
    #[must_use]
    pub fn new(project: &str, version: &str) -> Self {
        Self {
            project: project.to_string(),
            version: version.to_string(),
            dir_version: None,
            root_is_purelib: true,
            files: Vec::new(),
            unrecorded: Vec::new(),
            extra_rows: Vec::new(),
            write_wheel: true,
            write_record: true,
        }
    }

    /// The wheel's filename, `{project}-{version}-py3-none-any.whl`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}-{}-py3-none-any.whl", self.project, self.version)
    }

    /// The `.dist-info` directory name.
    #[must_use]
    pub fn dist_info_dir(&self) -> String {
        format!("{}-{}.dist-info", self.project, self.metadata_version())
    }

    /// The `.data` directory name.
    #[must_use]
    pub fn data_dir(&self) -> String {
        format!("{}-{}.data", self.project, self.metadata_version())
    }

    fn metadata_version(&self) -> &str {
        self.dir_version.as_deref().unwrap_or(&self.version)
    }

    /// Spells the version in the `.dist-info` and `.data` directory names
    /// differently from the filename.
    #[must_use]
    pub fn dir_version(mut self, version: &str) -> Self {
        self.dir_version = Some(version.to_string());
        self
    }

    /// Sets the `Root-Is-Purelib` value written to `WHEEL`.
    #[must_use]
    pub fn root_is_purelib(mut self, purelib: bool) -> Self {
        self.root_is_purelib = purelib;
        self
    }

    /// Adds a file that is both stored and listed in `RECORD`.
    #[must_use]
    pub fn add_file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.push((path.to_string(), data.to_vec()));
        self
    }

    /// Adds a file that is stored in the archive but not listed in `RECORD`.
    #[must_use]
    pub fn add_unrecorded_file(mut self, path: &str, data: &[u8]) -> Self {
        self.unrecorded.push((path.to_string(), data.to_vec()));
        self
    }

    /// Appends a raw row to `RECORD` without storing any file.
    #[must_use]
    pub fn add_record_row(mut self, row: &[&str]) -> Self {
        self.extra_rows.push(row.iter().map(ToString::to_string).collect());
        self
    }

    /// Omits the `WHEEL` descriptor.
    #[must_use]
    pub fn without_wheel_file(mut self) -> Self {
        self.write_wheel = false;
        self
    }

    /// Omits the `RECORD` manifest.
    #[must_use]
    pub fn without_record(mut self) -> Self {
        self.write_record = false;
        self
    }

    /// Builds and returns the wheel data.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let dist_info = self.dist_info_dir();
        let mut stored = self.files.clone();
        stored.push((
            format!("{dist_info}/METADATA"),
            format!(
                "Metadata-Version: 2.1\nName: {}\nVersion: {}\n",
                self.project,
                self.metadata_version()
            )
            .into_bytes(),
        ));
        if self.write_wheel {
            stored.push((
                format!("{dist_info}/WHEEL"),
                format!(
                    "Wheel-Version: 1.0\nGenerator: wheelcheck-tests\nRoot-Is-Purelib: {}\nTag: py3-none-any\n",
                    self.root_is_purelib
                )
                .into_bytes(),
            ));
        }

        let mut record = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        for (path, data) in &stored {
            let digest = digest_fingerprint(data);
            let size = data.len().to_string();
            record
                .write_record([path.as_str(), digest.as_str(), size.as_str()])
                .unwrap();
        }
        for row in &self.extra_rows {
            record.write_record(row).unwrap();
        }
        let record_path = format!("{dist_info}/RECORD");
        record.write_record([record_path.as_str(), "", ""]).unwrap();
        let record = record.into_inner().unwrap();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (path, data) in stored.iter().chain(&self.unrecorded) {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }
        if self.write_record {
            zip.start_file(record_path.as_str(), options).unwrap();
            zip.write_all(&record).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Builds the wheel and writes it into `dir` under its filename.
    pub fn write_to(self, dir: &Path) -> PathBuf {
        let path = dir.join(self.filename());
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
