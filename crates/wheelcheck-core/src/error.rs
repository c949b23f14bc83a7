//! Error types for wheel parsing and checker configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `WheelError`.
pub type Result<T> = std::result::Result<T, WheelError>;

/// The two special top-level directories a wheel may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataDirKind {
    /// The `{project}-{version}.dist-info` directory.
    DistInfo,
    /// The `{project}-{version}.data` directory.
    Data,
}

impl std::fmt::Display for MetadataDirKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DistInfo => f.write_str(".dist-info"),
            Self::Data => f.write_str(".data"),
        }
    }
}

/// Reason a RECORD path was rejected as non-normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIssue {
    /// The path starts with `/`.
    Absolute,
    /// The path is the empty string.
    Empty,
    /// The path contains `//`, `.` or `..` components.
    NonNormalized,
}

/// A whole-tree invariant violated by the entries listed in RECORD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralIssue {
    /// More than one `.dist-info` or `.data` directory appears in RECORD.
    MultipleInRecord {
        /// Which directory kind is duplicated.
        kind: MetadataDirKind,
    },
    /// RECORD lists no `.dist-info` directory at all.
    NoDistInfoInRecord,
    /// The directory named in RECORD differs from the one in the archive.
    RecordMismatch {
        /// Which directory kind disagrees.
        kind: MetadataDirKind,
        /// Name found in RECORD.
        found: String,
        /// Name found in the archive itself.
        expected: String,
    },
    /// A purelib wheel contains `*.data/purelib`.
    PurelibInPurelibWheel,
    /// A platlib wheel contains `*.data/platlib`.
    PlatlibInPlatlibWheel,
    /// `*.data/purelib` or `*.data/platlib` is a file.
    LibNotADirectory {
        /// `"purelib"` or `"platlib"`.
        name: &'static str,
    },
}

impl std::fmt::Display for StructuralIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleInRecord { kind } => {
                write!(f, "Wheel contains multiple {kind} directories in RECORD")
            }
            Self::NoDistInfoInRecord => f.write_str("No .dist-info directory in RECORD"),
            Self::RecordMismatch {
                kind,
                found,
                expected,
            } => write!(
                f,
                "{kind} directory in RECORD ('{found}') does not match actual directory name ('{expected}')"
            ),
            Self::PurelibInPurelibWheel => {
                f.write_str("Wheel is purelib yet contains *.data/purelib")
            }
            Self::PlatlibInPlatlibWheel => {
                f.write_str("Wheel is platlib yet contains *.data/platlib")
            }
            Self::LibNotADirectory { name } => write!(f, "*.data/{name} is not a directory"),
        }
    }
}

/// Errors raised while reading a wheel into a content model.
///
/// Every variant aborts processing of the wheel it was raised for; no
/// partially built model is ever returned alongside one.
#[derive(Error, Debug)]
pub enum WheelError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip container.
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The wheel's filename does not follow the wheel naming grammar.
    #[error("invalid wheel filename: {filename}")]
    InvalidArchiveName {
        /// The rejected filename.
        filename: String,
    },

    /// No `.dist-info` directory exists in the archive.
    #[error("No .dist-info directory in wheel")]
    MissingMetadataDirectory,

    /// More than one `.dist-info` or `.data` directory exists in the archive.
    #[error("Wheel contains multiple {kind} directories")]
    MultipleMetadataDirectories {
        /// Which directory kind is duplicated.
        kind: MetadataDirKind,
    },

    /// The project/version of a special directory disagrees with the filename.
    #[error("Project & version of wheel's {kind} directory do not match wheel name: '{found}'")]
    NameVersionMismatch {
        /// Which directory kind disagrees.
        kind: MetadataDirKind,
        /// The offending directory name.
        found: String,
    },

    /// A required file is absent from the `.dist-info` directory.
    #[error("No {name} file in wheel")]
    MissingMetadataFile {
        /// `WHEEL` or `RECORD`.
        name: &'static str,
    },

    /// The WHEEL file has no `Root-Is-Purelib` line.
    #[error("Root-Is-Purelib header not found in WHEEL file")]
    MissingDescriptorField,

    /// The `Root-Is-Purelib` value is neither `true` nor `false`.
    #[error("Invalid Root-Is-Purelib value in WHEEL file: '{value}'")]
    InvalidDescriptorValue {
        /// The rejected value.
        value: String,
    },

    /// A RECORD row does not have exactly three fields.
    #[error("Invalid RECORD entry: {row:?}")]
    MalformedManifestRow {
        /// The fields of the offending row.
        row: Vec<String>,
    },

    /// A RECORD size field is not a non-negative integer.
    #[error("Invalid size in RECORD entry for '{path}': '{size}'")]
    InvalidManifestSize {
        /// Path of the offending row.
        path: String,
        /// The rejected size text.
        size: String,
    },

    /// RECORD could not be decoded as CSV.
    #[error("invalid RECORD file: {0}")]
    InvalidManifest(String),

    /// A path collides with an existing entry of the other kind.
    #[error("Conflicting occurrences of path '{path}'")]
    PathConflict {
        /// The colliding path.
        path: String,
    },

    /// A RECORD path is absolute, empty, or not normalized.
    #[error("{}", describe_path_issue(path, *issue))]
    NonNormalizedPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        issue: PathIssue,
    },

    /// A whole-tree invariant does not hold.
    #[error("{0}")]
    StructuralInvariantViolation(StructuralIssue),
}

fn describe_path_issue(path: &str, issue: PathIssue) -> String {
    match issue {
        PathIssue::Absolute => format!("Absolute path in RECORD: '{path}'"),
        PathIssue::Empty => "Empty path in RECORD".to_string(),
        PathIssue::NonNormalized => format!("Non-normalized path in RECORD: '{path}'"),
    }
}

impl WheelError {
    /// Returns `true` if the error is about the wheel's filename rather than
    /// its contents.
    ///
    /// # Examples
    ///
    /// ```
    /// use wheelcheck_core::WheelError;
    ///
    /// let err = WheelError::InvalidArchiveName {
    ///     filename: "foo.whl".to_string(),
    /// };
    /// assert!(err.is_filename_error());
    /// assert!(!WheelError::MissingDescriptorField.is_filename_error());
    /// ```
    #[must_use]
    pub const fn is_filename_error(&self) -> bool {
        matches!(self, Self::InvalidArchiveName { .. })
    }

    /// Returns the structural issue carried by this error, if any.
    #[must_use]
    pub const fn structural_issue(&self) -> Option<&StructuralIssue> {
        match self {
            Self::StructuralInvariantViolation(issue) => Some(issue),
            _ => None,
        }
    }
}

/// Errors raised while assembling checker configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A check name or prefix matches nothing in the catalogue.
    #[error("Unknown/invalid check prefix: '{0}'")]
    UnknownCheck(String),

    /// A configuration key holds a value of the wrong type.
    #[error("{}: {key}: {message}", path.display())]
    InvalidValue {
        /// The configuration file.
        path: PathBuf,
        /// The offending key.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// A configuration file could not be read.
    #[error("{}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML.
    #[error("{}: {source}", path.display())]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// The underlying parser error.
        #[source]
        source: toml::de::Error,
    },

    /// A `package` or `src_dir` path does not exist.
    #[error("no such file or directory: '{}'", path.display())]
    NoSuchPath {
        /// The missing path.
        path: PathBuf,
    },

    /// A `src_dir` path is not a directory.
    #[error("not a directory: '{}'", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// A pattern given in `package_omit` is not a valid glob.
    #[error("invalid omit pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: glob::PatternError,
    },

    /// Two sources put the same name at the top of the comparison tree.
    #[error("`{option} {}` adds '{name}' to file tree, but it is already present from prior --package or --src-dir option", path.display())]
    DuplicateToplevel {
        /// `--package` or `--src-dir`.
        option: &'static str,
        /// The source path being merged.
        path: PathBuf,
        /// The colliding top-level name.
        name: String,
    },

    /// Walking a local source tree failed.
    #[error("cannot traverse '{}': {message}", path.display())]
    Traversal {
        /// The path being walked.
        path: PathBuf,
        /// The underlying error message.
        message: String,
    },
}
