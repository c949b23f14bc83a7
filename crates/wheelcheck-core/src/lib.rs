//! Structural validation of Python wheel contents.
//!
//! `wheelcheck-core` reads a built wheel archive, models its file tree from
//! the `RECORD` manifest, and runs a fixed catalogue of checks for common
//! packaging mistakes: stray bytecode, duplicate files, modules at
//! unimportable paths, missing or unexpected top-level entries, and more.
//!
//! # Examples
//!
//! ```no_run
//! use wheelcheck_core::WheelChecker;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let checker = WheelChecker::default().with_toplevel(["foo"]);
//! let failures = checker.check_wheel("dist/foo-1.0-py3-none-any.whl")?;
//! for failure in &failures {
//!     println!("{}", failure.show(Some("foo-1.0-py3-none-any.whl")));
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod checker;
pub mod checks;
pub mod config;
pub mod contents;
pub mod error;
pub mod filename;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod util;

// Re-export main API types
pub use checker::WheelChecker;
pub use checks::Check;
pub use checks::FailedCheck;
pub use config::Configuration;
pub use contents::WheelContents;
pub use contents::WheelContentsBuilder;
pub use error::ConfigError;
pub use error::Result;
pub use error::WheelError;
pub use filename::WheelFilename;
