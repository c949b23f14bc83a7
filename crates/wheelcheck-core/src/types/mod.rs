//! Core types of the wheel content model.

pub mod directory;
pub mod file;
pub mod section;

pub use directory::AllFiles;
pub use directory::Directory;
pub use directory::Entry;
pub use file::File;
pub use file::Signature;
pub use section::Section;
pub use section::classify_path;
