//! CLI argument parsing using clap.

use clap::ArgAction;
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use wheelcheck_core::Check;
use wheelcheck_core::checks::parse_checks_string;

#[derive(Parser)]
#[command(name = "wheelcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Wheel files, or directories to search for wheels
    #[arg(value_name = "WHEEL")]
    pub wheels: Vec<PathBuf>,

    /// Read configuration from the given file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not read any configuration file
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,

    /// Comma-separated list of checks or check prefixes to enable
    #[arg(long, value_name = "CHECKS", value_parser = parse_checks_string)]
    pub select: Option<BTreeSet<Check>>,

    /// Comma-separated list of checks or check prefixes to disable
    #[arg(long, value_name = "CHECKS", value_parser = parse_checks_string)]
    pub ignore: Option<BTreeSet<Check>>,

    /// Comma-separated list of expected toplevel library entries
    #[arg(long, value_name = "NAMES")]
    pub toplevel: Option<String>,

    /// Check wheel contents against a package file or directory (repeatable)
    #[arg(long = "package", value_name = "PATH")]
    pub packages: Vec<PathBuf>,

    /// Check wheel contents against the children of a source directory
    /// (repeatable)
    #[arg(long = "src-dir", value_name = "DIR")]
    pub src_dirs: Vec<PathBuf>,

    /// Comma-separated glob patterns to exclude while reading --package and
    /// --src-dir
    #[arg(long, value_name = "PATTERNS")]
    pub package_omit: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Output results in JSON format
    #[arg(short, long)]
    pub json: bool,
}
