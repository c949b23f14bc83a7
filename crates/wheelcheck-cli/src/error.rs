//! Error conversion utilities for CLI.
//!
//! Converts wheelcheck-core's typed errors (thiserror) into user-facing
//! messages (anyhow), adding hints where the fix is not obvious.

use anyhow::anyhow;
use wheelcheck_core::ConfigError;
use wheelcheck_core::WheelError;

/// Describes why a wheel could not be read, without the wheel's name.
pub fn describe_wheel_error(err: &WheelError) -> String {
    if err.is_filename_error() {
        "wheel has invalid filename".to_string()
    } else {
        format!("invalid wheel: {err}")
    }
}

/// Converts `ConfigError` to a user-friendly anyhow error
pub fn convert_config_error(err: ConfigError) -> anyhow::Error {
    match err {
        ConfigError::UnknownCheck(_) => anyhow!(
            "{err}\n\
             HINT: Checks are named W001-W010, W101-W102 and W201-W202; a prefix such as W0 selects a group."
        ),
        ConfigError::DuplicateToplevel { .. } => anyhow!(
            "{err}\n\
             HINT: Each toplevel name may come from only one --package or --src-dir path."
        ),
        ConfigError::Parse { .. } => anyhow!(
            "{err}\n\
             HINT: Pass --no-config to ignore configuration files."
        ),
        ConfigError::NoSuchPath { .. } | ConfigError::NotADirectory { .. } => {
            anyhow::Error::from(err).context("Cannot build package tree")
        }
        _ => anyhow::Error::from(err).context("Invalid configuration"),
    }
}
