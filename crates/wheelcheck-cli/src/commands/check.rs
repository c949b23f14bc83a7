//! Check command implementation

use crate::cli::Cli;
use crate::error::convert_config_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::info;
use walkdir::WalkDir;
use wheelcheck_core::Configuration;
use wheelcheck_core::FailedCheck;
use wheelcheck_core::WheelChecker;
use wheelcheck_core::WheelError;
use wheelcheck_core::util::comma_split;

/// Result of checking a single wheel.
pub enum WheelOutcome {
    Passed,
    Failed(Vec<FailedCheck>),
    Error(WheelError),
}

pub struct WheelReport {
    pub wheel: String,
    pub outcome: WheelOutcome,
}

impl WheelReport {
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, WheelOutcome::Passed)
    }
}

pub fn execute(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<bool> {
    let checker = build_checker(cli)?;
    let wheels = expand_wheel_paths(&cli.wheels)?;
    info!(wheels = wheels.len(), "checking wheels");

    let reports: Vec<WheelReport> = wheels
        .iter()
        .map(|wheel| check_one(&checker, wheel))
        .collect();
    formatter.format_reports(&reports)?;

    Ok(reports.iter().all(WheelReport::passed))
}

fn check_one(checker: &WheelChecker, wheel: &Path) -> WheelReport {
    let outcome = match checker.check_wheel(wheel) {
        Ok(failures) if failures.is_empty() => WheelOutcome::Passed,
        Ok(failures) => WheelOutcome::Failed(failures),
        Err(err) => WheelOutcome::Error(err),
    };
    WheelReport {
        wheel: wheel.display().to_string(),
        outcome,
    }
}

/// Merges the configuration file and the command line into a checker.
fn build_checker(cli: &Cli) -> Result<WheelChecker> {
    let mut config = if cli.no_config {
        Configuration::default()
    } else {
        Configuration::from_config_file(cli.config.as_deref()).map_err(convert_config_error)?
    };
    debug!(?config, "loaded configuration");
    config.update(cli_configuration(cli));
    config.into_checker().map_err(convert_config_error)
}

fn cli_configuration(cli: &Cli) -> Configuration {
    let mut config = Configuration {
        select: cli.select.clone(),
        ignore: cli.ignore.clone(),
        package_paths: (!cli.packages.is_empty()).then(|| cli.packages.clone()),
        src_dirs: (!cli.src_dirs.is_empty()).then(|| cli.src_dirs.clone()),
        package_omit: cli.package_omit.as_deref().map(comma_split),
        ..Configuration::default()
    };
    if let Some(toplevel) = &cli.toplevel {
        config = config.with_toplevel(comma_split(toplevel));
    }
    config
}

/// Replaces every directory argument with the wheels beneath it.
fn expand_wheel_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut wheels = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("Cannot search '{}' for wheels", path.display()))?;
                let is_wheel = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("whl"));
                if is_wheel && entry.file_type().is_file() {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            debug!(dir = %path.display(), wheels = found.len(), "expanded directory");
            wheels.extend(found);
        } else if path.exists() {
            wheels.push(path.clone());
        } else {
            bail!("Path does not exist: '{}'", path.display());
        }
    }
    Ok(wheels)
}
