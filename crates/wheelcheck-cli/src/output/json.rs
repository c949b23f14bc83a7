//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::Status;
use crate::commands::check::WheelOutcome;
use crate::commands::check::WheelReport;
use crate::error::describe_wheel_error;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use wheelcheck_core::Check;

pub struct JsonFormatter;

#[derive(Debug, Serialize)]
struct FailureOutput {
    check: Check,
    message: &'static str,
    paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WheelOutput {
    wheel: String,
    status: Status,
    failures: Vec<FailureOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&WheelReport> for WheelOutput {
    fn from(report: &WheelReport) -> Self {
        let (status, failures, error) = match &report.outcome {
            WheelOutcome::Passed => (Status::Ok, Vec::new(), None),
            WheelOutcome::Failed(failures) => (
                Status::Failed,
                failures
                    .iter()
                    .map(|f| FailureOutput {
                        check: f.check,
                        message: f.check.description(),
                        paths: f.args.clone(),
                    })
                    .collect(),
                None,
            ),
            WheelOutcome::Error(err) => (Status::Error, Vec::new(), Some(describe_wheel_error(err))),
        };
        Self {
            wheel: report.wheel.clone(),
            status,
            failures,
            error,
        }
    }
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_reports(&self, reports: &[WheelReport]) -> Result<()> {
        let wheels: Vec<WheelOutput> = reports.iter().map(WheelOutput::from).collect();
        let status = if wheels.iter().all(|w| w.status == Status::Ok) {
            Status::Ok
        } else {
            Status::Failed
        };
        Self::output(&JsonOutput::new("check", status, wheels))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("check", format!("{error:#}"));
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wheelcheck_core::FailedCheck;
    use wheelcheck_core::WheelError;

    #[test]
    fn test_failed_wheel_json() {
        let report = WheelReport {
            wheel: "foo-1.0-py3-none-any.whl".to_string(),
            outcome: WheelOutcome::Failed(vec![FailedCheck::with_args(
                Check::W002,
                ["foo.py", "foo/dup.py"],
            )]),
        };
        let value = serde_json::to_value(WheelOutput::from(&report)).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failures"][0]["check"], "W002");
        assert_eq!(value["failures"][0]["message"], "Wheel contains duplicate files");
        assert_eq!(value["failures"][0]["paths"][1], "foo/dup.py");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_wheel_json() {
        let report = WheelReport {
            wheel: "foo-1.0-py3-none-any.whl".to_string(),
            outcome: WheelOutcome::Error(WheelError::MissingMetadataDirectory),
        };
        let value = serde_json::to_value(WheelOutput::from(&report)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "invalid wheel: No .dist-info directory in wheel");
        assert_eq!(value["failures"].as_array().unwrap().len(), 0);
    }
}
