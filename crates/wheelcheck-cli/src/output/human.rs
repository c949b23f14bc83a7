//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::commands::check::WheelOutcome;
use crate::commands::check::WheelReport;
use crate::error::describe_wheel_error;
use anyhow::Result;
use console::Term;
use console::style;

pub struct HumanFormatter {
    use_colors: bool,
    term: Term,
    err_term: Term,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
            err_term: Term::stderr(),
        }
    }

    fn report_lines(&self, report: &WheelReport) -> Vec<String> {
        match &report.outcome {
            WheelOutcome::Passed => {
                let ok = if self.use_colors {
                    style("OK").green().bold().to_string()
                } else {
                    "OK".to_string()
                };
                vec![format!("{}: {ok}", report.wheel)]
            }
            WheelOutcome::Failed(failures) => failures
                .iter()
                .map(|f| f.show(Some(&report.wheel)))
                .collect(),
            WheelOutcome::Error(err) => {
                vec![format!("{}: {}", report.wheel, describe_wheel_error(err))]
            }
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_reports(&self, reports: &[WheelReport]) -> Result<()> {
        for report in reports {
            let term = if matches!(report.outcome, WheelOutcome::Error(_)) {
                &self.err_term
            } else {
                &self.term
            };
            for line in self.report_lines(report) {
                term.write_line(&line)?;
            }
        }
        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        if self.use_colors {
            let _ = self
                .err_term
                .write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = self.err_term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
