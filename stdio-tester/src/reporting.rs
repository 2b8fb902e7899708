//! Aggregation and reporting of run results.

use bigdecimal::BigDecimal;
use colored::Colorize;
use std::{io::Write, time::Duration};

use crate::execution::TestOutcome;
use crate::testcase::TestCase;
use crate::tolerance::Tolerance;

/// Statistics accumulated over a run.
#[derive(Clone, Debug, Default)]
pub struct RunStatistics {
    /// Number of tests run to completion, including a failing one.
    pub completed: usize,
    /// Sum of all test durations.
    pub total_duration: Duration,
    /// Longest test duration.
    pub max_duration: Duration,
    /// Largest relative numeric error observed; zero if none was.
    pub max_error: BigDecimal,
    /// Whether a test failed.
    pub failed: bool,
}

impl RunStatistics {
    /// Folds the outcome of a completed test into the statistics.
    pub fn record(&mut self, outcome: &TestOutcome) {
        self.completed += 1;
        self.total_duration += outcome.duration;
        self.max_duration = self.max_duration.max(outcome.duration);

        if let Some(comparison) = &outcome.comparison {
            if let Some(error) = &comparison.max_error {
                if *error > self.max_error {
                    self.max_error = error.clone();
                }
            }

            self.failed |= comparison.failed;
        }
    }

    /// Returns the mean test duration, if any test completed.
    pub fn average_duration(&self) -> Option<Duration> {
        let completed = u32::try_from(self.completed).ok()?;
        self.total_duration.checked_div(completed)
    }

    /// Returns the exit code the run should end with.
    pub const fn exit_code(&self) -> u8 {
        if self.failed { 1 } else { 0 }
    }

    /// Writes the end-of-run summary.
    pub fn write_summary<W: Write>(&self, mut writer: W, tolerance: &Tolerance) -> std::io::Result<()> {
        let formatted_count = if self.failed {
            self.completed.to_string().red()
        } else {
            self.completed.to_string().green()
        };

        writeln!(writer)?;
        writeln!(writer, " - total tests passed:  {formatted_count}")?;

        if let Some(average) = self.average_duration() {
            writeln!(writer, " - average test time:   {}", format_duration(average))?;
            writeln!(
                writer,
                " - max test time:       {}",
                format_duration(self.max_duration)
            )?;
        }

        if !tolerance.is_exact() {
            writeln!(writer, " - max error: {} < tolerance {tolerance}", self.max_error)?;
        }

        Ok(())
    }
}

/// Writes the start of a test's report line.
pub fn write_test_header<W: Write>(mut writer: W, test: &TestCase) -> std::io::Result<()> {
    write!(writer, "{}... ", test.input_path.display())?;
    writer.flush()
}

/// Writes the end of a test's report line.
pub fn write_test_footer<W: Write>(mut writer: W, outcome: &TestOutcome) -> std::io::Result<()> {
    writeln!(writer, "{}", format_duration(outcome.duration))
}

/// Formats a duration as seconds with millisecond precision, e.g. `0.125s`.
pub fn format_duration(duration: Duration) -> String {
    std::format!("{:.3}s", duration.as_secs_f64())
}
