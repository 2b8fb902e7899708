//! Test runner implementation.

use std::io::Write;

use crate::config::RunnerConfig;
use crate::error::Error;
use crate::reporting::{RunStatistics, write_test_footer, write_test_header};
use crate::testcase::discover_tests;

/// Runs tests one after another, stopping at the first failure.
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    /// Creates a new test runner with the given configuration.
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runs all tests, writing the report to `writer`, and returns the run's statistics.
    ///
    /// All tests are discovered, and their expected-output files checked, before any test
    /// runs; a problem with either aborts the run before anything is reported.
    ///
    /// # Errors
    ///
    /// Fails on configuration errors (see [`Error::is_configuration_error`]) and on fatal
    /// errors during a test. Failing tests are not errors; they are reflected in the
    /// returned statistics.
    pub fn run<W: Write>(&self, mut writer: W) -> Result<RunStatistics, Error> {
        let tests = discover_tests(&self.config.test_paths, self.config.generate)?;
        tracing::debug!(target: "discover", "discovered {} test(s)", tests.len());

        for test in &tests {
            test.check_expected_output()?;
        }

        let mut stats = RunStatistics::default();

        for test in &tests {
            write_test_header(&mut writer, test)?;

            let outcome = test.run(&self.config.command, &self.config.tolerance, |diagnostic| {
                write!(writer, "{diagnostic}")?;
                writer.flush()
            })?;

            write_test_footer(&mut writer, &outcome)?;

            if !outcome.exit_status.success() {
                tracing::debug!(
                    target: "execute",
                    "{} exited with {}",
                    test.input_path.display(),
                    outcome.exit_status
                );
            }

            stats.record(&outcome);

            if outcome.is_failure() {
                break;
            }
        }

        stats.write_summary(&mut writer, &self.config.tolerance)?;

        Ok(stats)
    }
}
