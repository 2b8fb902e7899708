//! Execution of the command under test against a single test case.

use std::{
    fs::{File, OpenOptions},
    io::BufReader,
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};

use crate::comparison::{Diagnostic, OutputComparison, StreamComparator};
use crate::error::Error;
use crate::pathsearch::CommandSpec;
use crate::testcase::TestCase;
use crate::tolerance::Tolerance;

/// Result of running the command under test for one test case.
#[derive(Debug)]
pub struct TestOutcome {
    /// Comparison of the produced output against the expected output; absent when the
    /// expected output was being generated.
    pub comparison: Option<OutputComparison>,
    /// Exit status of the command.
    pub exit_status: ExitStatus,
    /// Wall-clock time spent on the test, from launch through comparison and exit.
    pub duration: Duration,
}

impl TestOutcome {
    /// Returns whether the test failed.
    pub fn is_failure(&self) -> bool {
        self.comparison.as_ref().is_some_and(|c| c.failed)
    }
}

impl TestCase {
    /// Runs the command under test with this test's input on its standard input.
    ///
    /// When generating, standard output is written straight into the (new) expected-output
    /// file. Otherwise it is compared against the expected-output file as it is produced,
    /// with each diagnostic handed to `on_diagnostic`. Standard error is discarded.
    ///
    /// # Arguments
    ///
    /// * `command` - The command under test.
    /// * `tolerance` - Tolerance applied to numeric tokens.
    /// * `on_diagnostic` - Callback invoked for each diagnostic as it is found.
    pub fn run<F>(
        &self,
        command: &CommandSpec,
        tolerance: &Tolerance,
        on_diagnostic: F,
    ) -> Result<TestOutcome, Error>
    where
        F: FnMut(&Diagnostic) -> std::io::Result<()>,
    {
        let start_time = Instant::now();

        let input = File::open(&self.input_path)
            .map_err(|e| Error::OpenFile(self.input_path.clone(), e))?;

        let mut cmd = command.to_command();
        cmd.stdin(input).stderr(Stdio::null());

        if self.generate {
            let output = self.create_expected_output()?;
            cmd.stdout(output);

            let mut child = cmd
                .spawn()
                .map_err(|e| Error::SpawnFailed(command.to_string(), e))?;
            tracing::debug!(target: "execute", "launched {command} (pid {})", child.id());

            let exit_status = child.wait()?;
            tracing::debug!(target: "execute", "{command} exited: {exit_status}");

            return Ok(TestOutcome {
                comparison: None,
                exit_status,
                duration: start_time.elapsed(),
            });
        }

        let expected = File::open(&self.expected_output_path)
            .map_err(|e| Error::OpenFile(self.expected_output_path.clone(), e))?;

        cmd.stdout(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::SpawnFailed(command.to_string(), e))?;
        tracing::debug!(target: "execute", "launched {command} (pid {})", child.id());

        let comparison = match child.stdout.take() {
            Some(stdout) => StreamComparator::new(tolerance).compare(
                BufReader::new(stdout),
                BufReader::new(expected),
                on_diagnostic,
            ),
            None => Err(Error::Io(std::io::Error::other(
                "child process has no standard output",
            ))),
        };

        // Don't leave the child behind if we're bailing out; it may be blocked writing.
        if comparison.is_err() {
            if let Err(e) = child.kill() {
                tracing::debug!(target: "execute", "failed to kill {command}: {e}");
            }
        }

        let exit_status = child.wait()?;
        tracing::debug!(target: "execute", "{command} exited: {exit_status}");

        let comparison = comparison?;

        Ok(TestOutcome {
            comparison: Some(comparison),
            exit_status,
            duration: start_time.elapsed(),
        })
    }

    fn create_expected_output(&self) -> Result<File, Error> {
        if let Some(parent) = self.expected_output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::OpenFile(parent.to_path_buf(), e))?;
            }
        }

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.expected_output_path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::ExpectedOutputExists(self.expected_output_path.clone())
                } else {
                    Error::OpenFile(self.expected_output_path.clone(), e)
                }
            })
    }
}
