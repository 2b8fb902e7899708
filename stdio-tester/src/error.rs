//! Error facilities

use std::path::PathBuf;

/// Monolithic error type for the tester.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A test path given on the command line does not exist.
    #[error("{} does not exist", .0.display())]
    TestPathNotFound(PathBuf),

    /// The expected-output file for a test is missing and we are not generating.
    #[error("{} does not exist", .0.display())]
    ExpectedOutputMissing(PathBuf),

    /// The expected-output file for a test is present but we were asked to generate it.
    #[error("{} already exists", .0.display())]
    ExpectedOutputExists(PathBuf),

    /// The tolerance text could not be parsed as a decimal number.
    #[error("invalid tolerance '{0}': {1}")]
    InvalidTolerance(String, bigdecimal::ParseBigDecimalError),

    /// The tolerance was negative.
    #[error("tolerance must not be negative: {0}")]
    NegativeTolerance(String),

    /// The command under test could not be resolved to an executable.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A token could not be parsed as a number during tolerant comparison.
    #[error("cannot compare '{token}' numerically: {source}")]
    NumberParse {
        /// The offending token.
        token: String,
        /// The underlying parse failure.
        source: bigdecimal::ParseBigDecimalError,
    },

    /// The command under test could not be launched.
    #[error("failed to launch {0}: {1}")]
    SpawnFailed(String, std::io::Error),

    /// A file could not be opened or created.
    #[error("failed to open {}: {}", .0.display(), .1)]
    OpenFile(PathBuf, std::io::Error),

    /// An error occurred while walking a test directory.
    #[error("failed to list tests: {0}")]
    Walk(#[from] walkdir::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns whether this error stems from the test suite layout or invocation rather than
    /// from running the tests; such errors are reported alongside the test report.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::TestPathNotFound(_)
                | Self::ExpectedOutputMissing(_)
                | Self::ExpectedOutputExists(_)
                | Self::InvalidTolerance(..)
                | Self::NegativeTolerance(_)
                | Self::CommandNotFound(_)
        )
    }
}
