//! Conformance tester for programs that read standard input and write standard output.
//!
//! Given a command and a set of input files, runs the command once per input, streaming
//! its output and comparing it token by token against the paired expected-output file,
//! optionally tolerating small relative numeric differences. Alternatively, records the
//! command's output as the expected output ("generate" mode).
//!
//! The run is sequential and halts at the first failing test.

mod comparison;
mod config;
pub mod entry;
mod error;
pub mod events;
mod execution;
mod pathsearch;
mod productinfo;
mod reporting;
mod runner;
mod testcase;
mod tolerance;

pub use comparison::{
    ComparisonVerdict, Diagnostic, LineComparison, LineSource, OutputComparison,
    StreamComparator, compare_lines,
};
pub use config::{CommandLineArgs, RunnerConfig};
pub use error::Error;
pub use execution::TestOutcome;
pub use pathsearch::{CommandSpec, ExecutablePathSearch, search_for_executable};
pub use reporting::{RunStatistics, format_duration, write_test_footer, write_test_header};
pub use runner::TestRunner;
pub use testcase::{
    TestCase, discover_tests, expected_output_path_for, is_input_file_name, natural_cmp,
};
pub use tolerance::{TokenComparison, Tolerance};
