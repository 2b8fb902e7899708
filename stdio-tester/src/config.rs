//! Command-line options and run configuration.

use clap::Parser;
use std::path::PathBuf;

use crate::error::Error;
use crate::events::TraceEvent;
use crate::pathsearch::CommandSpec;
use crate::productinfo;
use crate::tolerance::Tolerance;

const SHORT_DESCRIPTION: &str =
    "Tests whether an executable produces the expected output for given inputs";

const LONG_DESCRIPTION: &str = r"
Runs COMMAND once per input file found under TESTS, feeding the file to its standard input,
and compares what it prints against the paired expected-output file, token by token.

Input files are those ending in `.in`, named `in*`, or containing `.in.`; the expected output
for `x.in` is `x.out`, for `in3` it is `out3`, and `/in/` and `.in.` map to `/out/` and `.out.`.
Testing stops at the first failing test.
";

/// Parsed command-line arguments.
#[derive(Clone, Parser, Debug)]
#[clap(name = productinfo::PRODUCT_NAME,
       version = productinfo::PRODUCT_VERSION,
       about = SHORT_DESCRIPTION,
       long_about = LONG_DESCRIPTION,
       disable_help_flag = true)]
pub struct CommandLineArgs {
    /// Display usage information.
    #[clap(long = "help", action = clap::ArgAction::HelpLong)]
    pub help: Option<bool>,

    /// Executable to test; a file by this name in the current directory takes precedence.
    #[clap(default_value = "a.out")]
    pub command: String,

    /// Test input files, or directories to search for them.
    #[clap(default_value = ".")]
    pub tests: Vec<PathBuf>,

    /// Write expected-output files from the command's output instead of comparing.
    #[clap(long = "generate")]
    pub generate: bool,

    /// Relative error tolerated between numeric tokens; 0 requires exact matches.
    #[clap(long = "tolerance", default_value = "0", env = "STDIO_TESTER_TOLERANCE")]
    pub tolerance: String,

    /// Colorize output?
    #[clap(long = "color", default_value_t = clap::ColorChoice::Auto)]
    pub color: clap::ColorChoice,

    /// Log diagnostic details to standard error.
    #[clap(short = 'v', long = "verbose", env = "STDIO_TESTER_VERBOSE")]
    pub verbose: bool,

    /// Enable tracing of the given event type.
    #[clap(long = "trace", value_name = "EVENT")]
    pub enabled_trace_events: Vec<TraceEvent>,
}

/// Validated configuration for a test run.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// The command under test.
    pub command: CommandSpec,
    /// Test input files or directories, in order.
    pub test_paths: Vec<PathBuf>,
    /// Tolerance applied to numeric tokens.
    pub tolerance: Tolerance,
    /// Whether expected-output files are generated rather than compared against.
    pub generate: bool,
}

impl RunnerConfig {
    /// Creates a new runner config comparing exactly.
    pub fn new(command: CommandSpec, test_paths: Vec<PathBuf>) -> Self {
        Self {
            command,
            test_paths,
            tolerance: Tolerance::exact(),
            generate: false,
        }
    }

    /// Validates parsed command-line arguments into a runner config.
    pub fn from_args(args: &CommandLineArgs) -> Result<Self, Error> {
        let tolerance: Tolerance = args.tolerance.parse()?;
        let command = CommandSpec::resolve(&args.command)?;

        Ok(Self::new(command, args.tests.clone())
            .with_tolerance(tolerance)
            .with_generate(args.generate))
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets whether expected-output files are generated.
    #[must_use]
    pub const fn with_generate(mut self, generate: bool) -> Self {
        self.generate = generate;
        self
    }
}
