//! Implements the command-line interface for `stdio-tester`.

use clap::Parser;

use crate::config::{CommandLineArgs, RunnerConfig};
use crate::events::TraceEventConfig;
use crate::productinfo;
use crate::runner::TestRunner;

/// Main entry point for `stdio-tester`. Never returns.
pub fn run() {
    //
    // Set up panic handler. On release builds, it will capture panic details to a
    // temporary .toml file and report a human-readable message to the screen.
    //
    human_panic::setup_panic!(
        human_panic::Metadata::new(productinfo::PRODUCT_NAME, productinfo::PRODUCT_VERSION)
            .homepage(productinfo::PRODUCT_REPO)
            .support(std::format!(
                "please post a GitHub issue at {}/issues/new",
                productinfo::PRODUCT_REPO
            ))
    );

    //
    // Parse args.
    //
    let parsed_args = match CommandLineArgs::try_parse() {
        Ok(parsed_args) => parsed_args,
        Err(e) => {
            let _ = e.print();

            // clap returns errors for `--help`, `--version`, etc.; those aren't failures.
            let exit_code = match e.kind() {
                clap::error::ErrorKind::DisplayVersion => 0,
                clap::error::ErrorKind::DisplayHelp => 0,
                _ => 1,
            };

            std::process::exit(exit_code);
        }
    };

    //
    // Run.
    //
    let exit_code = run_with_args(&parsed_args);

    std::process::exit(i32::from(exit_code));
}

/// Runs the tests described by the given arguments. Returns the exit code.
///
/// Configuration errors are reported on standard output, alongside the test report; any
/// other error is logged to standard error.
pub fn run_with_args(args: &CommandLineArgs) -> u8 {
    match args.color {
        clap::ColorChoice::Always => colored::control::set_override(true),
        clap::ColorChoice::Never => colored::control::set_override(false),
        clap::ColorChoice::Auto => (),
    }

    let event_config = TraceEventConfig::init(&args.enabled_trace_events, args.verbose);
    tracing::debug!("enabled trace events: {:?}", event_config.enabled_events());

    let result = RunnerConfig::from_args(args).and_then(|config| {
        tracing::debug!(target: "execute", "testing command: {}", config.command);
        TestRunner::new(config).run(std::io::stdout().lock())
    });

    match result {
        Ok(stats) => stats.exit_code(),
        Err(err) if err.is_configuration_error() => {
            println!("{err}");
            1
        }
        Err(err) => {
            tracing::error!("error: {err:#}");
            1
        }
    }
}
