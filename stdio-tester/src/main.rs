//! Implements the command-line interface for `stdio-tester`.

/// Main entry point for `stdio-tester`.
fn main() {
    stdio_tester::entry::run();
}
