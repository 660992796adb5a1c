//! testrig CLI entry point

fn main() {
    // Logging is installed by the CLI once verbosity and color flags are parsed.
    testrig::cli::run();
}
