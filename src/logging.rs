//! Logging setup for the shell.
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `BLOCKSH_LOG` (or `RUST_LOG`) overrides the level picked from `-v` flags.

use tracing_subscriber::EnvFilter;

/// Log level selected from the number of `-v` flags
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize logging. Call this once at startup.
pub fn init_logging(verbose: u8) {
    let env_filter = EnvFilter::try_from_env("BLOCKSH_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
