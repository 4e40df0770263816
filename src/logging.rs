//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "dotsync_cli=debug"
    } else {
        "dotsync_cli=info"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flag.
///
/// Diagnostics go to stderr so command output on stdout stays scriptable.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
