//! Ambient stderr diagnostics, shared by both binaries.
//!
//! Never used for the decision itself — that is the single contractual
//! line on standard output. This is purely for operator-facing warnings
//! (invalid pattern, unreadable marker file, malformed registry, ...).

use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "BLOCKGUARD_LOG";

/// Install a `tracing-subscriber` `fmt` layer writing to stderr, filtered
/// by `BLOCKGUARD_LOG` (default `warn`). Safe to call once per process;
/// a second call in the same process is a silent no-op.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
