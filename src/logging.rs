//! Logging initialization for the command-line tools
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Install a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `ingot=debug` with
/// `verbose` and `warn` without it. Calling this more than once is a no-op.
pub fn init(verbose: bool) {
    INIT_ONCE.call_once(|| {
        let fallback = if verbose { "ingot=debug" } else { "warn" };
        // a host process may already own the global subscriber
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .ok();
    });
}
