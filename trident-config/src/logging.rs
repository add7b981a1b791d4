//! Shared `tracing` subscriber init for the three binaries: a console
//! layer filtered by `RUST_LOG` (falling back to a per-binary default),
//! no export layer, since nothing here ships to a remote collector.

use tracing_subscriber::EnvFilter;

/// Initialize a `tracing_subscriber::fmt` subscriber. `default_level` is
/// used when `RUST_LOG` isn't set; an explicit `RUST_LOG` always wins.
pub fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).init();
}
