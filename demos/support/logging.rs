//! Minimal `tracing` bootstrap shared by the demo binaries.
//!
//! The library itself only emits `tracing` events/spans (see
//! `ringcast::disruptor::dispatcher`); it never installs a subscriber,
//! since that choice belongs to the binary that links the crate.

use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` formatter reading `RUST_LOG`,
/// defaulting to `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
