//! Log setup for the binaries.
//!
//! The library only emits `tracing` events; per-item failures are observable
//! through these logs alone. Binaries call [`init_tracing`] once at startup.

use std::env;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Filter directives for icondigger; falls back to `RUST_LOG` when unset.
pub const LOG_ENV: &str = "ICONDIGGER_LOG";

/// Environment variable the filter is read from.
pub fn filter_env_var() -> &'static str {
    if env::var_os(LOG_ENV).is_some() {
        LOG_ENV
    } else {
        EnvFilter::DEFAULT_ENV
    }
}

/// Install a compact stderr subscriber, `warn` unless the environment says otherwise.
pub fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(filter_env_var())
        .from_env_lossy();

    // A subscriber may already be installed (tests, embedding front ends).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
