//! Logging setup, standing in for the original's per-channel debug
//! mask (`DEBUG_PFUSE`, `DEBUG_NET`, `DEBUG_BOOT`, `DEBUG_ERR`, ...).
//! `--debug-all` and `--debug=<channels>` become an `EnvFilter`
//! directive string instead of a bitfield.

use crate::config::MagmaConfig;

/// Install a global `tracing` subscriber from `config`'s debug knobs.
/// Safe to call once per process; a second call is a no-op.
pub fn init(config: &MagmaConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(config.filter_directive())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
