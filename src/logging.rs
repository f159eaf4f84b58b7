//! Opt-in `tracing` subscriber setup.
//!
//! The library only emits events; applications that want to see them without
//! wiring their own subscriber can call [`init`] once at startup.

use crate::config::BridgeConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `cloudbridge=debug` in debug mode and `cloudbridge=warn` otherwise.
///
/// Returns `false` if another global subscriber is already installed.
pub fn init(config: &BridgeConfig) -> bool {
    let fallback = if config.debug_mode {
        "cloudbridge=debug"
    } else {
        "cloudbridge=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
