//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global fmt subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - overrides everything below
/// - `CARTWISE_LOG` / `[logging] filter` - used when `RUST_LOG` is unset
/// - Default: `info,cartwise=debug,sqlx=warn`
///
/// Returns `false` when a subscriber was already installed, e.g. by the
/// host app or an earlier call.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
