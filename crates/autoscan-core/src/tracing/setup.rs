//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogLevel;
use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize logging at `level`.
///
/// `AUTOSCAN_LOG` (e.g. `autoscan_analysis=debug,autoscan_storage=warn`)
/// takes precedence over `level`. Output goes to stderr so stdout stays
/// free for module lists.
///
/// Idempotent; a subscriber installed by the host process is left alone.
pub fn init_tracing(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(format!("autoscan={}", level.as_directive())));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .with(filter)
            .try_init();
    });
}
