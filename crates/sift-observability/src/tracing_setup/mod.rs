//! Tracing setup: structured logging with span definitions and event types.

pub mod events;
pub mod spans;

use std::sync::Once;

use sift_core::config::ObservabilityConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directive.
pub const LOG_ENV_VAR: &str = "SIFT_LOG";

static INIT: Once = Once::new();

/// Initialize the subscriber with human-readable output.
///
/// Respects `SIFT_LOG` (e.g. `SIFT_LOG=sift_extractor=debug,info`).
/// Defaults to `info`. Idempotent.
pub fn init_tracing() {
    install(None, false);
}

/// Initialize from the `[observability]` config section. `SIFT_LOG` still wins
/// over `log_level`.
pub fn init_tracing_from_config(config: &ObservabilityConfig) {
    install(Some(&config.log_level), config.json_logs);
}

/// Initialize with an explicit filter string, ignoring `SIFT_LOG`.
pub fn init_tracing_with_filter(filter: &str) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(EnvFilter::new(filter))
            .try_init();
    });
}

fn install(level: Option<&str>, json: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

        // try_init: a host application may already own the global subscriber.
        let result = if json {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .with(filter)
                .try_init()
        };
        if let Err(e) = result {
            eprintln!("sift: tracing subscriber not installed: {e}");
        }
    });
}
