//! Subscriber setup

use relay_core::{LogFormat, ObservabilityConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize structured logging.
///
/// `RUST_LOG` overrides `config.log_level` when set. Calling this more than
/// once, or after another subscriber was installed, is a no-op.
///
/// # Example
///
/// ```rust,no_run
/// use relay_telemetry::{ObservabilityConfig, init_telemetry};
///
/// init_telemetry(&ObservabilityConfig::default());
/// ```
pub fn init_telemetry(config: &ObservabilityConfig) {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let result = match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_line_number(true),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed");
    }
}

/// Whether [`init_telemetry`] has run in this process
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}
