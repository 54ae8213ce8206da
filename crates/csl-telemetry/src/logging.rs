//! Subscriber setup for structured logs.
//!
//! Human-readable output for development, JSON lines for containers so a log
//! shipper can parse `level`, `target` and the event fields directly.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Build the filter: `RUST_LOG` wins when it parses, then the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))
}

/// Install the global subscriber.
///
/// Fails with [`TelemetryError::SubscriberInit`] if one is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;

    let result = match (config.console_output, config.json_logs) {
        (false, _) => tracing_subscriber::registry().with(filter).try_init(),
        (true, true) => {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
        (true, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        service = %config.full_service_name(),
        json_logs = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log with the component name attached.
#[macro_export]
macro_rules! log_event {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a status change with the standard list/index fields.
#[macro_export]
macro_rules! log_status_event {
    ($level:ident, $msg:expr, $list:expr, $index:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = "status-list",
            list = %$list,
            index = $index,
            $($($field)*,)?
            $msg
        )
    };
}
