//! # CSL Telemetry
//!
//! Logging setup shared by every Credential-Status-Ledger binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use csl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::for_component("node"))?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CSL_SERVICE_NAME` | `credential-status-ledger` | Service name in logs |
//! | `CSL_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `CSL_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `CSL_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging for the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)
}
