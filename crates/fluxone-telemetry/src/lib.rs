//! # Fluxone Telemetry
//!
//! Structured logging and Prometheus counters shared by the Fluxone crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fluxone_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, wins when set |
//! | `FLUXONE_LOG_LEVEL` | `info` | Log level filter |
//! | `FLUXONE_JSON_LOGS` | `false` | JSON log lines instead of pretty output |
//! | `FLUXONE_SERVICE_NAME` | `fluxone` | Service name in the startup log |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    gather_metrics, register_metrics, ACTIONS_EXECUTED, ACTIONS_MISSING, CONTAINER_RESOLUTIONS,
    EVENTS_EMITTED, REGISTRY, STORE_CHANGES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
