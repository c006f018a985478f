//! Prometheus metrics for Fluxone applications.
//!
//! All metrics follow the naming convention: `fluxone_<object>_<metric>_total`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Metrics registry shared by every Application in the process
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // ACTION METRICS
    // =========================================================================

    /// Actions found and executed
    pub static ref ACTIONS_EXECUTED: Counter = Counter::new(
        "fluxone_actions_executed_total",
        "Total number of actions executed through the application"
    ).expect("metric creation failed");

    /// Action lookups that found nothing
    pub static ref ACTIONS_MISSING: Counter = Counter::new(
        "fluxone_actions_missing_total",
        "Total number of executions requested for unregistered actions"
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT METRICS
    // =========================================================================

    /// Events emitted on application buses
    pub static ref EVENTS_EMITTED: Counter = Counter::new(
        "fluxone_events_emitted_total",
        "Total number of events emitted on application event buses"
    ).expect("metric creation failed");

    /// Store change notifications
    pub static ref STORE_CHANGES: Counter = Counter::new(
        "fluxone_store_changes_total",
        "Total number of store change notifications"
    ).expect("metric creation failed");

    // =========================================================================
    // CONTAINER METRICS
    // =========================================================================

    /// Container lookups made through the application, by registration kind
    pub static ref CONTAINER_RESOLUTIONS: CounterVec = CounterVec::new(
        Opts::new(
            "fluxone_container_resolutions_total",
            "Total container lookups made through the application"
        ),
        &["kind"]  // kind: value/factory/singleton/missing
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`].
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Actions
        Box::new(ACTIONS_EXECUTED.clone()),
        Box::new(ACTIONS_MISSING.clone()),
        // Events
        Box::new(EVENTS_EMITTED.clone()),
        Box::new(STORE_CHANGES.clone()),
        // Container
        Box::new(CONTAINER_RESOLUTIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics in the Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    register_metrics()?;

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
