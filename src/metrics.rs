//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Auth Metrics
    pub static ref LOGINS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pattern_portal_logins_total", "Total number of completed login callbacks"),
        &["status"]
    ).expect("metric can be created");
    pub static ref LOGOUTS_TOTAL: IntCounter = IntCounter::new(
        "pattern_portal_logouts_total",
        "Total number of logout requests"
    ).expect("metric can be created");

    // Pattern Metrics
    pub static ref PATTERNS_RENDERED_TOTAL: IntCounter = IntCounter::new(
        "pattern_portal_patterns_rendered_total",
        "Total number of patterns rendered"
    ).expect("metric can be created");
    pub static ref PATTERN_INPUT_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pattern_portal_pattern_input_errors_total", "Total number of rejected pattern inputs"),
        &["reason"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("pattern_portal_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; instruments are registered on the first call.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(LOGINS_TOTAL.clone()))
            .expect("LOGINS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(LOGOUTS_TOTAL.clone()))
            .expect("LOGOUTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(PATTERNS_RENDERED_TOTAL.clone()))
            .expect("PATTERNS_RENDERED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(PATTERN_INPUT_ERRORS_TOTAL.clone()))
            .expect("PATTERN_INPUT_ERRORS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Encode every registered instrument in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    TextEncoder::new().encode_to_string(&REGISTRY.gather())
}
