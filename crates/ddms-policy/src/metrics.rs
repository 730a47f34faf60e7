//! # Policy Metrics
//!
//! Prometheus metrics for observing license flow and admission decisions.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ddms-policy = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `ddms_license_updates_total` - Counter of registry mutations (by kind)
//! - `ddms_license_outputs_skipped_total` - Counter of malformed license outputs
//! - `ddms_admission_checks_total` - Counter of `can_mine` verdicts (by verdict)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_int_counter, CounterVec, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Registry mutations, labeled granted / amended / revoked / ignored
    pub static ref LICENSE_UPDATES: CounterVec = register_counter_vec!(
        "ddms_license_updates_total",
        "Total number of license registry mutations",
        &["kind"]
    )
    .expect("Failed to create LICENSE_UPDATES metric");

    /// License-header outputs dropped for violating the wire format
    pub static ref LICENSE_OUTPUTS_SKIPPED: IntCounter = register_int_counter!(
        "ddms_license_outputs_skipped_total",
        "Total number of malformed license outputs skipped"
    )
    .expect("Failed to create LICENSE_OUTPUTS_SKIPPED metric");

    /// Admission checks, labeled allowed / denied
    pub static ref ADMISSION_CHECKS: CounterVec = register_counter_vec!(
        "ddms_admission_checks_total",
        "Total number of can_mine admission checks",
        &["verdict"]
    )
    .expect("Failed to create ADMISSION_CHECKS metric");
}

/// Record a registry mutation by kind
#[cfg(feature = "metrics")]
pub fn record_license_update(kind: &str) {
    LICENSE_UPDATES.with_label_values(&[kind]).inc();
}

/// Record a skipped malformed license output
#[cfg(feature = "metrics")]
pub fn record_output_skipped() {
    LICENSE_OUTPUTS_SKIPPED.inc();
}

/// Record a can_mine verdict
#[cfg(feature = "metrics")]
pub fn record_admission(allowed: bool) {
    let verdict = if allowed { "allowed" } else { "denied" };
    ADMISSION_CHECKS.with_label_values(&[verdict]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_license_update(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_output_skipped() {}

#[cfg(not(feature = "metrics"))]
pub fn record_admission(_allowed: bool) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        // These should compile and run without panic even without metrics feature
        record_license_update("granted");
        record_output_skipped();
        record_admission(true);
        record_admission(false);
    }
}
