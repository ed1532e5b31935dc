//! Prometheus metrics for the sync engine

use anyhow::Result;
use prometheus::core::Collector;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counters describing what the engine has done
#[derive(Clone)]
pub struct SyncMetrics {
    /// Lifecycle events received, by status
    pub events_total: CounterVec,
    /// Endpoints written for started containers
    pub endpoints_registered_total: Counter,
    /// Endpoints removed for stopped containers
    pub endpoints_removed_total: Counter,
    /// Hosts removed after losing their last endpoint
    pub hosts_removed_total: Counter,
    /// Failed units of work, by error kind
    pub errors_total: CounterVec,
    pub registry: Arc<Registry>,
}

impl SyncMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_total = CounterVec::new(
            Opts::new("havok_events_total", "Container lifecycle events received"),
            &["status"],
        )?;
        let endpoints_registered_total = Counter::new(
            "havok_endpoints_registered_total",
            "Endpoints registered for started containers",
        )?;
        let endpoints_removed_total = Counter::new(
            "havok_endpoints_removed_total",
            "Endpoints removed for stopped containers",
        )?;
        let hosts_removed_total = Counter::new(
            "havok_hosts_removed_total",
            "Hosts removed after their last endpoint went away",
        )?;
        let errors_total = CounterVec::new(
            Opts::new("havok_errors_total", "Errors while syncing, by kind"),
            &["kind"],
        )?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(endpoints_registered_total.clone()))?;
        registry.register(Box::new(endpoints_removed_total.clone()))?;
        registry.register(Box::new(hosts_removed_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(Self {
            events_total,
            endpoints_registered_total,
            endpoints_removed_total,
            hosts_removed_total,
            errors_total,
            registry,
        })
    }

    pub fn record_event(&self, status: &str) {
        self.events_total.with_label_values(&[status]).inc();
    }

    pub fn record_error(&self, kind: &str) {
        self.errors_total.with_label_values(&[kind]).inc();
    }

    /// Current count of errors of one kind; reading never creates a series
    pub fn errors(&self, kind: &str) -> u64 {
        let families = self.errors_total.collect();
        families
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "kind" && label.get_value() == kind)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new().expect("Failed to create default SyncMetrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = SyncMetrics::new().expect("Failed to create metrics");
        assert!(metrics.gather().is_ok());
    }

    #[test]
    fn test_counters_show_up_in_text_format() {
        let metrics = SyncMetrics::default();
        metrics.record_event("start");
        metrics.record_error("store");
        metrics.endpoints_registered_total.inc();

        let text = metrics.gather().expect("Failed to gather metrics");
        assert!(text.contains("# HELP"));
        assert!(text.contains("havok_events_total{status=\"start\"} 1"));
        assert!(text.contains("havok_errors_total{kind=\"store\"} 1"));
        assert!(text.contains("havok_endpoints_registered_total 1"));
    }

    #[test]
    fn test_clones_share_counters() {
        let a = SyncMetrics::default();
        let b = a.clone();
        a.record_error("validation");
        assert_eq!(b.errors("validation"), 1);
        assert_eq!(b.errors("store"), 0);
    }

    #[test]
    fn test_reading_an_error_kind_adds_no_series() {
        let metrics = SyncMetrics::default();
        assert_eq!(metrics.errors("store"), 0);
        let text = metrics.gather().unwrap();
        assert!(!text.contains("kind=\"store\""));
    }
}
