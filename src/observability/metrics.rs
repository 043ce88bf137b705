//! Forwarder metrics
//!
//! Counters and histograms are recorded through the `metrics` facade. Without an
//! installed recorder they are no-ops, so `run` from cron costs nothing; the
//! long-running `schedule` mode can expose them through the Prometheus exporter.

use std::net::SocketAddr;
use tracing::{debug, info, warn};

/// Build a metric name with the forwarder prefix
macro_rules! forwarder_metric {
    (counter, $name:expr) => {
        concat!("audit_fwd_", $name, "_total")
    };
    (histogram, $name:expr) => {
        concat!("audit_fwd_", $name)
    };
}

/// Install the Prometheus exporter listening on `addr`
pub fn init_metrics(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            info!("Prometheus exporter listening on http://{}/metrics", addr);
            ForwarderMetrics::describe_metrics();
            ForwarderMetrics::register_metrics();
        }
        Err(e) => {
            warn!("Failed to install Prometheus exporter on {}: {}", addr, e);
        }
    }
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

pub struct ForwarderMetrics;

impl ForwarderMetrics {
    pub fn record_run_started() {
        ::metrics::counter!(forwarder_metric!(counter, "runs")).increment(1);
    }

    pub fn record_fetched(count: usize) {
        ::metrics::counter!(forwarder_metric!(counter, "records_fetched")).increment(count as u64);
    }

    pub fn record_published(count: usize, body_bytes: usize) {
        ::metrics::counter!(forwarder_metric!(counter, "records_published")).increment(count as u64);
        ::metrics::histogram!(forwarder_metric!(histogram, "publish_body_bytes")).record(body_bytes as f64);
    }

    /// `stage` is one of `config`, `fetch`, `publish`
    pub fn record_failure(stage: &'static str) {
        ::metrics::counter!(forwarder_metric!(counter, "run_failures"), "stage" => stage).increment(1);
    }

    pub fn record_run_duration(duration_secs: f64) {
        ::metrics::histogram!(forwarder_metric!(histogram, "run_duration_seconds")).record(duration_secs);
    }

    /// Pre-register so every series shows up on the exporter before the first run
    pub fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(forwarder_metric!(counter, "runs"));
        let _ = counter!(forwarder_metric!(counter, "records_fetched"));
        let _ = counter!(forwarder_metric!(counter, "records_published"));
        let _ = histogram!(forwarder_metric!(histogram, "publish_body_bytes"));
        let _ = histogram!(forwarder_metric!(histogram, "run_duration_seconds"));
    }

    /// Attach help text to every series; returns how many were described
    pub fn describe_metrics() -> usize {
        let docs = Self::metrics_documentation();
        for doc in &docs {
            match doc.metric_type {
                MetricType::Counter => ::metrics::describe_counter!(doc.name, doc.help),
                MetricType::Histogram => ::metrics::describe_histogram!(doc.name, doc.help),
            }
            debug!(name = doc.name, labels = ?doc.labels, "Described metric");
        }
        docs.len()
    }

    pub fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: forwarder_metric!(counter, "runs"),
                metric_type: MetricType::Counter,
                help: "Total number of forwarding runs started",
                labels: vec![],
            },
            MetricDoc {
                name: forwarder_metric!(counter, "run_failures"),
                metric_type: MetricType::Counter,
                help: "Total number of forwarding runs that failed, by stage",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: forwarder_metric!(counter, "records_fetched"),
                metric_type: MetricType::Counter,
                help: "Total number of audit records fetched from the source",
                labels: vec![],
            },
            MetricDoc {
                name: forwarder_metric!(counter, "records_published"),
                metric_type: MetricType::Counter,
                help: "Total number of log entries accepted by the ingestion endpoint",
                labels: vec![],
            },
            MetricDoc {
                name: forwarder_metric!(histogram, "publish_body_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of published request bodies in bytes",
                labels: vec![],
            },
            MetricDoc {
                name: forwarder_metric!(histogram, "run_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall-clock duration of a forwarding run in seconds",
                labels: vec![],
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name_macro() {
        assert_eq!(forwarder_metric!(counter, "runs"), "audit_fwd_runs_total");
        assert_eq!(forwarder_metric!(histogram, "publish_body_bytes"), "audit_fwd_publish_body_bytes");
    }

    #[test]
    fn test_recording_without_recorder() {
        // No recorder installed: all calls are no-ops
        ForwarderMetrics::register_metrics();
        ForwarderMetrics::record_run_started();
        ForwarderMetrics::record_failure("fetch");
        ForwarderMetrics::record_published(3, 413);
    }

    #[test]
    fn test_describe_covers_every_documented_metric() {
        assert_eq!(ForwarderMetrics::describe_metrics(), ForwarderMetrics::metrics_documentation().len());
    }

    #[test]
    fn test_metrics_documentation() {
        let docs = ForwarderMetrics::metrics_documentation();
        assert_eq!(docs.len(), 6);
        for doc in docs {
            assert!(doc.name.starts_with("audit_fwd_"));
        }
    }
}
