//! Prometheus exporter and per-store counters.
//!
//! Every store reports `store_actions_total{store,outcome}`, an action
//! latency histogram, and `store_lock_timeouts_total{store}`.
//!
//! # Example
//!
//! ```rust,no_run
//! use dogspa_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsServer::new("0.0.0.0:9090".parse()?);
//! exporter.start()?;
//! // curl http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, gauge, histogram};

/// Exporter setup failure.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The Prometheus exporter could not be configured
    #[error("Cannot build Prometheus exporter: {0}")]
    Build(String),
}

/// Installs the global recorder and serves `/metrics` on `addr`.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Exporter for `addr`; nothing is bound until [`start`](Self::start).
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the recorder and spawn the HTTP listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a
    /// warning and leaves the existing recorder in place.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        describe_store_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        let addr = self.addr;
        tokio::spawn(async move {
            // ExporterError carries no Debug or Display
            if exporter.await.is_err() {
                tracing::error!(addr = %addr, "Metrics exporter stopped");
            }
        });

        self.handle = Some(handle);
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Handle of the installed recorder
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Current metrics in the Prometheus text format, or `None` if another
    /// recorder was installed first.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn describe_store_metrics() {
    describe_counter!(
        "store_actions_total",
        "Actions processed by a store, by store and outcome (accepted, rejected, timeout)"
    );
    describe_histogram!(
        "store_action_duration_seconds",
        "Time from send to commit, including lock waits"
    );
    describe_counter!(
        "store_lock_timeouts_total",
        "Actions that gave up waiting for a key or state lock"
    );
}

/// Outcome counters keyed by store name.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Action committed after `duration`
    pub fn record_accepted(store: &'static str, duration: Duration) {
        counter!("store_actions_total", "store" => store, "outcome" => "accepted").increment(1);
        histogram!("store_action_duration_seconds", "store" => store)
            .record(duration.as_secs_f64());
    }

    /// Action refused by the reducer
    pub fn record_rejected(store: &'static str) {
        counter!("store_actions_total", "store" => store, "outcome" => "rejected").increment(1);
    }

    /// Action abandoned at its lock deadline
    pub fn record_timeout(store: &'static str) {
        counter!("store_actions_total", "store" => store, "outcome" => "timeout").increment(1);
        counter!("store_lock_timeouts_total", "store" => store).increment(1);
    }
}
