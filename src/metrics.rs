//! Metrics collection for transfer submissions

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Transfer pipeline metrics
pub struct Metrics {
    registry: Registry,

    // Counters
    pub transfers_submitted: IntCounter,
    pub transfers_confirmed: IntCounter,
    pub transfers_failed: IntCounter,
    pub failures_by_category: IntCounterVec,

    // Histograms
    pub confirmation_latency: Histogram,
    pub build_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let transfers_submitted = IntCounter::with_opts(Opts::new(
            "transfers_submitted_total",
            "Total number of transfers handed to the submitter",
        ))?;

        let transfers_confirmed = IntCounter::with_opts(Opts::new(
            "transfers_confirmed_total",
            "Number of transfers confirmed at the configured commitment",
        ))?;

        let transfers_failed = IntCounter::with_opts(Opts::new(
            "transfers_failed_total",
            "Number of transfers that ended in an error",
        ))?;

        let failures_by_category = IntCounterVec::new(
            Opts::new(
                "transfer_failures_by_category_total",
                "Failed transfers by error category",
            ),
            &["category"],
        )?;

        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "transfer_confirmation_latency_seconds",
                "Time from build start to confirmation",
            )
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        )?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("transfer_build_latency_seconds", "Transaction build latency")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
        )?;

        registry.register(Box::new(transfers_submitted.clone()))?;
        registry.register(Box::new(transfers_confirmed.clone()))?;
        registry.register(Box::new(transfers_failed.clone()))?;
        registry.register(Box::new(failures_by_category.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;

        Ok(Self {
            registry,
            transfers_submitted,
            transfers_confirmed,
            transfers_failed,
            failures_by_category,
            confirmation_latency,
            build_latency,
        })
    }

    /// Gather every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Record a failed transfer under its error category
    pub fn record_failure(&self, category: &str) {
        self.transfers_failed.inc();
        self.failures_by_category
            .with_label_values(&[category])
            .inc();
    }

    /// Number of failures recorded for `category`
    pub fn failures_for(&self, category: &str) -> u64 {
        self.failures_by_category
            .with_label_values(&[category])
            .get()
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.start.elapsed().as_secs_f64());
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let metrics = Metrics::new().expect("Should create metrics");
        metrics.transfers_submitted.inc();
        metrics.record_failure("timeout");
        metrics.record_failure("timeout");
        metrics.record_failure("rejected");

        assert_eq!(metrics.transfers_submitted.get(), 1);
        assert_eq!(metrics.transfers_failed.get(), 3);
        assert_eq!(metrics.failures_for("timeout"), 2);
        assert_eq!(metrics.failures_for("rejected"), 1);
        assert_eq!(metrics.failures_for("expired"), 0);

        let text = metrics.gather_text().expect("Should encode metrics");
        assert!(text.contains("transfers_submitted_total 1"));
        assert!(text.contains("transfers_failed_total 3"));
    }

    #[test]
    fn test_timer_observes_histogram() {
        let metrics = Metrics::new().expect("Should create metrics");
        let timer = Timer::new();
        timer.observe_duration(&metrics.build_latency);
        assert_eq!(metrics.build_latency.get_sample_count(), 1);
    }
}
