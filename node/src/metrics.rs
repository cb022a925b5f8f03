//! Prometheus metrics for the eggvote service.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`] that the HTTP
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, HistogramOpts, IntCounter, IntGauge, Opts,
    Registry,
};

/// Central collection of all service-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Ballots accepted and committed.
    pub votes_total: IntCounter,
    /// Vote attempts rejected (validation failures and duplicates).
    pub votes_rejected_total: IntCounter,
    /// Rounds closed by the scheduler.
    pub rounds_closed_total: IntCounter,
    /// Failed tokenization dispatch attempts.
    pub dispatch_failures_total: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Id of the currently open round.
    pub current_round_id: IntGauge,
    /// Ballots committed in the currently open round.
    pub current_round_votes: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// HTTP request handling time, in seconds.
    pub request_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let votes_total = register_int_counter_with_registry!(
            Opts::new("eggvote_votes_total", "Total ballots accepted"),
            registry
        )
        .expect("failed to register votes_total counter");

        let votes_rejected_total = register_int_counter_with_registry!(
            Opts::new(
                "eggvote_votes_rejected_total",
                "Total vote attempts rejected"
            ),
            registry
        )
        .expect("failed to register votes_rejected_total counter");

        let rounds_closed_total = register_int_counter_with_registry!(
            Opts::new("eggvote_rounds_closed_total", "Total rounds closed"),
            registry
        )
        .expect("failed to register rounds_closed_total counter");

        let dispatch_failures_total = register_int_counter_with_registry!(
            Opts::new(
                "eggvote_dispatch_failures_total",
                "Total failed tokenization dispatch attempts"
            ),
            registry
        )
        .expect("failed to register dispatch_failures_total counter");

        let current_round_id = register_int_gauge_with_registry!(
            Opts::new("eggvote_current_round_id", "Id of the open round"),
            registry
        )
        .expect("failed to register current_round_id gauge");

        let current_round_votes = register_int_gauge_with_registry!(
            Opts::new(
                "eggvote_current_round_votes",
                "Ballots committed in the open round"
            ),
            registry
        )
        .expect("failed to register current_round_votes gauge");

        // Exponential buckets covering 1 ms → ~8 s.
        let request_duration_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "eggvote_request_duration_seconds",
                "HTTP request handling time in seconds"
            )
            .buckets(prometheus::exponential_buckets(0.001, 2.0, 14).unwrap()),
            registry
        )
        .expect("failed to register request_duration_seconds histogram");

        Self {
            registry,
            votes_total,
            votes_rejected_total,
            rounds_closed_total,
            dispatch_failures_total,
            current_round_id,
            current_round_votes,
            request_duration_seconds,
        }
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
