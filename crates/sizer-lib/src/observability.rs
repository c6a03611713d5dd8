//! Observability infrastructure for the planner
//!
//! Provides:
//! - Prometheus metrics (simulation runs, oracle latency, per-type outcomes)
//! - Structured logging of planning events with tracing

use crate::filter::Rejection;
use crate::search::SearchBounds;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Encoder, Histogram, IntCounter,
    IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Histogram buckets for oracle call latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PlannerMetricsInner> = OnceLock::new();

struct PlannerMetricsInner {
    simulation_runs: IntCounter,
    oracle_latency_seconds: Histogram,
    oracle_timeouts: IntCounter,
    node_types_converged: IntGauge,
    node_types_failed: IntGauge,
    node_types_rejected: IntGauge,
}

impl PlannerMetricsInner {
    fn new() -> Self {
        Self {
            simulation_runs: register_int_counter!(
                "sizer_simulation_runs_total",
                "Total number of feasibility oracle calls"
            )
            .expect("Failed to register simulation_runs_total"),

            oracle_latency_seconds: register_histogram!(
                "sizer_oracle_latency_seconds",
                "Wall-clock time spent in feasibility oracle calls",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register oracle_latency_seconds"),

            oracle_timeouts: register_int_counter!(
                "sizer_oracle_timeouts_total",
                "Oracle calls abandoned after exceeding their time budget"
            )
            .expect("Failed to register oracle_timeouts_total"),

            node_types_converged: register_int_gauge!(
                "sizer_node_types_converged",
                "Node types whose search found a feasible node count in the last plan"
            )
            .expect("Failed to register node_types_converged"),

            node_types_failed: register_int_gauge!(
                "sizer_node_types_failed",
                "Node types whose search hit its limit or aborted in the last plan"
            )
            .expect("Failed to register node_types_failed"),

            node_types_rejected: register_int_gauge!(
                "sizer_node_types_rejected",
                "Node types dropped by the pre-filter in the last plan"
            )
            .expect("Failed to register node_types_rejected"),
        }
    }
}

/// Planner metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PlannerMetrics {
    _private: (),
}

impl Default for PlannerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PlannerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PlannerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_simulation_runs(&self) {
        self.inner().simulation_runs.inc();
    }

    pub fn observe_oracle_latency(&self, duration: Duration) {
        self.inner()
            .oracle_latency_seconds
            .observe(duration.as_secs_f64());
    }

    pub fn inc_oracle_timeouts(&self) {
        self.inner().oracle_timeouts.inc();
    }

    /// Record per-type outcomes of a finished plan
    pub fn set_node_type_outcomes(&self, converged: usize, failed: usize, rejected: usize) {
        self.inner().node_types_converged.set(converged as i64);
        self.inner().node_types_failed.set(failed as i64);
        self.inner().node_types_rejected.set(rejected as i64);
    }

    pub fn simulation_runs(&self) -> u64 {
        self.inner().simulation_runs.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for planning events
///
/// Keeps the event names and field sets of planner logs in one place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanLogger;

impl PlanLogger {
    pub fn new() -> Self {
        Self
    }

    pub fn log_plan_started(&self, candidates: usize, workloads: usize, bounds: SearchBounds) {
        info!(
            event = "plan_started",
            candidates = candidates,
            workloads = workloads,
            min_nodes = bounds.min,
            max_nodes = bounds.max,
            "Starting capacity search"
        );
    }

    pub fn log_node_type_rejected(&self, rejection: &Rejection) {
        warn!(
            event = "node_type_rejected",
            node_type = %rejection.node_type,
            dimension = %rejection.dimension,
            capacity = %rejection.capacity,
            demand = %rejection.demand,
            workload = %rejection.workload,
            "Ignoring node type {} with {} {} because pod {} requests {}",
            rejection.node_type,
            rejection.capacity,
            rejection.dimension,
            rejection.workload,
            rejection.demand
        );
    }

    pub fn log_probe(&self, node_type: &str, node_count: u32, pool_capacity: &str) {
        debug!(
            event = "probe",
            node_type = %node_type,
            node_count = node_count,
            pool_capacity = %pool_capacity,
            "Simulating {} nodes of {}",
            node_count,
            node_type
        );
    }

    pub fn log_probe_timeout(&self, node_type: &str, node_count: u32, budget: Duration) {
        let budget_ms = budget.as_millis() as u64;
        debug!(
            event = "probe_timeout",
            node_type = %node_type,
            node_count = node_count,
            budget_ms = budget_ms,
            "Simulation exceeded its time budget"
        );
    }

    pub fn log_oracle_error(&self, node_type: &str, node_count: u32, error: &str) {
        warn!(
            event = "probe_failed",
            node_type = %node_type,
            node_count = node_count,
            error = %error,
            "Simulation failed, treating node count as infeasible"
        );
    }

    pub fn log_converged(&self, node_type: &str, node_count: u32, probes: u64) {
        info!(
            event = "search_converged",
            node_type = %node_type,
            node_count = node_count,
            probes = probes,
            "Found feasible node count"
        );
    }

    pub fn log_limit_reached(&self, node_type: &str, max_nodes: u32, probes: u64) {
        warn!(
            event = "search_limit_reached",
            node_type = %node_type,
            max_nodes = max_nodes,
            probes = probes,
            "Instance type {} reached limit of {} nodes",
            node_type,
            max_nodes
        );
    }

    pub fn log_search_aborted(&self, node_type: &str, reason: &str, probes: u64) {
        warn!(
            event = "search_aborted",
            node_type = %node_type,
            reason = %reason,
            probes = probes,
            "Failed to simulate a cluster of {}",
            node_type
        );
    }

    pub fn log_plan_finished(&self, converged: usize, failed: usize, simulation_runs: u64) {
        info!(
            event = "plan_finished",
            converged = converged,
            failed = failed,
            simulation_runs = simulation_runs,
            "Completed {} simulations",
            simulation_runs
        );
    }
}
