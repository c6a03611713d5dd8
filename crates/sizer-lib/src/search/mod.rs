//! Capacity search
//!
//! For one node type, probe the feasibility oracle with growing homogeneous
//! pools until every workload schedules or the node limit is reached.

use crate::error::ConfigError;
use crate::models::{NodeType, WorkloadSet};
use crate::observability::{PlanLogger, PlannerMetrics};
use crate::oracle::{FeasibilityOracle, NodePool, Verdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::debug;

/// Smallest cluster probed unless configured otherwise
pub const DEFAULT_MIN_NODES: u32 = 2;

/// Time budget of a single oracle call
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_millis(250);

/// Node types searched at the same time
pub const DEFAULT_CONCURRENCY: usize = 4;

/// How the node count grows after an infeasible probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Grow by roughly 1/15th of the current count, at least one node
    #[default]
    Fast,
    /// Grow by exactly one node, so the first feasible count is the minimum
    Slow,
}

impl SearchMode {
    /// Node count to probe after `n`
    pub fn next(self, n: u32) -> u32 {
        match self {
            SearchMode::Fast => n.saturating_add((n / 15).max(1)),
            SearchMode::Slow => n.saturating_add(1),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Fast => f.write_str("fast"),
            SearchMode::Slow => f.write_str("slow"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(SearchMode::Fast),
            "slow" => Ok(SearchMode::Slow),
            other => Err(ConfigError::Invalid(format!(
                "unknown search mode {other:?}, expected fast or slow"
            ))),
        }
    }
}

/// Node count range of a search; `min` is probed first, `max` never is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchBounds {
    pub min: u32,
    pub max: u32,
}

impl SearchBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Fill in defaults for unset bounds
    ///
    /// `max` defaults to the workload count, since one node per pod is
    /// always enough when every pod fits on a node. If that leaves no room
    /// above `min`, the defaulted max becomes `min + 1` so `min` is still
    /// probed once. An explicit max is used as given.
    pub fn resolve(min: Option<u32>, max: Option<u32>, workload_count: usize) -> Self {
        let min = min.unwrap_or(DEFAULT_MIN_NODES);
        let max = max.unwrap_or_else(|| {
            let count = u32::try_from(workload_count).unwrap_or(u32::MAX);
            if count <= min {
                min.saturating_add(1)
            } else {
                count
            }
        });

        Self { min, max }
    }

    /// True when no node count lies in `[min, max)`
    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }
}

/// Tunables shared by every search of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub min_nodes: u32,
    /// Defaults to the workload count when unset
    pub max_nodes: Option<u32>,
    pub oracle_timeout: Duration,
    pub concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            min_nodes: DEFAULT_MIN_NODES,
            max_nodes: None,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl SearchConfig {
    pub fn bounds(&self, workload_count: usize) -> SearchBounds {
        SearchBounds::resolve(Some(self.min_nodes), self.max_nodes, workload_count)
    }
}

/// How a search for one node type ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Every workload scheduled on `node_count` nodes
    Converged { node_count: u32 },
    /// The next node count would have been `max_nodes` or more
    LimitReached {
        max_nodes: u32,
        last_probed: Option<u32>,
    },
    /// The oracle rejected its inputs as malformed
    Aborted { reason: String },
}

impl SearchOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, SearchOutcome::Converged { .. })
    }
}

/// Result of searching one node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub node_type: String,
    pub hourly_price: f64,
    pub outcome: SearchOutcome,
    /// Oracle calls made for this node type
    pub probes: u64,
}

/// Progress notifications sent while searches run
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Started { node_type: String },
    Probe { node_type: String, node_count: u32 },
    Finished { report: SearchReport },
}

enum ProbeResult {
    Scheduled,
    Infeasible,
    Structural(String),
}

/// Minimal-node-count search against a feasibility oracle
///
/// Cloning is cheap; clones share the oracle, the simulation-run counter
/// and the event channel.
#[derive(Clone)]
pub struct CapacitySearch {
    oracle: Arc<dyn FeasibilityOracle>,
    mode: SearchMode,
    oracle_timeout: Duration,
    runs: Arc<AtomicU64>,
    metrics: Option<PlannerMetrics>,
    events: Option<mpsc::Sender<SearchEvent>>,
    logger: PlanLogger,
}

impl CapacitySearch {
    pub fn new(oracle: Arc<dyn FeasibilityOracle>, config: &SearchConfig) -> Self {
        Self {
            oracle,
            mode: config.mode,
            oracle_timeout: config.oracle_timeout,
            runs: Arc::new(AtomicU64::new(0)),
            metrics: None,
            events: None,
            logger: PlanLogger::new(),
        }
    }

    /// Count simulation runs into a counter shared with other searches
    pub fn with_run_counter(mut self, runs: Arc<AtomicU64>) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_metrics(mut self, metrics: PlannerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<SearchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Oracle calls made through this search's counter so far
    pub fn simulation_runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Search for the smallest feasible pool of `node_type` within `bounds`
    pub async fn run(
        &self,
        node_type: &NodeType,
        workloads: &WorkloadSet,
        bounds: SearchBounds,
    ) -> SearchReport {
        let name = node_type.name();
        self.emit(SearchEvent::Started {
            node_type: name.to_string(),
        });

        let mut probes = 0u64;
        let mut last_probed = None;
        let mut n = bounds.min;

        let outcome = loop {
            if n >= bounds.max {
                self.logger.log_limit_reached(name, bounds.max, probes);
                break SearchOutcome::LimitReached {
                    max_nodes: bounds.max,
                    last_probed,
                };
            }

            let pool = NodePool::homogeneous(node_type, n);
            let capacity = match pool.total_capacity() {
                Ok(total) => total.to_string(),
                Err(e) => e.to_string(),
            };
            self.logger.log_probe(name, n, &capacity);
            self.emit(SearchEvent::Probe {
                node_type: name.to_string(),
                node_count: n,
            });

            probes += 1;
            last_probed = Some(n);

            match self.probe(name, &pool, workloads).await {
                ProbeResult::Scheduled => {
                    self.logger.log_converged(name, n, probes);
                    break SearchOutcome::Converged { node_count: n };
                }
                ProbeResult::Structural(reason) => {
                    self.logger.log_search_aborted(name, &reason, probes);
                    break SearchOutcome::Aborted { reason };
                }
                ProbeResult::Infeasible => n = self.mode.next(n),
            }
        };

        let report = SearchReport {
            node_type: name.to_string(),
            hourly_price: node_type.hourly_price(),
            outcome,
            probes,
        };
        self.emit(SearchEvent::Finished {
            report: report.clone(),
        });

        report
    }

    async fn probe(&self, name: &str, pool: &NodePool, workloads: &WorkloadSet) -> ProbeResult {
        self.runs.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &self.metrics {
            metrics.inc_simulation_runs();
        }

        let started = Instant::now();
        let result =
            tokio::time::timeout(self.oracle_timeout, self.oracle.evaluate(pool, workloads)).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_oracle_latency(started.elapsed());
        }

        let node_count = pool.len() as u32;
        match result {
            Ok(Ok(Verdict::Scheduled)) => ProbeResult::Scheduled,
            Ok(Ok(Verdict::Unschedulable { pending })) => {
                debug!(
                    node_type = %name,
                    node_count = node_count,
                    pending = pending,
                    "Pods left pending"
                );
                ProbeResult::Infeasible
            }
            Ok(Err(e)) if e.is_structural() => ProbeResult::Structural(e.to_string()),
            Ok(Err(e)) => {
                self.logger.log_oracle_error(name, node_count, &e.to_string());
                ProbeResult::Infeasible
            }
            Err(_) => {
                self.logger
                    .log_probe_timeout(name, node_count, self.oracle_timeout);
                if let Some(metrics) = &self.metrics {
                    metrics.inc_oracle_timeouts();
                }
                ProbeResult::Infeasible
            }
        }
    }

    fn emit(&self, event: SearchEvent) {
        if let Some(events) = &self.events {
            // A full or closed channel drops the event
            let _ = events.try_send(event);
        }
    }
}
