//! Plan orchestration
//!
//! Filters the candidate node types, runs one capacity search per survivor
//! on a bounded pool of tokio tasks, then prices and ranks what converged.

mod report;

pub use report::{CollectingSink, FailureReason, NodeTypeFailure, PlanReport, ReportSink};

pub use crate::search::SearchEvent;

use crate::filter::{filter_node_types, FilterOutcome};
use crate::models::{NodeType, PlanResult, WorkloadSet};
use crate::observability::{PlanLogger, PlannerMetrics};
use crate::oracle::FeasibilityOracle;
use crate::ranking::rank;
use crate::search::{
    CapacitySearch, SearchBounds, SearchConfig, SearchOutcome, SearchReport,
};
use chrono::Utc;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Finds the cheapest homogeneous cluster for a workload set
pub struct Planner {
    oracle: Arc<dyn FeasibilityOracle>,
    config: SearchConfig,
    metrics: Option<PlannerMetrics>,
    events: Option<mpsc::Sender<SearchEvent>>,
    logger: PlanLogger,
}

impl Planner {
    pub fn new(oracle: Arc<dyn FeasibilityOracle>, config: SearchConfig) -> Self {
        Self {
            oracle,
            config,
            metrics: None,
            events: None,
            logger: PlanLogger::new(),
        }
    }

    /// Record simulation runs and outcomes in the global Prometheus metrics
    pub fn with_metrics(mut self, metrics: PlannerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Receive progress events from subsequent runs
    ///
    /// Events are dropped rather than awaited when the receiver lags more
    /// than `buffer` events behind.
    pub fn subscribe(&mut self, buffer: usize) -> mpsc::Receiver<SearchEvent> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        self.events = Some(tx);
        rx
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Filter, search, price and rank `candidates` for `workloads`
    pub async fn plan(&self, candidates: Vec<NodeType>, workloads: &WorkloadSet) -> PlanReport {
        let candidate_count = candidates.len();
        let bounds = self.config.bounds(workloads.len());

        let FilterOutcome { accepted, rejected } = filter_node_types(candidates, workloads);
        let searched = accepted.len();
        self.logger
            .log_plan_started(accepted.len(), workloads.len(), bounds);

        let runs = Arc::new(AtomicU64::new(0));
        let reports = self
            .run_searches(accepted, workloads, bounds, runs.clone())
            .await;

        let mut results = Vec::new();
        let mut failures = Vec::new();
        for report in reports {
            match report.outcome {
                SearchOutcome::Converged { node_count } => results.push(PlanResult::priced(
                    report.node_type,
                    report.hourly_price,
                    node_count,
                )),
                SearchOutcome::LimitReached { max_nodes, .. } => failures.push(NodeTypeFailure {
                    node_type: report.node_type,
                    reason: FailureReason::LimitReached { max_nodes },
                }),
                SearchOutcome::Aborted { reason } => failures.push(NodeTypeFailure {
                    node_type: report.node_type,
                    reason: FailureReason::Structural { message: reason },
                }),
            }
        }

        let results = rank(results);
        let simulation_runs = runs.load(std::sync::atomic::Ordering::Relaxed);

        if let Some(metrics) = &self.metrics {
            metrics.set_node_type_outcomes(results.len(), failures.len(), rejected.len());
        }
        self.logger
            .log_plan_finished(results.len(), failures.len(), simulation_runs);

        PlanReport {
            results,
            failures,
            rejected,
            candidates: candidate_count,
            searched,
            simulation_runs,
            bounds,
            generated_at: Utc::now(),
        }
    }

    /// Run the capacity search alone, without filtering or pricing
    ///
    /// Reports come back in the order of `node_types`.
    pub async fn search_all(
        &self,
        node_types: Vec<NodeType>,
        workloads: &WorkloadSet,
    ) -> Vec<SearchReport> {
        let bounds = self.config.bounds(workloads.len());
        self.run_searches(node_types, workloads, bounds, Arc::new(AtomicU64::new(0)))
            .await
    }

    async fn run_searches(
        &self,
        node_types: Vec<NodeType>,
        workloads: &WorkloadSet,
        bounds: SearchBounds,
        runs: Arc<AtomicU64>,
    ) -> Vec<SearchReport> {
        let mut search = CapacitySearch::new(self.oracle.clone(), &self.config).with_run_counter(runs);
        if let Some(metrics) = &self.metrics {
            search = search.with_metrics(metrics.clone());
        }
        if let Some(events) = &self.events {
            search = search.with_events(events.clone());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let handles: Vec<_> = node_types
            .into_iter()
            .map(|node_type| {
                let name = node_type.name().to_string();
                let price = node_type.hourly_price();
                let search = search.clone();
                let workloads = workloads.clone();
                let semaphore = semaphore.clone();

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire().await;
                    search.run(&node_type, &workloads, bounds).await
                });
                (name, price, handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for (name, price, handle) in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    let reason = format!("search task failed: {e}");
                    self.logger.log_search_aborted(&name, &reason, 0);
                    reports.push(SearchReport {
                        node_type: name,
                        hourly_price: price,
                        outcome: SearchOutcome::Aborted { reason },
                        probes: 0,
                    });
                }
            }
        }

        reports
    }
}
