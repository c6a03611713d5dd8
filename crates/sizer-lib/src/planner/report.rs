//! Plan reports and where they are published

use crate::filter::Rejection;
use crate::models::PlanResult;
use crate::search::SearchBounds;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a node type produced no result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// No feasible count below the node limit
    LimitReached { max_nodes: u32 },
    /// The search could not run for this node type
    Structural { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::LimitReached { max_nodes } => {
                write!(f, "reached limit of {max_nodes} nodes")
            }
            FailureReason::Structural { message } => f.write_str(message),
        }
    }
}

/// A searched node type that did not converge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeTypeFailure {
    pub node_type: String,
    pub reason: FailureReason,
}

/// Everything a planning run produced
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Converged node types, cheapest first
    pub results: Vec<PlanResult>,
    pub failures: Vec<NodeTypeFailure>,
    /// Node types dropped before searching
    pub rejected: Vec<Rejection>,
    /// Node types offered to the planner, before filtering
    pub candidates: usize,
    /// Distinct node types that passed filtering and were searched
    pub searched: usize,
    /// Oracle calls across every search
    pub simulation_runs: u64,
    pub bounds: SearchBounds,
    pub generated_at: DateTime<Utc>,
}

impl PlanReport {
    /// True when no node type converged
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True when filtering left nothing to search
    pub fn nothing_searched(&self) -> bool {
        self.searched == 0
    }

    pub fn cheapest(&self) -> Option<&PlanResult> {
        self.results.first()
    }

    pub fn no_solution_message(&self) -> String {
        format!(
            "Could not converge to a solution over {} simulations.",
            self.simulation_runs
        )
    }
}

/// Destination for finished plan reports
pub trait ReportSink {
    fn publish(&mut self, report: &PlanReport) -> anyhow::Result<()>;
}

/// Sink that keeps every published report, mostly useful in tests
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub reports: Vec<PlanReport>,
}

impl ReportSink for CollectingSink {
    fn publish(&mut self, report: &PlanReport) -> anyhow::Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}
