//! Cluster sizing library
//!
//! This crate provides the core functionality for:
//! - Exact Kubernetes resource quantities
//! - Loading workloads and priced node type catalogs
//! - Filtering node types that can never host a workload
//! - Searching the smallest feasible node count per node type
//! - Pricing and ranking the resulting clusters

pub mod catalog;
pub mod config;
pub mod cost;
pub mod error;
pub mod filter;
pub mod models;
pub mod observability;
pub mod oracle;
pub mod planner;
pub mod quantity;
pub mod ranking;
pub mod search;
pub mod workload;

pub use catalog::{create_provider, CatalogFile, NodeCatalogProvider, Provider};
pub use crate::config::PlannerConfig;
pub use error::{Result, SizerError};
pub use models::*;
pub use observability::{PlanLogger, PlannerMetrics};
pub use oracle::{FeasibilityOracle, FirstFitOracle, NodePool, Verdict};
pub use planner::{PlanReport, Planner, ReportSink, SearchEvent};
pub use quantity::{Dimension, ResourceQuantity, ResourceVector};
pub use search::{SearchBounds, SearchConfig, SearchMode, SearchOutcome};
pub use workload::{WorkloadExclusions, WorkloadFile, WorkloadSource};
