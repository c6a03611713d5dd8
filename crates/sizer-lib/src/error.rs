//! Error types for the sizing engine
//!
//! Per-node-type search outcomes (timeouts, exhausted bounds) are not errors
//! and live in [`crate::search::SearchOutcome`]. The types here cover inputs
//! that cannot be turned into a plan at all, and the oracle's failure modes.

use crate::quantity::Dimension;
use thiserror::Error;

/// Errors produced by resource quantity parsing and arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("invalid quantity {input:?}: {reason}")]
    Parse { input: String, reason: String },

    #[error("cannot combine {left} with {right}")]
    DimensionMismatch { left: Dimension, right: Dimension },

    #[error("{0} quantity overflow")]
    Overflow(Dimension),
}

/// Errors produced while constructing model values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("node type {name}: hourly price must be a finite non-negative number, got {price}")]
    InvalidPrice { name: String, price: f64 },

    #[error("node type {name}: {reason}")]
    InvalidShape { name: String, reason: String },

    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// Errors produced while loading workloads
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to load workload file {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("pod {pod}, container {container}: {source}")]
    Request {
        pod: String,
        container: String,
        #[source]
        source: QuantityError,
    },

    #[error("invalid exclusion pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("found 0 pods to simulate with")]
    Empty,
}

/// Errors produced by node catalog providers
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load catalog file {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },

    #[error("could not find instance data for {0}")]
    UnknownInstanceType(String),

    #[error("unknown provider {0:?}, expected aws or gcp")]
    UnknownProvider(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors reported by a feasibility oracle
///
/// A structural error means the inputs themselves are malformed and retrying
/// with more nodes cannot help; any other failure is treated as "not
/// feasible at this node count".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("malformed simulation input: {0}")]
    Structural(String),

    #[error("simulation failed: {0}")]
    Failed(String),
}

impl OracleError {
    pub fn is_structural(&self) -> bool {
        matches!(self, OracleError::Structural(_))
    }
}

/// Errors produced while loading planner configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Umbrella error for library entry points
#[derive(Debug, Error)]
pub enum SizerError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = SizerError> = std::result::Result<T, E>;
