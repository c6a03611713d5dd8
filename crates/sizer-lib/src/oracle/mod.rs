//! Feasibility oracle interface
//!
//! The capacity search only needs a yes/no answer to "do these workloads
//! fit on this pool?". Whatever answers it (a bin packer, a full scheduler
//! simulation, a test double) sits behind [`FeasibilityOracle`]. Time
//! budgets are enforced by the caller, not by the oracle.

mod first_fit;

pub use first_fit::{pack, FirstFitOracle};

use crate::error::{OracleError, QuantityError};
use crate::models::{NodeCapacity, NodeType, WorkloadSet};
use crate::quantity::ResourceVector;
use async_trait::async_trait;

/// A single node handed to the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub name: String,
    pub capacity: NodeCapacity,
}

/// The nodes of a simulated cluster
#[derive(Debug, Clone, PartialEq)]
pub struct NodePool {
    node_type: String,
    nodes: Vec<NodeSpec>,
}

impl NodePool {
    /// A pool of `count` identical nodes named `node-0`, `node-1`, ...
    pub fn homogeneous(node_type: &NodeType, count: u32) -> Self {
        let nodes = (0..count)
            .map(|i| NodeSpec {
                name: format!("node-{i}"),
                capacity: *node_type.capacity(),
            })
            .collect();

        Self {
            node_type: node_type.name().to_string(),
            nodes,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Summed allocatable capacity of every node in the pool
    pub fn total_capacity(&self) -> Result<ResourceVector, QuantityError> {
        self.nodes
            .iter()
            .try_fold(ResourceVector::zero(), |total, node| {
                total.checked_add(&node.capacity.resources)
            })
    }
}

/// Answer of a single feasibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every workload was placed
    Scheduled,
    /// Some workloads stayed pending
    Unschedulable { pending: usize },
}

impl Verdict {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, Verdict::Scheduled)
    }
}

/// Trait for scheduling feasibility oracles
///
/// Implementations must give the same verdict for identical inputs within
/// one planning run.
#[async_trait]
pub trait FeasibilityOracle: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Decide whether `workloads` can all be scheduled onto `pool`
    async fn evaluate(&self, pool: &NodePool, workloads: &WorkloadSet)
        -> Result<Verdict, OracleError>;
}

/// Oracle backed by a plain function, handy for synthetic capacity models
pub struct FnOracle<F> {
    name: String,
    verdict: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&NodePool, &WorkloadSet) -> Result<Verdict, OracleError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, verdict: F) -> Self {
        Self {
            name: name.into(),
            verdict,
        }
    }
}

#[async_trait]
impl<F> FeasibilityOracle for FnOracle<F>
where
    F: Fn(&NodePool, &WorkloadSet) -> Result<Verdict, OracleError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        pool: &NodePool,
        workloads: &WorkloadSet,
    ) -> Result<Verdict, OracleError> {
        (self.verdict)(pool, workloads)
    }
}
