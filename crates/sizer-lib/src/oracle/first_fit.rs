//! First-fit-decreasing bin packing oracle
//!
//! A deliberately small stand-in for a full scheduler simulation: workloads
//! are placed largest first (CPU, then memory) on the first node with enough
//! free CPU, memory, GPU and pod slots.

use super::{FeasibilityOracle, NodePool, Verdict};
use crate::error::OracleError;
use crate::models::{Workload, WorkloadSet};
use crate::quantity::ResourceVector;
use async_trait::async_trait;

/// Oracle that packs workloads with first-fit-decreasing
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFitOracle;

impl FirstFitOracle {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FeasibilityOracle for FirstFitOracle {
    fn name(&self) -> &str {
        "first-fit"
    }

    async fn evaluate(
        &self,
        pool: &NodePool,
        workloads: &WorkloadSet,
    ) -> Result<Verdict, OracleError> {
        // Packing is CPU bound; run it off the async workers so the
        // caller's timeout can fire while it is still going.
        let pool = pool.clone();
        let workloads = workloads.clone();

        tokio::task::spawn_blocking(move || pack(&pool, &workloads))
            .await
            .map_err(|e| OracleError::Failed(format!("packing task failed: {e}")))?
    }
}

struct Bin {
    free: ResourceVector,
    pods_left: u32,
}

/// Pack `workloads` onto `pool` and report whether everything was placed
pub fn pack(pool: &NodePool, workloads: &WorkloadSet) -> Result<Verdict, OracleError> {
    if pool.is_empty() {
        return Err(OracleError::Structural("node pool is empty".to_string()));
    }
    if let Some(workload) = workloads.iter().find(|w| w.aggregate().has_negative()) {
        return Err(OracleError::Structural(format!(
            "pod {} has a negative resource request",
            workload.id()
        )));
    }

    let mut order: Vec<&Workload> = workloads.iter().collect();
    order.sort_by(|a, b| {
        let (a, b) = (a.aggregate(), b.aggregate());
        b.cpu()
            .value()
            .cmp(&a.cpu().value())
            .then_with(|| b.memory().value().cmp(&a.memory().value()))
    });

    let mut bins: Vec<Bin> = pool
        .nodes()
        .iter()
        .map(|node| Bin {
            free: node.capacity.resources,
            pods_left: node.capacity.max_pods,
        })
        .collect();

    let mut pending = 0;
    for workload in order {
        let demand = workload.aggregate();
        let slot = bins
            .iter_mut()
            .find(|bin| bin.pods_left > 0 && demand.fits_within(&bin.free));

        match slot {
            Some(bin) => {
                bin.free = bin
                    .free
                    .checked_sub(demand)
                    .map_err(|e| OracleError::Structural(e.to_string()))?;
                bin.pods_left -= 1;
            }
            None => pending += 1,
        }
    }

    if pending == 0 {
        Ok(Verdict::Scheduled)
    } else {
        Ok(Verdict::Unschedulable { pending })
    }
}
