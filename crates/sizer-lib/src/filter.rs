//! Node type pre-filter
//!
//! Drops node types that could never host the largest workload, whatever
//! the cluster size, before any oracle call is spent on them.

use crate::models::{NodeType, WorkloadId, WorkloadSet};
use crate::observability::PlanLogger;
use crate::quantity::{Dimension, ResourceQuantity};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Why a node type was dropped before searching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub node_type: String,
    pub workload: WorkloadId,
    pub dimension: Dimension,
    pub demand: ResourceQuantity,
    pub capacity: ResourceQuantity,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has {} {} but pod {} requests {}",
            self.node_type, self.capacity, self.dimension, self.workload, self.demand
        )
    }
}

/// Node types split into searchable candidates and rejections
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<NodeType>,
    pub rejected: Vec<Rejection>,
}

/// Check whether a single node could hold every workload on its own
///
/// Dimensions are checked CPU, memory, then GPU; the first violation wins.
pub fn check_node_type(node_type: &NodeType, workloads: &WorkloadSet) -> Result<(), Rejection> {
    let capacity = &node_type.capacity().resources;

    for workload in workloads {
        if let Some(dimension) = workload.aggregate().first_exceeding(capacity) {
            return Err(Rejection {
                node_type: node_type.name().to_string(),
                workload: workload.id().clone(),
                dimension,
                demand: workload.aggregate().get(dimension),
                capacity: capacity.get(dimension),
            });
        }
    }

    Ok(())
}

/// Filter candidates down to node types able to host every single workload
///
/// Input order is preserved and a repeated node type name is kept only once.
pub fn filter_node_types(candidates: Vec<NodeType>, workloads: &WorkloadSet) -> FilterOutcome {
    let logger = PlanLogger::new();
    let mut seen = HashSet::new();
    let mut outcome = FilterOutcome::default();

    for node_type in candidates {
        if !seen.insert(node_type.name().to_string()) {
            debug!(node_type = %node_type.name(), "Dropping duplicate node type");
            continue;
        }

        match check_node_type(&node_type, workloads) {
            Ok(()) => outcome.accepted.push(node_type),
            Err(rejection) => {
                logger.log_node_type_rejected(&rejection);
                outcome.rejected.push(rejection);
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Container, NodeCapacity, Workload};
    use crate::quantity::ResourceVector;

    const GI: i64 = 1 << 30;

    fn node(name: &str, cpu_millis: i64, memory: i64, gpu: i64) -> NodeType {
        NodeType::new(
            name,
            0.1,
            NodeCapacity::new(ResourceVector::new(cpu_millis, memory, gpu), 110),
        )
        .unwrap()
    }

    fn workloads(demands: &[(i64, i64, i64)]) -> WorkloadSet {
        demands
            .iter()
            .enumerate()
            .map(|(i, &(cpu, memory, gpu))| {
                Workload::new(
                    WorkloadId::new("default", format!("pod-{i}")),
                    vec![Container::new("app", ResourceVector::new(cpu, memory, gpu))],
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_survivors_fit_every_workload() {
        let set = workloads(&[(1000, 2 * GI, 0), (3000, GI, 0), (500, 6 * GI, 1)]);
        let candidates = vec![
            node("small", 2000, 4 * GI, 0),
            node("large", 4000, 8 * GI, 1),
            node("gpu-less", 4000, 8 * GI, 0),
        ];

        let outcome = filter_node_types(candidates, &set);

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].name(), "large");
        for accepted in &outcome.accepted {
            for workload in &set {
                assert!(workload.aggregate().fits_within(&accepted.capacity().resources));
            }
        }
        assert_eq!(outcome.rejected.len(), 2);
    }

    #[test]
    fn test_gpu_demand_compared_against_node_gpu() {
        let set = workloads(&[(1000, GI, 2)]);
        let rejection = check_node_type(&node("one-gpu", 8000, 32 * GI, 1), &set).unwrap_err();

        assert_eq!(rejection.dimension, Dimension::Gpu);
        assert_eq!(rejection.demand.value(), 2);
        assert_eq!(rejection.capacity.value(), 1);
        assert_eq!(rejection.workload.to_string(), "default/pod-0");
    }

    #[test]
    fn test_first_violation_wins() {
        let set = workloads(&[(8000, 64 * GI, 4)]);
        let rejection = check_node_type(&node("tiny", 1000, GI, 0), &set).unwrap_err();
        assert_eq!(rejection.dimension, Dimension::Cpu);
    }

    #[test]
    fn test_order_preserved_and_duplicates_dropped() {
        let set = workloads(&[(500, GI, 0)]);
        let candidates = vec![
            node("c", 1000, 2 * GI, 0),
            node("a", 1000, 2 * GI, 0),
            node("c", 2000, 4 * GI, 0),
            node("b", 1000, 2 * GI, 0),
        ];

        let outcome = filter_node_types(candidates, &set);
        let names: Vec<&str> = outcome.accepted.iter().map(|t| t.name()).collect();

        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(outcome.accepted[0].allocatable(Dimension::Cpu).value(), 1000);
    }

    #[test]
    fn test_demand_equal_to_capacity_is_accepted() {
        let set = workloads(&[(4000, 8 * GI, 1)]);
        assert!(check_node_type(&node("exact", 4000, 8 * GI, 1), &set).is_ok());
    }
}
