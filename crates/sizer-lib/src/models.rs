//! Core data models for capacity planning

use crate::error::{ModelError, QuantityError};
use crate::quantity::{Dimension, ResourceQuantity, ResourceVector};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Pod slots assumed when a catalog does not say otherwise
pub const DEFAULT_MAX_PODS: u32 = 110;

/// Stable identity of a workload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkloadId {
    pub namespace: String,
    pub name: String,
}

impl WorkloadId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A container and its resource requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub name: String,
    pub requests: ResourceVector,
}

impl Container {
    pub fn new(name: impl Into<String>, requests: ResourceVector) -> Self {
        Self {
            name: name.into(),
            requests,
        }
    }
}

/// A schedulable unit (pod) whose demand is the sum of its containers' requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload {
    id: WorkloadId,
    containers: Vec<Container>,
    aggregate: ResourceVector,
}

impl Workload {
    pub fn new(id: WorkloadId, containers: Vec<Container>) -> Result<Self, QuantityError> {
        let aggregate = containers
            .iter()
            .try_fold(ResourceVector::zero(), |total, container| {
                total.checked_add(&container.requests)
            })?;

        Ok(Self {
            id,
            containers,
            aggregate,
        })
    }

    pub fn id(&self) -> &WorkloadId {
        &self.id
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Total requests across all containers
    pub fn aggregate(&self) -> &ResourceVector {
        &self.aggregate
    }
}

/// The fixed set of workloads a plan must schedule
///
/// Clones share the same backing storage.
#[derive(Debug, Clone)]
pub struct WorkloadSet {
    workloads: Arc<[Workload]>,
}

impl WorkloadSet {
    pub fn new(workloads: Vec<Workload>) -> Self {
        Self {
            workloads: workloads.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.workloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Workload> {
        self.workloads.iter()
    }

    pub fn as_slice(&self) -> &[Workload] {
        &self.workloads
    }

    /// Sum of every workload's aggregate demand
    pub fn total(&self) -> Result<ResourceVector, QuantityError> {
        self.iter().try_fold(ResourceVector::zero(), |total, workload| {
            total.checked_add(workload.aggregate())
        })
    }
}

impl FromIterator<Workload> for WorkloadSet {
    fn from_iter<I: IntoIterator<Item = Workload>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a WorkloadSet {
    type Item = &'a Workload;
    type IntoIter = std::slice::Iter<'a, Workload>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Allocatable capacity of a single node, net of reserved overhead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeCapacity {
    pub resources: ResourceVector,
    pub max_pods: u32,
}

impl NodeCapacity {
    pub fn new(resources: ResourceVector, max_pods: u32) -> Self {
        Self {
            resources,
            max_pods,
        }
    }
}

/// Share of raw machine resources held back for the system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reservation {
    pub cpu_fraction: f64,
    pub memory_fraction: f64,
}

impl Reservation {
    pub const NONE: Reservation = Reservation {
        cpu_fraction: 0.0,
        memory_fraction: 0.0,
    };
}

impl Default for Reservation {
    /// Both supported providers keep 10% of vCPU and memory free
    fn default() -> Self {
        Self {
            cpu_fraction: 0.1,
            memory_fraction: 0.1,
        }
    }
}

/// Raw machine shape as published by a provider catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineShape {
    pub vcpu: f64,
    pub memory_gib: f64,
    pub gpu: u32,
    pub max_pods: u32,
}

/// A priced, fixed-capacity unit of compute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeType {
    name: String,
    hourly_price: f64,
    capacity: NodeCapacity,
}

impl NodeType {
    /// Build a node type whose capacity is already allocatable
    pub fn new(
        name: impl Into<String>,
        hourly_price: f64,
        capacity: NodeCapacity,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if !hourly_price.is_finite() || hourly_price < 0.0 {
            return Err(ModelError::InvalidPrice {
                name,
                price: hourly_price,
            });
        }
        if capacity.resources.has_negative() {
            return Err(ModelError::InvalidShape {
                name,
                reason: "negative allocatable capacity".to_string(),
            });
        }

        Ok(Self {
            name,
            hourly_price,
            capacity,
        })
    }

    /// Build a node type from a raw machine shape, applying the reservation once
    ///
    /// Allocatable memory is `floor(memory_gib * 1024 * (1 - fraction))`
    /// mebibytes (2^20 bytes) for every provider. Readings of the same figure
    /// as decimal megabytes would come out about 4.9% smaller.
    pub fn from_shape(
        name: impl Into<String>,
        hourly_price: f64,
        shape: MachineShape,
        reservation: Reservation,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if !(shape.vcpu.is_finite() && shape.vcpu >= 0.0)
            || !(shape.memory_gib.is_finite() && shape.memory_gib >= 0.0)
        {
            return Err(ModelError::InvalidShape {
                name,
                reason: format!(
                    "vcpu {} and memory {}GiB must be non-negative",
                    shape.vcpu, shape.memory_gib
                ),
            });
        }

        let cpu_millis = (shape.vcpu * 1000.0 * (1.0 - reservation.cpu_fraction)).floor() as i64;
        let memory_mib =
            (shape.memory_gib * 1024.0 * (1.0 - reservation.memory_fraction)).floor() as i64;
        let memory = ResourceQuantity::memory_bytes(memory_mib)
            .checked_scale(1 << 20)
            .map_err(ModelError::from)?;

        let resources = ResourceVector::from_quantities(
            ResourceQuantity::cpu_millis(cpu_millis),
            memory,
            ResourceQuantity::gpu_units(i64::from(shape.gpu)),
        )?;

        Self::new(name, hourly_price, NodeCapacity::new(resources, shape.max_pods))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hourly_price(&self) -> f64 {
        self.hourly_price
    }

    pub fn capacity(&self) -> &NodeCapacity {
        &self.capacity
    }

    pub fn allocatable(&self, dimension: Dimension) -> ResourceQuantity {
        self.capacity.resources.get(dimension)
    }
}

/// Cheapest configuration found for one node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub instance_type: String,
    pub node_count: u32,
    pub hourly_price: f64,
    pub total_price_per_month: f64,
}
