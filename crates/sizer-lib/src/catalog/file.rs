//! Catalog file format
//!
//! ```yaml
//! instances:
//!   - instance_type: m5.large
//!     vcpu: 2
//!     memory_gib: 8
//!     gpu: 0
//!     max_pods: 29
//!     pricing:
//!       us-east-1: { on_demand: 0.096, spot: 0.037 }
//! ```

use crate::error::CatalogError;
use crate::models::{MachineShape, NodeType, Reservation, DEFAULT_MAX_PODS};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Hourly USD prices of an instance type in one region
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RegionPricing {
    #[serde(default)]
    pub on_demand: f64,
    #[serde(default)]
    pub spot: Option<f64>,
}

/// One instance type as published by a provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub instance_type: String,
    pub vcpu: f64,
    pub memory_gib: f64,
    #[serde(default)]
    pub gpu: u32,
    #[serde(default)]
    pub max_pods: Option<u32>,
    #[serde(default)]
    pub pricing: BTreeMap<String, RegionPricing>,
}

impl CatalogEntry {
    pub fn pricing_in(&self, region: &str) -> Option<&RegionPricing> {
        self.pricing.get(region)
    }

    /// Build the allocatable node type for this entry at the given price
    pub fn to_node_type(
        &self,
        hourly_price: f64,
        max_pods: u32,
        reservation: Reservation,
    ) -> Result<NodeType, CatalogError> {
        let shape = MachineShape {
            vcpu: self.vcpu,
            memory_gib: self.memory_gib,
            gpu: self.gpu,
            max_pods,
        };
        Ok(NodeType::from_shape(
            self.instance_type.clone(),
            hourly_price,
            shape,
            reservation,
        )?)
    }

    pub fn max_pods_or_default(&self) -> u32 {
        self.max_pods.unwrap_or(DEFAULT_MAX_PODS)
    }
}

/// The full set of instance types a provider offers
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub instances: Vec<CatalogEntry>,
}

impl CatalogFile {
    pub fn new(instances: Vec<CatalogEntry>) -> Self {
        Self { instances }
    }

    /// Load a catalog from a YAML, JSON or TOML file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let load_error = |source| CatalogError::Load {
            path: path.display().to_string(),
            source,
        };

        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(load_error)?
            .try_deserialize()
            .map_err(load_error)
    }

    pub fn find(&self, instance_type: &str) -> Option<&CatalogEntry> {
        self.instances
            .iter()
            .find(|entry| entry.instance_type == instance_type)
    }

    /// Entries selected by `type_filter`, in catalog order
    pub fn select<'a>(&'a self, type_filter: &'a [String]) -> impl Iterator<Item = &'a CatalogEntry> {
        self.instances.iter().filter(move |entry| {
            type_filter.is_empty() || type_filter.iter().any(|t| *t == entry.instance_type)
        })
    }
}
