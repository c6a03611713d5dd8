//! GCP node catalog

use super::{CatalogFile, NodeCatalogProvider};
use crate::error::CatalogError;
use crate::models::{NodeType, Reservation, DEFAULT_MAX_PODS};
use tracing::debug;

/// GCP catalog: optional spot pricing, unavailable types are skipped
pub struct GcpCatalog {
    catalog: CatalogFile,
    reservation: Reservation,
    spot: bool,
}

impl GcpCatalog {
    pub fn new(catalog: CatalogFile) -> Self {
        Self {
            catalog,
            reservation: Reservation::default(),
            spot: false,
        }
    }

    pub fn with_spot(mut self, spot: bool) -> Self {
        self.spot = spot;
        self
    }
}

impl NodeCatalogProvider for GcpCatalog {
    fn name(&self) -> &str {
        "GCP"
    }

    fn list_node_types(
        &self,
        region: &str,
        type_filter: &[String],
    ) -> Result<Vec<NodeType>, CatalogError> {
        let mut node_types = Vec::new();

        for entry in self.catalog.select(type_filter) {
            let pricing = match entry.pricing_in(region) {
                Some(pricing) if pricing.on_demand > 0.0 => pricing,
                _ => {
                    debug!(
                        instance_type = %entry.instance_type,
                        region = %region,
                        "Instance is not available in region"
                    );
                    continue;
                }
            };

            let hourly_price = if self.spot {
                match pricing.spot {
                    Some(spot) if spot > 0.0 => spot,
                    _ => {
                        debug!(
                            instance_type = %entry.instance_type,
                            region = %region,
                            "Instance is not available as a spot instance"
                        );
                        continue;
                    }
                }
            } else {
                pricing.on_demand
            };

            node_types.push(entry.to_node_type(hourly_price, DEFAULT_MAX_PODS, self.reservation)?);
        }

        Ok(node_types)
    }
}
