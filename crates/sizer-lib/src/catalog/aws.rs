//! AWS node catalog

use super::{CatalogFile, NodeCatalogProvider};
use crate::error::CatalogError;
use crate::models::{NodeType, Reservation};
use tracing::{debug, warn};

/// AWS catalog: on-demand pricing, explicit instance types must exist
pub struct AwsCatalog {
    catalog: CatalogFile,
    reservation: Reservation,
}

impl AwsCatalog {
    pub fn new(catalog: CatalogFile) -> Self {
        Self {
            catalog,
            reservation: Reservation::default(),
        }
    }
}

impl NodeCatalogProvider for AwsCatalog {
    fn name(&self) -> &str {
        "AWS"
    }

    fn list_node_types(
        &self,
        region: &str,
        type_filter: &[String],
    ) -> Result<Vec<NodeType>, CatalogError> {
        if let Some(missing) = type_filter
            .iter()
            .find(|instance_type| self.catalog.find(instance_type).is_none())
        {
            return Err(CatalogError::UnknownInstanceType(missing.clone()));
        }

        let mut node_types = Vec::new();
        for entry in self.catalog.select(type_filter) {
            let Some(pricing) = entry.pricing_in(region) else {
                warn!(
                    instance_type = %entry.instance_type,
                    region = %region,
                    "No on-demand price for instance type in region, skipping"
                );
                continue;
            };

            if entry.max_pods.is_none() {
                debug!(
                    instance_type = %entry.instance_type,
                    "Could not find max pods for instance, assuming default"
                );
            }

            debug!(instance_type = %entry.instance_type, "Adding instance type to candidates");
            node_types.push(entry.to_node_type(
                pricing.on_demand,
                entry.max_pods_or_default(),
                self.reservation,
            )?);
        }

        Ok(node_types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, RegionPricing};
    use crate::models::DEFAULT_MAX_PODS;
    use crate::quantity::Dimension;
    use std::collections::BTreeMap;

    fn entry(name: &str, vcpu: f64, memory_gib: f64, regions: &[(&str, f64)]) -> CatalogEntry {
        CatalogEntry {
            instance_type: name.to_string(),
            vcpu,
            memory_gib,
            gpu: 0,
            max_pods: None,
            pricing: regions
                .iter()
                .map(|(region, price)| {
                    (
                        region.to_string(),
                        RegionPricing {
                            on_demand: *price,
                            spot: Some(price / 3.0),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn catalog() -> AwsCatalog {
        AwsCatalog::new(CatalogFile::new(vec![
            entry("m5.large", 2.0, 8.0, &[("us-east-1", 0.096)]),
            entry("m5.xlarge", 4.0, 16.0, &[("us-east-1", 0.192)]),
            entry("m5.2xlarge", 8.0, 32.0, &[("eu-west-1", 0.428)]),
        ]))
    }

    #[test]
    fn test_unknown_instance_type_is_error() {
        let result = catalog().list_node_types("us-east-1", &["m5.huge".to_string()]);
        assert!(matches!(
            result,
            Err(CatalogError::UnknownInstanceType(name)) if name == "m5.huge"
        ));
    }

    #[test]
    fn test_filter_and_region() {
        let types = catalog()
            .list_node_types("us-east-1", &["m5.xlarge".to_string()])
            .unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name(), "m5.xlarge");
        assert_eq!(types[0].hourly_price(), 0.192);
        assert_eq!(types[0].allocatable(Dimension::Cpu).value(), 3600);
        assert_eq!(types[0].capacity().max_pods, DEFAULT_MAX_PODS);
    }

    #[test]
    fn test_empty_filter_lists_priced_types_in_order() {
        let types = catalog().list_node_types("us-east-1", &[]).unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["m5.large", "m5.xlarge"]);
    }
}
