//! Node type catalogs
//!
//! Each cloud provider is a [`NodeCatalogProvider`] variant that turns the
//! entries of a catalog file into priced, allocatable [`NodeType`]s for a
//! region. The engine never branches on the provider; it only consumes the
//! resulting node types.

mod aws;
mod file;
mod gcp;

pub use aws::AwsCatalog;
pub use file::{CatalogEntry, CatalogFile, RegionPricing};
pub use gcp::GcpCatalog;

use crate::error::CatalogError;
use crate::models::NodeType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for node type catalog implementations
pub trait NodeCatalogProvider: Send + Sync {
    /// Human readable provider name
    fn name(&self) -> &str;

    /// List candidate node types available in `region`
    ///
    /// An empty `type_filter` selects every instance type in the catalog.
    fn list_node_types(
        &self,
        region: &str,
        type_filter: &[String],
    ) -> Result<Vec<NodeType>, CatalogError>;
}

/// Supported cloud providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Aws,
    Gcp,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Aws => f.write_str("aws"),
            Provider::Gcp => f.write_str("gcp"),
        }
    }
}

impl FromStr for Provider {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Provider::Aws),
            "gcp" => Ok(Provider::Gcp),
            _ => Err(CatalogError::UnknownProvider(s.to_string())),
        }
    }
}

/// Create the catalog provider for `provider` over the given catalog file
pub fn create_provider(
    provider: Provider,
    catalog: CatalogFile,
    spot: bool,
) -> Box<dyn NodeCatalogProvider> {
    match provider {
        Provider::Aws => {
            if spot {
                tracing::warn!("Spot pricing is not supported for AWS, using on-demand prices");
            }
            Box::new(AwsCatalog::new(catalog))
        }
        Provider::Gcp => Box::new(GcpCatalog::new(catalog).with_spot(spot)),
    }
}
