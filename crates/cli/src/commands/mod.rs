//! CLI commands

pub mod nodes;
pub mod simulate;

use crate::config::{self, Overrides};
use anyhow::{Context, Result};
use clap::Args;
use sizer_lib::config::PlannerConfig;
use sizer_lib::{
    create_provider, CatalogFile, NodeType, Provider, SearchMode, WorkloadExclusions,
    WorkloadFile, WorkloadSet, WorkloadSource,
};
use std::path::PathBuf;
use tracing::info;

/// Inputs shared by every planning command
#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Config file (default: ~/.config/sizer/config.yaml when present)
    pub config: Option<PathBuf>,

    /// Cloud provider (aws, gcp)
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Region whose prices are used
    #[arg(long)]
    pub region: Option<String>,

    /// Search mode (fast, slow)
    #[arg(long)]
    pub mode: Option<SearchMode>,

    /// Use spot prices where the provider supports them
    #[arg(long)]
    pub spot: bool,

    /// Workload file
    #[arg(long)]
    pub pods: Option<PathBuf>,

    /// Instance type catalog file
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Smallest node count to simulate
    #[arg(long)]
    pub min_nodes: Option<u32>,

    /// Node count limit (default: number of pods)
    #[arg(long)]
    pub max_nodes: Option<u32>,

    /// Instance type to consider (repeatable, default: whole catalog)
    #[arg(long = "node-type")]
    pub node_types: Vec<String>,

    /// Namespace regex to exclude (repeatable)
    #[arg(long)]
    pub exclude_namespaces: Vec<String>,

    /// Pod name regex to exclude (repeatable)
    #[arg(long)]
    pub exclude_pods: Vec<String>,

    /// Container name regex to exclude (repeatable)
    #[arg(long)]
    pub exclude_containers: Vec<String>,
}

impl PlanArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider,
            region: self.region.clone(),
            mode: self.mode,
            spot: self.spot,
            pods: self.pods.clone(),
            catalog: self.catalog.clone(),
            min_nodes: self.min_nodes,
            max_nodes: self.max_nodes,
            node_types: self.node_types.clone(),
            exclude_namespaces: self.exclude_namespaces.clone(),
            exclude_pods: self.exclude_pods.clone(),
            exclude_containers: self.exclude_containers.clone(),
            ..Overrides::default()
        }
    }
}

/// Load the workload set named by the configuration
pub fn load_workloads(config: &PlannerConfig) -> Result<WorkloadSet> {
    let path = config
        .pods
        .clone()
        .context("No workload file configured, set `pods` or pass --pods")?;
    let exclusions = WorkloadExclusions::new(
        &config.exclude.namespaces,
        &config.exclude.pods,
        &config.exclude.containers,
    )
    .context("Invalid exclusion pattern")?;

    WorkloadFile::new(&path)
        .with_exclusions(exclusions)
        .load()
        .with_context(|| format!("Failed to load workloads from {}", path.display()))
}

/// List the candidate node types of the configured provider and region
pub fn load_node_types(config: &PlannerConfig) -> Result<Vec<NodeType>> {
    let path = config
        .catalog
        .clone()
        .context("No catalog file configured, set `catalog` or pass --catalog")?;
    let catalog = CatalogFile::load(&path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;

    let provider = create_provider(config.provider, catalog, config.spot);
    let selection = config.provider_config();
    let node_types = provider
        .list_node_types(&selection.region, &selection.instance_types)
        .with_context(|| {
            format!(
                "Failed to list {} node types in {}",
                provider.name(),
                selection.region
            )
        })?;

    info!(
        provider = %provider.name(),
        region = %selection.region,
        node_types = node_types.len(),
        "Loaded node catalog"
    );

    Ok(node_types)
}

pub fn load_config(args: &PlanArgs, overrides: &Overrides) -> Result<PlannerConfig> {
    config::load(args.config.as_deref(), overrides)
}
