//! List candidate node types

use anyhow::Result;
use serde::Serialize;
use sizer_lib::filter::check_node_type;
use sizer_lib::{NodeType, WorkloadSet};
use tabled::Tabled;

use super::{load_config, load_node_types, load_workloads, PlanArgs};
use crate::output::{print_table, OutputFormat};

/// Row for the node type table
#[derive(Tabled, Serialize)]
struct NodeTypeRow {
    #[tabled(rename = "Instance Type")]
    instance_type: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "GPU")]
    gpu: String,
    #[tabled(rename = "Max Pods")]
    max_pods: u32,
    #[tabled(rename = "Price/hour (USD)")]
    hourly_price: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn status(node_type: &NodeType, workloads: Option<&WorkloadSet>) -> String {
    match workloads.map(|set| check_node_type(node_type, set)) {
        None => "-".to_string(),
        Some(Ok(())) => "accepted".to_string(),
        Some(Err(rejection)) => format!(
            "rejected: pod {} requests {} {}",
            rejection.workload, rejection.demand, rejection.dimension
        ),
    }
}

/// Show allocatable capacity, price and filter verdict of every candidate
pub async fn run(args: PlanArgs, format: OutputFormat) -> Result<()> {
    let config = load_config(&args, &args.overrides())?;
    let node_types = load_node_types(&config)?;

    // Verdicts need workloads; without a workload file only the catalog is shown
    let workloads = match config.pods {
        Some(_) => Some(load_workloads(&config)?),
        None => None,
    };

    let rows: Vec<NodeTypeRow> = node_types
        .iter()
        .map(|node_type| {
            let resources = &node_type.capacity().resources;
            NodeTypeRow {
                instance_type: node_type.name().to_string(),
                cpu: resources.cpu().to_string(),
                memory: resources.memory().to_string(),
                gpu: resources.gpu().to_string(),
                max_pods: node_type.capacity().max_pods,
                hourly_price: format!("{:.4}", node_type.hourly_price()),
                status: status(node_type, workloads.as_ref()),
            }
        })
        .collect();

    print_table(&rows, format)
}
