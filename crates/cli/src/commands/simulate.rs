//! Simulate clusters and rank node types by monthly cost

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use sizer_lib::planner::{PlanReport, ReportSink};
use sizer_lib::{FirstFitOracle, Planner, PlannerMetrics, SearchEvent, SearchOutcome};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;

use super::{load_config, load_node_types, load_workloads, PlanArgs};
use crate::output::{
    format_usd, print_info, print_success, print_warning, render_table, OutputFormat,
};

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Node types searched in parallel
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Time budget of a single simulation in milliseconds
    #[arg(long)]
    pub oracle_timeout_ms: Option<u64>,

    /// Write Prometheus metrics to this file when done
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Report per node type progress on stderr
    #[arg(long)]
    pub progress: bool,
}

/// Row for the ranked results table
#[derive(Tabled, Serialize)]
struct ResultRow {
    #[tabled(rename = "Instance Type")]
    instance_type: String,
    #[tabled(rename = "Node Count")]
    node_count: u32,
    #[tabled(rename = "Price/month (USD)")]
    price: String,
}

/// Prints reports as tables and status lines
pub struct TableSink;

impl ReportSink for TableSink {
    fn publish(&mut self, report: &PlanReport) -> Result<()> {
        if report.is_empty() {
            print_warning(&report.no_solution_message());
        } else {
            let rows: Vec<ResultRow> = report
                .results
                .iter()
                .map(|result| ResultRow {
                    instance_type: result.instance_type.clone(),
                    node_count: result.node_count,
                    price: format_usd(result.total_price_per_month),
                })
                .collect();
            println!("{}", render_table(&rows));

            if let Some(cheapest) = report.cheapest() {
                print_success(&format!(
                    "Cheapest: {} x {} at {}/month",
                    cheapest.node_count,
                    cheapest.instance_type,
                    format_usd(cheapest.total_price_per_month)
                ));
            }
        }

        for failure in &report.failures {
            print_warning(&format!("{}: {}", failure.node_type, failure.reason));
        }
        for rejection in &report.rejected {
            print_info(&format!("Skipped {}", rejection));
        }

        println!(
            "{}",
            format!("Completed {} simulations", report.simulation_runs).dimmed()
        );
        Ok(())
    }
}

/// Writes reports as pretty-printed JSON
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn publish(&mut self, report: &PlanReport) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

fn print_progress(event: &SearchEvent) {
    match event {
        SearchEvent::Started { node_type } => eprintln!("{} {}", "…".dimmed(), node_type),
        SearchEvent::Probe { .. } => {}
        SearchEvent::Finished { report } => match &report.outcome {
            SearchOutcome::Converged { node_count } => eprintln!(
                "{} {}: {} nodes after {} simulations",
                "✓".green(),
                report.node_type,
                node_count,
                report.probes
            ),
            SearchOutcome::LimitReached { max_nodes, .. } => eprintln!(
                "{} {}: no fit below {} nodes",
                "⚠".yellow(),
                report.node_type,
                max_nodes
            ),
            SearchOutcome::Aborted { reason } => {
                eprintln!("{} {}: {}", "✗".red(), report.node_type, reason)
            }
        },
    }
}

/// Run the capacity search for every candidate node type
pub async fn run(args: SimulateArgs, format: OutputFormat) -> Result<()> {
    let mut overrides = args.plan.overrides();
    overrides.concurrency = args.concurrency;
    overrides.oracle_timeout_ms = args.oracle_timeout_ms;

    let config = load_config(&args.plan, &overrides)?;
    let workloads = load_workloads(&config)?;
    let node_types = load_node_types(&config)?;

    if format == OutputFormat::Table {
        let total = workloads.total().context("Total pod requests overflow")?;
        print_info(&format!(
            "Found {} pods to simulate, with {} CPU, {} Mem and {} GPUs",
            workloads.len(),
            total.cpu(),
            total.memory(),
            total.gpu()
        ));
    }

    let metrics = PlannerMetrics::new();
    let mut planner = Planner::new(Arc::new(FirstFitOracle::new()), config.search_config())
        .with_metrics(metrics.clone());

    let progress = if args.progress {
        let mut events = planner.subscribe(256);
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                print_progress(&event);
            }
        }))
    } else {
        None
    };

    let report = planner.plan(node_types, &workloads).await;

    drop(planner);
    if let Some(progress) = progress {
        progress.await.context("Progress reporter failed")?;
    }

    match format {
        OutputFormat::Table => TableSink.publish(&report)?,
        OutputFormat::Json => JsonSink::new(std::io::stdout().lock()).publish(&report)?,
    }

    if let Some(path) = &args.metrics_out {
        std::fs::write(path, metrics.render())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    if report.candidates == 0 {
        bail!("No node types to simulate");
    }
    if report.nothing_searched() {
        bail!(
            "None of the {} node types can host every pod",
            report.candidates
        );
    }

    Ok(())
}
