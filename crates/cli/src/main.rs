//! Node sizer CLI
//!
//! Finds the cheapest homogeneous cluster (instance type and node count)
//! able to schedule a fixed set of workloads.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{nodes, simulate, PlanArgs};
use output::{print_error, LogFormat, OutputFormat};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Node sizer CLI
#[derive(Parser)]
#[command(name = "sizer")]
#[command(author, version, about = "Find the cheapest cluster for a set of workloads", long_about = None)]
pub struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(
        long,
        global = true,
        default_value = "error",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    /// Log line format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate clusters per node type and rank them by monthly cost
    Simulate(simulate::SimulateArgs),

    /// List candidate node types and whether they can host every pod
    Nodes(PlanArgs),
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Simulate(args) => simulate::run(args, cli.format).await,
        Commands::Nodes(args) => nodes::run(args, cli.format).await,
    }
}
