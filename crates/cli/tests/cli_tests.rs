//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const CATALOG: &str = r#"
instances:
  - instance_type: t3.small
    vcpu: 2
    memory_gib: 2
    max_pods: 11
    pricing:
      us-east-1: { on_demand: 0.0208 }
  - instance_type: m5.large
    vcpu: 2
    memory_gib: 8
    max_pods: 29
    pricing:
      us-east-1: { on_demand: 0.096 }
  - instance_type: m5.xlarge
    vcpu: 4
    memory_gib: 16
    max_pods: 58
    pricing:
      us-east-1: { on_demand: 0.192 }
"#;

const WORKLOADS: &str = r#"
pods:
  - name: web
    replicas: 4
    containers:
      - name: app
        requests:
          cpu: 1
          memory: 2Gi
  - name: coredns
    namespace: kube-system
    containers:
      - name: coredns
        requests:
          cpu: 100m
          memory: 70Mi
"#;

fn sizer() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sizer"));
    command.env_remove("RUST_LOG");
    command
}

/// Write a config, catalog and workload file and return the directory
fn fixture(extra_config: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let write = |name: &str, content: &str| {
        std::fs::write(dir.path().join(name), content).expect("Failed to write fixture");
    };

    write("catalog.yaml", CATALOG);
    write("workloads.yaml", WORKLOADS);
    write(
        "config.yaml",
        &format!(
            "provider: aws\npods: workloads.yaml\ncatalog: catalog.yaml\nexclude:\n  namespaces: [kube-system]\n{}",
            extra_config
        ),
    );
    dir
}

fn config_path(dir: &TempDir) -> String {
    dir.path().join("config.yaml").display().to_string()
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = sizer()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("simulate"), "Should show simulate command");
    assert!(stdout.contains("nodes"), "Should show nodes command");
    assert!(stdout.contains("--log-level"), "Should show log level option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = sizer()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("sizer"), "Should show binary name");
}

/// Test simulate subcommand help
#[test]
fn test_simulate_help() {
    let output = sizer()
        .args(["simulate", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Simulate help should succeed");
    assert!(stdout.contains("--mode"), "Should show mode option");
    assert!(stdout.contains("--max-nodes"), "Should show max nodes option");
    assert!(stdout.contains("--node-type"), "Should show node type option");
    assert!(stdout.contains("--spot"), "Should show spot option");
}

#[test]
fn test_simulate_json_ranks_node_types() {
    let dir = fixture("");

    let output = sizer()
        .args(["--format", "json", "simulate", &config_path(&dir)])
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "simulate failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report = json_stdout(&output);

    assert_eq!(report["candidates"], 3);
    assert_eq!(report["bounds"]["min"], 2);
    assert_eq!(report["bounds"]["max"], 4);

    let results = report["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["instance_type"], "m5.xlarge");
    assert_eq!(results[0]["node_count"], 2);
    let monthly = results[0]["total_price_per_month"].as_f64().unwrap();
    assert!((monthly - 0.192 * 2.0 * 744.0).abs() < 1e-6);

    assert_eq!(report["failures"][0]["node_type"], "m5.large");
    assert_eq!(report["failures"][0]["reason"]["kind"], "limit_reached");
    assert_eq!(report["rejected"][0]["node_type"], "t3.small");
    assert_eq!(report["rejected"][0]["dimension"], "memory");

    // m5.large probes 2 and 3 nodes, m5.xlarge converges at its first probe
    assert_eq!(report["simulation_runs"], 3);
}

#[test]
fn test_simulate_table_output() {
    let dir = fixture("nodes:\n  max_nodes: 10\n");

    let output = sizer()
        .args(["simulate", &config_path(&dir), "--mode", "slow"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "simulate should succeed");
    assert!(stdout.contains("Found 4 pods to simulate"), "Should summarise pods");
    assert!(stdout.contains("Instance Type"), "Should show table header");
    assert!(stdout.contains("m5.xlarge"));
    assert!(stdout.contains("m5.large"));
    assert!(stdout.contains("$285.70"), "Should show monthly price");
}

#[test]
fn test_simulate_without_solution_reports_message() {
    let dir = fixture("");

    let output = sizer()
        .args(["simulate", &config_path(&dir), "--node-type", "m5.large"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "No solution is not a failure");
    assert!(stdout.contains("Could not converge to a solution over 2 simulations."));
}

#[test]
fn test_simulate_fails_when_every_type_is_rejected() {
    let dir = fixture("");

    let output = sizer()
        .args(["simulate", &config_path(&dir), "--node-type", "t3.small"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("can host every pod"));
}

#[test]
fn test_simulate_fails_when_repeated_type_is_rejected() {
    let dir = fixture("");
    std::fs::write(
        dir.path().join("catalog.yaml"),
        r#"
instances:
  - instance_type: t3.small
    vcpu: 2
    memory_gib: 2
    pricing:
      us-east-1: { on_demand: 0.0208 }
  - instance_type: t3.small
    vcpu: 2
    memory_gib: 2
    pricing:
      us-east-1: { on_demand: 0.0208 }
"#,
    )
    .expect("Failed to write catalog");

    let output = sizer()
        .args(["--format", "json", "simulate", &config_path(&dir)])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "nothing left to search must fail");
    let report = json_stdout(&output);
    assert_eq!(report["candidates"], 2);
    assert_eq!(report["searched"], 0);
    assert_eq!(report["rejected"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["simulation_runs"], 0);
}

#[test]
fn test_simulate_unknown_aws_type_fails() {
    let dir = fixture("");

    let output = sizer()
        .args(["simulate", &config_path(&dir), "--node-type", "m9.huge"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("m9.huge"));
}

#[test]
fn test_simulate_writes_metrics() {
    let dir = fixture("");
    let metrics = dir.path().join("metrics.prom");

    let output = sizer()
        .args(["--format", "json", "simulate", &config_path(&dir), "--metrics-out"])
        .arg(&metrics)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let exposition = std::fs::read_to_string(&metrics).expect("metrics file");
    assert!(exposition.contains("sizer_simulation_runs_total 3"));
}

#[test]
fn test_nodes_lists_verdicts() {
    let dir = fixture("");

    let output = sizer()
        .args(["--format", "json", "nodes", &config_path(&dir)])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let rows = json_stdout(&output);
    let rows = rows.as_array().expect("rows array");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["instance_type"], "t3.small");
    assert!(rows[0]["status"].as_str().unwrap().starts_with("rejected"));
    assert_eq!(rows[2]["cpu"], "3600m");
    assert_eq!(rows[2]["status"], "accepted");
}

#[test]
fn test_missing_config_file_fails() {
    let output = sizer()
        .args(["simulate", Path::new("/nonexistent/sizer.yaml").to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}
