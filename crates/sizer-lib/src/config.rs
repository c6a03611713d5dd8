//! Planner configuration
//!
//! Loaded from an optional YAML/JSON/TOML file, then overridden by
//! `SIZER_`-prefixed environment variables. Nested keys use `__`, e.g.
//! `SIZER_NODES__MAX_NODES=10`.

use crate::catalog::Provider;
use crate::error::ConfigError;
use crate::search::{SearchConfig, SearchMode, DEFAULT_CONCURRENCY, DEFAULT_MIN_NODES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top level planner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub provider: Provider,
    pub mode: SearchMode,
    /// Price nodes at spot rates where the provider supports it
    pub spot: bool,
    /// Workload file
    pub pods: Option<PathBuf>,
    /// Instance type catalog file
    pub catalog: Option<PathBuf>,
    pub nodes: NodesConfig,
    pub search: SearchSettings,
    pub exclude: ExclusionSettings,
}

/// Node count bounds and per-provider instance selection
///
/// The camel case keys `minNodes`, `maxNodes` and `instanceTypes` are
/// accepted as well. File keys reach serde lowercased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    #[serde(alias = "minNodes", alias = "minnodes")]
    pub min_nodes: u32,
    /// Defaults to the number of pods
    #[serde(alias = "maxNodes", alias = "maxnodes")]
    pub max_nodes: Option<u32>,
    pub aws: ProviderConfig,
    pub gcp: ProviderConfig,
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            min_nodes: DEFAULT_MIN_NODES,
            max_nodes: None,
            aws: ProviderConfig::new("us-east-1"),
            gcp: ProviderConfig::new("us-central1"),
        }
    }
}

/// Region and instance types to consider for one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: String,
    /// Empty means every type in the catalog
    #[serde(alias = "instanceTypes", alias = "instancetypes")]
    pub instance_types: Vec<String>,
}

impl ProviderConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            instance_types: Vec::new(),
        }
    }
}

/// Worker pool and oracle budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub concurrency: usize,
    pub oracle_timeout_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            oracle_timeout_ms: 250,
        }
    }
}

/// Regular expressions selecting workloads to leave out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionSettings {
    pub namespaces: Vec<String>,
    pub pods: Vec<String>,
    pub containers: Vec<String>,
}

impl PlannerConfig {
    /// Load configuration from an optional file plus the environment
    ///
    /// Relative `pods` and `catalog` paths are resolved against the
    /// directory of the config file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(
        path: Option<&Path>,
        environment: ::config::Environment,
    ) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        builder = builder.add_source(environment);

        let mut loaded: PlannerConfig = builder.build()?.try_deserialize()?;

        if let Some(base) = path.and_then(Path::parent) {
            loaded.pods = loaded.pods.map(|p| resolve_relative(base, p));
            loaded.catalog = loaded.catalog.map(|p| resolve_relative(base, p));
        }

        Ok(loaded)
    }

    /// Section of the active provider
    pub fn provider_config(&self) -> &ProviderConfig {
        match self.provider {
            Provider::Aws => &self.nodes.aws,
            Provider::Gcp => &self.nodes.gcp,
        }
    }

    pub fn provider_config_mut(&mut self) -> &mut ProviderConfig {
        match self.provider {
            Provider::Aws => &mut self.nodes.aws,
            Provider::Gcp => &mut self.nodes.gcp,
        }
    }

    /// Reject settings no search can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.min_nodes == 0 {
            return Err(ConfigError::Invalid("nodes.min_nodes must be at least 1".into()));
        }
        if self.nodes.max_nodes == Some(0) {
            return Err(ConfigError::Invalid("nodes.max_nodes must be at least 1".into()));
        }
        if self.search.concurrency == 0 {
            return Err(ConfigError::Invalid("search.concurrency must be at least 1".into()));
        }
        if self.search.oracle_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "search.oracle_timeout_ms must be at least 1".into(),
            ));
        }
        if self.provider_config().region.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "nodes.{}.region must be set",
                self.provider
            )));
        }
        Ok(())
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            mode: self.mode,
            min_nodes: self.nodes.min_nodes,
            max_nodes: self.nodes.max_nodes,
            oracle_timeout: Duration::from_millis(self.search.oracle_timeout_ms),
            concurrency: self.search.concurrency,
        }
    }
}

fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix("SIZER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();

        assert_eq!(config.provider, Provider::Aws);
        assert_eq!(config.mode, SearchMode::Fast);
        assert!(!config.spot);
        assert_eq!(config.nodes.min_nodes, 2);
        assert_eq!(config.nodes.max_nodes, None);
        assert_eq!(config.provider_config().region, "us-east-1");
        assert!(config.validate().is_ok());

        let search = config.search_config();
        assert_eq!(search.oracle_timeout, Duration::from_millis(250));
        assert_eq!(search.concurrency, 4);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
provider: gcp
mode: slow
spot: true
pods: workloads.yaml
catalog: /srv/catalog.yaml
nodes:
  min_nodes: 3
  max_nodes: 40
  gcp:
    region: europe-west1
    instance_types: [n1-standard-4, n1-standard-8]
exclude:
  namespaces: [kube-system]
"#,
        );

        let config = PlannerConfig::load(Some(&path)).unwrap();

        assert_eq!(config.provider, Provider::Gcp);
        assert_eq!(config.mode, SearchMode::Slow);
        assert!(config.spot);
        assert_eq!(config.pods, Some(dir.path().join("workloads.yaml")));
        assert_eq!(config.catalog, Some(PathBuf::from("/srv/catalog.yaml")));
        assert_eq!(config.nodes.min_nodes, 3);
        assert_eq!(config.nodes.max_nodes, Some(40));
        assert_eq!(config.provider_config().region, "europe-west1");
        assert_eq!(config.provider_config().instance_types.len(), 2);
        assert_eq!(config.nodes.aws.region, "us-east-1");
        assert_eq!(config.exclude.namespaces, ["kube-system"]);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "search:\n  oracle_timeout_ms: 100\n");

        let vars = ::config::Map::from([
            ("SIZER_SEARCH__ORACLE_TIMEOUT_MS".to_string(), "900".to_string()),
            ("SIZER_NODES__MAX_NODES".to_string(), "12".to_string()),
        ]);
        let config =
            PlannerConfig::load_with(Some(&path), environment().source(Some(vars))).unwrap();

        assert_eq!(config.search.oracle_timeout_ms, 900);
        assert_eq!(config.nodes.max_nodes, Some(12));
    }

    #[test]
    fn test_load_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
nodes:
  minNodes: 3
  maxNodes: 7
  aws:
    instanceTypes: [m5.large]
"#,
        );

        let config = PlannerConfig::load(Some(&path)).unwrap();

        assert_eq!(config.nodes.min_nodes, 3);
        assert_eq!(config.nodes.max_nodes, Some(7));
        assert_eq!(config.nodes.aws.instance_types, ["m5.large"]);
        assert_eq!(config.nodes.aws.region, "us-east-1");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = PlannerConfig::load(Some(Path::new("/nonexistent/sizer.yaml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let mut config = PlannerConfig::default();
        config.nodes.min_nodes = 0;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.nodes.max_nodes = Some(0);
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.search.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.search.oracle_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.provider_config_mut().region.clear();
        assert!(config.validate().is_err());
    }
}
