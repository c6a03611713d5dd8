//! Configuration file discovery and command line overrides

use anyhow::{Context, Result};
use sizer_lib::config::PlannerConfig;
use sizer_lib::{Provider, SearchMode};
use std::path::{Path, PathBuf};

/// Default configuration file, `~/.config/sizer/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("sizer").join("config.yaml"))
}

/// The explicit path if given, else the default file when it exists
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|path| path.exists()),
    }
}

/// Settings given on the command line, applied over the loaded file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub region: Option<String>,
    pub mode: Option<SearchMode>,
    pub spot: bool,
    pub pods: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub min_nodes: Option<u32>,
    pub max_nodes: Option<u32>,
    pub node_types: Vec<String>,
    pub exclude_namespaces: Vec<String>,
    pub exclude_pods: Vec<String>,
    pub exclude_containers: Vec<String>,
    pub concurrency: Option<usize>,
    pub oracle_timeout_ms: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut PlannerConfig) {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.spot {
            config.spot = true;
        }
        if let Some(pods) = &self.pods {
            config.pods = Some(pods.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.catalog = Some(catalog.clone());
        }
        if let Some(min_nodes) = self.min_nodes {
            config.nodes.min_nodes = min_nodes;
        }
        if let Some(max_nodes) = self.max_nodes {
            config.nodes.max_nodes = Some(max_nodes);
        }
        if let Some(concurrency) = self.concurrency {
            config.search.concurrency = concurrency;
        }
        if let Some(timeout) = self.oracle_timeout_ms {
            config.search.oracle_timeout_ms = timeout;
        }

        let provider_config = config.provider_config_mut();
        if let Some(region) = &self.region {
            provider_config.region = region.clone();
        }
        if !self.node_types.is_empty() {
            provider_config.instance_types = self.node_types.clone();
        }

        config.exclude.namespaces.extend(self.exclude_namespaces.iter().cloned());
        config.exclude.pods.extend(self.exclude_pods.iter().cloned());
        config.exclude.containers.extend(self.exclude_containers.iter().cloned());
    }
}

/// Load the planner configuration and apply command line overrides
pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<PlannerConfig> {
    let path = resolve_config_path(explicit);
    let mut config = PlannerConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load config file {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })?;

    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_target_active_provider() {
        let mut config = PlannerConfig::default();
        let overrides = Overrides {
            provider: Some(Provider::Gcp),
            region: Some("europe-west4".to_string()),
            node_types: vec!["n2-standard-4".to_string()],
            max_nodes: Some(12),
            exclude_namespaces: vec!["kube-system".to_string()],
            ..Overrides::default()
        };

        overrides.apply(&mut config);

        assert_eq!(config.provider, Provider::Gcp);
        assert_eq!(config.nodes.gcp.region, "europe-west4");
        assert_eq!(config.nodes.gcp.instance_types, ["n2-standard-4"]);
        assert_eq!(config.nodes.aws.region, "us-east-1");
        assert_eq!(config.nodes.max_nodes, Some(12));
        assert_eq!(config.exclude.namespaces, ["kube-system"]);
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/tmp/sizer.yaml");
        assert_eq!(resolve_config_path(Some(path)), Some(path.to_path_buf()));
    }
}
