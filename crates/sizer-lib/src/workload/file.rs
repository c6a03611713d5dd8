//! Declarative workload file
//!
//! ```yaml
//! pods:
//!   - name: web
//!     namespace: default
//!     replicas: 3
//!     containers:
//!       - name: app
//!         requests: { cpu: 500m, memory: 1Gi, gpu: 0 }
//! ```

use super::{WorkloadExclusions, WorkloadSource};
use crate::error::WorkloadError;
use crate::models::{Container, Workload, WorkloadId, WorkloadSet};
use crate::quantity::{Dimension, ResourceQuantity, ResourceVector};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct WorkloadDocument {
    #[serde(default)]
    pods: Vec<PodSpec>,
}

#[derive(Debug, Deserialize)]
struct PodSpec {
    name: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    #[serde(default = "default_replicas")]
    replicas: u32,
    #[serde(default)]
    containers: Vec<ContainerSpec>,
}

#[derive(Debug, Deserialize)]
struct ContainerSpec {
    name: String,
    #[serde(default)]
    requests: RequestSpec,
}

#[derive(Debug, Default, Deserialize)]
struct RequestSpec {
    cpu: Option<RawQuantity>,
    memory: Option<RawQuantity>,
    #[serde(alias = "nvidia.com/gpu")]
    gpu: Option<RawQuantity>,
}

/// A quantity as written in the file; YAML turns `1` and `0.5` into numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawQuantity::Int(v) => write!(f, "{v}"),
            RawQuantity::Float(v) => write!(f, "{v}"),
            RawQuantity::Text(v) => f.write_str(v),
        }
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_replicas() -> u32 {
    1
}

/// Workloads declared in a YAML, JSON or TOML file
#[derive(Debug, Clone)]
pub struct WorkloadFile {
    path: PathBuf,
    exclusions: WorkloadExclusions,
}

impl WorkloadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            exclusions: WorkloadExclusions::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: WorkloadExclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<WorkloadDocument, WorkloadError> {
        let load_error = |source| WorkloadError::Load {
            path: self.path.display().to_string(),
            source,
        };

        config::Config::builder()
            .add_source(config::File::from(self.path.as_path()))
            .build()
            .map_err(load_error)?
            .try_deserialize()
            .map_err(load_error)
    }

    fn build_containers(&self, pod: &PodSpec) -> Result<Vec<Container>, WorkloadError> {
        let mut containers = Vec::with_capacity(pod.containers.len());

        for spec in &pod.containers {
            if self.exclusions.excludes_container(&spec.name) {
                debug!(pod = %pod.name, container = %spec.name, "Excluding container");
                continue;
            }

            let requests = parse_requests(&spec.requests).map_err(|source| {
                WorkloadError::Request {
                    pod: format!("{}/{}", pod.namespace, pod.name),
                    container: spec.name.clone(),
                    source,
                }
            })?;
            containers.push(Container::new(spec.name.clone(), requests));
        }

        Ok(containers)
    }
}

impl WorkloadSource for WorkloadFile {
    fn load(&self) -> Result<WorkloadSet, WorkloadError> {
        let document = self.read_document()?;
        let mut workloads = Vec::new();

        for pod in &document.pods {
            if self.exclusions.excludes_namespace(&pod.namespace)
                || self.exclusions.excludes_pod(&pod.name)
            {
                debug!(namespace = %pod.namespace, pod = %pod.name, "Excluding pod");
                continue;
            }

            let containers = self.build_containers(pod)?;
            if containers.is_empty() {
                debug!(namespace = %pod.namespace, pod = %pod.name, "No containers within pod");
                continue;
            }

            for replica in 0..pod.replicas {
                let name = if pod.replicas == 1 {
                    pod.name.clone()
                } else {
                    format!("{}-{}", pod.name, replica)
                };
                let workload = Workload::new(
                    WorkloadId::new(pod.namespace.clone(), name),
                    containers.clone(),
                )
                .map_err(|source| WorkloadError::Request {
                    pod: format!("{}/{}", pod.namespace, pod.name),
                    container: "*".to_string(),
                    source,
                })?;
                workloads.push(workload);
            }
        }

        if workloads.is_empty() {
            return Err(WorkloadError::Empty);
        }

        info!(
            path = %self.path.display(),
            pods = workloads.len(),
            "Loaded workloads"
        );

        Ok(WorkloadSet::new(workloads))
    }
}

fn parse_requests(
    spec: &RequestSpec,
) -> Result<ResourceVector, crate::error::QuantityError> {
    let parse = |raw: &Option<RawQuantity>, dimension| match raw {
        Some(raw) => ResourceQuantity::parse(dimension, &raw.to_string()),
        None => Ok(ResourceQuantity::zero(dimension)),
    };

    ResourceVector::from_quantities(
        parse(&spec.cpu, Dimension::Cpu)?,
        parse(&spec.memory, Dimension::Memory)?,
        parse(&spec.gpu, Dimension::Gpu)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const GI: i64 = 1 << 30;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_expands_replicas() {
        let file = yaml_file(
            r#"
pods:
  - name: web
    replicas: 3
    containers:
      - name: app
        requests:
          cpu: 500m
          memory: 1Gi
  - name: db
    namespace: data
    containers:
      - name: postgres
        requests:
          cpu: 2
          memory: 4Gi
      - name: exporter
        requests:
          cpu: 0.1
"#,
        );

        let set = WorkloadFile::new(file.path()).load().unwrap();
        let ids: Vec<String> = set.iter().map(|w| w.id().to_string()).collect();

        assert_eq!(ids, ["default/web-0", "default/web-1", "default/web-2", "data/db"]);
        assert_eq!(
            set.as_slice()[3].aggregate(),
            &ResourceVector::new(2100, 4 * GI, 0)
        );
    }

    #[test]
    fn test_gpu_alias() {
        let file = yaml_file(
            r#"
pods:
  - name: trainer
    containers:
      - name: cuda
        requests:
          cpu: 4
          nvidia.com/gpu: 2
"#,
        );

        let set = WorkloadFile::new(file.path()).load().unwrap();
        assert_eq!(set.as_slice()[0].aggregate().gpu().value(), 2);
    }

    #[test]
    fn test_exclusions_applied() {
        let file = yaml_file(
            r#"
pods:
  - name: coredns
    namespace: kube-system
    containers:
      - name: coredns
        requests: { cpu: 100m }
  - name: api
    containers:
      - name: app
        requests: { cpu: 1 }
      - name: istio-proxy
        requests: { cpu: 1 }
  - name: only-sidecar
    containers:
      - name: istio-proxy
        requests: { cpu: 1 }
"#,
        );
        let exclusions = WorkloadExclusions::new(
            &["kube-system".to_string()],
            &[],
            &["istio".to_string()],
        )
        .unwrap();

        let set = WorkloadFile::new(file.path())
            .with_exclusions(exclusions)
            .load()
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].id().name, "api");
        assert_eq!(set.as_slice()[0].aggregate().cpu().value(), 1000);
    }

    #[test]
    fn test_empty_file_is_error() {
        let file = yaml_file("pods: []\n");
        assert!(matches!(
            WorkloadFile::new(file.path()).load(),
            Err(WorkloadError::Empty)
        ));
    }

    #[test]
    fn test_bad_quantity_names_container() {
        let file = yaml_file(
            r#"
pods:
  - name: web
    containers:
      - name: app
        requests: { memory: lots }
"#,
        );

        let err = WorkloadFile::new(file.path()).load().unwrap_err();
        assert!(err.to_string().contains("default/web"));
        assert!(err.to_string().contains("app"));
    }
}
