//! Regex-based exclusion of namespaces, pods and containers

use crate::error::WorkloadError;
use regex::Regex;

/// Patterns for workloads that should not take part in a plan
///
/// Patterns match anywhere in the name; empty patterns are ignored.
#[derive(Debug, Clone, Default)]
pub struct WorkloadExclusions {
    namespaces: Vec<Regex>,
    pods: Vec<Regex>,
    containers: Vec<Regex>,
}

impl WorkloadExclusions {
    pub fn new(
        namespaces: &[String],
        pods: &[String],
        containers: &[String],
    ) -> Result<Self, WorkloadError> {
        Ok(Self {
            namespaces: compile(namespaces)?,
            pods: compile(pods)?,
            containers: compile(containers)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.pods.is_empty() && self.containers.is_empty()
    }

    pub fn excludes_namespace(&self, namespace: &str) -> bool {
        matches_any(&self.namespaces, namespace)
    }

    pub fn excludes_pod(&self, pod: &str) -> bool {
        matches_any(&self.pods, pod)
    }

    pub fn excludes_container(&self, container: &str) -> bool {
        matches_any(&self.containers, container)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, WorkloadError> {
    patterns
        .iter()
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| WorkloadError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(patterns: &[Regex], value: &str) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_patterns_ignored() {
        let exclusions = WorkloadExclusions::new(&strings(&[""]), &[], &[]).unwrap();
        assert!(exclusions.is_empty());
        assert!(!exclusions.excludes_namespace("default"));
    }

    #[test]
    fn test_unanchored_match() {
        let exclusions = WorkloadExclusions::new(
            &strings(&["kube-", "^gmp-system$"]),
            &strings(&["canary"]),
            &strings(&["istio-proxy"]),
        )
        .unwrap();

        assert!(exclusions.excludes_namespace("kube-system"));
        assert!(exclusions.excludes_namespace("gmp-system"));
        assert!(!exclusions.excludes_namespace("gmp-system-extra"));
        assert!(exclusions.excludes_pod("web-canary-1"));
        assert!(!exclusions.excludes_pod("web-1"));
        assert!(exclusions.excludes_container("istio-proxy"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = WorkloadExclusions::new(&[], &strings(&["(unclosed"]), &[]);
        assert!(matches!(result, Err(WorkloadError::Pattern { .. })));
    }
}
