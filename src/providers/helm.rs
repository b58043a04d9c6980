//! hashicorp/helm

use serde::Serialize;
use stackgraph::{Provider, Resource};

use super::kubernetes::KubernetesConnection;

#[derive(Debug, Clone, Serialize)]
pub struct HelmProvider {
    pub kubernetes: KubernetesConnection,
}

impl Provider for HelmProvider {
    const NAME: &'static str = "helm";
    const SOURCE: &'static str = "hashicorp/helm";
    const VERSION: &'static str = "~> 2.0";
}

/// A chart installed into the cluster
///
/// `values` holds raw YAML documents, merged in order by Helm.
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub name: String,
    pub repository: String,
    pub chart: String,
    /// Unpinned when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_namespace: Option<bool>,
    pub wait: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<SetValue>,
}

impl Resource for Release {
    const TYPE: &'static str = "helm_release";
}

#[derive(Debug, Clone, Serialize)]
pub struct SetValue {
    pub name: String,
    pub value: String,
}

impl SetValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
