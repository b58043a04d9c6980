//! hashicorp/kubernetes

use serde::Serialize;
use stackgraph::{Provider, Resource};
use std::collections::BTreeMap;

use crate::config::KubernetesConfig;

/// Kubeconfig file and context to connect with
#[derive(Debug, Clone, Serialize)]
pub struct KubernetesConnection {
    pub config_path: String,
    pub config_context: String,
}

impl From<&KubernetesConfig> for KubernetesConnection {
    fn from(config: &KubernetesConfig) -> Self {
        Self {
            config_path: config.config_path.clone(),
            config_context: config.config_context.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KubernetesProvider {
    #[serde(flatten)]
    pub connection: KubernetesConnection,
}

impl Provider for KubernetesProvider {
    const NAME: &'static str = "kubernetes";
    const SOURCE: &'static str = "hashicorp/kubernetes";
    const VERSION: &'static str = "~> 2.0";
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `kubernetes_config_map_v1`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

impl Resource for ConfigMap {
    const TYPE: &'static str = "kubernetes_config_map_v1";
}
