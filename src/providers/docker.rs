//! kreuzwerker/docker

use serde::Serialize;
use stackgraph::{Provider, Resource};

/// Talks to the local daemon; no settings needed
#[derive(Debug, Clone, Default, Serialize)]
pub struct DockerProvider {}

impl Provider for DockerProvider {
    const NAME: &'static str = "docker";
    const SOURCE: &'static str = "kreuzwerker/docker";
    const VERSION: &'static str = "~> 3.0";
}

/// A pulled image
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub name: String,
    /// Keep the image on destroy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_locally: Option<bool>,
}

impl Resource for Image {
    const TYPE: &'static str = "docker_image";
}

#[derive(Debug, Clone, Serialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks_advanced: Vec<NetworkAdvanced>,
}

impl Resource for Container {
    const TYPE: &'static str = "docker_container";
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerPort {
    pub internal: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkAdvanced {
    pub name: String,
}
