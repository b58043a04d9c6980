//! Registry and kind cluster
//!
//! Three stacks applied strictly in sequence: the registry container, the
//! kind cluster that pulls through it, and a config map in the cluster
//! documenting where the registry lives.

use anyhow::Result;
use stackgraph::{App, Provisioner, ResourceOptions, Stack};
use std::collections::BTreeMap;

use crate::config::{ClusterConfig, DevstackConfig, RegistryConfig};
use crate::providers::{
    ConfigMap, Container, ContainerPort, DockerProvider, Image, KubernetesProvider, NetworkAdvanced,
    NullProvider, NullResource, ObjectMeta,
};

pub const REGISTRY_STACK: &str = "docker-registry";
pub const KIND_STACK: &str = "kind-cluster";
pub const CONFIG_STACK: &str = "cluster-config";

/// Name kind gives the cluster and its docker network
const KIND_NAME: &str = "kind";

/// Directory containerd reads per-registry host configuration from
const CONTAINERD_CERTS_DIR: &str = "/etc/containerd/certs.d";

pub fn build(config: &DevstackConfig) -> Result<App> {
    let registry = registry_stack(&config.registry)?;
    let kind = kind_stack(&registry, &config.registry, &config.cluster)?;
    let cluster_config = config_stack(&kind, config)?;

    let mut app = App::new("cluster");
    app.add_stack(registry)?;
    app.add_stack(kind)?;
    app.add_stack(cluster_config)?;
    Ok(app)
}

fn registry_stack(registry: &RegistryConfig) -> Result<Stack> {
    let mut stack = Stack::new(REGISTRY_STACK)?;
    stack.provider(&DockerProvider::default())?;

    let image = stack.resource(
        "registry-image",
        &Image {
            name: registry.image.clone(),
            keep_locally: Some(true),
        },
    )?;

    stack.resource(
        &registry.container_name,
        &Container {
            name: registry.container_name.clone(),
            image: image.attr("image_id"),
            ports: vec![ContainerPort {
                internal: registry.internal_port,
                external: Some(registry.external_port),
                ip: Some(registry.bind_ip.clone()),
            }],
            restart: Some("always".to_string()),
            networks_advanced: vec![NetworkAdvanced {
                name: "bridge".to_string(),
            }],
        },
    )?;

    Ok(stack)
}

/// Inline kind configuration piped to `kind create cluster`
pub fn kind_config(cluster: &ClusterConfig) -> String {
    format!(
        r#"kind: Cluster
apiVersion: kind.x-k8s.io/v1alpha4
containerdConfigPatches:
- |-
  [plugins."io.containerd.grpc.v1.cri".registry]
    config_path = "{CONTAINERD_CERTS_DIR}"
nodes:
- role: control-plane
  extraPortMappings:
  - containerPort: {}
    hostPort: {}
    protocol: TCP
  - containerPort: {}
    hostPort: {}
    protocol: TCP
"#,
        cluster.http_node_port,
        cluster.http_host_port,
        cluster.https_node_port,
        cluster.https_host_port,
    )
}

fn kind_stack(
    registry_stack: &Stack,
    registry: &RegistryConfig,
    cluster: &ClusterConfig,
) -> Result<Stack> {
    let mut stack = Stack::new(KIND_STACK)?;
    stack.add_dependency(registry_stack);
    stack.provider(&NullProvider::default())?;

    let kind_config = kind_config(cluster);
    let kind_cluster = stack.resource_with(
        "kind-cluster",
        &NullResource::default().trigger("config", kind_config.clone()),
        ResourceOptions::new()
            .provisioner(Provisioner::local_exec(format!(
                "echo '{kind_config}' | kind create cluster --config=-"
            )))
            .provisioner(Provisioner::on_destroy(format!(
                "kind delete cluster -n {KIND_NAME}"
            ))),
    )?;

    let registry_config = stack.resource_with(
        "registry-config",
        &NullResource::default(),
        ResourceOptions::new()
            .depends_on(&kind_cluster)
            .provisioner(Provisioner::local_exec(registry_hosts_command(registry))),
    )?;

    stack.resource_with(
        "network-connection",
        &NullResource::default(),
        ResourceOptions::new()
            .depends_on(&registry_config)
            .provisioner(Provisioner::local_exec(network_connect_command(registry))),
    )?;

    Ok(stack)
}

/// Writes `hosts.toml` into every node so `localhost:<port>` resolves to the registry container
fn registry_hosts_command(registry: &RegistryConfig) -> String {
    format!(
        r#"REGISTRY_DIR="{CONTAINERD_CERTS_DIR}/{host}"
for node in $(kind get nodes); do
  docker exec "$node" mkdir -p "$REGISTRY_DIR"
  echo '[host."http://{name}:{port}"]' | docker exec -i "$node" cp /dev/stdin "$REGISTRY_DIR/hosts.toml"
done
"#,
        host = registry.host_address(),
        name = registry.container_name,
        port = registry.internal_port,
    )
}

/// Attaches the registry to the kind network unless it already is
fn network_connect_command(registry: &RegistryConfig) -> String {
    format!(
        r#"if [ "$(docker inspect -f='{{{{json .NetworkSettings.Networks.{KIND_NAME}}}}}' "{name}")" = 'null' ]; then
  docker network connect "{KIND_NAME}" "{name}"
fi
"#,
        name = registry.container_name,
    )
}

fn config_stack(kind_stack: &Stack, config: &DevstackConfig) -> Result<Stack> {
    let mut stack = Stack::new(CONFIG_STACK)?;
    stack.add_dependency(kind_stack);
    stack.provider(&KubernetesProvider {
        connection: (&config.kubernetes).into(),
    })?;

    let mut data = BTreeMap::new();
    data.insert(
        "localRegistryHosting.v1".to_string(),
        format!(
            "host: \"{}\"\nhelp: \"https://kind.sigs.k8s.io/docs/user/local-registry/\"",
            config.registry.host_address()
        ),
    );

    stack.resource(
        "local-registry-hosting",
        &ConfigMap {
            metadata: ObjectMeta {
                name: "local-registry-hosting".to_string(),
                namespace: Some("kube-public".to_string()),
            },
            data,
        },
    )?;

    Ok(stack)
}
