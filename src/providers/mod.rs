//! Typed provider configurations and resource attribute structs
//!
//! Each struct serializes to exactly the attribute block the provider
//! expects. Optional attributes are skipped when unset so the synthesized
//! JSON only carries what a stack actually declares.

pub mod docker;
pub mod helm;
pub mod kubernetes;
pub mod null;
pub mod zitadel;

pub use docker::{Container, ContainerPort, DockerProvider, Image, NetworkAdvanced};
pub use helm::{HelmProvider, Release, SetValue};
pub use kubernetes::{ConfigMap, KubernetesConnection, KubernetesProvider, ObjectMeta};
pub use null::{NullProvider, NullResource};
pub use zitadel::{ApplicationOidc, HumanUser, Org, Project, ZitadelProvider};
