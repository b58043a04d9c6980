//! hashicorp/null

use serde::Serialize;
use stackgraph::{Provider, Resource};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct NullProvider {}

impl Provider for NullProvider {
    const NAME: &'static str = "null";
    const SOURCE: &'static str = "hashicorp/null";
    const VERSION: &'static str = "~> 3.0";
}

/// A resource that does nothing itself and only carries provisioners
///
/// Changing any trigger value forces replacement, which reruns the
/// provisioners.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NullResource {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub triggers: BTreeMap<String, String>,
}

impl NullResource {
    pub fn trigger(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.triggers.insert(key.into(), value.into());
        self
    }
}

impl Resource for NullResource {
    const TYPE: &'static str = "null_resource";
}
