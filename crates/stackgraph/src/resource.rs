//! Resource and provider traits, and the untyped resource node
//!
//! Typed attribute structs implement [`Resource`] (or [`Provider`]) and are
//! turned into JSON when added to a stack. Everything after that point works
//! on [`ResourceNode`], which is what gets ordered and synthesized.

use crate::error::{Error, Result};
use crate::token::ResourceRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A typed resource declaration
///
/// The struct's serialized form becomes the resource's attribute block, so
/// field names must already be the provider's snake_case attribute names.
///
/// ```ignore
/// #[derive(Debug, Serialize)]
/// struct Org { name: String }
///
/// impl Resource for Org {
///     const TYPE: &'static str = "zitadel_org";
/// }
/// ```
pub trait Resource: Serialize + fmt::Debug {
    /// Terraform resource type, e.g. `helm_release`
    const TYPE: &'static str;
}

/// A typed provider configuration
pub trait Provider: Serialize + fmt::Debug {
    /// Local provider name, e.g. `kubernetes`
    const NAME: &'static str;

    /// Registry source, e.g. `hashicorp/kubernetes`
    const SOURCE: &'static str;

    /// Version constraint written to `required_providers`
    const VERSION: &'static str;
}

/// When a provisioner runs in the resource lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum When {
    #[default]
    Create,
    Destroy,
}

/// A provisioner attached to a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioner {
    /// Run a shell command on the machine executing the engine
    LocalExec { command: String, when: When },
}

impl Provisioner {
    /// A local-exec provisioner run at creation time
    pub fn local_exec(command: impl Into<String>) -> Self {
        Self::LocalExec {
            command: command.into(),
            when: When::Create,
        }
    }

    /// A local-exec provisioner run at destroy time
    pub fn on_destroy(command: impl Into<String>) -> Self {
        Self::LocalExec {
            command: command.into(),
            when: When::Destroy,
        }
    }

    /// The shell command this provisioner runs
    pub fn command(&self) -> &str {
        match self {
            Self::LocalExec { command, .. } => command,
        }
    }

    pub fn when(&self) -> When {
        match self {
            Self::LocalExec { when, .. } => *when,
        }
    }

    /// Terraform JSON form: `{"local-exec": {"command": ..., "when": ...}}`
    pub fn to_json(&self) -> Value {
        match self {
            Self::LocalExec { command, when } => serde_json::json!({
                "local-exec": {
                    "command": command,
                    "when": when,
                }
            }),
        }
    }
}

/// Meta-arguments attached when a typed resource is added to a stack
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub depends_on: Vec<ResourceRef>,
    pub provisioners: Vec<Provisioner>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an explicit ordering edge
    pub fn depends_on(mut self, target: &ResourceRef) -> Self {
        if !self.depends_on.contains(target) {
            self.depends_on.push(target.clone());
        }
        self
    }

    pub fn provisioner(mut self, provisioner: Provisioner) -> Self {
        self.provisioners.push(provisioner);
        self
    }
}

/// An untyped resource: identifier, kind, attributes and dependency set
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    pub reference: ResourceRef,
    pub attributes: Map<String, Value>,
    pub depends_on: Vec<ResourceRef>,
    pub provisioners: Vec<Provisioner>,
}

impl ResourceNode {
    /// Build a node from a typed resource
    pub fn from_typed<R: Resource>(name: &str, resource: &R, options: ResourceOptions) -> Result<Self> {
        let attributes = match serde_json::to_value(resource) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                return Err(Error::Serialize {
                    what: format!("{}.{name}", R::TYPE),
                    source: <serde_json::Error as serde::ser::Error>::custom(format!(
                        "expected an attribute object, got {other}"
                    )),
                });
            }
            Err(source) => {
                return Err(Error::Serialize {
                    what: format!("{}.{name}", R::TYPE),
                    source,
                });
            }
        };

        Ok(Self {
            reference: ResourceRef::new(R::TYPE, name),
            attributes,
            depends_on: options.depends_on,
            provisioners: options.provisioners,
        })
    }

    pub fn resource_type(&self) -> &str {
        &self.reference.resource_type
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn fqn(&self) -> String {
        self.reference.fqn()
    }

    /// Resources referenced from attribute or provisioner strings
    pub fn implicit_references(&self) -> Vec<ResourceRef> {
        let mut found = Vec::new();
        for value in self.attributes.values() {
            collect_references(value, &mut found);
        }
        for provisioner in &self.provisioners {
            for reference in crate::token::references(provisioner.command()) {
                push_unique(&mut found, reference);
            }
        }
        found.retain(|r| r != &self.reference);
        found
    }

    /// The attribute block as synthesized, meta-arguments included
    pub fn to_json(&self) -> Value {
        let mut block = self.attributes.clone();

        if !self.depends_on.is_empty() {
            let deps: Vec<Value> = self
                .depends_on
                .iter()
                .map(|r| Value::String(r.fqn()))
                .collect();
            block.insert("depends_on".to_string(), Value::Array(deps));
        }

        if !self.provisioners.is_empty() {
            let provisioners: Vec<Value> = self.provisioners.iter().map(Provisioner::to_json).collect();
            block.insert("provisioner".to_string(), Value::Array(provisioners));
        }

        Value::Object(block)
    }
}

/// Walk a JSON value and collect every interpolated resource reference
pub(crate) fn collect_references(value: &Value, found: &mut Vec<ResourceRef>) {
    match value {
        Value::String(s) => {
            for reference in crate::token::references(s) {
                push_unique(found, reference);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

fn push_unique(found: &mut Vec<ResourceRef>, reference: ResourceRef) {
    if !found.contains(&reference) {
        found.push(reference);
    }
}
