//! Deterministic Terraform JSON synthesis
//!
//! `serde_json` maps keep their keys sorted, and every collection written
//! here is either a sorted map or a list in declaration order, so the same
//! stack always renders to the same bytes.

use crate::error::{Error, Result};
use crate::stack::Stack;
use serde_json::{Map, Value, json};

/// Name written into the `//` metadata block
pub const GENERATOR: &str = concat!("stackgraph/", env!("CARGO_PKG_VERSION"));

/// File name of a synthesized stack inside its working directory
pub const STACK_FILE: &str = "cdk.tf.json";

/// Default local state file for a stack
pub fn state_file_name(stack: &str) -> String {
    format!("terraform.{stack}.tfstate")
}

impl Stack {
    /// Render the stack as a Terraform JSON document
    ///
    /// `state_path` is the local backend path; `None` keeps the state file
    /// next to the configuration.
    pub fn to_json(&self, state_path: Option<&str>) -> Result<Value> {
        self.validate()?;

        let mut doc = Map::new();

        let state_path = state_path
            .map(str::to_string)
            .unwrap_or_else(|| state_file_name(self.name()));
        doc.insert(
            "//".to_string(),
            json!({
                "metadata": {
                    "backend": "local",
                    "generator": GENERATOR,
                    "stackName": self.name(),
                    "dependencies": self.dependencies(),
                }
            }),
        );

        let mut terraform = Map::new();
        terraform.insert(
            "backend".to_string(),
            json!({ "local": { "path": state_path } }),
        );
        if !self.required_providers().is_empty() {
            terraform.insert(
                "required_providers".to_string(),
                to_value("required_providers", self.required_providers())?,
            );
        }
        doc.insert("terraform".to_string(), Value::Object(terraform));

        if !self.providers().is_empty() {
            doc.insert(
                "provider".to_string(),
                to_value("providers", self.providers())?,
            );
        }

        if !self.resources().is_empty() {
            let mut by_type: Map<String, Value> = Map::new();
            for node in self.resources() {
                let entry = by_type
                    .entry(node.resource_type().to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(named) = entry {
                    named.insert(node.name().to_string(), node.to_json());
                }
            }
            doc.insert("resource".to_string(), Value::Object(by_type));
        }

        if !self.outputs().is_empty() {
            let mut outputs = Map::new();
            for (name, output) in self.outputs() {
                let mut block = Map::new();
                block.insert("value".to_string(), output.value.clone());
                if let Some(description) = &output.description {
                    block.insert("description".to_string(), json!(description));
                }
                if output.sensitive {
                    block.insert("sensitive".to_string(), json!(true));
                }
                outputs.insert(name.clone(), Value::Object(block));
            }
            doc.insert("output".to_string(), Value::Object(outputs));
        }

        Ok(Value::Object(doc))
    }

    /// Render the stack as pretty-printed Terraform JSON text
    pub fn synth(&self, state_path: Option<&str>) -> Result<String> {
        let doc = self.to_json(state_path)?;
        let mut text = serde_json::to_string_pretty(&doc).map_err(|source| Error::Serialize {
            what: format!("stack {}", self.name()),
            source,
        })?;
        text.push('\n');
        Ok(text)
    }
}

/// blake3 hex digest of synthesized content
pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

fn to_value<T: serde::Serialize>(what: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|source| Error::Serialize {
        what: what.to_string(),
        source,
    })
}
