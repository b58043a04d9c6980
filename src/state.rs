//! Terraform state outputs and the `.dev.vars` file built from them

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::IdentityConfig;

/// Default file the extracted outputs are written to
pub const OUTPUTS_FILE: &str = "terraform-outputs.json";

/// Default environment file for local app development
pub const DEV_VARS_FILE: &str = ".dev.vars";

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("output '{0}' not found; deploy the identity app and extract its outputs first")]
    MissingOutput(String),

    #[error("output '{key}' has no string field '{field}'")]
    MissingField { key: String, field: String },
}

// ============================================================================
// State Structures
// ============================================================================

/// The part of a Terraform state file we read
#[derive(Debug, Deserialize)]
struct TerraformState {
    #[serde(default)]
    outputs: BTreeMap<String, StateOutput>,
}

/// One output as recorded in state, sensitive values unmasked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateOutput {
    pub value: Value,
    #[serde(rename = "type", default)]
    pub output_type: Value,
    #[serde(default)]
    pub sensitive: bool,
}

impl StateOutput {
    /// Value for console display; sensitive values are never printed
    pub fn display_value(&self) -> String {
        if self.sensitive {
            "[SENSITIVE - written to file unmasked]".to_string()
        } else {
            self.value.to_string()
        }
    }
}

/// Outputs extracted from one state file
///
/// Written as a flat `{name: {value, type, sensitive}}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputsFile {
    pub outputs: BTreeMap<String, StateOutput>,
}

impl OutputsFile {
    /// Read every output of a local state file
    pub fn from_state(state_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(state_path)
            .with_context(|| format!("Could not read state file: {}", state_path.display()))?;
        let state: TerraformState = serde_json::from_str(&content)
            .with_context(|| format!("Invalid state file: {}", state_path.display()))?;

        log::info!(
            "read {} output(s) from {}",
            state.outputs.len(),
            state_path.display()
        );
        Ok(Self {
            outputs: state.outputs,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read outputs file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid outputs file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize outputs")?;
        fs::write(path, content)
            .with_context(|| format!("Could not write outputs file: {}", path.display()))?;
        Ok(())
    }

    fn output(&self, key: &str) -> Result<&Value, StateError> {
        self.outputs
            .get(key)
            .map(|o| &o.value)
            .ok_or_else(|| StateError::MissingOutput(key.to_string()))
    }

    /// A string output, or a string field of an object output
    fn string(&self, key: &str, field: Option<&str>) -> Result<String, StateError> {
        let value = self.output(key)?;
        let value = match field {
            Some(field) => value.get(field),
            None => Some(value),
        };
        value
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StateError::MissingField {
                key: key.to_string(),
                field: field.unwrap_or("value").to_string(),
            })
    }
}

// ============================================================================
// .dev.vars
// ============================================================================

/// Environment variables a locally running app needs to authenticate
pub fn dev_vars(outputs: &OutputsFile, identity: &IdentityConfig) -> Result<Vec<(&'static str, String)>> {
    Ok(vec![
        ("CLIENT_ID", outputs.string("client_id", None)?),
        ("CLIENT_SECRET", outputs.string("client_secret", None)?),
        ("AUTH_SERVER_URL", identity.auth_server_url()),
        ("APP_URL", identity.app_url.clone()),
        ("DEV_MODE", "true".to_string()),
        ("ZITADEL_ORG_ID", outputs.string("created_org", Some("id"))?),
        ("ZITADEL_PROJECT_ID", outputs.string("created_project", Some("id"))?),
    ])
}

/// `KEY="value"` lines
pub fn render_dev_vars(vars: &[(&str, String)]) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str(&format!("{key}=\"{}\"\n", value.replace('"', "\\\"")));
    }
    out
}
