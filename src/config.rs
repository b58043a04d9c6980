use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

// ============================================================================
// Main Config Schema
// ============================================================================

/// The devstack configuration (`devstack.toml`)
///
/// Every field has a default matching the local kind setup, so a missing
/// file or an empty one is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevstackConfig {
    /// Directory synthesized stacks are written to
    pub out_dir: String,

    /// Kubeconfig used by the kubernetes and helm providers
    pub kubernetes: KubernetesConfig,

    /// Local container registry
    pub registry: RegistryConfig,

    /// kind cluster port mappings
    pub cluster: ClusterConfig,

    /// Ingress domain and TLS material
    pub ingress: IngressConfig,

    /// Identity provider entities
    pub identity: IdentityConfig,

    /// Provisioning engine
    pub terraform: TerraformConfig,
}

impl Default for DevstackConfig {
    fn default() -> Self {
        Self {
            out_dir: "cdktf.out".to_string(),
            kubernetes: KubernetesConfig::default(),
            registry: RegistryConfig::default(),
            cluster: ClusterConfig::default(),
            ingress: IngressConfig::default(),
            identity: IdentityConfig::default(),
            terraform: TerraformConfig::default(),
        }
    }
}

impl DevstackConfig {
    /// Load the config from `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Save the config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Could not write config file: {}", path.display()))?;

        Ok(path.to_path_buf())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.out_dir.trim().is_empty() {
            anyhow::bail!("out_dir cannot be empty");
        }

        self.registry.validate().context("Invalid [registry]")?;
        self.ingress.validate().context("Invalid [ingress]")?;
        self.identity.validate().context("Invalid [identity]")?;

        if self.terraform.binary.trim().is_empty() {
            anyhow::bail!("terraform.binary cannot be empty");
        }

        Ok(())
    }

    /// Output directory with `~` and variables expanded
    pub fn out_path(&self) -> PathBuf {
        paths::expand(&self.out_dir)
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Passed to the providers verbatim; they expand `~` themselves
    pub config_path: String,
    pub config_context: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            config_path: "~/.kube/config".to_string(),
            config_context: "kind-kind".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub image: String,
    pub container_name: String,
    /// Port the registry listens on inside the container
    pub internal_port: u16,
    /// Port published on the host
    pub external_port: u16,
    pub bind_ip: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            image: "registry:2".to_string(),
            container_name: "kind-registry".to_string(),
            internal_port: 5000,
            external_port: 5001,
            bind_ip: "127.0.0.1".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.container_name.is_empty() {
            anyhow::bail!("container_name cannot be empty");
        }
        if self.internal_port == 0 || self.external_port == 0 {
            anyhow::bail!("registry ports must be non-zero");
        }
        Ok(())
    }

    /// Host-side registry address, e.g. `localhost:5001`
    pub fn host_address(&self) -> String {
        format!("localhost:{}", self.external_port)
    }
}

/// Node ports the ingress controller listens on, mapped to host ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub http_node_port: u16,
    pub http_host_port: u16,
    pub https_node_port: u16,
    pub https_host_port: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            http_node_port: 30080,
            http_host_port: 80,
            https_node_port: 30443,
            https_host_port: 443,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Public host name of the identity server
    pub external_domain: String,
    /// Secret the self-signed certificate is stored in
    pub tls_secret: String,
    /// Where the extracted certificate is written
    pub cert_dir: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            external_domain: "machine.127.0.0.1.sslip.io".to_string(),
            tls_secret: "zitadel-tls".to_string(),
            cert_dir: "./certs".to_string(),
        }
    }
}

impl IngressConfig {
    pub fn validate(&self) -> Result<()> {
        if self.external_domain.is_empty() {
            anyhow::bail!("external_domain cannot be empty");
        }
        if self.tls_secret.is_empty() {
            anyhow::bail!("tls_secret cannot be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Instance domain the zitadel provider talks to
    pub domain: String,
    /// Service-account key, read when the identity app is synthesized
    pub key_file: String,
    pub org_name: String,
    pub project_name: String,
    pub app_name: String,
    pub redirect_uris: Vec<String>,
    pub user: UserConfig,
    /// `APP_URL` written to `.dev.vars`
    pub app_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            domain: "machine.127.0.0.1.sslip.io".to_string(),
            key_file: "zitadel-admin-sa.json".to_string(),
            org_name: "makers".to_string(),
            project_name: "makers-project".to_string(),
            app_name: "makers-app".to_string(),
            redirect_uris: vec!["http://localhost:3000/callback".to_string()],
            user: UserConfig::default(),
            app_url: "http://localhost:8787".to_string(),
        }
    }
}

impl IdentityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            anyhow::bail!("domain cannot be empty");
        }
        if self.org_name.is_empty() || self.project_name.is_empty() || self.app_name.is_empty() {
            anyhow::bail!("org_name, project_name and app_name cannot be empty");
        }
        if self.redirect_uris.is_empty() {
            anyhow::bail!("at least one redirect URI is required");
        }
        Ok(())
    }

    pub fn key_path(&self) -> PathBuf {
        paths::expand(&self.key_file)
    }

    /// `AUTH_SERVER_URL` written to `.dev.vars`
    pub fn auth_server_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub user_name: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub initial_password: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            user_name: "makers-user".to_string(),
            email: "makers-user@example.com".to_string(),
            first_name: "Makers".to_string(),
            last_name: "User".to_string(),
            display_name: "Makers User".to_string(),
            initial_password: "TempPassword123!".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Engine binary, looked up on PATH
    pub binary: String,
    /// Directory for `terraform.<stack>.tfstate`; defaults to each stack's working directory
    pub state_dir: Option<String>,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: "terraform".to_string(),
            state_dir: None,
        }
    }
}

impl TerraformConfig {
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_dir.as_deref().map(paths::expand)
    }
}

// ============================================================================
// Tests
// ============================================================================
