//! The three development apps
//!
//! Each app is synthesized and deployed on its own, in the order
//! `cluster`, `components`, `identity`.

pub mod cluster;
pub mod components;
pub mod identity;

use anyhow::Result;
use clap::ValueEnum;
use stackgraph::App;
use std::fmt;
use std::path::PathBuf;

use crate::config::DevstackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum AppKind {
    /// Local registry and kind cluster
    Cluster,
    /// cert-manager, Traefik, PostgreSQL and Zitadel
    Components,
    /// Zitadel organization, project, application and user
    Identity,
}

impl AppKind {
    /// All apps in the order they are deployed
    pub const ALL: [Self; 3] = [Self::Cluster, Self::Components, Self::Identity];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::Components => "components",
            Self::Identity => "identity",
        }
    }

    /// Declare the app's stacks
    pub fn build(self, config: &DevstackConfig) -> Result<App> {
        let app = match self {
            Self::Cluster => cluster::build(config)?,
            Self::Components => components::build(config)?,
            Self::Identity => identity::build(config)?,
        };

        Ok(match config.terraform.state_path() {
            Some(dir) => app.with_state_dir(dir),
            None => app,
        })
    }

    /// Declare the app without reading secrets
    ///
    /// The result has the same stacks and resources as [`AppKind::build`]
    /// but must not be synthesized for deployment.
    pub fn outline(self, config: &DevstackConfig) -> Result<App> {
        match self {
            Self::Identity => identity::outline(config),
            other => other.build(config),
        }
    }

    /// Directory the app is synthesized into
    pub fn out_dir(self, config: &DevstackConfig) -> PathBuf {
        config.out_path().join(self.name())
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_names_match_builders() {
        let config = DevstackConfig::default();
        for kind in AppKind::ALL {
            assert_eq!(kind.outline(&config).unwrap().name(), kind.name());
        }
        assert_eq!(
            AppKind::Identity.out_dir(&config),
            PathBuf::from("cdktf.out").join("identity")
        );
    }

    #[test]
    fn test_state_dir_applies_to_every_stack() {
        let mut config = DevstackConfig::default();
        config.terraform.state_dir = Some("/srv/state".to_string());

        let app = AppKind::Cluster.build(&config).unwrap();
        assert_eq!(
            app.state_path("kind-cluster").as_deref(),
            Some("/srv/state/terraform.kind-cluster.tfstate")
        );
    }
}
