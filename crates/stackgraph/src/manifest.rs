//! `manifest.json`: the index of a synthesized app

use crate::error::{Error, Result};
use crate::planner::DependencyGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest inside an app's output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// One synthesized stack as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    pub name: String,
    /// Relative to the app output directory
    pub working_directory: String,
    /// Relative to the app output directory
    pub synthesized_stack_path: String,
    pub dependencies: Vec<String>,
    pub content_hash: String,
}

/// Index of every stack an app synthesized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub app: String,
    pub stacks: BTreeMap<String, StackEntry>,
}

impl Manifest {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            app: app.into(),
            stacks: BTreeMap::new(),
        }
    }

    /// Read `manifest.json` from an app output directory
    pub fn load(out_dir: &Path) -> Result<Self> {
        let path = out_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&content).map_err(|source| Error::Manifest { path, source })
    }

    /// Write `manifest.json` into an app output directory
    pub fn save(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(MANIFEST_FILE);
        let mut content = serde_json::to_string_pretty(self).map_err(|source| Error::Serialize {
            what: "manifest".to_string(),
            source,
        })?;
        content.push('\n');
        fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Stack-level dependency graph
    pub fn stack_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for entry in self.stacks.values() {
            graph.add_node(entry.name.clone());
            for dep in &entry.dependencies {
                graph.add_edge(entry.name.clone(), dep.clone());
            }
        }
        graph
    }

    /// Working directory of a stack, resolved against `out_dir`
    pub fn working_dir(&self, out_dir: &Path, stack: &str) -> PathBuf {
        match self.stacks.get(stack) {
            Some(entry) => out_dir.join(&entry.working_directory),
            None => out_dir.join("stacks").join(stack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, deps: &[&str]) -> StackEntry {
        StackEntry {
            name: name.to_string(),
            working_directory: format!("stacks/{name}"),
            synthesized_stack_path: format!("stacks/{name}/cdk.tf.json"),
            dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
            content_hash: "00".to_string(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut manifest = Manifest::new("cluster");
        manifest
            .stacks
            .insert("docker-registry".into(), entry("docker-registry", &[]));
        manifest
            .stacks
            .insert("kind-cluster".into(), entry("kind-cluster", &["docker-registry"]));

        manifest.save(dir.path()).unwrap();
        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(
            loaded.stack_graph().order().unwrap(),
            vec!["docker-registry", "kind-cluster"]
        );
    }

    #[test]
    fn test_load_missing_and_invalid() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(Manifest::load(dir.path()), Err(Error::Io { .. })));

        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(Manifest::load(dir.path()), Err(Error::Manifest { .. })));
    }

    #[test]
    fn test_working_dir_resolution() {
        let mut manifest = Manifest::new("identity");
        manifest.stacks.insert("zitadel-dev".into(), entry("zitadel-dev", &[]));
        let out = Path::new("/out/identity");
        assert_eq!(
            manifest.working_dir(out, "zitadel-dev"),
            PathBuf::from("/out/identity/stacks/zitadel-dev")
        );
    }
}
