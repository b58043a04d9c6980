//! Apps: one independently synthesized graph of stacks

use crate::error::{Error, Result};
use crate::manifest::{Manifest, StackEntry};
use crate::planner::DependencyGraph;
use crate::stack::Stack;
use crate::synth::{STACK_FILE, content_hash, state_file_name};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of synthesizing one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedStack {
    pub name: String,
    pub path: PathBuf,
    pub content_hash: String,
    /// False when the previous synthesis produced the same bytes
    pub changed: bool,
}

/// Outcome of synthesizing an app
#[derive(Debug, Clone)]
pub struct SynthReport {
    pub manifest_path: PathBuf,
    pub stacks: Vec<SynthesizedStack>,
}

impl SynthReport {
    pub fn changed(&self) -> usize {
        self.stacks.iter().filter(|s| s.changed).count()
    }
}

/// An ordered set of stacks with stack-level dependency edges
#[derive(Debug, Clone)]
pub struct App {
    name: String,
    stacks: Vec<Stack>,
    state_dir: Option<PathBuf>,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stacks: Vec::new(),
            state_dir: None,
        }
    }

    /// Keep every stack's local state file in `dir` instead of its working directory
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a stack; its dependencies must already be part of the app
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stack(stack.name()).is_some() {
            return Err(Error::DuplicateStack(stack.name().to_string()));
        }
        if let Some(missing) = stack
            .dependencies()
            .iter()
            .find(|dep| self.stack(dep).is_none())
        {
            return Err(Error::UnknownStack(missing.clone()));
        }

        log::debug!(
            "app {}: added stack {} ({} resources)",
            self.name,
            stack.name(),
            stack.resources().len()
        );
        self.stacks.push(stack);
        Ok(())
    }

    /// Stacks in the order they were added
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    pub fn stack_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for stack in &self.stacks {
            graph.add_node(stack.name());
            for dep in stack.dependencies() {
                graph.add_edge(stack.name(), dep.clone());
            }
        }
        graph
    }

    /// Stack names in the order they must be applied
    pub fn deploy_order(&self) -> Result<Vec<String>> {
        self.stack_graph().order()
    }

    /// Stack names grouped into levels that may be deployed together
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        self.stack_graph().waves()
    }

    /// Local backend path a stack will be synthesized with
    pub fn state_path(&self, stack: &str) -> Option<String> {
        self.state_dir
            .as_ref()
            .map(|dir| dir.join(state_file_name(stack)).to_string_lossy().to_string())
    }

    /// Write every stack's Terraform JSON and the manifest into `out_dir`
    pub fn synth(&self, out_dir: &Path) -> Result<SynthReport> {
        let order = self.deploy_order()?;
        let previous = Manifest::load(out_dir).ok();
        let mut manifest = Manifest::new(self.name.clone());
        let mut stacks = Vec::with_capacity(order.len());

        for name in order {
            let stack = self
                .stack(&name)
                .ok_or_else(|| Error::UnknownStack(name.clone()))?;
            let text = stack.synth(self.state_path(&name).as_deref())?;
            let hash = content_hash(&text);

            let working_directory = format!("stacks/{name}");
            let synthesized_stack_path = format!("{working_directory}/{STACK_FILE}");
            let dir = out_dir.join(&working_directory);
            fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
            let path = out_dir.join(&synthesized_stack_path);
            fs::write(&path, &text).map_err(|e| Error::io(&path, e))?;

            let changed = previous
                .as_ref()
                .and_then(|m| m.stacks.get(&name))
                .is_none_or(|entry| entry.content_hash != hash);
            log::debug!("synthesized {} -> {} (changed: {changed})", name, path.display());

            manifest.stacks.insert(
                name.clone(),
                StackEntry {
                    name: name.clone(),
                    working_directory,
                    synthesized_stack_path,
                    dependencies: stack.dependencies().to_vec(),
                    content_hash: hash.clone(),
                },
            );
            stacks.push(SynthesizedStack {
                name,
                path,
                content_hash: hash,
                changed,
            });
        }

        let manifest_path = manifest.save(out_dir)?;
        Ok(SynthReport {
            manifest_path,
            stacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn three_stacks() -> App {
        let registry = Stack::new("docker-registry").unwrap();
        let mut cluster = Stack::new("kind-cluster").unwrap();
        cluster.add_dependency(&registry);
        let mut config = Stack::new("cluster-config").unwrap();
        config.add_dependency(&cluster);

        let mut app = App::new("cluster");
        app.add_stack(registry).unwrap();
        app.add_stack(cluster).unwrap();
        app.add_stack(config).unwrap();
        app
    }

    #[test]
    fn test_dependency_must_be_added_first() {
        let registry = Stack::new("docker-registry").unwrap();
        let mut cluster = Stack::new("kind-cluster").unwrap();
        cluster.add_dependency(&registry);

        let mut app = App::new("cluster");
        assert!(matches!(
            app.add_stack(cluster),
            Err(Error::UnknownStack(name)) if name == "docker-registry"
        ));
    }

    #[test]
    fn test_duplicate_stack() {
        let mut app = App::new("cluster");
        app.add_stack(Stack::new("a").unwrap()).unwrap();
        assert!(matches!(
            app.add_stack(Stack::new("a").unwrap()),
            Err(Error::DuplicateStack(_))
        ));
    }

    #[test]
    fn test_deploy_order() {
        assert_eq!(
            three_stacks().deploy_order().unwrap(),
            vec!["docker-registry", "kind-cluster", "cluster-config"]
        );
        assert_eq!(three_stacks().waves().unwrap().len(), 3);
    }

    #[test]
    fn test_synth_writes_stacks_and_manifest() {
        let dir = TempDir::new().unwrap();
        let app = three_stacks();

        let report = app.synth(dir.path()).unwrap();
        assert_eq!(report.stacks.len(), 3);
        assert_eq!(report.changed(), 3);
        assert!(dir.path().join("stacks/kind-cluster/cdk.tf.json").exists());

        let manifest = Manifest::load(dir.path()).unwrap();
        assert_eq!(manifest.app, "cluster");
        assert_eq!(
            manifest.stacks["cluster-config"].dependencies,
            vec!["kind-cluster".to_string()]
        );

        let again = app.synth(dir.path()).unwrap();
        assert_eq!(again.changed(), 0);
    }

    #[test]
    fn test_state_dir_sets_backend_path() {
        let dir = TempDir::new().unwrap();
        let app = three_stacks().with_state_dir("/srv/state");
        app.synth(dir.path()).unwrap();

        let text = fs::read_to_string(dir.path().join("stacks/docker-registry/cdk.tf.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            doc["terraform"]["backend"]["local"]["path"],
            "/srv/state/terraform.docker-registry.tfstate"
        );
    }
}
