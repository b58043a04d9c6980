//! Dependency ordering and execution plans
//!
//! Ordering uses Kahn's algorithm. Nodes that become ready at the same time
//! are drawn from a `BTreeSet`, so the result never depends on insertion
//! order or hash seeds.

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// A directed graph where an edge `a -> b` means "a waits for b"
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl Into<String>) {
        self.dependencies.entry(node.into()).or_default();
    }

    /// Record that `dependent` must wait for `dependency`
    pub fn add_edge(&mut self, dependent: impl Into<String>, dependency: impl Into<String>) {
        let dependency = dependency.into();
        self.add_node(dependency.clone());
        self.dependencies
            .entry(dependent.into())
            .or_default()
            .insert(dependency);
    }

    pub fn contains(&self, node: &str) -> bool {
        self.dependencies.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Direct dependencies of a node
    pub fn dependencies_of(&self, node: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(node)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// All `(dependent, dependency)` pairs, sorted
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.dependencies
            .iter()
            .flat_map(|(node, deps)| deps.iter().map(move |d| (node.as_str(), d.as_str())))
            .collect()
    }

    /// A single topological order: every node after all of its dependencies
    pub fn order(&self) -> Result<Vec<String>> {
        Ok(self.waves()?.into_iter().flatten().collect())
    }

    /// Group nodes into levels; a node only depends on nodes of earlier levels
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        let mut remaining: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(node, deps)| (node.as_str(), deps.len()))
            .collect();

        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (node, deps) in &self.dependencies {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(node.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut waves = Vec::new();
        let mut placed = 0;

        while !ready.is_empty() {
            let wave: Vec<&str> = std::mem::take(&mut ready).into_iter().collect();
            for node in &wave {
                remaining.remove(node);
                for dependent in dependents.get(node).into_iter().flatten() {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(*dependent);
                        }
                    }
                }
            }
            placed += wave.len();
            waves.push(wave.into_iter().map(str::to_string).collect());
        }

        if placed != self.dependencies.len() {
            let stuck = remaining.keys().map(|n| (*n).to_string()).collect();
            return Err(Error::Cycle(stuck));
        }

        Ok(waves)
    }

    /// The given roots plus everything they transitively depend on
    pub fn with_dependencies(&self, roots: &[String]) -> Result<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for root in roots {
            if !self.contains(root) {
                return Err(Error::UnknownStack(root.clone()));
            }
            stack.push(root);
        }

        while let Some(node) = stack.pop() {
            if seen.insert(node.to_string()) {
                stack.extend(self.dependencies_of(node));
            }
        }

        Ok(seen)
    }

    /// The given roots plus everything that transitively depends on them
    pub fn with_dependents(&self, roots: &[String]) -> Result<BTreeSet<String>> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = Vec::new();

        for root in roots {
            if !self.contains(root) {
                return Err(Error::UnknownStack(root.clone()));
            }
            stack.push(root.clone());
        }

        while let Some(node) = stack.pop() {
            if seen.insert(node.clone()) {
                for (dependent, deps) in &self.dependencies {
                    if deps.contains(&node) {
                        stack.push(dependent.clone());
                    }
                }
            }
        }

        Ok(seen)
    }

    /// Restrict the graph to a subset of nodes, dropping edges that leave it
    pub fn subgraph(&self, keep: &BTreeSet<String>) -> Self {
        let dependencies = self
            .dependencies
            .iter()
            .filter(|(node, _)| keep.contains(*node))
            .map(|(node, deps)| {
                let deps = deps.iter().filter(|d| keep.contains(*d)).cloned().collect();
                (node.clone(), deps)
            })
            .collect();
        Self { dependencies }
    }
}

/// Direction an execution plan walks the stack graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deploy,
    Destroy,
}

impl Operation {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Destroy => "destroy",
        }
    }
}

/// A synthesized stack ready to be handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStack {
    pub name: String,
    /// Directory holding `cdk.tf.json`; the engine runs here
    pub working_dir: PathBuf,
}

/// Stacks grouped into waves, in the order the operation runs them
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub operation: Operation,
    pub waves: Vec<Vec<PlannedStack>>,
}

impl ExecutionPlan {
    /// Plan an operation over the stacks recorded in a manifest
    ///
    /// An empty `targets` selects every stack. Deploy pulls in the targets'
    /// dependencies; destroy pulls in their dependents and runs the waves in
    /// reverse so nothing is removed while something still relies on it.
    pub fn from_manifest(
        manifest: &Manifest,
        out_dir: &Path,
        targets: &[String],
        operation: Operation,
    ) -> Result<Self> {
        let graph = manifest.stack_graph();

        let selected = if targets.is_empty() {
            graph.dependencies.keys().cloned().collect()
        } else {
            match operation {
                Operation::Deploy => graph.with_dependencies(targets)?,
                Operation::Destroy => graph.with_dependents(targets)?,
            }
        };

        let mut waves: Vec<Vec<PlannedStack>> = graph
            .subgraph(&selected)
            .waves()?
            .into_iter()
            .map(|wave| {
                wave.into_iter()
                    .map(|name| PlannedStack {
                        working_dir: manifest.working_dir(out_dir, &name),
                        name,
                    })
                    .collect()
            })
            .collect();

        if operation == Operation::Destroy {
            waves.reverse();
        }

        log::debug!(
            "planned {} of {} stack(s) in {} wave(s)",
            operation.verb(),
            selected.len(),
            waves.len()
        );

        Ok(Self { operation, waves })
    }

    /// Total number of stacks in the plan
    pub fn total_stacks(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_stacks() == 0
    }

    /// Stack names in execution order
    pub fn stack_names(&self) -> Vec<&str> {
        self.waves
            .iter()
            .flatten()
            .map(|s| s.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        g.add_edge("kind-cluster", "docker-registry");
        g.add_edge("cluster-config", "kind-cluster");
        g
    }

    #[test]
    fn test_order_follows_edges() {
        assert_eq!(
            chain().order().unwrap(),
            vec!["docker-registry", "kind-cluster", "cluster-config"]
        );
    }

    #[test]
    fn test_ties_break_lexicographically() {
        let mut g = DependencyGraph::new();
        g.add_node("zeta");
        g.add_node("alpha");
        g.add_edge("mid", "alpha");
        g.add_edge("mid", "zeta");

        assert_eq!(
            g.waves().unwrap(),
            vec![vec!["alpha".to_string(), "zeta".to_string()], vec!["mid".to_string()]]
        );
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut g = chain();
        g.add_edge("docker-registry", "cluster-config");
        g.add_node("standalone");

        match g.order() {
            Err(Error::Cycle(nodes)) => {
                assert_eq!(nodes, vec!["cluster-config", "docker-registry", "kind-cluster"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut g = DependencyGraph::new();
        g.add_edge("a", "a");
        assert!(matches!(g.order(), Err(Error::Cycle(_))));
    }

    #[test]
    fn test_closure_helpers() {
        let g = chain();
        let deps = g.with_dependencies(&["kind-cluster".to_string()]).unwrap();
        assert_eq!(
            deps.into_iter().collect::<Vec<_>>(),
            vec!["docker-registry", "kind-cluster"]
        );

        let dependents = g.with_dependents(&["kind-cluster".to_string()]).unwrap();
        assert_eq!(
            dependents.into_iter().collect::<Vec<_>>(),
            vec!["cluster-config", "kind-cluster"]
        );

        assert!(matches!(
            g.with_dependencies(&["missing".to_string()]),
            Err(Error::UnknownStack(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_subgraph_drops_outside_edges() {
        let g = chain();
        let keep: BTreeSet<String> = ["kind-cluster".to_string(), "cluster-config".to_string()].into();
        let sub = g.subgraph(&keep);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.order().unwrap(), vec!["kind-cluster", "cluster-config"]);
    }

    fn cluster_manifest() -> Manifest {
        let mut manifest = Manifest::new("cluster");
        for (name, deps) in [
            ("docker-registry", vec![]),
            ("kind-cluster", vec!["docker-registry"]),
            ("cluster-config", vec!["kind-cluster"]),
        ] {
            manifest.stacks.insert(
                name.to_string(),
                crate::manifest::StackEntry {
                    name: name.to_string(),
                    working_directory: format!("stacks/{name}"),
                    synthesized_stack_path: format!("stacks/{name}/cdk.tf.json"),
                    dependencies: deps.into_iter().map(String::from).collect(),
                    content_hash: String::new(),
                },
            );
        }
        manifest
    }

    #[test]
    fn test_plan_deploy_pulls_in_dependencies() {
        let out = Path::new("cdktf.out/cluster");
        let plan = ExecutionPlan::from_manifest(
            &cluster_manifest(),
            out,
            &["kind-cluster".to_string()],
            Operation::Deploy,
        )
        .unwrap();

        assert_eq!(plan.stack_names(), vec!["docker-registry", "kind-cluster"]);
        assert_eq!(plan.waves[0][0].working_dir, out.join("stacks/docker-registry"));
    }

    #[test]
    fn test_plan_destroy_pulls_in_dependents_in_reverse() {
        let plan = ExecutionPlan::from_manifest(
            &cluster_manifest(),
            Path::new("out"),
            &["kind-cluster".to_string()],
            Operation::Destroy,
        )
        .unwrap();

        assert_eq!(plan.operation, Operation::Destroy);
        assert_eq!(plan.stack_names(), vec!["cluster-config", "kind-cluster"]);
    }

    #[test]
    fn test_plan_without_targets_covers_every_stack() {
        let manifest = cluster_manifest();
        let deploy =
            ExecutionPlan::from_manifest(&manifest, Path::new("out"), &[], Operation::Deploy).unwrap();
        assert_eq!(
            deploy.stack_names(),
            vec!["docker-registry", "kind-cluster", "cluster-config"]
        );
        assert_eq!(deploy.waves.len(), 3);

        let destroy =
            ExecutionPlan::from_manifest(&manifest, Path::new("out"), &[], Operation::Destroy).unwrap();
        assert_eq!(
            destroy.stack_names(),
            vec!["cluster-config", "kind-cluster", "docker-registry"]
        );
    }

    #[test]
    fn test_plan_unknown_target() {
        let result = ExecutionPlan::from_manifest(
            &cluster_manifest(),
            Path::new("out"),
            &["missing".to_string()],
            Operation::Destroy,
        );
        assert!(matches!(result, Err(Error::UnknownStack(name)) if name == "missing"));
    }
}
