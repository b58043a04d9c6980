//! Stacks: named, independently synthesizable groups of resources

use crate::error::{Error, Result};
use crate::planner::DependencyGraph;
use crate::resource::{Provider, Resource, ResourceNode, ResourceOptions, collect_references};
use crate::token::{ResourceRef, is_valid_name};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A provider entry for `terraform.required_providers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredProvider {
    pub source: String,
    pub version: String,
}

/// A value the stack exposes after apply
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub value: Value,
    pub description: Option<String>,
    pub sensitive: bool,
}

impl Output {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            description: None,
            sensitive: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mask the value in engine output
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// An ordered set of resource nodes plus edges to other stacks
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    dependencies: Vec<String>,
    providers: BTreeMap<String, Vec<Value>>,
    required_providers: BTreeMap<String, RequiredProvider>,
    resources: Vec<ResourceNode>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(Error::InvalidName(name));
        }
        Ok(Self {
            name,
            dependencies: Vec::new(),
            providers: BTreeMap::new(),
            required_providers: BTreeMap::new(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the stacks that must be applied before this one
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Declare that this stack is applied only after `other`
    pub fn add_dependency(&mut self, other: &Stack) {
        if !self.dependencies.iter().any(|d| d == other.name()) {
            self.dependencies.push(other.name().to_string());
        }
    }

    /// Configure a provider for this stack
    pub fn provider<P: Provider>(&mut self, provider: &P) -> Result<()> {
        let config = serde_json::to_value(provider).map_err(|source| Error::Serialize {
            what: format!("provider {}", P::NAME),
            source,
        })?;

        self.providers
            .entry(P::NAME.to_string())
            .or_default()
            .push(config);
        self.required_providers.insert(
            P::NAME.to_string(),
            RequiredProvider {
                source: P::SOURCE.to_string(),
                version: P::VERSION.to_string(),
            },
        );
        Ok(())
    }

    /// Add a typed resource without meta-arguments
    pub fn resource<R: Resource>(&mut self, name: &str, resource: &R) -> Result<ResourceRef> {
        self.resource_with(name, resource, ResourceOptions::new())
    }

    /// Add a typed resource with `depends_on` edges and provisioners
    pub fn resource_with<R: Resource>(
        &mut self,
        name: &str,
        resource: &R,
        options: ResourceOptions,
    ) -> Result<ResourceRef> {
        if !is_valid_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }

        let node = ResourceNode::from_typed(name, resource, options)?;
        if self.find(&node.reference).is_some() {
            return Err(Error::DuplicateResource {
                stack: self.name.clone(),
                fqn: node.fqn(),
            });
        }

        for dep in &node.depends_on {
            if self.find(dep).is_none() {
                return Err(Error::UnknownDependency {
                    stack: self.name.clone(),
                    from: node.fqn(),
                    to: dep.fqn(),
                });
            }
        }

        log::trace!("stack {}: added {}", self.name, node.fqn());
        let reference = node.reference.clone();
        self.resources.push(node);
        Ok(reference)
    }

    /// Expose a value as a stack output
    pub fn output(&mut self, name: &str, output: Output) -> Result<()> {
        if !is_valid_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    /// Resources in declaration order
    pub fn resources(&self) -> &[ResourceNode] {
        &self.resources
    }

    pub fn find(&self, reference: &ResourceRef) -> Option<&ResourceNode> {
        self.resources.iter().find(|r| &r.reference == reference)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn providers(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.providers
    }

    pub fn required_providers(&self) -> &BTreeMap<String, RequiredProvider> {
        &self.required_providers
    }

    /// Resource graph with explicit and interpolation-derived edges
    ///
    /// Fails on references to resources the stack does not declare.
    pub fn resource_graph(&self) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();

        for node in &self.resources {
            let fqn = node.fqn();
            graph.add_node(fqn.clone());

            for dep in &node.depends_on {
                if self.find(dep).is_none() {
                    return Err(Error::UnknownDependency {
                        stack: self.name.clone(),
                        from: fqn,
                        to: dep.fqn(),
                    });
                }
                graph.add_edge(fqn.clone(), dep.fqn());
            }

            for reference in node.implicit_references() {
                if self.find(&reference).is_none() {
                    return Err(Error::DanglingReference {
                        stack: self.name.clone(),
                        from: fqn,
                        to: reference.fqn(),
                    });
                }
                graph.add_edge(fqn.clone(), reference.fqn());
            }
        }

        Ok(graph)
    }

    /// Check names, references and acyclicity
    pub fn validate(&self) -> Result<()> {
        self.resource_graph()?.order()?;

        for (name, output) in &self.outputs {
            let mut found = Vec::new();
            collect_references(&output.value, &mut found);
            if let Some(missing) = found.iter().find(|r| self.find(r).is_none()) {
                return Err(Error::DanglingReference {
                    stack: self.name.clone(),
                    from: format!("output.{name}"),
                    to: missing.fqn(),
                });
            }
        }

        Ok(())
    }

    /// The order in which the engine is able to create this stack's resources
    pub fn resource_order(&self) -> Result<Vec<String>> {
        self.resource_graph()?.order()
    }
}
