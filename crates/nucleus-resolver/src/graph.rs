//! Adjacency-list dependency graph keyed by component id.
//!
//! Nodes are stored in declaration order. A dependency on an id that was
//! never declared creates a phantom node at the end of the node list; phantom
//! nodes exist only so that the missing-dependency diagnostic can name every
//! dependent, and they never take part in ordering.
//!
//! Edges point from a dependency to its dependent. The component that
//! declared an edge is always the dependent end, so no further edge
//! metadata is kept.

use std::collections::HashMap;

use nucleus_types::ComponentId;

use crate::{Declaration, MissingDependency, ResolveError};

/// A node of the dependency graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: ComponentId,
    declared: bool,
    dependencies: Vec<usize>,
}

impl Node {
    /// Return the component id.
    pub const fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Return `false` for phantom nodes created for undeclared ids.
    pub const fn is_declared(&self) -> bool {
        self.declared
    }

    /// Return the node indices this node depends on, without repeats.
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }
}

/// Directed dependency graph built once per simulation assembly.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<ComponentId, usize>,
    declared_count: usize,
}

impl DependencyGraph {
    /// Build the graph from component declarations.
    ///
    /// All declarations are inserted before any edge, so a component may
    /// depend on one declared after it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DuplicateComponent`] on the first repeated id.
    pub fn build<I>(declarations: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let declarations: Vec<Declaration> = declarations.into_iter().collect();
        let mut graph = Self::default();

        for declaration in &declarations {
            if graph.index.contains_key(&declaration.id) {
                return Err(ResolveError::DuplicateComponent {
                    id: declaration.id.clone(),
                });
            }
            graph.push_node(declaration.id.clone(), true);
        }
        graph.declared_count = graph.nodes.len();

        for (dependent, declaration) in declarations.into_iter().enumerate() {
            for dependency in declaration.dependencies {
                let target = match graph.index.get(&dependency) {
                    Some(&existing) => existing,
                    None => graph.push_node(dependency, false),
                };
                if let Some(node) = graph.nodes.get_mut(dependent)
                    && !node.dependencies.contains(&target)
                {
                    node.dependencies.push(target);
                }
            }
        }

        Ok(graph)
    }

    fn push_node(&mut self, id: ComponentId, declared: bool) -> usize {
        let position = self.nodes.len();
        self.index.insert(id.clone(), position);
        self.nodes.push(Node {
            id,
            declared,
            dependencies: Vec::new(),
        });
        position
    }

    /// Return all nodes, declared ones first in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the declared nodes only.
    pub fn declared(&self) -> &[Node] {
        self.nodes.get(..self.declared_count).unwrap_or_default()
    }

    /// Return the node for an index.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Return the index of a component id.
    pub fn index_of(&self, id: &ComponentId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Return the number of nodes, phantom nodes included.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return whether the graph has no nodes.
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return every phantom node with the declared components that need it.
    ///
    /// Phantom nodes are reported in order of first reference; dependents
    /// in declaration order.
    pub fn missing_dependencies(&self) -> Vec<MissingDependency> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.declared)
            .map(|(phantom, node)| MissingDependency {
                dependency: node.id.clone(),
                dependents: self
                    .declared()
                    .iter()
                    .filter(|candidate| candidate.dependencies.contains(&phantom))
                    .map(|candidate| candidate.id.clone())
                    .collect(),
            })
            .collect()
    }
}
