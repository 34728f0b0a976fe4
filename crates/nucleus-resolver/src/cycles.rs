//! Reduction of a cyclic dependency graph to its irreducible core.
//!
//! Two reductions are applied until neither changes the graph:
//!
//! - **Source/sink reduction** removes every node with no incoming or no
//!   outgoing edges. Such a node cannot lie on a cycle.
//! - **Chain reduction** collapses a node with exactly one outgoing edge
//!   into its target: every predecessor is linked directly to the target and
//!   the node is removed. A collapse that would turn a two-node cycle into a
//!   self-loop is skipped, so the smallest cycles keep both of their members.
//!
//! The weakly-connected components of what remains are the reported
//! [`CycleGroup`]s. Each member lists only the members of its own group that
//! it depends on in the reduced graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::graph::DependencyGraph;
use crate::{CycleGroup, CycleMember};

/// Working copy of the graph. Edges run from dependency to dependent.
#[derive(Debug, Default)]
struct ReductionGraph {
    outgoing: BTreeMap<usize, BTreeSet<usize>>,
    incoming: BTreeMap<usize, BTreeSet<usize>>,
}

impl ReductionGraph {
    fn from_graph(graph: &DependencyGraph) -> Self {
        let mut reduced = Self::default();
        for position in 0..graph.len() {
            reduced.outgoing.entry(position).or_default();
            reduced.incoming.entry(position).or_default();
        }
        for (dependent, node) in graph.nodes().iter().enumerate() {
            for &dependency in node.dependencies() {
                reduced.add_edge(dependency, dependent);
            }
        }
        reduced
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        self.outgoing.entry(from).or_default().insert(to);
        self.incoming.entry(to).or_default().insert(from);
    }

    fn remove_node(&mut self, node: usize) {
        if let Some(targets) = self.outgoing.remove(&node) {
            for target in targets {
                if let Some(sources) = self.incoming.get_mut(&target) {
                    sources.remove(&node);
                }
            }
        }
        if let Some(sources) = self.incoming.remove(&node) {
            for source in sources {
                if let Some(targets) = self.outgoing.get_mut(&source) {
                    targets.remove(&node);
                }
            }
        }
    }

    fn nodes(&self) -> Vec<usize> {
        self.outgoing.keys().copied().collect()
    }

    fn out_degree(&self, node: usize) -> usize {
        self.outgoing.get(&node).map_or(0, BTreeSet::len)
    }

    fn in_degree(&self, node: usize) -> usize {
        self.incoming.get(&node).map_or(0, BTreeSet::len)
    }

    /// Remove every node with no incoming or no outgoing edges.
    fn reduce_sources_and_sinks(&mut self) -> bool {
        let mut changed = false;
        loop {
            let removable: Vec<usize> = self
                .nodes()
                .into_iter()
                .filter(|&node| self.in_degree(node) == 0 || self.out_degree(node) == 0)
                .collect();
            if removable.is_empty() {
                return changed;
            }
            for node in removable {
                self.remove_node(node);
            }
            changed = true;
        }
    }

    /// Collapse nodes with a single outgoing edge into their target.
    fn reduce_chains(&mut self) -> bool {
        let mut changed = false;
        for node in self.nodes() {
            if self.out_degree(node) != 1 {
                continue;
            }
            let Some(target) = self
                .outgoing
                .get(&node)
                .and_then(|targets| targets.first().copied())
            else {
                continue;
            };
            let predecessors = self.incoming.get(&node).cloned().unwrap_or_default();
            if target == node || predecessors.contains(&target) {
                continue;
            }

            for predecessor in predecessors {
                self.add_edge(predecessor, target);
            }
            self.remove_node(node);
            changed = true;
        }
        changed
    }

    /// Partition the remaining nodes into weakly-connected components,
    /// each sorted ascending, ordered by their smallest node.
    fn weak_components(&self) -> Vec<Vec<usize>> {
        let mut seen = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.nodes() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                let neighbours = self
                    .outgoing
                    .get(&node)
                    .into_iter()
                    .chain(self.incoming.get(&node))
                    .flatten();
                for &next in neighbours {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }
}

/// Reduce a cyclic graph and return its irreducible cycle groups.
///
/// Returns an empty list for an acyclic graph.
pub fn irreducible_groups(graph: &DependencyGraph) -> Vec<CycleGroup> {
    let mut reduced = ReductionGraph::from_graph(graph);

    loop {
        let stripped = reduced.reduce_sources_and_sinks();
        let collapsed = reduced.reduce_chains();
        if !stripped && !collapsed {
            break;
        }
    }

    reduced
        .weak_components()
        .into_iter()
        .map(|component| CycleGroup {
            members: component
                .iter()
                .filter_map(|&node| {
                    let id = graph.node(node)?.id().clone();
                    let depends_on = reduced
                        .incoming
                        .get(&node)
                        .into_iter()
                        .flatten()
                        .filter(|&&dependency| component.binary_search(&dependency).is_ok())
                        .filter_map(|&dependency| graph.node(dependency).map(|n| n.id().clone()))
                        .collect();
                    Some(CycleMember { id, depends_on })
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use nucleus_types::ComponentId;

    use super::*;
    use crate::Declaration;

    fn groups_of(declarations: Vec<Declaration>) -> Vec<CycleGroup> {
        irreducible_groups(&DependencyGraph::build(declarations).unwrap())
    }

    fn ids(names: &[&str]) -> Vec<ComponentId> {
        names.iter().map(|name| ComponentId::new(name)).collect()
    }

    #[test]
    fn acyclic_graph_reduces_to_nothing() {
        let groups = groups_of(vec![
            Declaration::new("A"),
            Declaration::new("B").depends_on("A"),
            Declaration::new("C").depends_on("B").depends_on("A"),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn tails_hanging_off_a_cycle_are_stripped() {
        let groups = groups_of(vec![
            Declaration::new("root"),
            Declaration::new("X").depends_on("Y").depends_on("root"),
            Declaration::new("Y").depends_on("X"),
            Declaration::new("leaf").depends_on("Y"),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ids(), ids(&["X", "Y"]));
        assert_eq!(groups[0].member(&ComponentId::new("X")).unwrap().depends_on, ids(&["Y"]));
        assert_eq!(groups[0].member(&ComponentId::new("Y")).unwrap().depends_on, ids(&["X"]));
    }

    #[test]
    fn long_cycle_collapses_to_two_members() {
        // A -> B -> C -> D -> A expressed as "depends on" declarations.
        let groups = groups_of(vec![
            Declaration::new("A").depends_on("D"),
            Declaration::new("B").depends_on("A"),
            Declaration::new("C").depends_on("B"),
            Declaration::new("D").depends_on("C"),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.members.len(), 2);
        for member in &group.members {
            assert_eq!(member.depends_on.len(), 1);
            assert_ne!(member.depends_on[0], member.id);
        }
    }

    #[test]
    fn disjoint_cycles_form_separate_groups() {
        let groups = groups_of(vec![
            Declaration::new("A").depends_on("B"),
            Declaration::new("B").depends_on("A"),
            Declaration::new("C"),
            Declaration::new("D").depends_on("E").depends_on("C"),
            Declaration::new("E").depends_on("D"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ids(), ids(&["A", "B"]));
        assert_eq!(groups[1].ids(), ids(&["D", "E"]));
    }

    #[test]
    fn cycles_sharing_a_node_stay_in_one_group() {
        let groups = groups_of(vec![
            Declaration::new("hub").depends_on("left").depends_on("right"),
            Declaration::new("left").depends_on("hub"),
            Declaration::new("right").depends_on("hub"),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.ids(), ids(&["hub", "left", "right"]));
        assert_eq!(
            group.member(&ComponentId::new("hub")).unwrap().depends_on,
            ids(&["left", "right"])
        );
    }
}
