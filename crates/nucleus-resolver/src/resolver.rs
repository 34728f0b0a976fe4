//! Rank computation and initialization ordering.
//!
//! A node's rank is 0 if it has no dependencies and otherwise one more than
//! the largest rank among its dependencies. Ranks are found by a fixed-point
//! pass over all nodes. An acyclic graph of `n` nodes settles within `n`
//! passes, so if the ranks are still changing after `n + 1` passes the
//! graph must contain a cycle; no separate cycle search is needed to decide
//! that.

use nucleus_types::ComponentId;
use tracing::{debug, info, warn};

use crate::cycles::irreducible_groups;
use crate::graph::DependencyGraph;
use crate::{Declaration, ResolveError};

/// Resolve the initialization order of a set of component declarations.
///
/// On success the ids are returned in non-decreasing rank order, ties kept
/// in declaration order, so identical input always yields an identical
/// order.
///
/// # Errors
///
/// - [`ResolveError::DuplicateComponent`] if two declarations share an id.
/// - [`ResolveError::MissingDependency`] naming every undeclared id and all
///   of its dependents.
/// - [`ResolveError::CircularDependency`] with every irreducible cycle group.
pub fn resolve<I>(declarations: I) -> Result<Vec<ComponentId>, ResolveError>
where
    I: IntoIterator<Item = Declaration>,
{
    let graph = DependencyGraph::build(declarations)?;

    let missing = graph.missing_dependencies();
    if !missing.is_empty() {
        warn!(missing = missing.len(), "Component dependencies reference undeclared ids");
        return Err(ResolveError::MissingDependency { missing });
    }

    let Some(ranks) = compute_ranks(&graph) else {
        let groups = irreducible_groups(&graph);
        warn!(groups = groups.len(), "Component dependencies are circular");
        return Err(ResolveError::CircularDependency { groups });
    };

    let mut order: Vec<usize> = (0..graph.declared().len()).collect();
    // `sort_by_key` is stable: equal ranks keep declaration order.
    order.sort_by_key(|&node| ranks.get(node).copied().unwrap_or_default());

    let ordered: Vec<ComponentId> = order
        .into_iter()
        .filter_map(|node| graph.node(node).map(|n| n.id().clone()))
        .collect();

    for (position, id) in ordered.iter().enumerate() {
        let rank = graph
            .index_of(id)
            .and_then(|node| ranks.get(node).copied())
            .unwrap_or_default();
        debug!(component = %id, position, rank, "Component ordered");
    }
    info!(components = ordered.len(), "Component dependencies resolved");

    Ok(ordered)
}

/// Compute the rank of every node, or `None` if the graph has a cycle.
pub(crate) fn compute_ranks(graph: &DependencyGraph) -> Option<Vec<usize>> {
    let node_count = graph.len();
    let mut ranks = vec![0_usize; node_count];

    for _ in 0..=node_count {
        let mut changed = false;

        for (position, node) in graph.nodes().iter().enumerate() {
            let rank = node
                .dependencies()
                .iter()
                .filter_map(|&dependency| ranks.get(dependency).copied())
                .max()
                .map_or(0, |highest| highest.saturating_add(1));

            if let Some(slot) = ranks.get_mut(position)
                && *slot != rank
            {
                *slot = rank;
                changed = true;
            }
        }

        if !changed {
            return Some(ranks);
        }
    }

    None
}
