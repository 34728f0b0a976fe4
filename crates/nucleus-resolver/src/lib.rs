//! Component dependency ordering for the Nucleus simulation kernel.
//!
//! Every component (plugin) declares the ids of the components it depends
//! on. Before any simulation activity the kernel passes those declarations
//! through [`resolve`], which either returns an initialization order or a
//! fully diagnosed failure.
//!
//! # Modules
//!
//! - [`graph`] -- The [`DependencyGraph`]: declared nodes, phantom nodes for
//!   undeclared ids, and dependency edges.
//! - [`resolver`] -- Rank computation and the stable ordering.
//! - [`cycles`] -- Source/sink and chain reduction of a cyclic graph into
//!   its irreducible [`CycleGroup`]s.
//!
//! # Failure semantics
//!
//! All three failures are fatal at assembly time. Resolution never returns
//! a partial order, and a failure reports every violation of its kind that
//! can be detected: every missing id with every component that needed it,
//! or every irreducible cycle group.
//!
//! ```
//! use nucleus_resolver::{resolve, Declaration};
//! use nucleus_types::ComponentId;
//!
//! let order = resolve(vec![
//!     Declaration::new("reports").depends_on("people"),
//!     Declaration::new("people"),
//! ]);
//!
//! assert_eq!(
//!     order.ok(),
//!     Some(vec![ComponentId::new("people"), ComponentId::new("reports")])
//! );
//! ```

pub mod cycles;
pub mod graph;
pub mod resolver;

pub use graph::DependencyGraph;
pub use resolver::resolve;

use nucleus_types::ComponentId;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A component id together with the ids it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// The declaring component.
    pub id: ComponentId,
    /// Components that must be initialized first. Repeated ids are ignored.
    pub dependencies: Vec<ComponentId>,
}

impl Declaration {
    /// Declare a component with no dependencies.
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
        }
    }

    /// Add a dependency.
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<ComponentId>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// An undeclared component id and every component that depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// The id that was referenced but never declared.
    pub dependency: ComponentId,
    /// Declared components that listed it, in declaration order.
    pub dependents: Vec<ComponentId>,
}

impl core::fmt::Display for MissingDependency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (needed by ", self.dependency)?;
        write_joined(f, &self.dependents)?;
        f.write_str(")")
    }
}

/// One node of an irreducible cycle group and the group members it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleMember {
    /// The component.
    pub id: ComponentId,
    /// Members of the same group this component depends on after reduction.
    pub depends_on: Vec<ComponentId>,
}

/// A weakly-connected set of components left over after every reducible
/// node has been stripped from a cyclic dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleGroup {
    /// Members in declaration order.
    pub members: Vec<CycleMember>,
}

impl CycleGroup {
    /// Return the ids of all members.
    pub fn ids(&self) -> Vec<ComponentId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    /// Return the member with the given id.
    pub fn member(&self, id: &ComponentId) -> Option<&CycleMember> {
        self.members.iter().find(|m| &m.id == id)
    }
}

impl core::fmt::Display for CycleGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} -> [", member.id)?;
            write_joined(f, &member.depends_on)?;
            f.write_str("]")?;
        }
        f.write_str("}")
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while resolving the component initialization order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Two components were declared with the same id.
    #[error("duplicate component id: {id}")]
    DuplicateComponent {
        /// The repeated id.
        id: ComponentId,
    },

    /// One or more dependencies name components that were never declared.
    #[error("missing dependencies: {}", Joined(.missing))]
    MissingDependency {
        /// Every undeclared id, in order of first reference.
        missing: Vec<MissingDependency>,
    },

    /// The dependency graph contains at least one cycle.
    #[error("circular dependencies: {}", Joined(.groups))]
    CircularDependency {
        /// Every irreducible group of the graph.
        groups: Vec<CycleGroup>,
    },
}

/// Display adapter joining a slice with `", "`.
struct Joined<'a, T>(&'a [T]);

impl<T: core::fmt::Display> core::fmt::Display for Joined<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write_joined(f, self.0)
    }
}

fn write_joined<T: core::fmt::Display>(
    f: &mut core::fmt::Formatter<'_>,
    items: &[T],
) -> core::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
