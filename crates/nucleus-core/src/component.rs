//! Components: units of initialization logic with declared dependencies.

use nucleus_resolver::Declaration;
use nucleus_types::ComponentId;

use crate::{Context, KernelError};

/// Initialization logic of a component, run exactly once.
pub type Initializer = Box<dyn FnOnce(&mut Context) -> Result<(), KernelError>>;

/// A unit of initialization logic, usually one plugin.
///
/// Components are initialized in dependency order: every component listed
/// with [`Component::depends_on`] has finished its initializer before this
/// one starts.
pub struct Component {
    id: ComponentId,
    dependencies: Vec<ComponentId>,
    initializer: Initializer,
}

impl Component {
    /// Create a component with no dependencies.
    pub fn new(
        id: impl Into<ComponentId>,
        initializer: impl FnOnce(&mut Context) -> Result<(), KernelError> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            initializer: Box::new(initializer),
        }
    }

    /// Require `dependency` to be initialized first.
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<ComponentId>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Return the component id.
    pub const fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Return the declared dependencies.
    pub fn dependencies(&self) -> &[ComponentId] {
        &self.dependencies
    }

    /// Return the declaration the resolver orders.
    pub fn declaration(&self) -> Declaration {
        Declaration {
            id: self.id.clone(),
            dependencies: self.dependencies.clone(),
        }
    }

    /// Consume the component and return its initializer.
    pub fn into_initializer(self) -> Initializer {
        self.initializer
    }
}

impl core::fmt::Debug for Component {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_mirrors_component() {
        let component = Component::new("inventory", |_| Ok(()))
            .depends_on("registry")
            .depends_on("clock");
        let declaration = component.declaration();

        assert_eq!(declaration.id, ComponentId::new("inventory"));
        assert_eq!(
            declaration.dependencies,
            vec![ComponentId::new("registry"), ComponentId::new("clock")]
        );
        assert_eq!(component.dependencies().len(), 2);
    }
}
