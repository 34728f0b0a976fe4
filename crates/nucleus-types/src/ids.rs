//! Type-safe identifier wrappers.
//!
//! Components, properties, groups and labelers are named by short strings
//! chosen by the code that declares them. Names are stored as [`Arc<str>`]
//! so that labels and subscriptions can clone them without allocating.
//!
//! Entities are addressed by a dense integer index. The raw value is signed
//! because indices arrive from outside the kernel (scenario inputs, plugin
//! code) and the property store rejects negative values at its boundary
//! instead of relying on the type system alone.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a shared string name with standard derives.
macro_rules! define_name_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create an identifier from a name.
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(Arc::from(name.as_ref()))
            }

            /// Return the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Arc::from(name))
            }
        }
    };
}

define_name_id! {
    /// Identifier of a component (a unit of initialization logic, usually a plugin).
    ComponentId
}

define_name_id! {
    /// Identifier of a property stored per entity.
    PropertyId
}

define_name_id! {
    /// Identifier of a dynamic grouping (filter or partition) of entities.
    GroupId
}

define_name_id! {
    /// Identifier of one labeling scheme for an event type.
    LabelerId
}

/// Index of an entity in the kernel's dense entity space.
///
/// Entity ids handed out by the kernel are always non-negative. Values built
/// with [`EntityId::new`] from external input may be negative; consumers that
/// index storage with them must validate via [`EntityId::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(i64);

impl EntityId {
    /// Wrap a raw index.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw (possibly negative) value.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Return the index as a `usize`, or `None` if it is negative.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl From<usize> for EntityId {
    fn from(index: usize) -> Self {
        Self(i64::try_from(index).unwrap_or(i64::MAX))
    }
}
