//! Indexed, time-tracked property storage for the Nucleus simulation kernel.
//!
//! Every property of an entity space is held by one manager, created from an
//! immutable [`PropertyDefinition`]. Managers store values densely, indexed
//! by [`EntityId`](nucleus_types::EntityId):
//!
//! - [`FloatPropertyManager`], [`IntegerPropertyManager`] and
//!   [`BooleanPropertyManager`] are specialized numeric variants that always
//!   carry a default value.
//! - [`ObjectPropertyManager`] holds arbitrary shared values and may have no
//!   default at all.
//!
//! Ids that were never set read as the definition's default. Backing storage
//! is materialized lazily on `set_value` and never shrinks; capacity set up
//! front or through `increment_capacity` is bookkeeping only, so no amount of
//! it allocates. An index whose storage cannot be allocated fails with
//! [`PropertyError::StorageExhausted`]. When a definition enables time tracking the manager
//! also records the simulation time of every assignment, read from a shared
//! [`SimClock`](nucleus_types::SimClock).
//!
//! [`PropertyStore`] keys managers by [`PropertyId`](nucleus_types::PropertyId)
//! and exposes them through the type-erased [`PropertyValue`].

pub mod boolean;
mod column;
pub mod definition;
pub mod manager;
pub mod numeric;
pub mod object;
pub mod store;

pub use boolean::BooleanPropertyManager;
pub use definition::{
    ObjectValue, PropertyDefinition, PropertyDefinitionBuilder, PropertyValue, TimeTrackingPolicy,
    ValueType,
};
pub use manager::PropertyManager;
pub use numeric::{FloatPropertyManager, IntegerPropertyManager};
pub use object::ObjectPropertyManager;
pub use store::PropertyStore;

use nucleus_types::PropertyId;

/// Errors raised by property definitions, managers and the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// No definition is registered for the requested property.
    #[error("no definition is registered for property {property}")]
    MissingPropertyDefinition {
        /// The unknown property.
        property: PropertyId,
    },

    /// A definition or value does not have the type the manager stores.
    #[error("improper property type: expected {expected}, found {actual}")]
    ImproperType {
        /// The type the manager stores.
        expected: ValueType,
        /// The type that was supplied.
        actual: ValueType,
    },

    /// The manager variant requires a default value and none was defined.
    #[error("a {value_type} property requires a default value")]
    MissingDefault {
        /// The definition's value type.
        value_type: ValueType,
    },

    /// A manager was created with a negative initial capacity.
    #[error("negative initial size: {size}")]
    NegativeInitialSize {
        /// The rejected capacity.
        size: i64,
    },

    /// An entity index was negative.
    #[error("negative index: {index}")]
    NegativeIndex {
        /// The rejected index.
        index: i64,
    },

    /// A capacity increment was negative.
    #[error("negative capacity increment: {increment}")]
    NegativeCapacityIncrement {
        /// The rejected increment.
        increment: i64,
    },

    /// Storage for an entity index could not be allocated.
    #[error("cannot allocate property storage up to index {index}")]
    StorageExhausted {
        /// The index being written.
        index: usize,
    },

    /// Assignment times were requested from a manager that does not record them.
    #[error("time tracking is off for this property")]
    TimeTrackingOff,

    /// A definition's default value does not have the definition's type.
    #[error("default value is not a {expected}")]
    IncompatibleDefault {
        /// The definition's value type.
        expected: ValueType,
    },

    /// A property was defined twice in one store.
    #[error("property {property} is already defined")]
    DuplicatePropertyDefinition {
        /// The repeated property.
        property: PropertyId,
    },
}
