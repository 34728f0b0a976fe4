//! The operations every property manager variant supports.

use nucleus_types::EntityId;

use crate::{PropertyDefinition, PropertyError, PropertyValue, ValueType};

/// Dense, per-entity storage of one property.
pub trait PropertyManager {
    /// The value type read and written through this manager.
    type Value;

    /// Return the definition the manager was created from.
    fn definition(&self) -> &PropertyDefinition;

    /// Return the value stored for `id`, or the default if it was never set.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeIndex`] if `id` is negative.
    fn get_value(&self, id: EntityId) -> Result<Self::Value, PropertyError>;

    /// Store `value` for `id`, growing storage as needed.
    ///
    /// When time tracking is on the current simulation time is recorded too.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeIndex`] if `id` is negative, or
    /// [`PropertyError::StorageExhausted`] if storage up to `id` cannot be
    /// allocated; nothing is written in that case.
    fn set_value(&mut self, id: EntityId, value: Self::Value) -> Result<(), PropertyError>;

    /// Return the simulation time at which `id` was last set.
    ///
    /// Ids that were never set report the time the manager was created.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::TimeTrackingOff`] if the definition does not
    /// track time, or [`PropertyError::NegativeIndex`] if `id` is negative.
    fn get_time(&self, id: EntityId) -> Result<f64, PropertyError>;

    /// Note that `id` is no longer in use.
    ///
    /// The stored slot is left untouched. Reads of a removed id return
    /// whatever was last stored there; callers must track entity existence
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeIndex`] if `id` is negative.
    fn remove_id(&mut self, id: EntityId) -> Result<(), PropertyError>;

    /// Raise the capacity by `count` ids.
    ///
    /// Capacity is bookkeeping only; storage is allocated on assignment.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeCapacityIncrement`] if `count` is
    /// negative.
    fn increment_capacity(&mut self, count: i64) -> Result<(), PropertyError>;

    /// Return the number of ids storage has been sized for.
    fn capacity(&self) -> usize;
}

/// Reject a definition whose type is not `expected`.
pub(crate) fn check_type(definition: &PropertyDefinition, expected: ValueType) -> Result<(), PropertyError> {
    if definition.value_type() == expected {
        Ok(())
    } else {
        Err(PropertyError::ImproperType {
            expected,
            actual: definition.value_type(),
        })
    }
}

/// Extract the mandatory default of a numeric definition.
pub(crate) fn required_default<T>(
    definition: &PropertyDefinition,
    extract: impl FnOnce(&PropertyValue) -> Option<T>,
) -> Result<T, PropertyError> {
    definition
        .default_value()
        .and_then(extract)
        .ok_or(PropertyError::MissingDefault {
            value_type: definition.value_type(),
        })
}
