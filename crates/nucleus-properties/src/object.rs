//! Manager for properties of arbitrary Rust types.

use std::any::Any;
use std::rc::Rc;

use nucleus_types::{EntityId, SimClock};

use crate::column::{AssignmentTimes, DenseColumn, increment, index_of, initial_size};
use crate::manager::PropertyManager;
use crate::{ObjectValue, PropertyDefinition, PropertyError, ValueType};

/// Manager for [`ValueType::Object`] properties.
///
/// Unlike the numeric variants an object property may be defined without a
/// default; ids that were never set then read as `None`. Writing `None`
/// clears a slot back to that state.
#[derive(Debug, Clone)]
pub struct ObjectPropertyManager {
    definition: PropertyDefinition,
    values: DenseColumn<Option<ObjectValue>>,
    times: AssignmentTimes,
}

impl ObjectPropertyManager {
    /// Create a manager for `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if the definition is not an
    /// object type, or [`PropertyError::NegativeInitialSize`] if
    /// `initial_capacity` is negative.
    pub fn new(
        definition: &PropertyDefinition,
        clock: SimClock,
        initial_capacity: i64,
    ) -> Result<Self, PropertyError> {
        let ValueType::Object { .. } = definition.value_type() else {
            return Err(PropertyError::ImproperType {
                expected: ValueType::object::<ObjectValue>(),
                actual: definition.value_type(),
            });
        };
        let capacity = initial_size(initial_capacity)?;
        let default = definition
            .default_value()
            .and_then(|value| value.as_object().cloned());
        Ok(Self {
            definition: definition.clone(),
            values: DenseColumn::new(default, capacity),
            times: AssignmentTimes::new(definition.time_tracking(), clock, capacity),
        })
    }

    /// Read the value for `id` as a shared `T`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeIndex`] if `id` is negative, or
    /// [`PropertyError::ImproperType`] if `T` is not the stored type.
    pub fn get_as<T: Any>(&self, id: EntityId) -> Result<Option<Rc<T>>, PropertyError> {
        self.check_requested::<T>()?;
        Ok(self.get_value(id)?.and_then(|value| value.downcast::<T>()))
    }

    /// Store `value` for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeIndex`] if `id` is negative, or
    /// [`PropertyError::ImproperType`] if `T` is not the stored type.
    pub fn set_as<T: Any>(&mut self, id: EntityId, value: T) -> Result<(), PropertyError> {
        self.set_value(id, Some(ObjectValue::new(value)))
    }

    fn check_requested<T: Any>(&self) -> Result<(), PropertyError> {
        let requested = ValueType::object::<T>();
        if requested == self.definition.value_type() {
            Ok(())
        } else {
            Err(PropertyError::ImproperType {
                expected: self.definition.value_type(),
                actual: requested,
            })
        }
    }
}

impl PropertyManager for ObjectPropertyManager {
    type Value = Option<ObjectValue>;

    fn definition(&self) -> &PropertyDefinition {
        &self.definition
    }

    fn get_value(&self, id: EntityId) -> Result<Option<ObjectValue>, PropertyError> {
        Ok(self.values.get(index_of(id)?).clone())
    }

    /// # Errors
    ///
    /// Also returns [`PropertyError::ImproperType`] if `value` is not of the
    /// definition's type.
    fn set_value(&mut self, id: EntityId, value: Option<ObjectValue>) -> Result<(), PropertyError> {
        let index = index_of(id)?;
        if let Some(object) = &value
            && object.value_type() != self.definition.value_type()
        {
            return Err(PropertyError::ImproperType {
                expected: self.definition.value_type(),
                actual: object.value_type(),
            });
        }
        self.values.reserve_through(index)?;
        self.times.reserve_through(index)?;
        self.values.set(index, value)?;
        self.times.record(index)
    }

    fn get_time(&self, id: EntityId) -> Result<f64, PropertyError> {
        if !self.definition.time_tracking().is_on() {
            return Err(PropertyError::TimeTrackingOff);
        }
        self.times.get(index_of(id)?)
    }

    fn remove_id(&mut self, id: EntityId) -> Result<(), PropertyError> {
        index_of(id).map(|_index| ())
    }

    fn increment_capacity(&mut self, count: i64) -> Result<(), PropertyError> {
        let additional = increment(count)?;
        self.values.grow(additional);
        self.times.grow(additional);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.values.capacity()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TimeTrackingPolicy;

    #[derive(Debug, PartialEq)]
    enum Region {
        North,
        South,
    }

    fn regions(default: Option<Region>) -> ObjectPropertyManager {
        let mut builder = PropertyDefinition::builder(ValueType::object::<Region>())
            .time_tracking(TimeTrackingPolicy::On);
        if let Some(region) = default {
            builder = builder.default_value(ObjectValue::new(region));
        }
        ObjectPropertyManager::new(&builder.build().unwrap(), SimClock::new(1.0), 0).unwrap()
    }

    #[test]
    fn unbounded_capacity_does_not_allocate() {
        let mut manager = regions(Some(Region::South));
        manager.increment_capacity(i64::MAX).unwrap();

        let far = EntityId::new(i64::MAX);
        assert!(matches!(
            manager.set_value(far, None),
            Err(PropertyError::StorageExhausted { .. })
        ));
        let value = manager.get_as::<Region>(far).unwrap().unwrap();
        assert_eq!(*value, Region::South);
    }

    #[test]
    fn unset_without_default_reads_none() {
        let manager = regions(None);
        assert!(manager.get_value(EntityId::new(3)).unwrap().is_none());
        assert!(manager.get_as::<Region>(EntityId::new(3)).unwrap().is_none());
    }

    #[test]
    fn unset_with_default_reads_shared_default() {
        let manager = regions(Some(Region::North));
        let first = manager.get_value(EntityId::new(0)).unwrap().unwrap();
        let second = manager.get_value(EntityId::new(8)).unwrap().unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(*manager.get_as::<Region>(EntityId::new(0)).unwrap().unwrap(), Region::North);
    }

    #[test]
    fn typed_round_trip() {
        let clock = SimClock::new(0.0);
        let definition = PropertyDefinition::builder(ValueType::object::<Region>())
            .time_tracking(TimeTrackingPolicy::On)
            .build()
            .unwrap();
        let mut manager = ObjectPropertyManager::new(&definition, clock.clone(), 0).unwrap();

        clock.set(2.5);
        manager.set_as(EntityId::new(4), Region::South).unwrap();
        assert_eq!(*manager.get_as::<Region>(EntityId::new(4)).unwrap().unwrap(), Region::South);
        assert!((manager.get_time(EntityId::new(4)).unwrap() - 2.5).abs() < f64::EPSILON);

        manager.set_value(EntityId::new(4), None).unwrap();
        assert!(manager.get_value(EntityId::new(4)).unwrap().is_none());
    }

    #[test]
    fn wrong_types_are_rejected() {
        let mut manager = regions(None);
        assert!(matches!(
            manager.set_as(EntityId::new(0), 5_u32),
            Err(PropertyError::ImproperType { .. })
        ));
        assert!(matches!(
            manager.get_as::<u32>(EntityId::new(0)),
            Err(PropertyError::ImproperType { .. })
        ));

        let float = PropertyDefinition::builder(ValueType::Float)
            .default_value(1.0)
            .build()
            .unwrap();
        assert!(matches!(
            ObjectPropertyManager::new(&float, SimClock::default(), 0),
            Err(PropertyError::ImproperType { .. })
        ));
    }
}
