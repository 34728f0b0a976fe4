//! Float and integer property managers.

use nucleus_types::{EntityId, SimClock};

use crate::column::{AssignmentTimes, DenseColumn, increment, index_of, initial_size};
use crate::manager::{PropertyManager, check_type, required_default};
use crate::{PropertyDefinition, PropertyError, PropertyValue, ValueType};

/// Generates a manager storing a plain `Copy` number per entity.
macro_rules! numeric_manager {
    (
        $(#[$meta:meta])*
        $name:ident, $value:ty, $value_type:expr, $extract:path
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            definition: PropertyDefinition,
            values: DenseColumn<$value>,
            times: AssignmentTimes,
        }

        impl $name {
            /// Create a manager for `definition`.
            ///
            /// # Errors
            ///
            /// Returns [`PropertyError::ImproperType`] if the definition is of
            /// another type, [`PropertyError::MissingDefault`] if it has no
            /// default, or [`PropertyError::NegativeInitialSize`] if
            /// `initial_capacity` is negative.
            pub fn new(
                definition: &PropertyDefinition,
                clock: SimClock,
                initial_capacity: i64,
            ) -> Result<Self, PropertyError> {
                check_type(definition, $value_type)?;
                let default = required_default(definition, $extract)?;
                let capacity = initial_size(initial_capacity)?;
                Ok(Self {
                    definition: definition.clone(),
                    values: DenseColumn::new(default, capacity),
                    times: AssignmentTimes::new(definition.time_tracking(), clock, capacity),
                })
            }
        }

        impl PropertyManager for $name {
            type Value = $value;

            fn definition(&self) -> &PropertyDefinition {
                &self.definition
            }

            fn get_value(&self, id: EntityId) -> Result<$value, PropertyError> {
                Ok(*self.values.get(index_of(id)?))
            }

            fn set_value(&mut self, id: EntityId, value: $value) -> Result<(), PropertyError> {
                let index = index_of(id)?;
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
    };
}

numeric_manager! {
    /// Manager for [`ValueType::Float`] properties.
    FloatPropertyManager, f64, ValueType::Float, PropertyValue::as_float
}

numeric_manager! {
    /// Manager for [`ValueType::Integer`] properties.
    IntegerPropertyManager, i64, ValueType::Integer, PropertyValue::as_integer
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::TimeTrackingPolicy;

    fn float_definition(policy: TimeTrackingPolicy) -> PropertyDefinition {
        PropertyDefinition::builder(ValueType::Float)
            .default_value(423.645)
            .time_tracking(policy)
            .build()
            .unwrap()
    }

    #[test]
    fn tracked_float_reports_assignment_time() {
        let clock = SimClock::new(0.0);
        let mut manager =
            FloatPropertyManager::new(&float_definition(TimeTrackingPolicy::On), clock.clone(), 0).unwrap();

        clock.set(10.0);
        manager.set_value(EntityId::new(5), 423.645).unwrap();

        assert!((manager.get_time(EntityId::new(5)).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((manager.get_value(EntityId::new(7)).unwrap() - 423.645).abs() < f64::EPSILON);
        assert!(manager.get_time(EntityId::new(7)).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn set_then_get_returns_value() {
        let mut manager =
            FloatPropertyManager::new(&float_definition(TimeTrackingPolicy::Off), SimClock::default(), 4).unwrap();
        manager.set_value(EntityId::new(2), -1.25).unwrap();
        manager.set_value(EntityId::new(2), 6.5).unwrap();
        assert!((manager.get_value(EntityId::new(2)).unwrap() - 6.5).abs() < f64::EPSILON);
        assert_eq!(manager.get_time(EntityId::new(2)), Err(PropertyError::TimeTrackingOff));
    }

    #[test]
    fn default_survives_capacity_growth() {
        let definition = PropertyDefinition::builder(ValueType::Integer)
            .default_value(17_i64)
            .build()
            .unwrap();
        let mut manager = IntegerPropertyManager::new(&definition, SimClock::default(), 2).unwrap();

        manager.increment_capacity(100).unwrap();
        assert_eq!(manager.capacity(), 102);
        assert_eq!(manager.get_value(EntityId::new(50)).unwrap(), 17);

        manager.set_value(EntityId::new(200), 3).unwrap();
        assert_eq!(manager.capacity(), 201);
        assert_eq!(manager.get_value(EntityId::new(199)).unwrap(), 17);
        assert_eq!(manager.get_value(EntityId::new(200)).unwrap(), 3);
    }

    #[test]
    fn unbounded_capacity_does_not_allocate() {
        let definition = float_definition(TimeTrackingPolicy::On);
        let mut manager = FloatPropertyManager::new(&definition, SimClock::default(), i64::MAX).unwrap();

        manager.increment_capacity(i64::MAX).unwrap();
        manager.increment_capacity(i64::MAX).unwrap();
        assert!((manager.get_value(EntityId::new(3)).unwrap() - 423.645).abs() < f64::EPSILON);

        let far = EntityId::new(i64::MAX);
        assert!(matches!(
            manager.set_value(far, 1.0),
            Err(PropertyError::StorageExhausted { .. })
        ));
        assert!((manager.get_value(far).unwrap() - 423.645).abs() < f64::EPSILON);
        assert!(manager.get_time(far).unwrap().abs() < f64::EPSILON);

        manager.set_value(EntityId::new(2), 5.5).unwrap();
        assert!((manager.get_value(EntityId::new(2)).unwrap() - 5.5).abs() < f64::EPSILON);
    }

    #[test]
    fn removal_leaves_stored_value() {
        let definition = PropertyDefinition::builder(ValueType::Integer)
            .default_value(0_i64)
            .build()
            .unwrap();
        let mut manager = IntegerPropertyManager::new(&definition, SimClock::default(), 0).unwrap();
        manager.set_value(EntityId::new(1), 9).unwrap();
        manager.remove_id(EntityId::new(1)).unwrap();
        assert_eq!(manager.get_value(EntityId::new(1)).unwrap(), 9);
    }

    #[test]
    fn construction_is_validated() {
        let no_default = PropertyDefinition::builder(ValueType::Float).build().unwrap();
        assert_eq!(
            FloatPropertyManager::new(&no_default, SimClock::default(), 0).unwrap_err(),
            PropertyError::MissingDefault { value_type: ValueType::Float }
        );

        let integer = PropertyDefinition::builder(ValueType::Integer)
            .default_value(1_i64)
            .build()
            .unwrap();
        assert_eq!(
            FloatPropertyManager::new(&integer, SimClock::default(), 0).unwrap_err(),
            PropertyError::ImproperType {
                expected: ValueType::Float,
                actual: ValueType::Integer,
            }
        );

        assert_eq!(
            IntegerPropertyManager::new(&integer, SimClock::default(), -4).unwrap_err(),
            PropertyError::NegativeInitialSize { size: -4 }
        );
    }

    #[test]
    fn negative_arguments_are_rejected() {
        let definition = float_definition(TimeTrackingPolicy::On);
        let mut manager = FloatPropertyManager::new(&definition, SimClock::default(), 0).unwrap();
        let negative = EntityId::new(-1);

        let expected = PropertyError::NegativeIndex { index: -1 };
        assert_eq!(manager.get_value(negative).unwrap_err(), expected);
        assert_eq!(manager.set_value(negative, 1.0).unwrap_err(), expected);
        assert_eq!(manager.get_time(negative).unwrap_err(), expected);
        assert_eq!(manager.remove_id(negative).unwrap_err(), expected);
        assert_eq!(
            manager.increment_capacity(-5).unwrap_err(),
            PropertyError::NegativeCapacityIncrement { increment: -5 }
        );
    }
}
