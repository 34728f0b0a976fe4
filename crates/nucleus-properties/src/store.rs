//! Registry of property managers keyed by property id.
//!
//! The store picks the manager variant from the definition's
//! [`ValueType`] when a property is defined and exposes every variant
//! through [`PropertyValue`]. All managers share the store's clock, so
//! assignment times reflect the kernel's simulation time.

use std::collections::HashMap;

use nucleus_types::{EntityId, PropertyId, SimClock};
use tracing::debug;

use crate::column::initial_size;
use crate::{
    BooleanPropertyManager, FloatPropertyManager, IntegerPropertyManager, ObjectPropertyManager,
    PropertyDefinition, PropertyError, PropertyManager, PropertyValue, ValueType,
};

/// One manager of any variant.
#[derive(Debug, Clone)]
enum Manager {
    Float(FloatPropertyManager),
    Integer(IntegerPropertyManager),
    Boolean(BooleanPropertyManager),
    Object(ObjectPropertyManager),
}

impl Manager {
    fn create(definition: &PropertyDefinition, clock: SimClock, capacity: i64) -> Result<Self, PropertyError> {
        Ok(match definition.value_type() {
            ValueType::Float => Self::Float(FloatPropertyManager::new(definition, clock, capacity)?),
            ValueType::Integer => Self::Integer(IntegerPropertyManager::new(definition, clock, capacity)?),
            ValueType::Boolean => Self::Boolean(BooleanPropertyManager::new(definition, clock, capacity)?),
            ValueType::Object { .. } => Self::Object(ObjectPropertyManager::new(definition, clock, capacity)?),
        })
    }

    fn definition(&self) -> &PropertyDefinition {
        match self {
            Self::Float(m) => m.definition(),
            Self::Integer(m) => m.definition(),
            Self::Boolean(m) => m.definition(),
            Self::Object(m) => m.definition(),
        }
    }

    fn get_value(&self, id: EntityId) -> Result<Option<PropertyValue>, PropertyError> {
        Ok(match self {
            Self::Float(m) => Some(PropertyValue::Float(m.get_value(id)?)),
            Self::Integer(m) => Some(PropertyValue::Integer(m.get_value(id)?)),
            Self::Boolean(m) => Some(PropertyValue::Boolean(m.get_value(id)?)),
            Self::Object(m) => m.get_value(id)?.map(PropertyValue::Object),
        })
    }

    fn set_value(&mut self, id: EntityId, value: PropertyValue) -> Result<(), PropertyError> {
        match (self, value) {
            (Self::Float(m), PropertyValue::Float(v)) => m.set_value(id, v),
            (Self::Integer(m), PropertyValue::Integer(v)) => m.set_value(id, v),
            (Self::Boolean(m), PropertyValue::Boolean(v)) => m.set_value(id, v),
            (Self::Object(m), PropertyValue::Object(v)) => m.set_value(id, Some(v)),
            (manager, value) => Err(PropertyError::ImproperType {
                expected: manager.definition().value_type(),
                actual: value.value_type(),
            }),
        }
    }

    fn get_time(&self, id: EntityId) -> Result<f64, PropertyError> {
        match self {
            Self::Float(m) => m.get_time(id),
            Self::Integer(m) => m.get_time(id),
            Self::Boolean(m) => m.get_time(id),
            Self::Object(m) => m.get_time(id),
        }
    }

    fn remove_id(&mut self, id: EntityId) -> Result<(), PropertyError> {
        match self {
            Self::Float(m) => m.remove_id(id),
            Self::Integer(m) => m.remove_id(id),
            Self::Boolean(m) => m.remove_id(id),
            Self::Object(m) => m.remove_id(id),
        }
    }

    fn increment_capacity(&mut self, count: i64) -> Result<(), PropertyError> {
        match self {
            Self::Float(m) => m.increment_capacity(count),
            Self::Integer(m) => m.increment_capacity(count),
            Self::Boolean(m) => m.increment_capacity(count),
            Self::Object(m) => m.increment_capacity(count),
        }
    }
}

/// Property managers of one entity space.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    clock: SimClock,
    initial_capacity: i64,
    managers: HashMap<PropertyId, Manager>,
    order: Vec<PropertyId>,
}

impl PropertyStore {
    /// Create an empty store whose managers start with `initial_capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NegativeInitialSize`] if `initial_capacity`
    /// is negative.
    pub fn new(clock: SimClock, initial_capacity: i64) -> Result<Self, PropertyError> {
        initial_size(initial_capacity)?;
        Ok(Self {
            clock,
            initial_capacity,
            managers: HashMap::new(),
            order: Vec::new(),
        })
    }

    /// Create the manager for `property`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::DuplicatePropertyDefinition`] if the property
    /// is already defined, or any error the manager variant raises for the
    /// definition.
    pub fn define(&mut self, property: PropertyId, definition: &PropertyDefinition) -> Result<(), PropertyError> {
        if self.managers.contains_key(&property) {
            return Err(PropertyError::DuplicatePropertyDefinition { property });
        }

        let manager = Manager::create(definition, self.clock.clone(), self.initial_capacity)?;
        debug!(
            property = %property,
            value_type = %definition.value_type(),
            time_tracking = ?definition.time_tracking(),
            "Defined property"
        );
        self.managers.insert(property.clone(), manager);
        self.order.push(property);
        Ok(())
    }

    /// Return `true` if `property` is defined.
    pub fn is_defined(&self, property: &PropertyId) -> bool {
        self.managers.contains_key(property)
    }

    /// Iterate defined properties in definition order.
    pub fn property_ids(&self) -> impl Iterator<Item = &PropertyId> {
        self.order.iter()
    }

    /// Return the definition of `property`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::MissingPropertyDefinition`] if `property` is
    /// not defined.
    pub fn definition(&self, property: &PropertyId) -> Result<&PropertyDefinition, PropertyError> {
        self.manager(property).map(Manager::definition)
    }

    /// Return the value of `property` for `entity`.
    ///
    /// `None` only occurs for object properties without a default.
    pub fn get_value(
        &self,
        property: &PropertyId,
        entity: EntityId,
    ) -> Result<Option<PropertyValue>, PropertyError> {
        self.manager(property)?.get_value(entity)
    }

    /// Store `value` and return the value it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if `value` is not of the
    /// property's type, in addition to the lookup and index errors.
    pub fn set_value(
        &mut self,
        property: &PropertyId,
        entity: EntityId,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, PropertyError> {
        let manager = self.manager_mut(property)?;
        let previous = manager.get_value(entity)?;
        manager.set_value(entity, value)?;
        Ok(previous)
    }

    /// Return the time `property` was last set for `entity`.
    pub fn get_time(&self, property: &PropertyId, entity: EntityId) -> Result<f64, PropertyError> {
        self.manager(property)?.get_time(entity)
    }

    /// Return a float property's value.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if the property is not a float.
    pub fn get_float(&self, property: &PropertyId, entity: EntityId) -> Result<f64, PropertyError> {
        match self.manager(property)? {
            Manager::Float(m) => m.get_value(entity),
            other => Err(mismatch(ValueType::Float, other)),
        }
    }

    /// Return an integer property's value.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if the property is not an integer.
    pub fn get_integer(&self, property: &PropertyId, entity: EntityId) -> Result<i64, PropertyError> {
        match self.manager(property)? {
            Manager::Integer(m) => m.get_value(entity),
            other => Err(mismatch(ValueType::Integer, other)),
        }
    }

    /// Return a boolean property's value.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if the property is not a boolean.
    pub fn get_boolean(&self, property: &PropertyId, entity: EntityId) -> Result<bool, PropertyError> {
        match self.manager(property)? {
            Manager::Boolean(m) => m.get_value(entity),
            other => Err(mismatch(ValueType::Boolean, other)),
        }
    }

    /// Signal to every manager that `entity` is no longer in use.
    pub fn remove_id(&mut self, entity: EntityId) -> Result<(), PropertyError> {
        self.managers
            .values_mut()
            .try_for_each(|manager| manager.remove_id(entity))
    }

    /// Pre-grow every manager by `count` ids.
    pub fn increment_capacity(&mut self, count: i64) -> Result<(), PropertyError> {
        self.managers
            .values_mut()
            .try_for_each(|manager| manager.increment_capacity(count))
    }

    fn manager(&self, property: &PropertyId) -> Result<&Manager, PropertyError> {
        self.managers
            .get(property)
            .ok_or_else(|| PropertyError::MissingPropertyDefinition {
                property: property.clone(),
            })
    }

    fn manager_mut(&mut self, property: &PropertyId) -> Result<&mut Manager, PropertyError> {
        self.managers
            .get_mut(property)
            .ok_or_else(|| PropertyError::MissingPropertyDefinition {
                property: property.clone(),
            })
    }
}

fn mismatch(expected: ValueType, manager: &Manager) -> PropertyError {
    PropertyError::ImproperType {
        expected,
        actual: manager.definition().value_type(),
    }
}
