//! Property definitions and type-erased property values.

use std::any::{Any, TypeId};
use std::rc::Rc;

use crate::PropertyError;

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// The closed set of storable value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64-bit floating point.
    Float,
    /// 64-bit signed integer.
    Integer,
    /// Boolean flag.
    Boolean,
    /// Any other `'static` Rust type, stored behind a shared pointer.
    Object {
        /// Runtime identity of the stored type.
        type_id: TypeId,
        /// Name of the stored type, for diagnostics.
        type_name: &'static str,
    },
}

impl ValueType {
    /// The object value type for `T`.
    pub fn object<T: Any>() -> Self {
        Self::Object {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl core::fmt::Display for ValueType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Float => f.write_str("float"),
            Self::Integer => f.write_str("integer"),
            Self::Boolean => f.write_str("boolean"),
            Self::Object { type_name, .. } => f.write_str(type_name),
        }
    }
}

/// A shared value of an arbitrary `'static` type.
#[derive(Clone)]
pub struct ObjectValue {
    value: Rc<dyn Any>,
    value_type: ValueType,
}

impl ObjectValue {
    /// Wrap `value`.
    pub fn new<T: Any>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Wrap an already shared value without copying it.
    pub fn from_rc<T: Any>(value: Rc<T>) -> Self {
        Self {
            value,
            value_type: ValueType::object::<T>(),
        }
    }

    /// Return the stored value's type.
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Borrow the value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Return a shared handle to the value as `T`, if it is one.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.value).downcast::<T>().ok()
    }

    /// Return `true` if both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
    }
}

impl core::fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ObjectValue<{}>", self.value_type)
    }
}

/// A property value of any storable type.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A float value.
    Float(f64),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
    /// An object value.
    Object(ObjectValue),
}

impl PropertyValue {
    /// Return the value's type.
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Float(_) => ValueType::Float,
            Self::Integer(_) => ValueType::Integer,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Object(object) => object.value_type(),
        }
    }

    /// Return the float, if this is one.
    pub const fn as_float(&self) -> Option<f64> {
        match *self {
            Self::Float(value) => Some(value),
            _ => None,
        }
    }

    /// Return the integer, if this is one.
    pub const fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Return the flag, if this is one.
    pub const fn as_boolean(&self) -> Option<bool> {
        match *self {
            Self::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Return the object, if this is one.
    pub const fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// Floats compare by total order (so `NaN == NaN`); objects by identity.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<ObjectValue> for PropertyValue {
    fn from(value: ObjectValue) -> Self {
        Self::Object(value)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Whether a manager records the simulation time of each assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeTrackingPolicy {
    /// Record assignment times.
    On,
    /// Store values only.
    #[default]
    Off,
}

impl TimeTrackingPolicy {
    /// Return `true` for [`TimeTrackingPolicy::On`].
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Immutable description of one property: type, default and time tracking.
///
/// Built with [`PropertyDefinition::builder`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    value_type: ValueType,
    default_value: Option<PropertyValue>,
    time_tracking: TimeTrackingPolicy,
}

impl PropertyDefinition {
    /// Start a definition for values of `value_type`.
    pub const fn builder(value_type: ValueType) -> PropertyDefinitionBuilder {
        PropertyDefinitionBuilder::new(value_type)
    }

    /// Return the value type.
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Return the default value, if one was defined.
    pub const fn default_value(&self) -> Option<&PropertyValue> {
        self.default_value.as_ref()
    }

    /// Return the time tracking policy.
    pub const fn time_tracking(&self) -> TimeTrackingPolicy {
        self.time_tracking
    }
}

/// Staged builder for [`PropertyDefinition`].
///
/// # Examples
///
/// ```
/// use nucleus_properties::{PropertyDefinition, TimeTrackingPolicy, ValueType};
///
/// let definition = PropertyDefinition::builder(ValueType::Float)
///     .default_value(423.645)
///     .time_tracking(TimeTrackingPolicy::On)
///     .build();
///
/// assert!(definition.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PropertyDefinitionBuilder {
    value_type: ValueType,
    default_value: Option<PropertyValue>,
    time_tracking: TimeTrackingPolicy,
}

impl PropertyDefinitionBuilder {
    /// Start a definition for values of `value_type`, with no default and
    /// time tracking off.
    pub const fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            default_value: None,
            time_tracking: TimeTrackingPolicy::Off,
        }
    }

    /// Set the value returned for ids that were never assigned.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the time tracking policy.
    #[must_use]
    pub const fn time_tracking(mut self, policy: TimeTrackingPolicy) -> Self {
        self.time_tracking = policy;
        self
    }

    /// Validate and produce the definition.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::IncompatibleDefault`] if the default value is
    /// not of the definition's type.
    pub fn build(self) -> Result<PropertyDefinition, PropertyError> {
        if let Some(default) = &self.default_value
            && default.value_type() != self.value_type
        {
            return Err(PropertyError::IncompatibleDefault {
                expected: self.value_type,
            });
        }

        Ok(PropertyDefinition {
            value_type: self.value_type,
            default_value: self.default_value,
            time_tracking: self.time_tracking,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Region(&'static str);

    #[test]
    fn builder_defaults() {
        let definition = PropertyDefinition::builder(ValueType::Integer).build().unwrap();
        assert_eq!(definition.value_type(), ValueType::Integer);
        assert!(definition.default_value().is_none());
        assert_eq!(definition.time_tracking(), TimeTrackingPolicy::Off);
    }

    #[test]
    fn default_must_match_type() {
        let err = PropertyDefinition::builder(ValueType::Float)
            .default_value(3_i64)
            .build()
            .unwrap_err();
        assert_eq!(err, PropertyError::IncompatibleDefault { expected: ValueType::Float });

        let err = PropertyDefinition::builder(ValueType::object::<Region>())
            .default_value(ObjectValue::new(7_u8))
            .build()
            .unwrap_err();
        assert!(matches!(err, PropertyError::IncompatibleDefault { .. }));
    }

    #[test]
    fn object_values_downcast() {
        let value = ObjectValue::new(Region("north"));
        assert_eq!(value.value_type(), ValueType::object::<Region>());
        assert_eq!(value.downcast_ref::<Region>(), Some(&Region("north")));
        assert!(value.downcast_ref::<u8>().is_none());
        assert_eq!(value.downcast::<Region>().unwrap().0, "north");
    }

    #[test]
    fn value_equality() {
        assert_eq!(PropertyValue::from(f64::NAN), PropertyValue::from(f64::NAN));
        assert_ne!(PropertyValue::from(1_i64), PropertyValue::from(1.0));

        let shared = ObjectValue::new(Region("south"));
        assert_eq!(PropertyValue::from(shared.clone()), PropertyValue::from(shared));
        assert_ne!(
            PropertyValue::from(ObjectValue::new(Region("south"))),
            PropertyValue::from(ObjectValue::new(Region("south")))
        );
    }

    #[test]
    fn value_type_display() {
        assert_eq!(ValueType::Float.to_string(), "float");
        assert!(ValueType::object::<Region>().to_string().ends_with("Region"));
    }
}
