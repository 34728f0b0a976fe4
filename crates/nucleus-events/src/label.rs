//! Compound routing keys.

use std::sync::Arc;

use nucleus_types::{ComponentId, EntityId, GroupId, LabelerId, PropertyId};

/// One element of a label's key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelKey {
    /// An entity.
    Entity(EntityId),
    /// A property.
    Property(PropertyId),
    /// A dynamic grouping.
    Group(GroupId),
    /// A component.
    Component(ComponentId),
    /// An integer key, e.g. an enumerated value.
    Integer(i64),
    /// A free-form textual key.
    Text(Arc<str>),
}

impl From<EntityId> for LabelKey {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<PropertyId> for LabelKey {
    fn from(id: PropertyId) -> Self {
        Self::Property(id)
    }
}

impl From<GroupId> for LabelKey {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

impl From<ComponentId> for LabelKey {
    fn from(id: ComponentId) -> Self {
        Self::Component(id)
    }
}

impl From<i64> for LabelKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for LabelKey {
    fn from(value: &str) -> Self {
        Self::Text(Arc::from(value))
    }
}

/// Routing key `(event type, labeler id, key tuple)`.
///
/// Two labels are equal iff all three parts are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventLabel<T> {
    event_type: T,
    labeler_id: LabelerId,
    keys: Vec<LabelKey>,
}

impl<T: Copy> EventLabel<T> {
    /// Build a label from its parts.
    pub fn new(event_type: T, labeler_id: LabelerId, keys: impl IntoIterator<Item = LabelKey>) -> Self {
        Self {
            event_type,
            labeler_id,
            keys: keys.into_iter().collect(),
        }
    }

    /// Build a label with an empty key tuple.
    pub const fn keyless(event_type: T, labeler_id: LabelerId) -> Self {
        Self {
            event_type,
            labeler_id,
            keys: Vec::new(),
        }
    }

    /// Return the event type.
    pub const fn event_type(&self) -> T {
        self.event_type
    }

    /// Return the labeler id.
    pub const fn labeler_id(&self) -> &LabelerId {
        &self.labeler_id
    }

    /// Return the key tuple.
    pub fn keys(&self) -> &[LabelKey] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Update,
        Removal,
    }

    #[test]
    fn labels_differ_by_every_part() {
        let by_pair = LabelerId::new("by-pair");
        let base = EventLabel::new(Kind::Update, by_pair.clone(), [LabelKey::Integer(1)]);

        assert_eq!(base, EventLabel::new(Kind::Update, by_pair.clone(), [LabelKey::Integer(1)]));
        assert_ne!(base, EventLabel::new(Kind::Removal, by_pair.clone(), [LabelKey::Integer(1)]));
        assert_ne!(
            base,
            EventLabel::new(Kind::Update, LabelerId::new("other"), [LabelKey::Integer(1)])
        );
        assert_ne!(base, EventLabel::new(Kind::Update, by_pair, [LabelKey::Integer(2)]));
    }

    #[test]
    fn keyless_label_has_no_keys() {
        let label = EventLabel::keyless(Kind::Removal, LabelerId::new("all"));
        assert!(label.keys().is_empty());
        assert_eq!(label.event_type(), Kind::Removal);
        assert_eq!(label.labeler_id().as_str(), "all");
    }

    #[test]
    fn key_conversions() {
        assert_eq!(LabelKey::from(EntityId::new(3)), LabelKey::Entity(EntityId::new(3)));
        assert_eq!(LabelKey::from("north"), LabelKey::Text(Arc::from("north")));
        assert_eq!(LabelKey::from(7_i64), LabelKey::Integer(7));
    }
}
