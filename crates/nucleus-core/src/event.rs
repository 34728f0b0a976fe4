//! The kernel's closed event taxonomy.

use nucleus_events::{Event, LabelKey};
use nucleus_properties::PropertyValue;
use nucleus_types::{EntityId, GroupId, PropertyId};
use serde::Serialize;

/// Discriminant of [`SimEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventType {
    /// An entity was created.
    EntityAddition,
    /// An entity was removed.
    EntityRemoval,
    /// A property value was assigned.
    PropertyUpdate,
    /// An entity joined a dynamic group.
    GroupMembershipAddition,
    /// An entity left a dynamic group.
    GroupMembershipRemoval,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::EntityAddition,
        Self::EntityRemoval,
        Self::PropertyUpdate,
        Self::GroupMembershipAddition,
        Self::GroupMembershipRemoval,
    ];
}

/// An event published by the kernel or by component code.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// An entity was created.
    EntityAddition {
        /// The new entity.
        entity: EntityId,
    },
    /// An entity was removed.
    EntityRemoval {
        /// The removed entity.
        entity: EntityId,
    },
    /// A property value was assigned.
    PropertyUpdate {
        /// The entity whose property changed.
        entity: EntityId,
        /// The property that changed.
        property: PropertyId,
        /// The value before the assignment, `None` for an unset object
        /// property without a default.
        previous: Option<PropertyValue>,
        /// The assigned value.
        current: PropertyValue,
    },
    /// An entity joined a dynamic group.
    GroupMembershipAddition {
        /// The group.
        group: GroupId,
        /// The entity that joined.
        entity: EntityId,
    },
    /// An entity left a dynamic group.
    GroupMembershipRemoval {
        /// The group.
        group: GroupId,
        /// The entity that left.
        entity: EntityId,
    },
}

impl SimEvent {
    /// Return the entity the event is about.
    pub const fn entity(&self) -> EntityId {
        match *self {
            Self::EntityAddition { entity }
            | Self::EntityRemoval { entity }
            | Self::PropertyUpdate { entity, .. }
            | Self::GroupMembershipAddition { entity, .. }
            | Self::GroupMembershipRemoval { entity, .. } => entity,
        }
    }

    /// Return the property of a property update.
    pub const fn property(&self) -> Option<&PropertyId> {
        match self {
            Self::PropertyUpdate { property, .. } => Some(property),
            _ => None,
        }
    }

    /// Return the group of a membership event.
    pub const fn group(&self) -> Option<&GroupId> {
        match self {
            Self::GroupMembershipAddition { group, .. } | Self::GroupMembershipRemoval { group, .. } => {
                Some(group)
            }
            _ => None,
        }
    }
}

impl Event for SimEvent {
    type Type = EventType;

    fn event_type(&self) -> EventType {
        match self {
            Self::EntityAddition { .. } => EventType::EntityAddition,
            Self::EntityRemoval { .. } => EventType::EntityRemoval,
            Self::PropertyUpdate { .. } => EventType::PropertyUpdate,
            Self::GroupMembershipAddition { .. } => EventType::GroupMembershipAddition,
            Self::GroupMembershipRemoval { .. } => EventType::GroupMembershipRemoval,
        }
    }

    fn primary_key(&self) -> Option<LabelKey> {
        Some(LabelKey::Entity(self.entity()))
    }
}
