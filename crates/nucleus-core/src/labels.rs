//! Built-in labelers and the labels subscribers use to match them.
//!
//! | Labeler id        | Event types            | Key tuple            |
//! |-------------------|------------------------|----------------------|
//! | `all`             | every type             | none                 |
//! | `entity`          | every type             | entity               |
//! | `property`        | property updates       | property             |
//! | `entity-property` | property updates       | entity, property     |
//! | `group`           | membership events      | group                |
//! | `group-entity`    | membership events      | group, entity        |
//!
//! Components may register further labelers of their own through
//! [`Context::register_labeler`](crate::Context::register_labeler).

use nucleus_events::{EventLabel, EventLabelDispatcher, EventLabeler, LabelKey};
use nucleus_types::{EntityId, GroupId, LabelerId, PropertyId};

use crate::event::{EventType, SimEvent};
use crate::{Context, KernelError};

/// Id of the labeler matching every event of a type.
pub const ALL: &str = "all";
/// Id of the labeler keyed by the event's entity.
pub const ENTITY: &str = "entity";
/// Id of the labeler keyed by the updated property.
pub const PROPERTY: &str = "property";
/// Id of the labeler keyed by entity and updated property.
pub const ENTITY_PROPERTY: &str = "entity-property";
/// Id of the labeler keyed by group.
pub const GROUP: &str = "group";
/// Id of the labeler keyed by group and entity.
pub const GROUP_ENTITY: &str = "group-entity";

const MEMBERSHIP: [EventType; 2] = [EventType::GroupMembershipAddition, EventType::GroupMembershipRemoval];

/// Register every built-in labeler with `dispatcher`.
pub(crate) fn register_builtin(
    dispatcher: &mut EventLabelDispatcher<SimEvent, Context>,
) -> Result<(), KernelError> {
    for event_type in EventType::ALL {
        dispatcher.register_labeler(EventLabeler::constant(LabelerId::new(ALL), event_type))?;
        dispatcher.register_labeler(EventLabeler::by_primary_key(LabelerId::new(ENTITY), event_type))?;
    }

    dispatcher.register_labeler(EventLabeler::new(
        LabelerId::new(PROPERTY),
        EventType::PropertyUpdate,
        |_, event: &SimEvent| derive(event, EventType::PropertyUpdate, PROPERTY, |e| {
            e.property().map(|p| vec![LabelKey::from(p.clone())])
        }),
    ))?;
    dispatcher.register_labeler(EventLabeler::new(
        LabelerId::new(ENTITY_PROPERTY),
        EventType::PropertyUpdate,
        |_, event: &SimEvent| derive(event, EventType::PropertyUpdate, ENTITY_PROPERTY, |e| {
            e.property()
                .map(|p| vec![LabelKey::from(e.entity()), LabelKey::from(p.clone())])
        }),
    ))?;

    for event_type in MEMBERSHIP {
        dispatcher.register_labeler(EventLabeler::new(
            LabelerId::new(GROUP),
            event_type,
            move |_, event: &SimEvent| derive(event, event_type, GROUP, |e| {
                e.group().map(|g| vec![LabelKey::from(g.clone())])
            }),
        ))?;
        dispatcher.register_labeler(EventLabeler::new(
            LabelerId::new(GROUP_ENTITY),
            event_type,
            move |_, event: &SimEvent| derive(event, event_type, GROUP_ENTITY, |e| {
                e.group()
                    .map(|g| vec![LabelKey::from(g.clone()), LabelKey::from(e.entity())])
            }),
        ))?;
    }

    Ok(())
}

/// Build a keyed label, or the keyless one if the event lacks the keys.
fn derive(
    event: &SimEvent,
    event_type: EventType,
    labeler: &str,
    keys: impl FnOnce(&SimEvent) -> Option<Vec<LabelKey>>,
) -> EventLabel<EventType> {
    let id = LabelerId::new(labeler);
    match keys(event) {
        Some(keys) => EventLabel::new(event_type, id, keys),
        None => EventLabel::keyless(event_type, id),
    }
}

// ---------------------------------------------------------------------------
// Subscriber labels
// ---------------------------------------------------------------------------

/// Every event of `event_type`.
pub fn all(event_type: EventType) -> EventLabel<EventType> {
    EventLabel::keyless(event_type, LabelerId::new(ALL))
}

/// Events of `event_type` about `entity`.
pub fn entity(event_type: EventType, entity: EntityId) -> EventLabel<EventType> {
    EventLabel::new(event_type, LabelerId::new(ENTITY), [LabelKey::from(entity)])
}

/// Updates of `property` on any entity.
pub fn property(property: &PropertyId) -> EventLabel<EventType> {
    EventLabel::new(
        EventType::PropertyUpdate,
        LabelerId::new(PROPERTY),
        [LabelKey::from(property.clone())],
    )
}

/// Updates of `property` on `entity`.
pub fn entity_property(entity: EntityId, property: &PropertyId) -> EventLabel<EventType> {
    EventLabel::new(
        EventType::PropertyUpdate,
        LabelerId::new(ENTITY_PROPERTY),
        [LabelKey::from(entity), LabelKey::from(property.clone())],
    )
}

/// Membership events of `event_type` for `group`.
pub fn group(event_type: EventType, group: &GroupId) -> EventLabel<EventType> {
    EventLabel::new(event_type, LabelerId::new(GROUP), [LabelKey::from(group.clone())])
}

/// Membership events of `event_type` for `entity` in `group`.
pub fn group_entity(event_type: EventType, group: &GroupId, entity: EntityId) -> EventLabel<EventType> {
    EventLabel::new(
        event_type,
        LabelerId::new(GROUP_ENTITY),
        [LabelKey::from(group.clone()), LabelKey::from(entity)],
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nucleus_properties::PropertyValue;

    use super::*;
    use crate::config::KernelConfig;

    fn update(entity: i64, property: &str) -> SimEvent {
        SimEvent::PropertyUpdate {
            entity: EntityId::new(entity),
            property: PropertyId::new(property),
            previous: None,
            current: PropertyValue::Integer(1),
        }
    }

    #[test]
    fn property_update_derives_all_four_labels() {
        let context = Context::new(&KernelConfig::default()).unwrap();
        let mut dispatcher = EventLabelDispatcher::new();
        register_builtin(&mut dispatcher).unwrap();

        let labels = dispatcher.labels_for(&context, &update(3, "stock"));
        let stock = PropertyId::new("stock");
        assert_eq!(
            labels,
            vec![
                all(EventType::PropertyUpdate),
                entity(EventType::PropertyUpdate, EntityId::new(3)),
                property(&stock),
                entity_property(EntityId::new(3), &stock),
            ]
        );
    }

    #[test]
    fn membership_events_derive_group_labels() {
        let context = Context::new(&KernelConfig::default()).unwrap();
        let mut dispatcher = EventLabelDispatcher::new();
        register_builtin(&mut dispatcher).unwrap();

        let low = GroupId::new("low");
        let event = SimEvent::GroupMembershipRemoval {
            group: low.clone(),
            entity: EntityId::new(1),
        };
        let labels = dispatcher.labels_for(&context, &event);
        assert!(labels.contains(&group(EventType::GroupMembershipRemoval, &low)));
        assert!(labels.contains(&group_entity(EventType::GroupMembershipRemoval, &low, EntityId::new(1))));
        assert!(!labels.contains(&group(EventType::GroupMembershipAddition, &low)));
    }

    #[test]
    fn builtin_registration_is_not_repeatable() {
        let mut dispatcher = EventLabelDispatcher::new();
        register_builtin(&mut dispatcher).unwrap();
        assert!(matches!(
            register_builtin(&mut dispatcher),
            Err(KernelError::Dispatch { .. })
        ));
    }
}
