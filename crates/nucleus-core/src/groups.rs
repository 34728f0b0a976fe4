//! Dynamic groups of entities.
//!
//! A group is defined by a membership predicate over entities plus the set
//! of event sensitivities that say when the predicate might have changed
//! its answer. The kernel evaluates the predicate for every live entity when
//! the group is added, for every new entity, and afterwards only for the
//! entities its sensitivities name.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use nucleus_events::FilterSensitivity;
use nucleus_types::{EntityId, GroupId, PropertyId};

use crate::Context;
use crate::event::{EventType, SimEvent};

/// Decides whether an entity belongs to a group.
pub type MembershipPredicate = Rc<dyn Fn(&Context, EntityId) -> bool>;

/// Declaration of a dynamic group, consumed by
/// [`Context::add_group`](crate::Context::add_group).
pub struct Group {
    id: GroupId,
    predicate: MembershipPredicate,
    sensitivities: Vec<FilterSensitivity<SimEvent, Context>>,
}

impl Group {
    /// Declare a group with the given membership predicate and no
    /// sensitivities yet.
    pub fn new(id: impl Into<GroupId>, predicate: impl Fn(&Context, EntityId) -> bool + 'static) -> Self {
        Self {
            id: id.into(),
            predicate: Rc::new(predicate),
            sensitivities: Vec::new(),
        }
    }

    /// Re-evaluate the entity returned by `probe` after events of
    /// `event_type`.
    #[must_use]
    pub fn sensitive_to(
        mut self,
        event_type: EventType,
        probe: impl Fn(&Context, &SimEvent) -> Option<EntityId> + 'static,
    ) -> Self {
        self.sensitivities.push(FilterSensitivity::new(event_type, probe));
        self
    }

    /// Re-evaluate the updated entity whenever `property` changes.
    #[must_use]
    pub fn sensitive_to_property(self, property: PropertyId) -> Self {
        self.sensitive_to(EventType::PropertyUpdate, move |_, event| {
            (event.property() == Some(&property)).then_some(event.entity())
        })
    }

    /// Return the group id.
    pub const fn id(&self) -> &GroupId {
        &self.id
    }

    pub(crate) fn into_parts(
        self,
    ) -> (GroupId, MembershipPredicate, Vec<FilterSensitivity<SimEvent, Context>>) {
        (self.id, self.predicate, self.sensitivities)
    }
}

impl core::fmt::Debug for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.id)
            .field("sensitivities", &self.sensitivities)
            .finish_non_exhaustive()
    }
}

struct GroupState {
    predicate: MembershipPredicate,
    members: BTreeSet<EntityId>,
}

/// Membership of every registered group.
#[derive(Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, GroupState>,
    order: Vec<GroupId>,
}

impl GroupRegistry {
    /// Register an empty group. Returns `false` if the id is taken.
    pub fn insert(&mut self, id: GroupId, predicate: MembershipPredicate) -> bool {
        if self.groups.contains_key(&id) {
            return false;
        }
        self.groups.insert(
            id.clone(),
            GroupState {
                predicate,
                members: BTreeSet::new(),
            },
        );
        self.order.push(id);
        true
    }

    /// Return a handle to a group's predicate.
    pub fn predicate(&self, group: &GroupId) -> Option<MembershipPredicate> {
        self.groups.get(group).map(|state| Rc::clone(&state.predicate))
    }

    /// Return whether `entity` is a member, or `None` for an unknown group.
    pub fn is_member(&self, group: &GroupId, entity: EntityId) -> Option<bool> {
        self.groups.get(group).map(|state| state.members.contains(&entity))
    }

    /// Record membership. Returns `true` if it changed.
    pub fn set_member(&mut self, group: &GroupId, entity: EntityId, member: bool) -> bool {
        self.groups.get_mut(group).is_some_and(|state| {
            if member {
                state.members.insert(entity)
            } else {
                state.members.remove(&entity)
            }
        })
    }

    /// Return the members of a group in id order.
    pub fn members(&self, group: &GroupId) -> Option<Vec<EntityId>> {
        self.groups
            .get(group)
            .map(|state| state.members.iter().copied().collect())
    }

    /// Return every group containing `entity`, in registration order.
    pub fn groups_containing(&self, entity: EntityId) -> Vec<GroupId> {
        self.order
            .iter()
            .filter(|id| self.is_member(id, entity) == Some(true))
            .cloned()
            .collect()
    }

    /// Return group ids in registration order.
    pub fn ids(&self) -> &[GroupId] {
        &self.order
    }
}

impl core::fmt::Debug for GroupRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(
                self.order
                    .iter()
                    .filter_map(|id| self.groups.get(id).map(|state| (id, state.members.len()))),
            )
            .finish()
    }
}
