//! Which published events could change a dynamic grouping's membership.
//!
//! A grouping declares one [`FilterSensitivity`] per event type it cares
//! about, once, when it is registered. After an event is published the index
//! looks up the sensitivities for that event's type only, asks each probe
//! which entity (if any) the event concerns, and hands back one
//! [`Reevaluation`] per affected grouping/entity pair. The grouping then
//! re-checks membership for that one entity rather than rescanning.

use std::collections::{HashMap, HashSet};

use nucleus_types::{EntityId, GroupId};
use tracing::{debug, trace};

use crate::{DispatchError, Event};

/// Signature of a sensitivity probe.
pub type Probe<E, C> = dyn Fn(&C, &E) -> Option<EntityId>;

/// Relevance of one event type to a grouping.
pub struct FilterSensitivity<E: Event, C> {
    event_type: E::Type,
    probe: Box<Probe<E, C>>,
}

impl<E: Event, C> FilterSensitivity<E, C> {
    /// Declare that events of `event_type` may affect the grouping.
    ///
    /// The probe returns the entity whose membership must be re-evaluated,
    /// or `None` when this particular event is irrelevant.
    pub fn new(event_type: E::Type, probe: impl Fn(&C, &E) -> Option<EntityId> + 'static) -> Self {
        Self {
            event_type,
            probe: Box::new(probe),
        }
    }

    /// Return the declared event type.
    pub const fn event_type(&self) -> E::Type {
        self.event_type
    }

    /// Run the probe.
    pub fn probe(&self, context: &C, event: &E) -> Option<EntityId> {
        (self.probe)(context, event)
    }
}

impl<E: Event, C> core::fmt::Debug for FilterSensitivity<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FilterSensitivity")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// A request to re-check one entity's membership in one grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reevaluation {
    /// The grouping to update.
    pub group: GroupId,
    /// The entity whose membership may have changed.
    pub entity: EntityId,
}

/// Sensitivities of every registered grouping, keyed by event type.
pub struct SensitivityIndex<E: Event, C> {
    by_type: HashMap<E::Type, Vec<(GroupId, FilterSensitivity<E, C>)>>,
    groups: HashSet<GroupId>,
}

impl<E: Event, C> Default for SensitivityIndex<E, C> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            groups: HashSet::new(),
        }
    }
}

impl<E: Event, C> SensitivityIndex<E, C> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the fixed sensitivities of a grouping.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateGrouping`] if the grouping was
    /// already registered. Sensitivities cannot be extended afterwards.
    pub fn register(
        &mut self,
        group: GroupId,
        sensitivities: Vec<FilterSensitivity<E, C>>,
    ) -> Result<(), DispatchError> {
        if !self.groups.insert(group.clone()) {
            return Err(DispatchError::DuplicateGrouping { group });
        }

        debug!(group = %group, sensitivities = sensitivities.len(), "Registered grouping sensitivities");
        for sensitivity in sensitivities {
            self.by_type
                .entry(sensitivity.event_type())
                .or_default()
                .push((group.clone(), sensitivity));
        }
        Ok(())
    }

    /// Return `true` if any grouping declared `event_type`.
    pub fn is_sensitive(&self, event_type: E::Type) -> bool {
        self.by_type.get(&event_type).is_some_and(|entries| !entries.is_empty())
    }

    /// Return `true` if `group` is registered.
    pub fn contains(&self, group: &GroupId) -> bool {
        self.groups.contains(group)
    }

    /// Probe every sensitivity declared for the event's type.
    ///
    /// Results follow grouping registration order. A grouping that declared
    /// several sensitivities for one type yields each entity at most once.
    pub fn reevaluations(&self, context: &C, event: &E) -> Vec<Reevaluation> {
        let event_type = event.event_type();
        let Some(entries) = self.by_type.get(&event_type) else {
            return Vec::new();
        };

        let mut requests: Vec<Reevaluation> = Vec::new();
        for (group, sensitivity) in entries {
            if let Some(entity) = sensitivity.probe(context, event) {
                let request = Reevaluation {
                    group: group.clone(),
                    entity,
                };
                if !requests.contains(&request) {
                    requests.push(request);
                }
            }
        }
        trace!(?event_type, requests = requests.len(), "Probed sensitivities");
        requests
    }
}

impl<E: Event, C> core::fmt::Debug for SensitivityIndex<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensitivityIndex")
            .field("groups", &self.groups.len())
            .field("event_types", &self.by_type.len())
            .finish()
    }
}
