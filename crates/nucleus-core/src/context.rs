//! The registration and run-time context handed to component code.
//!
//! One [`Context`] owns everything a kernel instance holds: the clock, the
//! event dispatcher and sensitivity index, dynamic groups, the property
//! store, the entity allocator and the plan queue. Component initializers,
//! event handlers and plans all receive `&mut Context`, which is the only
//! way external code reaches the kernel's subsystems.
//!
//! # Publishing
//!
//! [`Context::publish`] is synchronous and depth-first. For each event:
//!
//! 1. Groups sensitive to the event's type re-evaluate the entities their
//!    probes name; membership changes are published as nested events.
//! 2. Handlers under every label derived for the event run in labeler,
//!    then subscription, order. A handler may publish further events,
//!    which complete before the next handler runs.
//!
//! A handler that returns an error stops delivery of the current event and
//! the error surfaces from the `publish` call that invoked it.

use std::rc::Rc;

use nucleus_events::{
    Event, EventLabel, EventLabelDispatcher, EventLabeler, Handler, Reevaluation, SensitivityIndex,
};
use nucleus_properties::{PropertyDefinition, PropertyStore, PropertyValue};
use nucleus_types::{ComponentId, EntityId, GroupId, PropertyId, SimClock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::config::KernelConfig;
use crate::entities::EntityAllocator;
use crate::event::{EventType, SimEvent};
use crate::groups::{Group, GroupRegistry};
use crate::plan::{Plan, PlanId, PlanQueue};
use crate::{KernelError, labels};

/// Kernel state shared by components, handlers and plans.
pub struct Context {
    clock: SimClock,
    rng: StdRng,
    dispatcher: EventLabelDispatcher<SimEvent, Self>,
    sensitivity: SensitivityIndex<SimEvent, Self>,
    groups: GroupRegistry,
    properties: PropertyStore,
    entities: EntityAllocator,
    plans: PlanQueue,
    halted: bool,
    current_component: Option<ComponentId>,
    failure: Option<KernelError>,
    events_published: u64,
}

impl Context {
    /// Create a context with the built-in labelers registered.
    pub(crate) fn new(config: &KernelConfig) -> Result<Self, KernelError> {
        config.validate()?;
        let clock = SimClock::new(config.simulation.start_time);
        let mut dispatcher = EventLabelDispatcher::new();
        labels::register_builtin(&mut dispatcher)?;

        Ok(Self {
            properties: PropertyStore::new(clock.clone(), config.properties.initial_capacity)?,
            clock,
            rng: StdRng::seed_from_u64(config.simulation.seed),
            dispatcher,
            sensitivity: SensitivityIndex::new(),
            groups: GroupRegistry::default(),
            entities: EntityAllocator::new(),
            plans: PlanQueue::new(),
            halted: false,
            current_component: None,
            failure: None,
            events_published: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Time, randomness and control
    // -----------------------------------------------------------------------

    /// Return the current simulation time.
    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    /// Return a handle to the simulation clock.
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Return the kernel's seeded random generator.
    pub const fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Stop the run after the current plan completes.
    pub fn halt(&mut self) {
        if !self.halted {
            debug!(time = self.time(), component = ?self.current_component, "Halt requested");
        }
        self.halted = true;
    }

    /// Return `true` once [`Context::halt`] was called.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Return the component whose initializer is running, if any.
    pub const fn current_component(&self) -> Option<&ComponentId> {
        self.current_component.as_ref()
    }

    /// Return the number of events published so far.
    pub const fn events_published(&self) -> u64 {
        self.events_published
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Register an additional labeler.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Dispatch`] if the labeler id is already
    /// registered for its event type.
    pub fn register_labeler(&mut self, labeler: EventLabeler<SimEvent, Self>) -> Result<(), KernelError> {
        self.dispatcher.register_labeler(labeler)?;
        Ok(())
    }

    /// Subscribe `handler` to events deriving `label`.
    ///
    /// See [`labels`] for the labels of the built-in labelers.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Dispatch`] if no labeler can derive `label`.
    pub fn subscribe(
        &mut self,
        label: EventLabel<EventType>,
        handler: impl Fn(&mut Self, &SimEvent) -> Result<(), KernelError> + 'static,
    ) -> Result<(), KernelError> {
        let handler: Handler<SimEvent, Self> = Rc::new(move |context: &mut Self, event: &SimEvent| {
            if let Err(err) = handler(context, event) {
                context.record_failure(err);
            }
        });
        self.dispatcher.subscribe(label, handler)?;
        Ok(())
    }

    /// Publish `event` to groups and subscribers.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while updating groups or by a handler.
    pub fn publish(&mut self, event: SimEvent) -> Result<(), KernelError> {
        self.events_published = self.events_published.saturating_add(1);
        trace!(event_type = ?event.event_type(), entity = %event.entity(), "Publishing event");

        self.reevaluate(&event)?;

        let handlers = self.dispatcher.route(&*self, &event);
        for handler in handlers {
            handler(self, &event);
            if let Some(err) = self.failure.take() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn record_failure(&mut self, err: KernelError) {
        if self.failure.is_none() {
            warn!(error = %err, time = self.time(), "Event handler failed");
            self.failure = Some(err);
        }
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Register a dynamic group and compute its initial membership.
    ///
    /// Initial members are recorded without publishing membership events.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Dispatch`] if a group with the same id exists.
    pub fn add_group(&mut self, group: Group) -> Result<(), KernelError> {
        let (id, predicate, sensitivities) = group.into_parts();
        self.sensitivity.register(id.clone(), sensitivities)?;
        self.groups.insert(id.clone(), Rc::clone(&predicate));

        let view: &Self = self;
        let members: Vec<EntityId> = view
            .entities
            .iter()
            .filter(|&entity| predicate(view, entity))
            .collect();
        for &entity in &members {
            self.groups.set_member(&id, entity, true);
        }
        debug!(group = %id, members = members.len(), component = ?self.current_component, "Added group");
        Ok(())
    }

    /// Return `true` if `entity` is a member of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownGroup`] if the group does not exist.
    pub fn is_member(&self, group: &GroupId, entity: EntityId) -> Result<bool, KernelError> {
        self.groups
            .is_member(group, entity)
            .ok_or_else(|| KernelError::UnknownGroup { group: group.clone() })
    }

    /// Return the members of `group` in id order.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownGroup`] if the group does not exist.
    pub fn group_members(&self, group: &GroupId) -> Result<Vec<EntityId>, KernelError> {
        self.groups
            .members(group)
            .ok_or_else(|| KernelError::UnknownGroup { group: group.clone() })
    }

    /// Apply the reevaluations the sensitivity index requests for `event`.
    fn reevaluate(&mut self, event: &SimEvent) -> Result<(), KernelError> {
        if !self.sensitivity.is_sensitive(event.event_type()) {
            return Ok(());
        }
        let requests = self.sensitivity.reevaluations(&*self, event);
        for Reevaluation { group, entity } in requests {
            self.update_membership(&group, entity)?;
        }
        Ok(())
    }

    /// Re-check one entity against one group and publish any change.
    fn update_membership(&mut self, group: &GroupId, entity: EntityId) -> Result<(), KernelError> {
        let predicate = self
            .groups
            .predicate(group)
            .ok_or_else(|| KernelError::UnknownGroup { group: group.clone() })?;
        let member = self.entities.contains(entity) && predicate(self, entity);
        if !self.groups.set_member(group, entity, member) {
            return Ok(());
        }

        debug!(group = %group, entity = %entity, member, "Group membership changed");
        let event = if member {
            SimEvent::GroupMembershipAddition {
                group: group.clone(),
                entity,
            }
        } else {
            SimEvent::GroupMembershipRemoval {
                group: group.clone(),
                entity,
            }
        };
        self.publish(event)
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Define a property for every entity.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Property`] if the property already exists or
    /// the definition does not suit its manager variant.
    pub fn define_property(
        &mut self,
        property: impl Into<PropertyId>,
        definition: &PropertyDefinition,
    ) -> Result<(), KernelError> {
        self.properties.define(property.into(), definition)?;
        Ok(())
    }

    /// Return read access to the property store.
    pub const fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Return the value of `property` for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEntity`] if the entity is not alive, or
    /// [`KernelError::Property`] if the property is not defined.
    pub fn get_property(
        &self,
        entity: EntityId,
        property: &PropertyId,
    ) -> Result<Option<PropertyValue>, KernelError> {
        self.require_entity(entity)?;
        Ok(self.properties.get_value(property, entity)?)
    }

    /// Return a float property of `entity`.
    pub fn get_float(&self, entity: EntityId, property: &PropertyId) -> Result<f64, KernelError> {
        self.require_entity(entity)?;
        Ok(self.properties.get_float(property, entity)?)
    }

    /// Return an integer property of `entity`.
    pub fn get_integer(&self, entity: EntityId, property: &PropertyId) -> Result<i64, KernelError> {
        self.require_entity(entity)?;
        Ok(self.properties.get_integer(property, entity)?)
    }

    /// Return a boolean property of `entity`.
    pub fn get_boolean(&self, entity: EntityId, property: &PropertyId) -> Result<bool, KernelError> {
        self.require_entity(entity)?;
        Ok(self.properties.get_boolean(property, entity)?)
    }

    /// Return the time `property` was last assigned for `entity`.
    pub fn property_time(&self, entity: EntityId, property: &PropertyId) -> Result<f64, KernelError> {
        self.require_entity(entity)?;
        Ok(self.properties.get_time(property, entity)?)
    }

    /// Assign a property and publish the resulting
    /// [`SimEvent::PropertyUpdate`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEntity`] if the entity is not alive,
    /// [`KernelError::Property`] if the property is undefined or the value
    /// has the wrong type, or any error raised while publishing.
    pub fn set_property(
        &mut self,
        entity: EntityId,
        property: &PropertyId,
        value: impl Into<PropertyValue>,
    ) -> Result<(), KernelError> {
        self.require_entity(entity)?;
        let current = value.into();
        let previous = self.properties.set_value(property, entity, current.clone())?;
        self.publish(SimEvent::PropertyUpdate {
            entity,
            property: property.clone(),
            previous,
            current,
        })
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    /// Create an entity.
    ///
    /// [`SimEvent::EntityAddition`] is published first; the new entity is
    /// then evaluated against every group.
    ///
    /// # Errors
    ///
    /// Returns any error raised while publishing.
    pub fn add_entity(&mut self) -> Result<EntityId, KernelError> {
        let entity = self.entities.allocate();
        trace!(entity = %entity, "Added entity");
        self.publish(SimEvent::EntityAddition { entity })?;

        let groups = self.groups.ids().to_vec();
        for group in &groups {
            self.update_membership(group, entity)?;
        }
        Ok(entity)
    }

    /// Remove an entity.
    ///
    /// The entity leaves every group (publishing membership removals), every
    /// property manager is told the id is no longer in use, and
    /// [`SimEvent::EntityRemoval`] is published last.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnknownEntity`] if the entity is not alive, or
    /// any error raised while publishing.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<(), KernelError> {
        if !self.entities.remove(entity) {
            return Err(KernelError::UnknownEntity { entity });
        }
        self.properties.remove_id(entity)?;

        for group in self.groups.groups_containing(entity) {
            self.update_membership(&group, entity)?;
        }
        trace!(entity = %entity, "Removed entity");
        self.publish(SimEvent::EntityRemoval { entity })
    }

    /// Return `true` if `entity` is alive.
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Return the number of live entities.
    pub const fn entity_count(&self) -> usize {
        self.entities.count()
    }

    /// Return the live entities in id order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.entities.iter().collect()
    }

    fn require_entity(&self, entity: EntityId) -> Result<(), KernelError> {
        if self.entities.contains(entity) {
            Ok(())
        } else {
            Err(KernelError::UnknownEntity { entity })
        }
    }

    // -----------------------------------------------------------------------
    // Plans
    // -----------------------------------------------------------------------

    /// Schedule `action` to run at simulation time `time`.
    ///
    /// Plans due at the same time run in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::PastPlan`] if `time` is before the current
    /// time or not a finite number.
    pub fn add_plan(
        &mut self,
        time: f64,
        action: impl FnOnce(&mut Self) -> Result<(), KernelError> + 'static,
    ) -> Result<PlanId, KernelError> {
        let now = self.time();
        if !time.is_finite() || time < now {
            return Err(KernelError::PastPlan { time, now });
        }
        let id = self.plans.schedule(time, Box::new(action));
        debug!(plan = id.raw(), time, now, "Scheduled plan");
        Ok(id)
    }

    /// Return the number of pending plans.
    pub fn pending_plans(&self) -> usize {
        self.plans.len()
    }

    // -----------------------------------------------------------------------
    // Run loop support
    // -----------------------------------------------------------------------

    pub(crate) fn next_plan_time(&self) -> Option<f64> {
        self.plans.peek_time()
    }

    /// Pop the next plan and move the clock to its time.
    pub(crate) fn begin_next_plan(&mut self) -> Option<Plan> {
        let plan = self.plans.pop_next()?;
        self.clock.set(plan.time());
        Some(plan)
    }

    pub(crate) fn set_current_component(&mut self, component: Option<ComponentId>) {
        self.current_component = component;
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Context")
            .field("time", &self.time())
            .field("entities", &self.entities.count())
            .field("groups", &self.groups)
            .field("properties", &self.properties.property_ids().count())
            .field("pending_plans", &self.plans.len())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
