//! Labeler registry, subscriptions and label-based routing.
//!
//! Routing an event costs one derivation per labeler registered for the
//! event's type plus one hash lookup per derived label. The total number of
//! subscriptions in the system never enters into it.

use std::collections::HashMap;
use std::rc::Rc;

use nucleus_types::LabelerId;
use tracing::{debug, trace};

use crate::{DispatchError, Event, EventLabel, EventLabeler};

/// A subscribed event handler.
///
/// Handlers are reference counted so routing can hand out clones and release
/// the dispatcher before any handler runs. A handler is then free to publish
/// further events or subscribe new handlers.
pub type Handler<E, C> = Rc<dyn Fn(&mut C, &E)>;

/// Routes events of type `E` to handlers by exact label match.
pub struct EventLabelDispatcher<E: Event, C> {
    labelers: HashMap<E::Type, Vec<EventLabeler<E, C>>>,
    subscriptions: HashMap<EventLabel<E::Type>, Vec<Handler<E, C>>>,
    subscribed_types: HashMap<E::Type, usize>,
}

impl<E: Event, C> Default for EventLabelDispatcher<E, C> {
    fn default() -> Self {
        Self {
            labelers: HashMap::new(),
            subscriptions: HashMap::new(),
            subscribed_types: HashMap::new(),
        }
    }
}

impl<E: Event, C> EventLabelDispatcher<E, C> {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a labeler for its event type.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateLabeler`] if a labeler with the same
    /// id is already registered for the same event type.
    pub fn register_labeler(&mut self, labeler: EventLabeler<E, C>) -> Result<(), DispatchError> {
        let event_type = labeler.event_type();
        if self.has_labeler(event_type, labeler.id()) {
            return Err(DispatchError::DuplicateLabeler {
                event_type: format!("{event_type:?}"),
                labeler: labeler.id().clone(),
            });
        }

        debug!(?event_type, labeler = %labeler.id(), "Registered event labeler");
        self.labelers.entry(event_type).or_default().push(labeler);
        Ok(())
    }

    /// Return `true` if `labeler` is registered for `event_type`.
    pub fn has_labeler(&self, event_type: E::Type, labeler: &LabelerId) -> bool {
        self.labelers
            .get(&event_type)
            .is_some_and(|registered| registered.iter().any(|l| l.id() == labeler))
    }

    /// File `handler` under `label`.
    ///
    /// Handlers sharing a label are invoked in the order they subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownLabeler`] if no labeler with the
    /// label's id is registered for the label's event type. Such a label
    /// could never be derived, so the handler would never run.
    pub fn subscribe(
        &mut self,
        label: EventLabel<E::Type>,
        handler: Handler<E, C>,
    ) -> Result<(), DispatchError> {
        let event_type = label.event_type();
        if !self.has_labeler(event_type, label.labeler_id()) {
            return Err(DispatchError::UnknownLabeler {
                event_type: format!("{event_type:?}"),
                labeler: label.labeler_id().clone(),
            });
        }

        debug!(
            ?event_type,
            labeler = %label.labeler_id(),
            keys = ?label.keys(),
            "Subscribed event handler"
        );
        self.subscriptions.entry(label).or_default().push(handler);
        let count = self.subscribed_types.entry(event_type).or_default();
        *count = count.saturating_add(1);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Return `true` if at least one handler is subscribed for `event_type`.
    pub fn has_subscribers(&self, event_type: E::Type) -> bool {
        self.subscribed_types.get(&event_type).is_some_and(|&n| n > 0)
    }

    /// Return the total number of subscribed handlers.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    /// Derive every label of `event`, one per registered labeler.
    pub fn labels_for(&self, context: &C, event: &E) -> Vec<EventLabel<E::Type>> {
        self.labelers
            .get(&event.event_type())
            .map(|labelers| labelers.iter().map(|l| l.derive(context, event)).collect())
            .unwrap_or_default()
    }

    /// Collect the handlers that should receive `event`.
    ///
    /// Handlers come grouped by labeler in registration order, and within a
    /// label in subscription order. Nothing is invoked; see
    /// [`EventLabelDispatcher::publish`].
    pub fn route(&self, context: &C, event: &E) -> Vec<Handler<E, C>> {
        let event_type = event.event_type();
        if !self.has_subscribers(event_type) {
            trace!(?event_type, "No subscribers for event type");
            return Vec::new();
        }

        let mut handlers = Vec::new();
        for labeler in self.labelers.get(&event_type).into_iter().flatten() {
            let label = labeler.derive(context, event);
            if let Some(subscribed) = self.subscriptions.get(&label) {
                handlers.extend(subscribed.iter().cloned());
            }
        }
        trace!(?event_type, handlers = handlers.len(), "Routed event");
        handlers
    }

    /// Deliver `event` synchronously to every matching handler.
    ///
    /// Returns the number of handlers invoked. An event nobody subscribed to
    /// is silently dropped.
    pub fn publish(&self, context: &mut C, event: &E) -> usize {
        let handlers = self.route(context, event);
        for handler in &handlers {
            handler(context, event);
        }
        handlers.len()
    }
}

impl<E: Event, C> core::fmt::Debug for EventLabelDispatcher<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventLabelDispatcher")
            .field("labelers", &self.labelers)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}
