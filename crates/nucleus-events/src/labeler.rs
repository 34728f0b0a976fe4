//! Named label derivation functions.

use nucleus_types::LabelerId;

use crate::{Event, EventLabel};

/// Signature of a label derivation function.
pub type DeriveFn<E, C> = dyn Fn(&C, &E) -> EventLabel<<E as Event>::Type>;

/// One labeling scheme for one event type.
///
/// A labeler whose derivation ignores its input (see [`EventLabeler::constant`])
/// gives subscribers a way to receive every event of a type; the dispatcher
/// treats it like any other labeler.
pub struct EventLabeler<E: Event, C> {
    id: LabelerId,
    event_type: E::Type,
    derive: Box<DeriveFn<E, C>>,
}

impl<E: Event + 'static, C: 'static> EventLabeler<E, C> {
    /// Create a labeler from a derivation function.
    ///
    /// The function must return labels carrying `event_type` and `id`, or no
    /// subscription will ever match them.
    pub fn new(
        id: LabelerId,
        event_type: E::Type,
        derive: impl Fn(&C, &E) -> EventLabel<E::Type> + 'static,
    ) -> Self {
        Self {
            id,
            event_type,
            derive: Box::new(derive),
        }
    }

    /// Create a labeler that derives the same keyless label for every event.
    ///
    /// The label is built once here and cloned on each derivation.
    pub fn constant(id: LabelerId, event_type: E::Type) -> Self {
        let label = EventLabel::keyless(event_type, id.clone());
        Self::new(id, event_type, move |_, _| label.clone())
    }

    /// Create a labeler keyed by the event's primary key.
    ///
    /// Events without a primary key derive the keyless label.
    pub fn by_primary_key(id: LabelerId, event_type: E::Type) -> Self {
        let labeler_id = id.clone();
        Self::new(id, event_type, move |_, event: &E| {
            EventLabel::new(event_type, labeler_id.clone(), event.primary_key())
        })
    }
}

impl<E: Event, C> EventLabeler<E, C> {
    /// Return the labeler id.
    pub const fn id(&self) -> &LabelerId {
        &self.id
    }

    /// Return the event type this labeler handles.
    pub const fn event_type(&self) -> E::Type {
        self.event_type
    }

    /// Derive the label of an event.
    pub fn derive(&self, context: &C, event: &E) -> EventLabel<E::Type> {
        (self.derive)(context, event)
    }
}

impl<E: Event, C> core::fmt::Debug for EventLabeler<E, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventLabeler")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelKey;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Tick,
    }

    struct Tick(i64);

    impl Event for Tick {
        type Type = Kind;

        fn event_type(&self) -> Kind {
            Kind::Tick
        }

        fn primary_key(&self) -> Option<LabelKey> {
            Some(LabelKey::Integer(self.0))
        }
    }

    #[test]
    fn constant_labeler_ignores_content() {
        let labeler: EventLabeler<Tick, ()> =
            EventLabeler::constant(LabelerId::new("all"), Kind::Tick);
        assert_eq!(labeler.derive(&(), &Tick(1)), labeler.derive(&(), &Tick(2)));
        assert!(labeler.derive(&(), &Tick(1)).keys().is_empty());
    }

    #[test]
    fn primary_key_labeler_uses_key() {
        let labeler: EventLabeler<Tick, ()> =
            EventLabeler::by_primary_key(LabelerId::new("by-key"), Kind::Tick);
        let label = labeler.derive(&(), &Tick(9));
        assert_eq!(label.keys(), &[LabelKey::Integer(9)]);
        assert_ne!(label, labeler.derive(&(), &Tick(10)));
    }

    #[test]
    fn custom_labeler_reads_context() {
        let labeler: EventLabeler<Tick, i64> = EventLabeler::new(
            LabelerId::new("offset"),
            Kind::Tick,
            |offset: &i64, tick: &Tick| {
                EventLabel::new(
                    Kind::Tick,
                    LabelerId::new("offset"),
                    [LabelKey::Integer(tick.0.saturating_add(*offset))],
                )
            },
        );
        assert_eq!(labeler.derive(&5, &Tick(1)).keys(), &[LabelKey::Integer(6)]);
        assert_eq!(labeler.id().as_str(), "offset");
    }
}
