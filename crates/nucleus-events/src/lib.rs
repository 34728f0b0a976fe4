//! Label-based event routing for the Nucleus simulation kernel.
//!
//! Publishing an event never scans the full subscriber list. Instead every
//! event type has a small set of [`EventLabeler`]s; each derives one
//! [`EventLabel`] from the event, and only handlers filed under exactly that
//! label are invoked. A subscriber that cares about one producer/property
//! pair is filed under the label only that pair's events derive, so it is
//! never called for anything else.
//!
//! # Modules
//!
//! - [`label`] -- [`EventLabel`] and its key parts.
//! - [`labeler`] -- [`EventLabeler`]: a named derivation function per event type.
//! - [`dispatcher`] -- [`EventLabelDispatcher`]: labelers, subscriptions, routing.
//! - [`sensitivity`] -- [`SensitivityIndex`]: per-event-type probes that tell
//!   dynamic groupings which entity, if any, to re-evaluate.
//!
//! Both the event type `E` and the context `C` handed to labelers and
//! handlers are generic, so the crate knows nothing about the kernel that
//! embeds it.

pub mod dispatcher;
pub mod label;
pub mod labeler;
pub mod sensitivity;

pub use dispatcher::{EventLabelDispatcher, Handler};
pub use label::{EventLabel, LabelKey};
pub use labeler::EventLabeler;
pub use sensitivity::{FilterSensitivity, Reevaluation, SensitivityIndex};

use core::fmt::Debug;
use core::hash::Hash;

use nucleus_types::{GroupId, LabelerId};

/// An event that can be routed by label.
///
/// Each event belongs to exactly one member of a closed, statically known
/// set of event types.
pub trait Event {
    /// The discriminant identifying the kind of event.
    type Type: Copy + Eq + Hash + Debug;

    /// Return this event's type.
    fn event_type(&self) -> Self::Type;

    /// Return the event's primary key, used by primary-key labelers.
    fn primary_key(&self) -> Option<LabelKey> {
        None
    }
}

/// Errors raised while registering labelers, subscriptions or groupings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// A labeler with the same id is already registered for the event type.
    #[error("labeler {labeler} is already registered for event type {event_type}")]
    DuplicateLabeler {
        /// Debug rendering of the event type.
        event_type: String,
        /// The repeated labeler id.
        labeler: LabelerId,
    },

    /// A subscription names a labeler that was never registered.
    #[error("no labeler {labeler} is registered for event type {event_type}")]
    UnknownLabeler {
        /// Debug rendering of the event type.
        event_type: String,
        /// The unknown labeler id.
        labeler: LabelerId,
    },

    /// A grouping declared its sensitivities twice.
    #[error("grouping {group} has already declared its sensitivities")]
    DuplicateGrouping {
        /// The repeated grouping id.
        group: GroupId,
    },
}
