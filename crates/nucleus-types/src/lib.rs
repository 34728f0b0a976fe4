//! Shared type definitions for the Nucleus simulation kernel.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes for components, entities, properties,
//!   groups and event labelers
//! - [`clock`] -- The shared simulation clock of one kernel instance

pub mod clock;
pub mod ids;

pub use clock::SimClock;
pub use ids::{ComponentId, EntityId, GroupId, LabelerId, PropertyId};
