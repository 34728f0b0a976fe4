//! The Nucleus simulation kernel.
//!
//! A simulation is assembled from [`Component`]s. Each declares the
//! components it depends on and an initializer that receives the kernel's
//! [`Context`]; initializers run once, in dependency order, and register
//! properties, groups, event subscriptions and plans. [`Simulation::run`]
//! then executes plans in time order, and everything that happens during a
//! plan is expressed as [`SimEvent`]s routed by label.
//!
//! # Modules
//!
//! - [`component`] -- [`Component`]: id, dependencies and initializer.
//! - [`config`] -- Configuration loading from `nucleus-config.yaml`.
//! - [`context`] -- [`Context`]: the registration and run-time context.
//! - [`entities`] -- Dense, never reused entity ids.
//! - [`error`] -- [`KernelError`].
//! - [`event`] -- The closed event taxonomy [`SimEvent`] / [`EventType`].
//! - [`groups`] -- Dynamic groups driven by event sensitivities.
//! - [`labels`] -- Built-in labelers and subscriber label helpers.
//! - [`plan`] -- The deterministic plan queue.
//! - [`simulation`] -- [`SimulationBuilder`], [`Simulation`] and the run loop.
//!
//! ```
//! use nucleus_core::{Component, Simulation, EndReason};
//!
//! let mut simulation = Simulation::builder()
//!     .component(Component::new("census", |context| {
//!         context.add_entity()?;
//!         context.add_plan(3.0, |context| {
//!             context.add_entity()?;
//!             Ok(())
//!         })?;
//!         Ok(())
//!     }))
//!     .build()?;
//!
//! let summary = simulation.run()?;
//! assert_eq!(summary.end_reason, EndReason::QueueEmpty);
//! assert_eq!(summary.live_entities, 2);
//! # Ok::<(), nucleus_core::KernelError>(())
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod event;
pub mod groups;
pub mod labels;
pub mod plan;
pub mod simulation;

pub use component::Component;
pub use config::{ConfigError, KernelConfig};
pub use context::Context;
pub use error::KernelError;
pub use event::{EventType, SimEvent};
pub use groups::Group;
pub use plan::PlanId;
pub use simulation::{EndReason, RunSummary, Simulation, SimulationBuilder};
