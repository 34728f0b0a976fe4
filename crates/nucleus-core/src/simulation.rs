//! Simulation assembly and the plan-driven run loop.
//!
//! [`SimulationBuilder::build`] resolves component dependencies, creates the
//! [`Context`] and runs every initializer in resolved order. Assembly either
//! fully succeeds or returns the first error; no plan runs before every
//! component is initialized.
//!
//! [`Simulation::run`] then pops plans in `(time, insertion)` order,
//! advancing the shared clock to each plan's time, until one of the
//! termination conditions in [`EndReason`] holds.

use std::collections::HashMap;

use nucleus_types::ComponentId;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::component::Component;
use crate::config::KernelConfig;
use crate::{Context, KernelError};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// No plans were left.
    QueueEmpty,
    /// The next plan was due after the configured maximum time.
    MaxTimeReached,
    /// Component or plan code called [`Context::halt`].
    Halted,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Simulation time when the run started.
    pub start_time: f64,
    /// Simulation time when the run stopped.
    pub end_time: f64,
    /// Number of plans executed during this run.
    pub plans_executed: u64,
    /// Events published since the kernel was created.
    pub events_published: u64,
    /// Entities alive at the end of the run.
    pub live_entities: usize,
    /// Plans still queued at the end of the run.
    pub pending_plans: usize,
}

/// Collects configuration and components for a [`Simulation`].
#[derive(Debug, Default)]
pub struct SimulationBuilder {
    config: KernelConfig,
    components: Vec<Component>,
}

impl SimulationBuilder {
    /// Create a builder with the default configuration and no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` instead of the default configuration.
    #[must_use]
    pub fn config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a component.
    #[must_use]
    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Resolve the components and run their initializers.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Resolve`] for duplicate, missing or circular
    /// dependencies, [`KernelError::Config`] for an invalid configuration,
    /// or the first error raised by an initializer.
    pub fn build(self) -> Result<Simulation, KernelError> {
        let order = nucleus_resolver::resolve(self.components.iter().map(Component::declaration))?;
        info!(
            components = order.len(),
            order = ?order.iter().map(ComponentId::as_str).collect::<Vec<_>>(),
            "Components resolved"
        );

        let max_time = self.config.simulation.max_time;
        let mut context = Context::new(&self.config)?;
        let mut pending: HashMap<ComponentId, Component> = self
            .components
            .into_iter()
            .map(|component| (component.id().clone(), component))
            .collect();

        for id in &order {
            let Some(component) = pending.remove(id) else {
                continue;
            };
            context.set_current_component(Some(id.clone()));
            let initialize = component.into_initializer();
            if let Err(err) = initialize(&mut context) {
                warn!(component = %id, error = %err, "Component initialization failed");
                return Err(err);
            }
            debug!(component = %id, entities = context.entity_count(), "Component initialized");
        }
        context.set_current_component(None);

        info!(
            entities = context.entity_count(),
            pending_plans = context.pending_plans(),
            "Simulation assembled"
        );
        Ok(Simulation {
            context,
            order,
            max_time,
        })
    }
}

/// An assembled simulation, ready to run.
#[derive(Debug)]
pub struct Simulation {
    context: Context,
    order: Vec<ComponentId>,
    max_time: Option<f64>,
}

impl Simulation {
    /// Start assembling a simulation.
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    /// Return the kernel context.
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Return the kernel context for direct manipulation between runs.
    pub const fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Return the order components were initialized in.
    pub fn initialization_order(&self) -> &[ComponentId] {
        &self.order
    }

    /// Execute plans until the queue drains, the next plan is due after the
    /// maximum time, or the run is halted.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a plan. The plan's effects up to
    /// the failure remain applied.
    pub fn run(&mut self) -> Result<RunSummary, KernelError> {
        let start_time = self.context.time();
        let mut plans_executed: u64 = 0;
        info!(
            start_time,
            max_time = ?self.max_time,
            pending_plans = self.context.pending_plans(),
            "Simulation starting"
        );

        let end_reason = loop {
            if self.context.is_halted() {
                break EndReason::Halted;
            }
            let Some(next) = self.context.next_plan_time() else {
                break EndReason::QueueEmpty;
            };
            if self.max_time.is_some_and(|max| next > max) {
                break EndReason::MaxTimeReached;
            }
            let Some(plan) = self.context.begin_next_plan() else {
                break EndReason::QueueEmpty;
            };
            let id = plan.id();
            let action = plan.into_action();
            if let Err(err) = action(&mut self.context) {
                warn!(plan = id.raw(), time = self.context.time(), error = %err, "Plan failed");
                return Err(err);
            }
            plans_executed = plans_executed.saturating_add(1);
        };

        let summary = RunSummary {
            end_reason,
            start_time,
            end_time: self.context.time(),
            plans_executed,
            events_published: self.context.events_published(),
            live_entities: self.context.entity_count(),
            pending_plans: self.context.pending_plans(),
        };
        info!(
            end_reason = ?summary.end_reason,
            end_time = summary.end_time,
            plans_executed,
            events_published = summary.events_published,
            "Simulation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_end_reason_in_snake_case() {
        let summary = RunSummary {
            end_reason: EndReason::MaxTimeReached,
            start_time: 0.0,
            end_time: 4.0,
            plans_executed: 2,
            events_published: 7,
            live_entities: 1,
            pending_plans: 3,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["end_reason"], "max_time_reached");
        assert_eq!(json["pending_plans"], 3);
    }

    #[test]
    fn empty_simulation_ends_immediately() {
        let mut simulation = Simulation::builder().build().unwrap();
        let summary = simulation.run().unwrap();
        assert_eq!(summary.end_reason, EndReason::QueueEmpty);
        assert_eq!(summary.plans_executed, 0);
        assert!(simulation.initialization_order().is_empty());
    }
}
