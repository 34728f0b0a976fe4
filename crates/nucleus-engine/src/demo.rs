//! Demonstration components: a handful of shops whose stock is consumed at
//! random intervals and restocked after it runs low.
//!
//! - `registry` creates one entity per shop.
//! - `inventory` (after `registry`) defines the time-tracked `stock`
//!   property and schedules each shop's consumption plans.
//! - `observer` (after `inventory`) maintains the `low-stock` group and
//!   schedules a restock whenever a shop joins it.

use nucleus_core::{Component, Context, EventType, Group, KernelError, labels};
use nucleus_properties::{PropertyDefinition, TimeTrackingPolicy, ValueType};
use nucleus_types::{EntityId, GroupId, PropertyId};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::error::EngineError;

/// Name of the stock property.
pub const STOCK: &str = "stock";
/// Name of the low-stock group.
pub const LOW_STOCK: &str = "low-stock";

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// The `demo` section of `nucleus-config.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DemoConfig {
    /// Number of shops created by the registry.
    #[serde(default = "default_shops")]
    pub shops: u32,

    /// Stock every shop starts with.
    #[serde(default = "default_initial_stock")]
    pub initial_stock: f64,

    /// Shops below this level join the low-stock group.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: f64,

    /// Upper bound of one consumption.
    #[serde(default = "default_max_consumption")]
    pub max_consumption: f64,

    /// Shortest delay between two consumptions of one shop.
    #[serde(default = "default_min_interval")]
    pub min_interval: f64,

    /// Longest delay between two consumptions of one shop.
    #[serde(default = "default_max_interval")]
    pub max_interval: f64,

    /// Delay between joining the low-stock group and the delivery.
    #[serde(default = "default_restock_delay")]
    pub restock_delay: f64,

    /// Amount delivered by one restock.
    #[serde(default = "default_restock_amount")]
    pub restock_amount: f64,

    /// No consumption is scheduled after this time.
    #[serde(default = "default_horizon")]
    pub horizon: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            shops: default_shops(),
            initial_stock: default_initial_stock(),
            low_stock_threshold: default_low_stock_threshold(),
            max_consumption: default_max_consumption(),
            min_interval: default_min_interval(),
            max_interval: default_max_interval(),
            restock_delay: default_restock_delay(),
            restock_amount: default_restock_amount(),
            horizon: default_horizon(),
        }
    }
}

impl DemoConfig {
    /// Reject values the consumption plans cannot sample from.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Demo`] if a range is empty or a delay is not
    /// positive.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |message: String| Err(EngineError::Demo { message });
        if self.max_consumption.is_nan() || self.max_consumption <= 0.0 {
            return invalid(format!("max_consumption must be positive, got {}", self.max_consumption));
        }
        if self.min_interval.is_nan() || self.min_interval <= 0.0 || self.min_interval >= self.max_interval {
            return invalid(format!(
                "need 0 < min_interval < max_interval, got {} and {}",
                self.min_interval, self.max_interval
            ));
        }
        if self.restock_delay.is_nan() || self.restock_delay < 0.0 {
            return invalid(format!("restock_delay must not be negative, got {}", self.restock_delay));
        }
        Ok(())
    }
}

const fn default_shops() -> u32 {
    4
}

const fn default_initial_stock() -> f64 {
    20.0
}

const fn default_low_stock_threshold() -> f64 {
    5.0
}

const fn default_max_consumption() -> f64 {
    4.0
}

const fn default_min_interval() -> f64 {
    1.0
}

const fn default_max_interval() -> f64 {
    3.0
}

const fn default_restock_delay() -> f64 {
    6.0
}

const fn default_restock_amount() -> f64 {
    15.0
}

const fn default_horizon() -> f64 {
    100.0
}

// -----------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------

fn stock() -> PropertyId {
    PropertyId::new(STOCK)
}

/// Build the three demonstration components.
pub fn components(demo: DemoConfig) -> Vec<Component> {
    vec![
        Component::new("observer", move |context| observe(context, demo)).depends_on("inventory"),
        Component::new("inventory", move |context| stock_shops(context, demo)).depends_on("registry"),
        Component::new("registry", move |context| {
            for _ in 0..demo.shops {
                context.add_entity()?;
            }
            info!(shops = demo.shops, "Shops registered");
            Ok(())
        }),
    ]
}

fn stock_shops(context: &mut Context, demo: DemoConfig) -> Result<(), KernelError> {
    let definition = PropertyDefinition::builder(ValueType::Float)
        .default_value(demo.initial_stock)
        .time_tracking(TimeTrackingPolicy::On)
        .build()?;
    context.define_property(stock(), &definition)?;

    for shop in context.entities() {
        let first = context.time() + context.rng().random_range(demo.min_interval..demo.max_interval);
        context.add_plan(first, move |context| consume(context, shop, demo))?;
    }
    Ok(())
}

fn consume(context: &mut Context, shop: EntityId, demo: DemoConfig) -> Result<(), KernelError> {
    if !context.contains_entity(shop) {
        return Ok(());
    }
    let level = context.get_float(shop, &stock())?;
    let amount = context.rng().random_range(0.0..demo.max_consumption);
    let remaining = (level - amount).max(0.0);
    trace!(shop = %shop, level, amount, remaining, "Consumption");
    context.set_property(shop, &stock(), remaining)?;

    let next = context.time() + context.rng().random_range(demo.min_interval..demo.max_interval);
    if next <= demo.horizon {
        context.add_plan(next, move |context| consume(context, shop, demo))?;
    }
    Ok(())
}

fn observe(context: &mut Context, demo: DemoConfig) -> Result<(), KernelError> {
    let low = GroupId::new(LOW_STOCK);
    context.add_group(
        Group::new(low.clone(), move |context: &Context, shop| {
            context
                .get_float(shop, &stock())
                .is_ok_and(|level| level < demo.low_stock_threshold)
        })
        .sensitive_to_property(stock()),
    )?;

    context.subscribe(labels::group(EventType::GroupMembershipAddition, &low), move |context, event| {
        let shop = event.entity();
        let due = context.time() + demo.restock_delay;
        debug!(shop = %shop, time = context.time(), due, "Shop ran low, restock ordered");
        context.add_plan(due, move |context| restock(context, shop, demo))?;
        Ok(())
    })?;
    context.subscribe(labels::group(EventType::GroupMembershipRemoval, &low), |context, event| {
        debug!(shop = %event.entity(), time = context.time(), "Shop no longer low");
        Ok(())
    })?;
    Ok(())
}

fn restock(context: &mut Context, shop: EntityId, demo: DemoConfig) -> Result<(), KernelError> {
    if !context.contains_entity(shop) {
        return Ok(());
    }
    let level = context.get_float(shop, &stock())?;
    info!(shop = %shop, time = context.time(), level, amount = demo.restock_amount, "Restocking");
    context.set_property(shop, &stock(), level + demo.restock_amount)
}
