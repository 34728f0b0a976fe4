//! End-to-end tests of kernel assembly and the run loop.

#![allow(clippy::unwrap_used, clippy::float_cmp, clippy::panic)]

use std::cell::RefCell;
use std::rc::Rc;

use nucleus_core::{
    Component, Context, EndReason, EventType, Group, KernelConfig, KernelError, SimEvent, Simulation,
    labels,
};
use nucleus_events::Event;
use nucleus_properties::{PropertyDefinition, PropertyValue, TimeTrackingPolicy, ValueType};
use nucleus_resolver::ResolveError;
use nucleus_types::{ComponentId, EntityId, GroupId, PropertyId};
use rand::Rng;

type Log<T> = Rc<RefCell<Vec<T>>>;

fn log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

fn recording(id: &'static str, log: &Log<&'static str>) -> Component {
    let log = Rc::clone(log);
    Component::new(id, move |_| {
        log.borrow_mut().push(id);
        Ok(())
    })
}

fn config(yaml: &str) -> KernelConfig {
    KernelConfig::parse(yaml).unwrap()
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

#[test]
fn components_initialize_in_rank_order() {
    let ran = log();
    let simulation = Simulation::builder()
        .component(recording("D", &ran).depends_on("B").depends_on("C"))
        .component(recording("A", &ran))
        .component(recording("B", &ran).depends_on("A"))
        .component(recording("C", &ran).depends_on("A"))
        .build()
        .unwrap();

    assert_eq!(*ran.borrow(), vec!["A", "B", "C", "D"]);
    let order: Vec<&str> = simulation
        .initialization_order()
        .iter()
        .map(ComponentId::as_str)
        .collect();
    assert_eq!(order, vec!["A", "B", "C", "D"]);
}

#[test]
fn cyclic_components_fail_before_any_initializer_runs() {
    let ran = log();
    let err = Simulation::builder()
        .component(recording("X", &ran).depends_on("Y"))
        .component(recording("Y", &ran).depends_on("X"))
        .build()
        .unwrap_err();

    let KernelError::Resolve {
        source: ResolveError::CircularDependency { groups },
    } = err
    else {
        panic!("expected a circular dependency, got {err}");
    };
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups.first().unwrap().ids(),
        vec![ComponentId::new("X"), ComponentId::new("Y")]
    );
    assert!(ran.borrow().is_empty());
}

#[test]
fn missing_dependency_names_its_dependents() {
    let err = Simulation::builder()
        .component(Component::new("P", |_| Ok(())).depends_on("Q"))
        .build()
        .unwrap_err();

    let KernelError::Resolve {
        source: ResolveError::MissingDependency { missing },
    } = err
    else {
        panic!("expected a missing dependency, got {err}");
    };
    let missing = missing.first().unwrap();
    assert_eq!(missing.dependency, ComponentId::new("Q"));
    assert_eq!(missing.dependents, vec![ComponentId::new("P")]);
}

#[test]
fn failing_initializer_aborts_assembly() {
    let ran = log();
    let err = Simulation::builder()
        .component(Component::new("broken", |_| {
            Err(KernelError::Rejected {
                reason: "no inputs".to_owned(),
            })
        }))
        .component(recording("after", &ran).depends_on("broken"))
        .build()
        .unwrap_err();

    assert!(matches!(err, KernelError::Rejected { .. }));
    assert!(ran.borrow().is_empty());
}

#[test]
fn current_component_is_tracked_during_initialization() {
    let seen = log();
    let sink = Rc::clone(&seen);
    let simulation = Simulation::builder()
        .component(Component::new("census", move |context| {
            sink.borrow_mut().push(context.current_component().cloned());
            Ok(())
        }))
        .build()
        .unwrap();

    assert_eq!(*seen.borrow(), vec![Some(ComponentId::new("census"))]);
    assert!(simulation.context().current_component().is_none());
}

// ---------------------------------------------------------------------------
// Properties and events
// ---------------------------------------------------------------------------

#[test]
fn time_tracked_property_records_plan_time() {
    let height = PropertyId::new("height");
    let property = height.clone();
    let mut simulation = Simulation::builder()
        .component(Component::new("people", move |context| {
            let definition = PropertyDefinition::builder(ValueType::Float)
                .default_value(423.645)
                .time_tracking(TimeTrackingPolicy::On)
                .build()?;
            context.define_property(property.clone(), &definition)?;
            for _ in 0..8 {
                context.add_entity()?;
            }
            context.add_plan(10.0, move |context| {
                context.set_property(EntityId::new(5), &property, 423.645)
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    simulation.run().unwrap();
    let context = simulation.context();
    assert_eq!(context.property_time(EntityId::new(5), &height).unwrap(), 10.0);
    assert_eq!(context.get_float(EntityId::new(7), &height).unwrap(), 423.645);
    assert_eq!(context.property_time(EntityId::new(7), &height).unwrap(), 0.0);
}

#[test]
fn entity_property_subscribers_only_see_their_pair() {
    let x = PropertyId::new("x");
    let first = log();
    let second = log();
    let (first_sink, second_sink, property) = (Rc::clone(&first), Rc::clone(&second), x.clone());

    let mut simulation = Simulation::builder()
        .component(Component::new("producers", move |context| {
            let definition = PropertyDefinition::builder(ValueType::Integer)
                .default_value(0_i64)
                .build()?;
            context.define_property(property.clone(), &definition)?;
            let producer_a = context.add_entity()?;
            let producer_b = context.add_entity()?;

            context.subscribe(labels::entity_property(producer_a, &property), move |_, event| {
                first_sink.borrow_mut().push(event.entity());
                Ok(())
            })?;
            context.subscribe(labels::entity_property(producer_b, &property), move |_, event| {
                second_sink.borrow_mut().push(event.entity());
                Ok(())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    simulation
        .context_mut()
        .set_property(EntityId::new(0), &x, 7_i64)
        .unwrap();

    assert_eq!(*first.borrow(), vec![EntityId::new(0)]);
    assert!(second.borrow().is_empty());
}

#[test]
fn removal_leaves_groups_before_removal_event() {
    let flag = PropertyId::new("flag");
    let flagged = GroupId::new("flagged");
    let seen = log();
    let sink = Rc::clone(&seen);
    let (property, group) = (flag.clone(), flagged.clone());

    let mut simulation = Simulation::builder()
        .component(Component::new("flags", move |context| {
            let definition = PropertyDefinition::builder(ValueType::Boolean)
                .default_value(true)
                .build()?;
            context.define_property(property.clone(), &definition)?;
            let predicate_property = property.clone();
            context.add_group(
                Group::new(group, move |context: &Context, entity| {
                    context.get_boolean(entity, &predicate_property).unwrap_or(false)
                })
                .sensitive_to_property(property.clone()),
            )?;
            for event_type in EventType::ALL {
                let sink = Rc::clone(&sink);
                context.subscribe(labels::all(event_type), move |_, event: &SimEvent| {
                    sink.borrow_mut().push(event.event_type());
                    Ok(())
                })?;
            }
            Ok(())
        }))
        .build()
        .unwrap();

    let context = simulation.context_mut();
    let entity = context.add_entity().unwrap();
    assert!(context.is_member(&flagged, entity).unwrap());
    context.remove_entity(entity).unwrap();
    assert!(context.group_members(&flagged).unwrap().is_empty());

    assert_eq!(
        *seen.borrow(),
        vec![
            EventType::EntityAddition,
            EventType::GroupMembershipAddition,
            EventType::GroupMembershipRemoval,
            EventType::EntityRemoval,
        ]
    );
}

#[test]
fn handler_can_publish_nested_updates() {
    let celsius = PropertyId::new("celsius");
    let fahrenheit = PropertyId::new("fahrenheit");
    let (c, f) = (celsius.clone(), fahrenheit.clone());

    let mut simulation = Simulation::builder()
        .component(Component::new("thermometer", move |context| {
            let definition = PropertyDefinition::builder(ValueType::Float)
                .default_value(0.0)
                .build()?;
            context.define_property(c.clone(), &definition)?;
            context.define_property(f.clone(), &definition)?;
            let target = f.clone();
            context.subscribe(labels::property(&c), move |context, event| {
                if let SimEvent::PropertyUpdate {
                    entity,
                    current: PropertyValue::Float(value),
                    ..
                } = event
                {
                    context.set_property(*entity, &target, value.mul_add(1.8, 32.0))?;
                }
                Ok(())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    let context = simulation.context_mut();
    let entity = context.add_entity().unwrap();
    context.set_property(entity, &celsius, 100.0).unwrap();
    assert_eq!(context.get_float(entity, &fahrenheit).unwrap(), 212.0);
}

#[test]
fn wrong_value_type_is_rejected() {
    let mut simulation = Simulation::builder()
        .component(Component::new("counts", |context| {
            let definition = PropertyDefinition::builder(ValueType::Integer)
                .default_value(1_i64)
                .build()?;
            context.define_property("count", &definition)?;
            context.add_entity()?;
            Ok(())
        }))
        .build()
        .unwrap();

    let err = simulation
        .context_mut()
        .set_property(EntityId::new(0), &PropertyId::new("count"), true)
        .unwrap_err();
    assert!(matches!(err, KernelError::Property { .. }));
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

#[test]
fn plans_run_in_time_then_insertion_order() {
    let ran = log();
    let sink = Rc::clone(&ran);
    let mut simulation = Simulation::builder()
        .component(Component::new("schedule", move |context| {
            for (time, name) in [(2.0, "late"), (1.0, "first"), (1.0, "second"), (0.5, "early")] {
                let sink = Rc::clone(&sink);
                context.add_plan(time, move |context| {
                    sink.borrow_mut().push((name, context.time()));
                    Ok(())
                })?;
            }
            Ok(())
        }))
        .build()
        .unwrap();

    let summary = simulation.run().unwrap();
    assert_eq!(
        *ran.borrow(),
        vec![("early", 0.5), ("first", 1.0), ("second", 1.0), ("late", 2.0)]
    );
    assert_eq!(summary.end_reason, EndReason::QueueEmpty);
    assert_eq!(summary.plans_executed, 4);
    assert_eq!(summary.end_time, 2.0);
}

#[test]
fn max_time_leaves_later_plans_queued() {
    let mut simulation = Simulation::builder()
        .config(config("simulation:\n  max_time: 5.0\n"))
        .component(Component::new("ticker", |context| {
            fn tick(context: &mut Context) -> Result<(), KernelError> {
                context.add_entity()?;
                let next = context.time() + 2.0;
                context.add_plan(next, tick)?;
                Ok(())
            }
            context.add_plan(0.0, tick)?;
            Ok(())
        }))
        .build()
        .unwrap();

    let summary = simulation.run().unwrap();
    assert_eq!(summary.end_reason, EndReason::MaxTimeReached);
    assert_eq!(summary.plans_executed, 3);
    assert_eq!(summary.end_time, 4.0);
    assert_eq!(summary.live_entities, 3);
    assert_eq!(summary.pending_plans, 1);
}

#[test]
fn halt_stops_after_the_current_plan() {
    let mut simulation = Simulation::builder()
        .component(Component::new("stopper", |context| {
            context.add_plan(1.0, |context| {
                context.halt();
                context.add_entity()?;
                Ok(())
            })?;
            context.add_plan(2.0, |context| {
                context.add_entity()?;
                Ok(())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    let summary = simulation.run().unwrap();
    assert_eq!(summary.end_reason, EndReason::Halted);
    assert_eq!(summary.plans_executed, 1);
    assert_eq!(summary.live_entities, 1);
    assert_eq!(summary.pending_plans, 1);
}

#[test]
fn plan_in_the_past_fails_the_run() {
    let mut simulation = Simulation::builder()
        .config(config("simulation:\n  start_time: 3.0\n"))
        .component(Component::new("clock", |context| {
            context.add_plan(4.0, |context| {
                context.add_plan(1.0, |_| Ok(()))?;
                Ok(())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    let err = simulation.run().unwrap_err();
    assert!(matches!(err, KernelError::PastPlan { time, now } if time == 1.0 && now == 4.0));
}

#[test]
fn handler_error_fails_the_run() {
    let mut simulation = Simulation::builder()
        .component(Component::new("guard", |context| {
            context.subscribe(labels::all(EventType::EntityAddition), |_, _| {
                Err(KernelError::Rejected {
                    reason: "population frozen".to_owned(),
                })
            })?;
            context.add_plan(1.0, |context| {
                context.add_entity()?;
                Ok(())
            })?;
            Ok(())
        }))
        .build()
        .unwrap();

    let err = simulation.run().unwrap_err();
    assert_eq!(err.to_string(), "population frozen");
}

#[test]
fn same_seed_gives_same_draws() {
    fn draws(seed: u64) -> Vec<u32> {
        let drawn = log();
        let sink = Rc::clone(&drawn);
        Simulation::builder()
            .config(config(&format!("simulation:\n  seed: {seed}\n")))
            .component(Component::new("dice", move |context| {
                for _ in 0..5 {
                    let value = context.rng().random_range(0..1000);
                    sink.borrow_mut().push(value);
                }
                Ok(())
            }))
            .build()
            .unwrap();
        drawn.take()
    }

    assert_eq!(draws(11), draws(11));
    assert_ne!(draws(11), draws(12));
}
