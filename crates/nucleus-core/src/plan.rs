//! Deterministic plan queue.
//!
//! A `BinaryHeap` with reversed `Ord` acts as a min-heap keyed by
//! `(time, sequence)`. Sequence numbers increase strictly with every
//! scheduled plan, so plans due at the same time run in the order they were
//! added and two runs of the same input execute plans identically.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::{Context, KernelError};

/// Work scheduled for a future simulation time.
pub type PlanAction = Box<dyn FnOnce(&mut Context) -> Result<(), KernelError>>;

/// Identifier of a scheduled plan, unique within one kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlanId(u64);

impl PlanId {
    /// Return the raw sequence number.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One scheduled plan.
pub struct Plan {
    time: f64,
    id: PlanId,
    action: PlanAction,
}

impl Plan {
    /// Return the time the plan is due.
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Return the plan's id.
    pub const fn id(&self) -> PlanId {
        self.id
    }

    /// Consume the plan and return its action.
    pub fn into_action(self) -> PlanAction {
        self.action
    }
}

impl core::fmt::Debug for Plan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Plan")
            .field("time", &self.time)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Plan {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Plan {}

impl PartialOrd for Plan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed so the heap pops the earliest `(time, id)` first.
impl Ord for Plan {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Pending plans of one kernel.
#[derive(Debug, Default)]
pub struct PlanQueue {
    queue: BinaryHeap<Plan>,
    next_id: u64,
}

impl PlanQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` at `time`. The caller validates the time.
    pub fn schedule(&mut self, time: f64, action: PlanAction) -> PlanId {
        let id = PlanId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.queue.push(Plan { time, id, action });
        id
    }

    /// Pop the next plan (earliest time, lowest id).
    pub fn pop_next(&mut self) -> Option<Plan> {
        self.queue.pop()
    }

    /// Return the time of the next plan.
    pub fn peek_time(&self) -> Option<f64> {
        self.queue.peek().map(Plan::time)
    }

    /// Return `true` if no plans are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Return the number of pending plans.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn noop() -> PlanAction {
        Box::new(|_| Ok(()))
    }

    #[test]
    fn same_time_plans_keep_insertion_order() {
        let mut plans = PlanQueue::new();
        let first = plans.schedule(10.0, noop());
        let second = plans.schedule(10.0, noop());
        let third = plans.schedule(10.0, noop());

        assert_eq!(plans.pop_next().unwrap().id(), first);
        assert_eq!(plans.pop_next().unwrap().id(), second);
        assert_eq!(plans.pop_next().unwrap().id(), third);
        assert!(plans.pop_next().is_none());
    }

    #[test]
    fn earlier_time_runs_first() {
        let mut plans = PlanQueue::new();
        plans.schedule(5.0, noop());
        let early = plans.schedule(1.0, noop());
        plans.schedule(3.0, noop());

        assert_eq!(plans.len(), 3);
        assert_eq!(plans.peek_time(), Some(1.0));
        assert_eq!(plans.pop_next().unwrap().id(), early);

        let times: Vec<f64> = std::iter::from_fn(|| plans.pop_next().map(|p| p.time())).collect();
        assert_eq!(times, vec![3.0, 5.0]);
        assert!(plans.is_empty());
    }
}
