//! Dense, lazily filled storage shared by all manager variants.

use nucleus_types::{EntityId, SimClock};

use crate::{PropertyError, TimeTrackingPolicy};

/// Convert an entity id into a storage index.
pub(crate) fn index_of(id: EntityId) -> Result<usize, PropertyError> {
    id.index()
        .ok_or(PropertyError::NegativeIndex { index: id.raw() })
}

/// Validate an initial capacity.
pub(crate) fn initial_size(size: i64) -> Result<usize, PropertyError> {
    usize::try_from(size).map_err(|_e| PropertyError::NegativeInitialSize { size })
}

/// Make room in `values` for slot `index`.
pub(crate) fn reserve_through<T>(values: &mut Vec<T>, index: usize) -> Result<(), PropertyError> {
    let needed = index
        .checked_add(1)
        .ok_or(PropertyError::StorageExhausted { index })?;
    values
        .try_reserve(needed.saturating_sub(values.len()))
        .map_err(|_e| PropertyError::StorageExhausted { index })
}

/// Validate a capacity increment.
pub(crate) fn increment(count: i64) -> Result<usize, PropertyError> {
    usize::try_from(count).map_err(|_e| PropertyError::NegativeCapacityIncrement { increment: count })
}

/// A growable column of values with a fill value for unset slots.
///
/// Only the prefix up to the highest assigned index is materialized; reads
/// past it return the fill value. Capacity is a logical count that only
/// ever grows and never allocates.
#[derive(Debug, Clone)]
pub struct DenseColumn<T> {
    values: Vec<T>,
    fill: T,
    capacity: usize,
}

impl<T: Clone> DenseColumn<T> {
    /// Create a column that reads `fill` everywhere.
    pub fn new(fill: T, capacity: usize) -> Self {
        Self {
            values: Vec::new(),
            fill,
            capacity,
        }
    }

    /// Read the value at `index`.
    pub fn get(&self, index: usize) -> &T {
        self.values.get(index).unwrap_or(&self.fill)
    }

    /// Allocate every slot up to `index` so a following `set` cannot fail.
    pub fn reserve_through(&mut self, index: usize) -> Result<(), PropertyError> {
        reserve_through(&mut self.values, index)
    }

    /// Write `value` at `index`, materializing every slot before it.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), PropertyError> {
        if index >= self.values.len() {
            self.reserve_through(index)?;
            self.values.resize(index.saturating_add(1), self.fill.clone());
            self.capacity = self.capacity.max(self.values.len());
        }
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
        Ok(())
    }

    /// Raise the logical capacity by `additional` slots.
    pub const fn grow(&mut self, additional: usize) {
        self.capacity = self.capacity.saturating_add(additional);
    }

    /// Return the logical capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Assignment times of one property, present only when tracking is on.
#[derive(Debug, Clone)]
pub(crate) struct AssignmentTimes {
    clock: SimClock,
    times: Option<DenseColumn<f64>>,
}

impl AssignmentTimes {
    /// Unset ids report the time the manager was created.
    pub(crate) fn new(policy: TimeTrackingPolicy, clock: SimClock, capacity: usize) -> Self {
        let times = policy
            .is_on()
            .then(|| DenseColumn::new(clock.now(), capacity));
        Self { clock, times }
    }

    /// Allocate the time slot for `index` ahead of a value write.
    pub(crate) fn reserve_through(&mut self, index: usize) -> Result<(), PropertyError> {
        self.times
            .as_mut()
            .map_or(Ok(()), |times| times.reserve_through(index))
    }

    pub(crate) fn record(&mut self, index: usize) -> Result<(), PropertyError> {
        let now = self.clock.now();
        self.times
            .as_mut()
            .map_or(Ok(()), |times| times.set(index, now))
    }

    pub(crate) fn get(&self, index: usize) -> Result<f64, PropertyError> {
        self.times
            .as_ref()
            .map(|times| *times.get(index))
            .ok_or(PropertyError::TimeTrackingOff)
    }

    pub(crate) const fn grow(&mut self, additional: usize) {
        if let Some(times) = &mut self.times {
            times.grow(additional);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unset_slots_read_fill() {
        let mut column = DenseColumn::new(-1_i64, 0);
        assert_eq!(*column.get(10), -1);

        column.set(3, 8).unwrap();
        assert_eq!(*column.get(3), 8);
        assert_eq!(*column.get(2), -1);
        assert_eq!(*column.get(4), -1);
    }

    #[test]
    fn capacity_only_grows() {
        let mut column = DenseColumn::new(0_u8, 5);
        assert_eq!(column.capacity(), 5);
        column.grow(10);
        assert_eq!(column.capacity(), 15);
        column.set(40, 1).unwrap();
        assert_eq!(column.capacity(), 41);
        column.grow(0);
        assert_eq!(column.capacity(), 41);
    }

    #[test]
    fn huge_capacity_is_bookkeeping_only() {
        let mut column = DenseColumn::new(7_i64, usize::MAX);
        column.grow(usize::MAX);
        assert_eq!(column.capacity(), usize::MAX);
        assert_eq!(*column.get(usize::MAX), 7);

        assert_eq!(
            column.set(usize::MAX, 1),
            Err(PropertyError::StorageExhausted { index: usize::MAX })
        );
        let huge = usize::MAX.saturating_sub(1);
        assert_eq!(column.set(huge, 1), Err(PropertyError::StorageExhausted { index: huge }));
        assert_eq!(*column.get(0), 7);

        column.set(2, 9).unwrap();
        assert_eq!(*column.get(2), 9);
    }

    #[test]
    fn boundary_validation() {
        assert_eq!(
            index_of(EntityId::new(-3)),
            Err(PropertyError::NegativeIndex { index: -3 })
        );
        assert_eq!(index_of(EntityId::new(3)), Ok(3));
        assert_eq!(initial_size(-1), Err(PropertyError::NegativeInitialSize { size: -1 }));
        assert_eq!(
            increment(-2),
            Err(PropertyError::NegativeCapacityIncrement { increment: -2 })
        );
        assert_eq!(increment(0), Ok(0));
    }

    #[test]
    fn times_follow_the_clock() {
        let clock = SimClock::new(1.5);
        let mut times = AssignmentTimes::new(TimeTrackingPolicy::On, clock.clone(), 0);
        clock.set(4.0);
        times.record(2).unwrap();

        assert!((times.get(2).unwrap() - 4.0).abs() < f64::EPSILON);
        assert!((times.get(9).unwrap() - 1.5).abs() < f64::EPSILON);

        let off = AssignmentTimes::new(TimeTrackingPolicy::Off, clock, 0);
        assert_eq!(off.get(0), Err(PropertyError::TimeTrackingOff));
    }
}
