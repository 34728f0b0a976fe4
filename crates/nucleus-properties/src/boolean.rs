//! Boolean property manager backed by a bitset.

use nucleus_types::{EntityId, SimClock};

use crate::column::{AssignmentTimes, increment, index_of, initial_size, reserve_through};
use crate::manager::{PropertyManager, check_type, required_default};
use crate::{PropertyDefinition, PropertyError, PropertyValue, ValueType};

const WORD_BITS: usize = 64;

/// Split a bit index into its word index and the bit mask within the word.
fn locate(index: usize) -> (usize, u64) {
    let word = index.checked_div(WORD_BITS).unwrap_or(0);
    let bit = index
        .checked_rem(WORD_BITS)
        .and_then(|bit| u32::try_from(bit).ok())
        .unwrap_or(0);
    (word, 1_u64.checked_shl(bit).unwrap_or(0))
}

/// Manager for [`ValueType::Boolean`] properties, one bit per entity.
///
/// Words are filled with the default pattern when created, so bits that were
/// never assigned read as the default without a separate length.
#[derive(Debug, Clone)]
pub struct BooleanPropertyManager {
    definition: PropertyDefinition,
    default: bool,
    words: Vec<u64>,
    capacity: usize,
    times: AssignmentTimes,
}

impl BooleanPropertyManager {
    /// Create a manager for `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::ImproperType`] if the definition is of
    /// another type, [`PropertyError::MissingDefault`] if it has no default,
    /// or [`PropertyError::NegativeInitialSize`] if `initial_capacity` is
    /// negative.
    pub fn new(
        definition: &PropertyDefinition,
        clock: SimClock,
        initial_capacity: i64,
    ) -> Result<Self, PropertyError> {
        check_type(definition, ValueType::Boolean)?;
        let default = required_default(definition, PropertyValue::as_boolean)?;
        let capacity = initial_size(initial_capacity)?;
        Ok(Self {
            definition: definition.clone(),
            default,
            words: Vec::new(),
            capacity,
            times: AssignmentTimes::new(definition.time_tracking(), clock, capacity),
        })
    }

    const fn fill_word(&self) -> u64 {
        if self.default { u64::MAX } else { 0 }
    }
}

impl PropertyManager for BooleanPropertyManager {
    type Value = bool;

    fn definition(&self) -> &PropertyDefinition {
        &self.definition
    }

    fn get_value(&self, id: EntityId) -> Result<bool, PropertyError> {
        let (word, mask) = locate(index_of(id)?);
        Ok(self
            .words
            .get(word)
            .map_or(self.default, |bits| bits & mask != 0))
    }

    fn set_value(&mut self, id: EntityId, value: bool) -> Result<(), PropertyError> {
        let index = index_of(id)?;
        let (word, mask) = locate(index);
        self.times.reserve_through(index)?;
        if word >= self.words.len() {
            reserve_through(&mut self.words, word).map_err(|_e| PropertyError::StorageExhausted { index })?;
            let fill = self.fill_word();
            self.words.resize(word.saturating_add(1), fill);
        }
        if let Some(bits) = self.words.get_mut(word) {
            if value {
                *bits |= mask;
            } else {
                *bits &= !mask;
            }
        }
        self.capacity = self.capacity.max(index.saturating_add(1));
        self.times.record(index)
    }

    fn get_time(&self, id: EntityId) -> Result<f64, PropertyError> {
        if !self.definition.time_tracking().is_on() {
            return Err(PropertyError::TimeTrackingOff);
        }
        self.times.get(index_of(id)?)
    }

    fn remove_id(&mut self, id: EntityId) -> Result<(), PropertyError> {
        index_of(id).map(|_index| ())
    }

    fn increment_capacity(&mut self, count: i64) -> Result<(), PropertyError> {
        let additional = increment(count)?;
        self.capacity = self.capacity.saturating_add(additional);
        self.times.grow(additional);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
