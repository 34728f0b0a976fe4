//! Shared simulation clock.
//!
//! One kernel instance runs on one thread, so the clock is a reference
//! counted cell rather than an atomic. Property managers keep a handle to
//! read the current time when recording assignments; only the kernel's run
//! loop advances it.

use std::cell::Cell;
use std::rc::Rc;

/// Handle to the simulation time of one kernel instance.
///
/// Cloning the handle shares the underlying time value.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<f64>>,
}

impl SimClock {
    /// Create a clock starting at `start`.
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Return the current simulation time.
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Move the clock to `time`.
    ///
    /// The kernel only ever moves time forward; this method does not check.
    pub fn set(&self, time: f64) {
        self.now.set(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_time() {
        let clock = SimClock::new(2.5);
        let view = clock.clone();
        clock.set(10.0);
        assert!((view.now() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_starts_at_zero() {
        assert!(SimClock::default().now().abs() < f64::EPSILON);
    }
}
