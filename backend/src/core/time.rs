//! Time management for the simulation
//!
//! The orchestrator advances in discrete ticks while events carry a
//! continuous `f64` timestamp. A tick maps onto the time axis as
//! `start_time + tick * tick_length`.

use serde::{Deserialize, Serialize};

/// Manages simulation time in discrete ticks
///
/// # Example
/// ```
/// use adoption_simulator_core_rs::TimeManager;
///
/// let mut time = TimeManager::new(2020.0, 1.0);
/// assert_eq!(time.current_tick(), 0);
/// assert_eq!(time.current_time(), 2020.0);
///
/// time.advance_tick();
/// assert_eq!(time.current_time(), 2021.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeManager {
    /// Time value of tick 0
    start_time: f64,
    /// Length of one tick on the time axis
    tick_length: f64,
    /// Total ticks elapsed since simulation start
    current_tick: usize,
}

impl TimeManager {
    /// Create a new TimeManager
    ///
    /// # Arguments
    /// * `start_time` - Time value at tick 0
    /// * `tick_length` - Time advanced by one tick (must be positive and finite)
    pub fn new(start_time: f64, tick_length: f64) -> Self {
        assert!(
            tick_length.is_finite() && tick_length > 0.0,
            "tick_length must be positive"
        );
        assert!(start_time.is_finite(), "start_time must be finite");
        Self {
            start_time,
            tick_length,
            current_tick: 0,
        }
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick (total ticks since start)
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }

    /// Get the time value of the current tick
    ///
    /// # Example
    /// ```
    /// use adoption_simulator_core_rs::TimeManager;
    ///
    /// let mut time = TimeManager::new(0.0, 0.25);
    /// for _ in 0..4 {
    ///     time.advance_tick();
    /// }
    /// assert_eq!(time.current_time(), 1.0);
    /// ```
    pub fn current_time(&self) -> f64 {
        self.time_of_tick(self.current_tick)
    }

    /// Time value of an arbitrary tick
    pub fn time_of_tick(&self, tick: usize) -> f64 {
        self.start_time + tick as f64 * self.tick_length
    }

    /// Time value of tick 0
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Length of one tick
    pub fn tick_length(&self) -> f64 {
        self.tick_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "tick_length must be positive")]
    fn test_zero_tick_length_panics() {
        TimeManager::new(0.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "tick_length must be positive")]
    fn test_nan_tick_length_panics() {
        TimeManager::new(0.0, f64::NAN);
    }

    #[test]
    fn test_time_of_tick_is_linear() {
        let time = TimeManager::new(10.0, 0.5);
        assert_eq!(time.time_of_tick(0), 10.0);
        assert_eq!(time.time_of_tick(3), 11.5);
    }
}
