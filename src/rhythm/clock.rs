//! Clock-anchored step timing.
//!
//! The `StepClock` converts a tempo and a start time into absolute step
//! deadlines on an external monotonic clock. It is the only timing authority
//! of the machine.

use std::time::Instant;

use super::core::STEPS_PER_MEASURE;
use crate::error::{ConfigurationError, Result};

/// Number of steps per beat (16th notes).
pub const STEPS_PER_BEAT: u32 = 4;

/// A monotonic clock measured in seconds.
///
/// Hosts usually back this with the audio device clock so that steps line up
/// with what is actually heard.
pub trait AudioClock {
    /// Current absolute time in seconds. Must never go backwards.
    fn now(&self) -> f64;
}

/// An [`AudioClock`] backed by [`Instant`], counting from its creation.
///
/// # Examples
///
/// ```
/// use shakebeat::{AudioClock, MonotonicClock};
///
/// let clock = MonotonicClock::new();
/// let a = clock.now();
/// let b = clock.now();
/// assert!(b >= a);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Result of [`StepClock::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Step within the measure that is due next (0-15)
    pub step: usize,
    /// True when the step just processed was the last of its measure
    pub measure_completed: bool,
}

/// Absolute step scheduler.
///
/// Step `n` is due at `start_time + n * step_duration`. Every deadline is
/// computed from the same anchor, so irregular polling never accumulates drift.
///
/// Checking and advancing are separate: [`is_step_due`](Self::is_step_due)
/// never mutates, and the caller calls [`advance`](Self::advance) once after
/// processing the due step.
///
/// # Examples
///
/// ```
/// use shakebeat::StepClock;
///
/// // 120 BPM, starting at t = 10.0
/// let mut clock = StepClock::initialize(120.0, 10.0, 0.0)?;
/// assert_eq!(clock.step_duration(), 0.125);
///
/// assert!(!clock.is_step_due(9.99));
/// assert!(clock.is_step_due(10.0));
///
/// let advance = clock.advance();
/// assert_eq!(advance.step, 1);
/// assert!(!advance.measure_completed);
/// assert!(!clock.is_step_due(10.1));
/// assert!(clock.is_step_due(10.125));
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StepClock {
    /// Tempo in beats per minute
    bpm: f64,
    /// Absolute time of step 0
    start_time: f64,
    /// Length of one sixteenth step in seconds
    step_duration: f64,
    /// Step within the measure that is due next
    current_step: usize,
    /// Steps processed since start
    total_step_count: u64,
}

impl StepClock {
    /// Creates a clock whose first step is due `start_delay` seconds after `now`.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveBpm` if `bpm` is not a finite number above 0.
    pub fn initialize(bpm: f64, now: f64, start_delay: f64) -> Result<Self> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConfigurationError::NonPositiveBpm(bpm));
        }

        Ok(Self {
            bpm,
            start_time: now + start_delay,
            step_duration: Self::calculate_step_duration(bpm),
            current_step: 0,
            total_step_count: 0,
        })
    }

    /// Seconds per step: `60 / (bpm * 4)`.
    fn calculate_step_duration(bpm: f64) -> f64 {
        60.0 / (bpm * STEPS_PER_BEAT as f64)
    }

    /// Returns true if the next step's deadline has been reached.
    pub fn is_step_due(&self, now: f64) -> bool {
        now >= self.next_step_time()
    }

    /// Marks the due step as processed and moves to the next one.
    pub fn advance(&mut self) -> Advance {
        self.total_step_count = self.total_step_count.wrapping_add(1);
        self.current_step = (self.total_step_count % STEPS_PER_MEASURE as u64) as usize;

        Advance {
            step: self.current_step,
            measure_completed: self.current_step == 0,
        }
    }

    /// Absolute time of step `n` counted from the start.
    pub fn step_time(&self, n: u64) -> f64 {
        self.start_time + n as f64 * self.step_duration
    }

    /// Absolute deadline of the step that is due next.
    pub fn next_step_time(&self) -> f64 {
        self.step_time(self.total_step_count)
    }

    /// Absolute time of the next downbeat after the step that is due next.
    ///
    /// While a measure is in progress this is the time it ends.
    pub fn next_measure_time(&self) -> f64 {
        let measure = STEPS_PER_MEASURE as u64;
        self.step_time((self.total_step_count / measure + 1) * measure)
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_step_count(&self) -> u64 {
        self.total_step_count
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn step_duration(&self) -> f64 {
        self.step_duration
    }

    /// Length of one measure in seconds.
    pub fn measure_duration(&self) -> f64 {
        self.step_duration * STEPS_PER_MEASURE as f64
    }

    pub fn tempo(&self) -> f64 {
        self.bpm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize() {
        let clock = StepClock::initialize(120.0, 5.0, 3.0).unwrap();
        assert_eq!(clock.start_time(), 8.0);
        assert_eq!(clock.step_duration(), 0.125);
        assert_eq!(clock.measure_duration(), 2.0);
        assert_eq!(clock.current_step(), 0);
        assert_eq!(clock.total_step_count(), 0);
        assert_eq!(clock.tempo(), 120.0);
    }

    #[test]
    fn test_invalid_bpm() {
        for bpm in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                StepClock::initialize(bpm, 0.0, 0.0),
                Err(ConfigurationError::NonPositiveBpm(_))
            ));
        }
    }

    #[test]
    fn test_is_step_due_does_not_mutate() {
        let clock = StepClock::initialize(120.0, 0.0, 1.0).unwrap();
        assert!(!clock.is_step_due(0.5));
        assert!(clock.is_step_due(1.0));
        assert!(clock.is_step_due(1.0));
        assert_eq!(clock.total_step_count(), 0);
    }

    #[test]
    fn test_advance_wraps_at_measure() {
        let mut clock = StepClock::initialize(120.0, 0.0, 0.0).unwrap();

        for expected in 1..16 {
            let advance = clock.advance();
            assert_eq!(advance.step, expected);
            assert!(!advance.measure_completed);
        }

        let advance = clock.advance();
        assert_eq!(advance.step, 0);
        assert!(advance.measure_completed);
        assert_eq!(clock.total_step_count(), 16);
    }

    #[test]
    fn test_next_measure_time() {
        let mut clock = StepClock::initialize(120.0, 0.0, 1.0).unwrap();
        assert_eq!(clock.next_measure_time(), 3.0);

        for _ in 0..15 {
            clock.advance();
        }
        assert_eq!(clock.next_measure_time(), 3.0);

        clock.advance();
        assert_eq!(clock.next_step_time(), 3.0);
        assert_eq!(clock.next_measure_time(), 5.0);
    }

    #[test]
    fn test_deadlines_are_anchored() {
        let mut clock = StepClock::initialize(90.0, 0.0, 0.0).unwrap();
        let duration = clock.step_duration();

        for _ in 0..1000 {
            clock.advance();
        }

        // Computed from the anchor, not accumulated
        assert_eq!(clock.next_step_time(), 1000.0 * duration);
        assert_eq!(clock.step_time(1000), clock.next_step_time());
    }

    #[test]
    fn test_irregular_polling_never_skips() {
        let mut clock = StepClock::initialize(120.0, 0.0, 0.0).unwrap();
        let mut steps = Vec::new();

        // Poll at uneven intervals, each shorter than a step
        let mut now = 0.0;
        let intervals = [0.01, 0.1, 0.03, 0.12, 0.07];
        let mut i = 0;
        while clock.total_step_count() < 40 {
            if clock.is_step_due(now) {
                steps.push(clock.current_step());
                clock.advance();
            }
            now += intervals[i % intervals.len()];
            i += 1;
        }

        let expected: Vec<usize> = (0..40).map(|n| n % 16).collect();
        assert_eq!(steps, expected);
    }
}
