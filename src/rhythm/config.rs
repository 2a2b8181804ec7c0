//! Machine configuration.

use serde::Deserialize;

use super::judge::JudgeWindows;
use super::score::{DEFAULT_PASS_THRESHOLD, ScoreEvaluator};
use crate::error::{ConfigurationError, Result};

/// Tunables for a [`RhythmMachine`](crate::RhythmMachine).
///
/// Every field has a default, so partial configs deserialize cleanly.
///
/// # Examples
///
/// ```
/// use shakebeat::JudgeConfig;
///
/// let config = JudgeConfig::default()
///     .with_bpm(100.0)
///     .with_user_input_measures(2);
/// assert!(config.validate().is_ok());
///
/// assert!(JudgeConfig::default().with_bpm(0.0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Tempo in beats per minute
    pub bpm: f64,
    /// Max distance in seconds for a perfect shake
    pub perfect_accuracy: f64,
    /// Max distance in seconds for a good shake
    pub good_accuracy: f64,
    /// Measures in each judged phase
    pub user_input_measures: u32,
    /// Score deducted per extra shake
    pub extra_shake_penalty: f64,
    /// Lead-in before the first step, in seconds
    pub start_delay: f64,
    /// Minimum score for a pass
    pub pass_threshold: f64,
    /// Emit metronome clicks
    pub metronome_enabled: bool,
    /// Max shakes recorded per judged phase
    pub shake_capacity: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            perfect_accuracy: 0.1,
            good_accuracy: 0.2,
            user_input_measures: 1,
            extra_shake_penalty: 0.5,
            start_delay: 3.0,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            metronome_enabled: true,
            shake_capacity: 256,
        }
    }
}

impl JudgeConfig {
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn with_accuracy(mut self, perfect: f64, good: f64) -> Self {
        self.perfect_accuracy = perfect;
        self.good_accuracy = good;
        self
    }

    pub fn with_user_input_measures(mut self, measures: u32) -> Self {
        self.user_input_measures = measures;
        self
    }

    pub fn with_extra_shake_penalty(mut self, penalty: f64) -> Self {
        self.extra_shake_penalty = penalty;
        self
    }

    pub fn with_start_delay(mut self, seconds: f64) -> Self {
        self.start_delay = seconds;
        self
    }

    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub fn with_metronome(mut self, enabled: bool) -> Self {
        self.metronome_enabled = enabled;
        self
    }

    pub fn with_shake_capacity(mut self, capacity: usize) -> Self {
        self.shake_capacity = capacity;
        self
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigurationError` found.
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(ConfigurationError::NonPositiveBpm(self.bpm));
        }
        self.windows()?;
        if self.user_input_measures == 0 {
            return Err(ConfigurationError::ZeroUserInputMeasures);
        }
        if !self.extra_shake_penalty.is_finite() || self.extra_shake_penalty < 0.0 {
            return Err(ConfigurationError::NegativePenalty(self.extra_shake_penalty));
        }
        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            return Err(ConfigurationError::NegativeStartDelay(self.start_delay));
        }
        if self.shake_capacity == 0 {
            return Err(ConfigurationError::ZeroShakeCapacity);
        }
        self.evaluator()?;
        Ok(())
    }

    /// Timing windows described by this config.
    pub fn windows(&self) -> Result<JudgeWindows> {
        JudgeWindows::new(self.perfect_accuracy, self.good_accuracy)
    }

    /// Score evaluator described by this config.
    pub fn evaluator(&self) -> Result<ScoreEvaluator> {
        ScoreEvaluator::new(self.extra_shake_penalty)?.with_pass_threshold(self.pass_threshold)
    }
}
