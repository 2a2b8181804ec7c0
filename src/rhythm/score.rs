//! Score and verdict computation.

use super::core::Instrument;
use super::judge::MatchResult;
use crate::error::{ConfigurationError, Result};

/// Points awarded for a good (not perfect) shake.
pub const GOOD_WEIGHT: f64 = 0.7;

/// Default score needed to pass.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.7;

/// Outcome of a judged phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        *self == Verdict::Pass
    }
}

/// Converts match counts into a score in `[0, 1]` and a verdict.
///
/// ```text
/// score = clamp((perfect + 0.7 * good - penalty * extra) / expected, 0, 1)
/// ```
///
/// A phase with no expected shakes scores 0. The evaluator holds only its
/// parameters, so the same counts always give the same score.
///
/// # Examples
///
/// ```
/// use shakebeat::{MatchResult, ScoreEvaluator, Verdict};
///
/// let evaluator = ScoreEvaluator::new(0.5)?;
/// let result = MatchResult { perfect: 3, good: 1, missed: 0, extra: 0 };
///
/// let (score, verdict) = evaluator.evaluate(&result);
/// assert!((score - 0.925).abs() < 1e-9);
/// assert_eq!(verdict, Verdict::Pass);
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEvaluator {
    extra_penalty: f64,
    pass_threshold: f64,
}

impl ScoreEvaluator {
    /// Creates an evaluator with the default pass threshold.
    ///
    /// # Errors
    ///
    /// Returns `NegativePenalty` unless `extra_penalty` is finite and >= 0.
    pub fn new(extra_penalty: f64) -> Result<Self> {
        if !extra_penalty.is_finite() || extra_penalty < 0.0 {
            return Err(ConfigurationError::NegativePenalty(extra_penalty));
        }
        Ok(Self {
            extra_penalty,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        })
    }

    /// Sets the pass threshold.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPassThreshold` if `threshold` is outside `[0, 1]`.
    pub fn with_pass_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigurationError::InvalidPassThreshold(threshold));
        }
        self.pass_threshold = threshold;
        Ok(self)
    }

    pub fn extra_penalty(&self) -> f64 {
        self.extra_penalty
    }

    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    pub fn score(&self, result: &MatchResult) -> f64 {
        let total = result.total_expected();
        if total == 0 {
            return 0.0;
        }

        let points = result.perfect as f64 + result.good as f64 * GOOD_WEIGHT;
        let penalty = result.extra as f64 * self.extra_penalty;
        ((points - penalty) / total as f64).clamp(0.0, 1.0)
    }

    pub fn verdict(&self, score: f64) -> Verdict {
        if score >= self.pass_threshold {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn evaluate(&self, result: &MatchResult) -> (f64, Verdict) {
        let score = self.score(result);
        (score, self.verdict(score))
    }
}

/// Everything the host learns about one judged phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub instrument: Instrument,
    pub result: MatchResult,
    pub score: f64,
    pub verdict: Verdict,
}
