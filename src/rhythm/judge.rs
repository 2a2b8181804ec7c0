//! Shake timing judgement.
//!
//! # Matching
//!
//! Expected times are visited in ascending order. Each one claims the closest
//! observed shake that has not been claimed yet, provided the distance is
//! within the good window. Equal distances go to the shake seen first.
//!
//! This is a greedy, expectation-first assignment rather than a globally
//! optimal one: an early expected time can take a shake that would have fit a
//! later expected time better. Scores depend on this exact behavior.
//!
//! Shakes left unclaimed at the end are counted as extra.

use log::debug;

use super::core::STEPS_PER_MEASURE;
use super::pattern::Pattern;
use crate::error::{ConfigurationError, Result};

/// Timing tolerances in seconds, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindows {
    pub perfect: f64,
    pub good: f64,
}

impl JudgeWindows {
    /// Creates windows, requiring `0 <= perfect < good`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shakebeat::JudgeWindows;
    ///
    /// assert!(JudgeWindows::new(0.1, 0.2).is_ok());
    /// assert!(JudgeWindows::new(0.2, 0.1).is_err());
    /// ```
    pub fn new(perfect: f64, good: f64) -> Result<Self> {
        if !(perfect >= 0.0 && perfect < good && good.is_finite()) {
            return Err(ConfigurationError::InvalidTolerance { perfect, good });
        }
        Ok(Self { perfect, good })
    }

    /// Grades an absolute time difference. `None` means outside both windows.
    pub fn grade(&self, diff: f64) -> Option<Grade> {
        if diff <= self.perfect {
            Some(Grade::Perfect)
        } else if diff <= self.good {
            Some(Grade::Good)
        } else {
            None
        }
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect: 0.1,
            good: 0.2,
        }
    }
}

/// Classification of one expected shake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    Perfect,
    Good,
    Miss,
}

/// How one expected time was judged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgement {
    pub expected: f64,
    /// The shake that was claimed, if any
    pub observed: Option<f64>,
    pub grade: Grade,
}

/// Counts produced by one evaluation.
///
/// `perfect + good + missed` equals the number of expected times, and
/// `extra` equals the number of observed shakes minus `perfect + good`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct MatchResult {
    pub perfect: u32,
    pub good: u32,
    pub missed: u32,
    pub extra: u32,
}

impl MatchResult {
    /// Number of expected shakes this result accounts for.
    pub fn total_expected(&self) -> u32 {
        self.perfect + self.good + self.missed
    }

    /// Number of observed shakes this result accounts for.
    pub fn total_observed(&self) -> u32 {
        self.perfect + self.good + self.extra
    }
}

/// Full output of [`match_events`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub result: MatchResult,
    /// One entry per expected time, in order
    pub judgements: Vec<Judgement>,
    /// Observed times that nothing claimed, in arrival order
    pub extras: Vec<f64>,
}

/// Matches observed shakes against expected times.
///
/// `expected` must be ascending; `observed` is in arrival order.
///
/// # Examples
///
/// ```
/// use shakebeat::{match_events, JudgeWindows};
///
/// let expected = [1.0, 2.0, 3.0];
/// let observed = [1.05, 2.15, 7.0];
/// let outcome = match_events(&expected, &observed, &JudgeWindows::new(0.1, 0.2)?);
///
/// assert_eq!(outcome.result.perfect, 1);
/// assert_eq!(outcome.result.good, 1);
/// assert_eq!(outcome.result.missed, 1);
/// assert_eq!(outcome.result.extra, 1);
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
pub fn match_events(expected: &[f64], observed: &[f64], windows: &JudgeWindows) -> MatchOutcome {
    let mut used = vec![false; observed.len()];
    let mut result = MatchResult::default();
    let mut judgements = Vec::with_capacity(expected.len());

    for &expected_time in expected {
        let mut closest: Option<(usize, f64, Grade)> = None;

        for (j, &observed_time) in observed.iter().enumerate() {
            if used[j] {
                continue;
            }

            let diff = (observed_time - expected_time).abs();
            // Strict comparison keeps the first of equally close shakes
            if let Some(grade) = windows.grade(diff)
                && closest.is_none_or(|(_, best, _)| diff < best)
            {
                closest = Some((j, diff, grade));
            }
        }

        let judgement = match closest {
            Some((j, _, grade)) => {
                used[j] = true;
                if grade == Grade::Perfect {
                    result.perfect += 1;
                } else {
                    result.good += 1;
                }
                Judgement {
                    expected: expected_time,
                    observed: Some(observed[j]),
                    grade,
                }
            }
            None => {
                result.missed += 1;
                Judgement {
                    expected: expected_time,
                    observed: None,
                    grade: Grade::Miss,
                }
            }
        };
        judgements.push(judgement);
    }

    let extras: Vec<f64> = observed
        .iter()
        .zip(&used)
        .filter_map(|(&t, &claimed)| (!claimed).then_some(t))
        .collect();
    result.extra = extras.len() as u32;

    MatchOutcome {
        result,
        judgements,
        extras,
    }
}

/// State of one judged phase.
///
/// Created when the machine enters `UserInput` and dropped after evaluation.
/// Expected times come only from the judged pattern, repeated for the
/// configured number of measures.
///
/// # Examples
///
/// ```
/// use shakebeat::{JudgementSession, JudgeWindows, Pattern};
///
/// let mut steps = [false; 16];
/// steps[0] = true;
/// steps[8] = true;
/// let pattern = Pattern::new("half", steps);
///
/// // 120 BPM: 0.125 s per step, judged phase starts at t = 4.0
/// let mut session = JudgementSession::new(&pattern, 4.0, 0.125, 2, 64);
/// assert_eq!(session.expected_times(), &[4.0, 5.0, 6.0, 7.0]);
///
/// session.record_shake(4.02);
/// let outcome = session.evaluate(&JudgeWindows::default());
/// assert_eq!(outcome.result.perfect, 1);
/// assert_eq!(outcome.result.missed, 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JudgementSession {
    start_time: f64,
    expected: Vec<f64>,
    observed: Vec<f64>,
    capacity: usize,
    dropped: usize,
}

impl JudgementSession {
    /// Builds a session starting at `start_time`.
    ///
    /// At most `capacity` shakes are kept; later ones are dropped.
    pub fn new(
        pattern: &Pattern,
        start_time: f64,
        step_duration: f64,
        measures: u32,
        capacity: usize,
    ) -> Self {
        let mut expected = Vec::with_capacity(pattern.hit_count() * measures as usize);
        for measure in 0..measures as usize {
            for step in pattern.flagged_steps() {
                let n = measure * STEPS_PER_MEASURE + step;
                expected.push(start_time + n as f64 * step_duration);
            }
        }

        Self {
            start_time,
            expected,
            observed: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Appends a shake timestamp. Returns false if the session is full.
    pub fn record_shake(&mut self, time: f64) -> bool {
        if self.observed.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.observed.push(time);
        true
    }

    /// Judges the recorded shakes. Does not modify the session.
    pub fn evaluate(&self, windows: &JudgeWindows) -> MatchOutcome {
        let outcome = match_events(&self.expected, &self.observed, windows);

        for judgement in &outcome.judgements {
            let expected = judgement.expected - self.start_time;
            match judgement.observed {
                Some(observed) => debug!(
                    "{:?}: expected {:.2}s, actual {:.2}s, diff {:.3}s",
                    judgement.grade,
                    expected,
                    observed - self.start_time,
                    (observed - judgement.expected).abs()
                ),
                None => debug!("Miss: expected {:.2}s", expected),
            }
        }
        for extra in &outcome.extras {
            debug!("extra shake at {:.2}s", extra - self.start_time);
        }

        outcome
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn expected_times(&self) -> &[f64] {
        &self.expected
    }

    pub fn observed_times(&self) -> &[f64] {
        &self.observed
    }

    /// Number of shakes rejected because the session was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows() -> JudgeWindows {
        JudgeWindows::new(0.1, 0.2).unwrap()
    }

    fn four_on_floor() -> Pattern {
        let mut steps = [false; 16];
        for step in [0, 4, 8, 12] {
            steps[step] = true;
        }
        Pattern::new("four", steps)
    }

    #[test]
    fn test_invalid_windows() {
        assert!(JudgeWindows::new(0.2, 0.2).is_err());
        assert!(JudgeWindows::new(-0.1, 0.2).is_err());
        assert!(JudgeWindows::new(f64::NAN, 0.2).is_err());
        assert!(JudgeWindows::new(0.1, f64::INFINITY).is_err());
    }

    #[test]
    fn test_grade_boundaries_are_inclusive() {
        let w = JudgeWindows::new(0.25, 0.5).unwrap();
        assert_eq!(w.grade(0.0), Some(Grade::Perfect));
        assert_eq!(w.grade(0.25), Some(Grade::Perfect));
        assert_eq!(w.grade(0.5), Some(Grade::Good));
        assert_eq!(w.grade(0.75), None);
    }

    #[test]
    fn test_empty_inputs() {
        let outcome = match_events(&[], &[], &windows());
        assert_eq!(outcome.result, MatchResult::default());

        let outcome = match_events(&[], &[1.0, 2.0], &windows());
        assert_eq!(outcome.result.extra, 2);

        let outcome = match_events(&[1.0, 2.0], &[], &windows());
        assert_eq!(outcome.result.missed, 2);
    }

    #[test]
    fn test_nearest_shake_is_claimed() {
        let outcome = match_events(&[1.0], &[0.85, 1.02, 1.15], &windows());
        assert_eq!(outcome.result.perfect, 1);
        assert_eq!(outcome.result.extra, 2);
        assert_eq!(outcome.judgements[0].observed, Some(1.02));
        assert_eq!(outcome.extras, vec![0.85, 1.15]);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let outcome = match_events(&[1.0], &[1.125, 0.875], &windows());
        assert_eq!(outcome.judgements[0].observed, Some(1.125));
        assert_eq!(outcome.extras, vec![0.875]);
    }

    #[test]
    fn test_greedy_expectation_first() {
        // The shake at 1.15 sits closer to 1.2 but 1.0 claims it first,
        // leaving 1.2 only the shake at 1.35.
        let outcome = match_events(&[1.0, 1.2], &[1.15, 1.35], &windows());
        assert_eq!(outcome.judgements[0].observed, Some(1.15));
        assert_eq!(outcome.judgements[0].grade, Grade::Good);
        assert_eq!(outcome.judgements[1].observed, Some(1.35));
        assert_eq!(outcome.judgements[1].grade, Grade::Good);
        assert_eq!(outcome.result.good, 2);
    }

    #[test]
    fn test_misses_are_unclaimed_expectations() {
        let w = JudgeWindows::new(0.25, 0.5).unwrap();
        let outcome = match_events(&[1.0, 2.0, 3.0], &[1.5, 2.75, 3.0], &w);

        assert_eq!(outcome.judgements[0].grade, Grade::Good);
        assert_eq!(outcome.judgements[1].observed, None);
        assert_eq!(outcome.judgements[1].grade, Grade::Miss);
        assert_eq!(outcome.judgements[2].grade, Grade::Perfect);
        assert_eq!(outcome.extras, vec![2.75]);

        let unclaimed = outcome
            .judgements
            .iter()
            .filter(|j| j.observed.is_none())
            .count();
        assert_eq!(outcome.result.missed as usize, unclaimed);
        assert!(
            outcome
                .judgements
                .iter()
                .filter(|j| j.observed.is_some())
                .all(|j| j.grade != Grade::Miss)
        );
    }

    #[test]
    fn test_shake_is_claimed_once() {
        let outcome = match_events(&[1.0, 1.1], &[1.05], &windows());
        assert_eq!(outcome.result.perfect, 1);
        assert_eq!(outcome.result.missed, 1);
        assert_eq!(outcome.result.extra, 0);
    }

    #[test]
    fn test_session_expected_times() {
        let session = JudgementSession::new(&four_on_floor(), 10.0, 0.125, 1, 16);
        assert_eq!(session.expected_times(), &[10.0, 10.5, 11.0, 11.5]);
        assert_eq!(session.start_time(), 10.0);

        let session = JudgementSession::new(&four_on_floor(), 0.0, 0.125, 3, 16);
        assert_eq!(session.expected_times().len(), 12);
        assert!(session.expected_times().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(session.expected_times()[4], 2.0);
    }

    #[test]
    fn test_session_capacity() {
        let mut session = JudgementSession::new(&four_on_floor(), 0.0, 0.125, 1, 2);
        assert!(session.record_shake(0.0));
        assert!(session.record_shake(0.5));
        assert!(!session.record_shake(1.0));
        assert_eq!(session.observed_times(), &[0.0, 0.5]);
        assert_eq!(session.dropped(), 1);
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let mut session = JudgementSession::new(&four_on_floor(), 0.0, 0.125, 1, 16);
        for t in [0.01, 0.45, 0.9, 1.6, 3.0] {
            session.record_shake(t);
        }
        let first = session.evaluate(&windows());
        let second = session.evaluate(&windows());
        assert_eq!(first, second);
    }
}
