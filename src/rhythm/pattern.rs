//! Fixed-length binary rhythm patterns.
//!
//! A `Pattern` is one measure of sixteen on/off steps. Patterns carry no
//! timing of their own; the `StepClock` decides when each step happens.
//! A `PatternSet` is the validated, read-only collection the machine picks from.

use std::ops::Index;

use serde::Deserialize;

use super::core::STEPS_PER_MEASURE;
use crate::error::{ConfigurationError, Result};

/// A named 16-step binary pattern.
///
/// # Examples
///
/// ```
/// use shakebeat::Pattern;
///
/// let pattern = Pattern::from_values("four", &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0])?;
/// assert_eq!(pattern.name(), "four");
/// assert_eq!(pattern.hit_count(), 4);
/// assert!(pattern.is_set(4));
/// assert!(!pattern.is_set(5));
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPattern")]
pub struct Pattern {
    name: String,
    steps: [bool; STEPS_PER_MEASURE],
}

/// Serialized shape: `{"name": "...", "pattern": [0, 1, ...]}`.
#[derive(Deserialize)]
struct RawPattern {
    name: String,
    pattern: Vec<u8>,
}

impl TryFrom<RawPattern> for Pattern {
    type Error = ConfigurationError;

    fn try_from(raw: RawPattern) -> Result<Self> {
        Pattern::from_values(raw.name, &raw.pattern)
    }
}

impl Pattern {
    /// Creates a pattern from already-validated flags.
    ///
    /// # Examples
    ///
    /// ```
    /// use shakebeat::Pattern;
    ///
    /// let mut steps = [false; 16];
    /// steps[0] = true;
    /// let pattern = Pattern::new("downbeat", steps);
    /// assert_eq!(pattern.flagged_steps().collect::<Vec<_>>(), vec![0]);
    /// ```
    pub fn new(name: impl Into<String>, steps: [bool; STEPS_PER_MEASURE]) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Creates a pattern from raw `0`/`1` values.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPattern` if `values` is not exactly 16 long and
    /// `InvalidStepValue` for anything other than 0 or 1.
    pub fn from_values(name: impl Into<String>, values: &[u8]) -> Result<Self> {
        let name = name.into();
        if values.len() != STEPS_PER_MEASURE {
            return Err(ConfigurationError::MalformedPattern {
                name,
                len: values.len(),
            });
        }

        let mut steps = [false; STEPS_PER_MEASURE];
        for (step, &value) in values.iter().enumerate() {
            steps[step] = match value {
                0 => false,
                1 => true,
                _ => {
                    return Err(ConfigurationError::InvalidStepValue { name, step, value });
                }
            };
        }

        Ok(Self { name, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[bool; STEPS_PER_MEASURE] {
        &self.steps
    }

    /// Returns true if `step` is flagged. Steps outside the measure are never set.
    pub fn is_set(&self, step: usize) -> bool {
        self.steps.get(step).copied().unwrap_or(false)
    }

    /// Iterates over the indices of flagged steps in ascending order.
    pub fn flagged_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(step, &set)| set.then_some(step))
    }

    /// Number of flagged steps.
    pub fn hit_count(&self) -> usize {
        self.steps.iter().filter(|&&set| set).count()
    }
}

/// A non-empty, read-only collection of patterns.
///
/// Selections refer to patterns by index into this set.
///
/// # Examples
///
/// ```
/// use shakebeat::{Pattern, PatternSet, ConfigurationError};
///
/// assert_eq!(PatternSet::new(vec![]).unwrap_err(), ConfigurationError::EmptyPatternSet);
///
/// let set = PatternSet::new(vec![Pattern::new("rest", [false; 16])])?;
/// assert_eq!(set.len(), 1);
/// assert_eq!(set[0].name(), "rest");
/// # Ok::<(), ConfigurationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPatternSet")]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

#[derive(Deserialize)]
struct RawPatternSet {
    patterns: Vec<Pattern>,
}

impl TryFrom<RawPatternSet> for PatternSet {
    type Error = ConfigurationError;

    fn try_from(raw: RawPatternSet) -> Result<Self> {
        PatternSet::new(raw.patterns)
    }
}

impl PatternSet {
    /// Wraps a list of patterns.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPatternSet` if `patterns` is empty.
    pub fn new(patterns: Vec<Pattern>) -> Result<Self> {
        if patterns.is_empty() {
            return Err(ConfigurationError::EmptyPatternSet);
        }
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pattern> {
        self.patterns.iter()
    }

    /// Finds a pattern by name.
    pub fn find(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.name == name)
    }
}

impl Index<usize> for PatternSet {
    type Output = Pattern;

    fn index(&self, index: usize) -> &Pattern {
        &self.patterns[index]
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a Pattern;
    type IntoIter = std::slice::Iter<'a, Pattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.patterns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR: [u8; 16] = [1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0];

    #[test]
    fn test_from_values() {
        let pattern = Pattern::from_values("four", &FOUR).unwrap();
        assert_eq!(pattern.name(), "four");
        assert_eq!(pattern.hit_count(), 4);
        assert_eq!(
            pattern.flagged_steps().collect::<Vec<_>>(),
            vec![0, 4, 8, 12]
        );
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = Pattern::from_values("short", &[1, 0, 1]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MalformedPattern {
                name: "short".to_string(),
                len: 3
            }
        );

        let long = [0u8; 17];
        assert!(matches!(
            Pattern::from_values("long", &long),
            Err(ConfigurationError::MalformedPattern { len: 17, .. })
        ));
    }

    #[test]
    fn test_non_binary_value_is_rejected() {
        let mut values = FOUR;
        values[3] = 2;
        let err = Pattern::from_values("bad", &values).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidStepValue {
                name: "bad".to_string(),
                step: 3,
                value: 2
            }
        );
    }

    #[test]
    fn test_is_set_out_of_range() {
        let pattern = Pattern::new("all", [true; 16]);
        assert!(pattern.is_set(15));
        assert!(!pattern.is_set(16));
    }

    #[test]
    fn test_empty_set_is_rejected() {
        assert_eq!(
            PatternSet::new(Vec::new()).unwrap_err(),
            ConfigurationError::EmptyPatternSet
        );
    }

    #[test]
    fn test_set_lookup() {
        let set = PatternSet::new(vec![
            Pattern::from_values("four", &FOUR).unwrap(),
            Pattern::new("rest", [false; 16]),
        ])
        .unwrap();

        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert_eq!(set[1].name(), "rest");
        assert!(set.get(2).is_none());
        assert_eq!(set.find("four").map(Pattern::hit_count), Some(4));
        assert!(set.find("missing").is_none());
        assert_eq!(set.iter().count(), 2);
    }
}
