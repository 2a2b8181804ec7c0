//! Per-measure pattern selection.

use log::{debug, warn};
use rand::Rng;

use super::core::Instrument;
use super::pattern::PatternSet;

/// The patterns chosen for one measure and the instrument being judged.
///
/// A new selection replaces the previous one every cycle; it is never
/// mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSelection {
    /// Index of the maracas pattern in the `PatternSet`
    pub maracas: usize,
    /// Index of the tambourine pattern in the `PatternSet`
    pub tambourine: usize,
    /// Instrument the user has to reproduce
    pub judged: Instrument,
    /// True when the set had fewer than two patterns and both indices are 0
    pub degraded: bool,
}

impl MeasureSelection {
    /// Pattern index for `instrument`.
    pub fn pattern_index(&self, instrument: Instrument) -> usize {
        match instrument {
            Instrument::Maracas => self.maracas,
            Instrument::Tambourine => self.tambourine,
        }
    }

    /// Pattern index of the judged instrument.
    pub fn judged_index(&self) -> usize {
        self.pattern_index(self.judged)
    }
}

impl Default for MeasureSelection {
    fn default() -> Self {
        Self {
            maracas: 0,
            tambourine: 0,
            judged: Instrument::Maracas,
            degraded: false,
        }
    }
}

/// Picks two distinct patterns per measure and a judged instrument.
///
/// Indices are drawn uniformly; the tambourine index is redrawn until it
/// differs from the maracas index. The judged instrument is a fair coin flip.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use shakebeat::{Pattern, PatternSet, PatternSelector};
///
/// let set = PatternSet::new(vec![
///     Pattern::new("a", [true; 16]),
///     Pattern::new("b", [false; 16]),
/// ])?;
///
/// let mut selector = PatternSelector::with_rng(rand::rngs::StdRng::seed_from_u64(7));
/// let selection = selector.select_next(&set);
/// assert_ne!(selection.maracas, selection.tambourine);
/// assert!(!selection.degraded);
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PatternSelector<R: Rng = rand::rngs::ThreadRng> {
    rng: R,
}

impl PatternSelector<rand::rngs::ThreadRng> {
    /// Creates a selector using the thread-local RNG.
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for PatternSelector<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PatternSelector<R> {
    /// Creates a selector with a custom RNG.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Chooses the patterns for the next measure.
    ///
    /// With fewer than two patterns both instruments get index 0 and the
    /// returned selection is marked `degraded`. This is not an error.
    pub fn select_next(&mut self, patterns: &PatternSet) -> MeasureSelection {
        let len = patterns.len();
        let judged = if self.rng.gen_bool(0.5) {
            Instrument::Maracas
        } else {
            Instrument::Tambourine
        };

        if len < 2 {
            warn!("fewer than 2 patterns available, both instruments use pattern 0");
            return MeasureSelection {
                maracas: 0,
                tambourine: 0,
                judged,
                degraded: true,
            };
        }

        let maracas = self.rng.gen_range(0..len);
        let mut tambourine = self.rng.gen_range(0..len);
        while tambourine == maracas {
            tambourine = self.rng.gen_range(0..len);
        }

        debug!(
            "selected maracas='{}' tambourine='{}' judged={}",
            patterns[maracas].name(),
            patterns[tambourine].name(),
            judged
        );

        MeasureSelection {
            maracas,
            tambourine,
            judged,
            degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::pattern::Pattern;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn set_of(n: usize) -> PatternSet {
        PatternSet::new(
            (0..n)
                .map(|i| Pattern::new(format!("p{}", i), [i % 2 == 0; 16]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_pattern_degrades() {
        let mut selector = PatternSelector::with_rng(StdRng::seed_from_u64(1));
        let set = set_of(1);

        for _ in 0..20 {
            let selection = selector.select_next(&set);
            assert_eq!(selection.maracas, 0);
            assert_eq!(selection.tambourine, 0);
            assert!(selection.degraded);
        }
    }

    #[test]
    fn test_indices_are_distinct_and_in_range() {
        let mut selector = PatternSelector::with_rng(StdRng::seed_from_u64(42));

        for n in [2, 3, 7] {
            let set = set_of(n);
            for _ in 0..200 {
                let selection = selector.select_next(&set);
                assert_ne!(selection.maracas, selection.tambourine);
                assert!(selection.maracas < n);
                assert!(selection.tambourine < n);
                assert!(!selection.degraded);
            }
        }
    }

    #[test]
    fn test_both_instruments_get_judged() {
        let mut selector = PatternSelector::with_rng(StdRng::seed_from_u64(3));
        let set = set_of(4);

        let judged: Vec<Instrument> = (0..200)
            .map(|_| selector.select_next(&set).judged)
            .collect();

        assert!(judged.contains(&Instrument::Maracas));
        assert!(judged.contains(&Instrument::Tambourine));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let set = set_of(5);
        let mut a = PatternSelector::with_rng(StdRng::seed_from_u64(99));
        let mut b = PatternSelector::with_rng(StdRng::seed_from_u64(99));

        for _ in 0..50 {
            assert_eq!(a.select_next(&set), b.select_next(&set));
        }
    }

    #[test]
    fn test_judged_index() {
        let selection = MeasureSelection {
            maracas: 2,
            tambourine: 5,
            judged: Instrument::Tambourine,
            degraded: false,
        };
        assert_eq!(selection.judged_index(), 5);
        assert_eq!(selection.pattern_index(Instrument::Maracas), 2);
    }
}
