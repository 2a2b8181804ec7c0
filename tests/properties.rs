//! Property tests for timing, matching and scoring.

use proptest::prelude::*;
use shakebeat::{
    JudgeWindows, JudgementSession, MatchResult, Pattern, ScoreEvaluator, StepClock, match_events,
};

fn sorted_times(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 0..max_len).prop_map(|mut v| {
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v.dedup();
        v
    })
}

fn counts() -> impl Strategy<Value = MatchResult> {
    (0u32..20, 0u32..20, 0u32..20, 0u32..20).prop_map(|(perfect, good, missed, extra)| {
        MatchResult {
            perfect,
            good,
            missed,
            extra,
        }
    })
}

proptest! {
    #[test]
    fn steps_never_skip_or_repeat(
        bpm in 40.0f64..240.0,
        fractions in prop::collection::vec(0.05f64..1.0, 1..400),
    ) {
        let mut clock = StepClock::initialize(bpm, 0.0, 0.0).unwrap();
        let duration = clock.step_duration();
        let mut seen = Vec::new();
        let mut now = 0.0;

        for fraction in fractions {
            if clock.is_step_due(now) {
                seen.push(clock.current_step());
                clock.advance();
            }
            now += fraction * duration;
        }

        for (n, step) in seen.iter().enumerate() {
            prop_assert_eq!(*step, n % 16);
        }
    }

    #[test]
    fn matching_conserves_events(
        expected in sorted_times(24),
        observed in prop::collection::vec(0.0f64..10.0, 0..32),
        perfect in 0.0f64..0.2,
        extra_width in 0.01f64..0.3,
    ) {
        let windows = JudgeWindows::new(perfect, perfect + extra_width).unwrap();
        let outcome = match_events(&expected, &observed, &windows);
        let r = outcome.result;

        prop_assert_eq!((r.perfect + r.good + r.missed) as usize, expected.len());
        prop_assert_eq!(r.extra as usize, observed.len() - (r.perfect + r.good) as usize);
        prop_assert_eq!(outcome.judgements.len(), expected.len());
        prop_assert_eq!(outcome.extras.len(), r.extra as usize);
    }

    #[test]
    fn evaluation_is_idempotent(
        flags in prop::array::uniform16(any::<bool>()),
        shakes in prop::collection::vec(0.0f64..4.0, 0..40),
        measures in 1u32..4,
    ) {
        let pattern = Pattern::new("random", flags);
        let mut session = JudgementSession::new(&pattern, 0.0, 0.125, measures, 64);
        for t in shakes {
            session.record_shake(t);
        }

        let windows = JudgeWindows::default();
        prop_assert_eq!(session.evaluate(&windows), session.evaluate(&windows));
        prop_assert!(session.expected_times().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn score_is_bounded(result in counts(), penalty in 0.0f64..2.0) {
        let score = ScoreEvaluator::new(penalty).unwrap().score(&result);
        prop_assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn negative_penalty_is_rejected(penalty in -10.0f64..-1e-6) {
        prop_assert!(ScoreEvaluator::new(penalty).is_err());
    }

    #[test]
    fn more_perfect_never_lowers_score(result in counts(), penalty in 0.0f64..2.0) {
        let evaluator = ScoreEvaluator::new(penalty).unwrap();
        let better = MatchResult { perfect: result.perfect + 1, ..result };
        prop_assert!(evaluator.score(&better) + 1e-9 >= evaluator.score(&result));
    }

    #[test]
    fn more_extra_never_raises_score(result in counts(), penalty in 0.0f64..2.0) {
        let evaluator = ScoreEvaluator::new(penalty).unwrap();
        let worse = MatchResult { extra: result.extra + 1, ..result };
        prop_assert!(evaluator.score(&worse) <= evaluator.score(&result) + 1e-9);
    }
}
