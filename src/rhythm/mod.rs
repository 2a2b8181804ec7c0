pub mod clock;
mod config;
pub mod core;
pub mod judge;
mod machine;
pub mod pattern;
pub mod score;
pub mod selector;

pub use clock::{Advance, AudioClock, MonotonicClock, StepClock};
pub use config::JudgeConfig;
pub use self::core::{ClickKind, Cue, Instrument, STEPS_PER_MEASURE};
pub use judge::{
    Grade, JudgeWindows, Judgement, JudgementSession, MatchOutcome, MatchResult, match_events,
};
pub use machine::{PlayState, RhythmMachine};
pub use pattern::{Pattern, PatternSet};
pub use score::{Evaluation, ScoreEvaluator, Verdict};
pub use selector::{MeasureSelection, PatternSelector};
