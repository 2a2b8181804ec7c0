//! Shakebeat - the rhythm core of a shake-to-play music game
//!
//! The crate schedules 16-step rhythm patterns against a monotonic audio
//! clock, alternates between a playback measure and a judged measure, and
//! scores how closely a stream of shake timestamps follows the judged pattern.
//!
//! Audio output, shake detection and UI are left to the host: the
//! [`RhythmMachine`] only consumes clock readings and shake timestamps and
//! returns [`Cue`]s describing what should be heard.
//!
//! ```
//! use shakebeat::{JudgeConfig, Pattern, PatternSet, RhythmMachine};
//!
//! let patterns = PatternSet::new(vec![
//!     Pattern::from_values("four", &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0])?,
//!     Pattern::from_values("off", &[0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0])?,
//! ])?;
//!
//! let mut machine = RhythmMachine::new(JudgeConfig::default(), patterns)?;
//! let _announce = machine.start(0.0)?;
//!
//! // Every frame:
//! for cue in machine.tick(3.0) {
//!     println!("{:?}", cue);
//! }
//! # Ok::<(), shakebeat::ConfigurationError>(())
//! ```

pub mod error;
pub mod rhythm;

// Re-export commonly used types at the crate root
pub use error::{ConfigurationError, Result};
pub use rhythm::{
    Advance, AudioClock, ClickKind, Cue, Evaluation, Grade, Instrument, JudgeConfig,
    JudgeWindows, Judgement, JudgementSession, MatchOutcome, MatchResult, MeasureSelection,
    MonotonicClock, Pattern, PatternSelector, PatternSet, PlayState, RhythmMachine,
    STEPS_PER_MEASURE, ScoreEvaluator, StepClock, Verdict, match_events,
};

#[cfg(feature = "macros")]
pub use shakebeat_macros::steps;
