//! Playback and judgement state machine.
//!
//! The `RhythmMachine` combines a `StepClock` (for timing) with a `PatternSet`
//! (for note data). It alternates between a playback measure, where both
//! instruments play their selected patterns, and a judged phase, where the
//! user reproduces the judged instrument's pattern by shaking.

use log::{debug, info, trace, warn};
use rand::Rng;

use super::clock::{AudioClock, StepClock};
use super::config::JudgeConfig;
use super::core::{ClickKind, Cue, Instrument};
use super::judge::{JudgeWindows, JudgementSession};
use super::pattern::{Pattern, PatternSet};
use super::score::{Evaluation, ScoreEvaluator, Verdict};
use super::selector::{MeasureSelection, PatternSelector};
use crate::error::Result;

/// Phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayState {
    /// Both instruments play their patterns
    Playing,
    /// Instruments are silent and shakes are collected
    UserInput,
}

/// The rhythm game core.
///
/// The machine never blocks and owns no threads. The host calls
/// [`tick`](Self::tick) every frame with the current audio clock reading and
/// forwards each shake through [`on_shake_event`](Self::on_shake_event). Both
/// return the [`Cue`]s the audio and UI collaborators should act on.
///
/// # Cycle
///
/// - **Playing**: one measure of both patterns, metronome running
/// - **UserInput**: `user_input_measures` measures of metronome only; shakes
///   are recorded and judged when the phase ends
///
/// The phase changes as soon as the last step of a measure is processed.
/// Expected times of a judged phase are anchored at its first downbeat, and
/// shakes arriving up to the good window before that downbeat are kept for
/// it.
///
/// # Step processing
///
/// Each tick processes at most one due step. Deadlines are absolute, so a
/// host that falls behind catches up over the next ticks without skipping or
/// repeating a step.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use shakebeat::{Cue, JudgeConfig, Pattern, PatternSet, PlayState, RhythmMachine};
///
/// let patterns = PatternSet::new(vec![
///     Pattern::from_values("four", &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0])?,
///     Pattern::from_values("off", &[0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0])?,
/// ])?;
/// let config = JudgeConfig::default().with_start_delay(0.0);
/// let rng = rand::rngs::StdRng::seed_from_u64(1);
///
/// let mut machine = RhythmMachine::with_rng(config, patterns, rng)?;
/// let cues = machine.start(0.0)?;
/// assert!(matches!(cues[0], Cue::PlaybackStarted { .. }));
///
/// // 120 BPM: one step every 0.125 s, one measure every 2 s
/// for n in 0..15 {
///     machine.tick(n as f64 * 0.125);
/// }
/// assert_eq!(machine.current_state(), PlayState::Playing);
///
/// machine.tick(15.0 * 0.125);
/// assert_eq!(machine.current_state(), PlayState::UserInput);
/// assert_eq!(machine.session().unwrap().start_time(), 2.0);
/// # Ok::<(), shakebeat::ConfigurationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RhythmMachine<R: Rng = rand::rngs::ThreadRng> {
    config: JudgeConfig,
    windows: JudgeWindows,
    evaluator: ScoreEvaluator,
    patterns: PatternSet,
    /// Steps that click; every step clicks when absent
    metronome: Option<Pattern>,
    selector: PatternSelector<R>,
    selection: MeasureSelection,
    clock: Option<StepClock>,
    state: PlayState,
    session: Option<JudgementSession>,
    last_evaluation: Option<Evaluation>,
    /// Judged measures left in the current UserInput phase
    measures_remaining: u32,
    /// Shakes aimed at the coming judged phase, reported before it opened
    early_shakes: Vec<f64>,
    running: bool,
    stop_requested: bool,
}

impl RhythmMachine<rand::rngs::ThreadRng> {
    /// Creates a machine using the thread-local RNG for pattern selection.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `config` is invalid.
    pub fn new(config: JudgeConfig, patterns: PatternSet) -> Result<Self> {
        Self::with_rng(config, patterns, rand::thread_rng())
    }
}

impl<R: Rng> RhythmMachine<R> {
    /// Creates a machine with a custom RNG for pattern selection.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if `config` is invalid.
    pub fn with_rng(config: JudgeConfig, patterns: PatternSet, rng: R) -> Result<Self> {
        config.validate()?;
        let windows = config.windows()?;
        let evaluator = config.evaluator()?;

        Ok(Self {
            config,
            windows,
            evaluator,
            patterns,
            metronome: None,
            selector: PatternSelector::with_rng(rng),
            selection: MeasureSelection::default(),
            clock: None,
            state: PlayState::Playing,
            session: None,
            last_evaluation: None,
            measures_remaining: 0,
            early_shakes: Vec::new(),
            running: false,
            stop_requested: false,
        })
    }

    /// Restricts metronome clicks to the flagged steps of `pattern`.
    pub fn with_metronome_pattern(mut self, pattern: Pattern) -> Self {
        self.metronome = Some(pattern);
        self
    }

    /// Starts (or restarts) the cycle.
    ///
    /// The first step is due `start_delay` seconds after `now`. Returns the
    /// announcement cue for the first judged instrument.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveBpm` if the tempo is unusable.
    pub fn start(&mut self, now: f64) -> Result<Vec<Cue>> {
        let clock = StepClock::initialize(self.config.bpm, now, self.config.start_delay)?;
        self.selection = self.selector.select_next(&self.patterns);

        info!(
            "starting at {} bpm in {:.1}s, judging {} ('{}')",
            self.config.bpm,
            self.config.start_delay,
            self.selection.judged,
            self.judged_pattern().name()
        );

        self.clock = Some(clock);
        self.state = PlayState::Playing;
        self.session = None;
        self.measures_remaining = 0;
        self.early_shakes.clear();
        self.running = true;
        self.stop_requested = false;

        Ok(vec![Cue::PlaybackStarted {
            judged: self.selection.judged,
        }])
    }

    /// Requests a stop. The machine halts at the next due step boundary.
    pub fn stop(&mut self) {
        if self.running {
            self.stop_requested = true;
        }
    }

    /// Processes the next step if it is due at `now`.
    ///
    /// Returns the cues for that step, or nothing if no step is due.
    pub fn tick(&mut self, now: f64) -> Vec<Cue> {
        let mut cues = Vec::new();
        if !self.running {
            return cues;
        }

        let step = match &self.clock {
            Some(clock) if clock.is_step_due(now) => clock.current_step(),
            _ => return cues,
        };

        if self.stop_requested {
            info!("stopped");
            self.running = false;
            self.stop_requested = false;
            return cues;
        }

        self.play_step(step, &mut cues);

        let Some(clock) = self.clock.as_mut() else {
            return cues;
        };
        if clock.advance().measure_completed {
            let boundary = clock.next_step_time();
            self.finish_measure(boundary, &mut cues);
        }

        cues
    }

    /// Reads `clock` and calls [`tick`](Self::tick).
    pub fn poll(&mut self, clock: &impl AudioClock) -> Vec<Cue> {
        self.tick(clock.now())
    }

    /// Reports a shake at `time`.
    ///
    /// Shakes count during `UserInput`, and during the end of a playback
    /// measure when they fall within the good window of the coming judged
    /// downbeat. An accepted shake returns the feedback cue for the judged
    /// instrument.
    pub fn on_shake_event(&mut self, time: f64) -> Option<Cue> {
        if !self.running {
            return None;
        }

        let accepted = match (self.state, self.session.as_mut()) {
            (PlayState::UserInput, Some(session)) => session.record_shake(time),
            (PlayState::UserInput, None) => return None,
            (PlayState::Playing, _) => {
                let opens_at = self.clock.as_ref()?.next_measure_time();
                if time < opens_at - self.windows.good {
                    debug!("shake at {:.2} ignored outside the judged phase", time);
                    return None;
                }
                let has_room = self.early_shakes.len() < self.config.shake_capacity;
                if has_room {
                    self.early_shakes.push(time);
                }
                has_room
            }
        };

        if !accepted {
            warn!(
                "shake queue full ({} shakes), dropping shake at {:.2}",
                self.config.shake_capacity, time
            );
            return None;
        }

        debug!("shake at {:.2}", time);
        Some(Cue::ShakeFeedback(self.selection.judged))
    }

    /// Reads `clock` and calls [`on_shake_event`](Self::on_shake_event).
    pub fn shake_now(&mut self, clock: &impl AudioClock) -> Option<Cue> {
        self.on_shake_event(clock.now())
    }

    pub fn current_state(&self) -> PlayState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Result of the most recent judged phase.
    pub fn last_result(&self) -> Option<&Evaluation> {
        self.last_evaluation.as_ref()
    }

    /// Scores the shakes recorded so far without ending the phase.
    pub fn preview_result(&self) -> Option<Evaluation> {
        self.session.as_ref().map(|session| self.evaluate(session))
    }

    pub fn selection(&self) -> &MeasureSelection {
        &self.selection
    }

    pub fn judged_instrument(&self) -> Instrument {
        self.selection.judged
    }

    pub fn judged_pattern(&self) -> &Pattern {
        &self.patterns[self.selection.judged_index()]
    }

    pub fn session(&self) -> Option<&JudgementSession> {
        self.session.as_ref()
    }

    pub fn clock(&self) -> Option<&StepClock> {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    fn play_step(&self, step: usize, cues: &mut Vec<Cue>) {
        if self.state == PlayState::Playing {
            for instrument in Instrument::ALL {
                let pattern = &self.patterns[self.selection.pattern_index(instrument)];
                if pattern.is_set(step) {
                    cues.push(Cue::Note(instrument));
                }
            }
        }

        let clicks = self.config.metronome_enabled
            && self.metronome.as_ref().is_none_or(|m| m.is_set(step));
        if clicks {
            cues.push(Cue::Click(ClickKind::for_step(step)));
        }

        trace!("step {} ({:?}): {:?}", step, self.state, cues);
    }

    /// Applies the phase change for the measure that ended at `boundary`.
    fn finish_measure(&mut self, boundary: f64, cues: &mut Vec<Cue>) {
        match self.state {
            PlayState::Playing => self.enter_user_input(boundary, cues),
            PlayState::UserInput => {
                self.measures_remaining = self.measures_remaining.saturating_sub(1);
                if self.measures_remaining == 0 {
                    self.enter_playing(cues);
                }
            }
        }
    }

    fn enter_user_input(&mut self, boundary: f64, cues: &mut Vec<Cue>) {
        let step_duration = self.clock.as_ref().map_or(0.0, StepClock::step_duration);
        let mut session = JudgementSession::new(
            self.judged_pattern(),
            boundary,
            step_duration,
            self.config.user_input_measures,
            self.config.shake_capacity,
        );
        for time in self.early_shakes.drain(..) {
            session.record_shake(time);
        }

        info!(
            "user input: shake the {} pattern ({} expected)",
            self.selection.judged,
            session.expected_times().len()
        );

        self.session = Some(session);
        self.measures_remaining = self.config.user_input_measures;
        self.state = PlayState::UserInput;
        cues.push(Cue::UserInputStarted {
            judged: self.selection.judged,
        });
    }

    fn enter_playing(&mut self, cues: &mut Vec<Cue>) {
        if let Some(session) = self.session.take() {
            let evaluation = self.evaluate(&session);
            let result = evaluation.result;
            let outcome = match evaluation.verdict {
                Verdict::Pass => "OK",
                Verdict::Fail => "NG",
            };
            info!(
                "{}: {} perfect {} good {} miss {} extra {} score {:.1}%",
                outcome,
                evaluation.instrument,
                result.perfect,
                result.good,
                result.missed,
                result.extra,
                evaluation.score * 100.0
            );
            if session.dropped() > 0 {
                warn!("{} shakes were dropped this phase", session.dropped());
            }

            cues.push(Cue::Verdict(evaluation.verdict));
            self.last_evaluation = Some(evaluation);
        }

        self.selection = self.selector.select_next(&self.patterns);
        self.state = PlayState::Playing;
        info!(
            "playing: next judged pattern is {} ('{}')",
            self.selection.judged,
            self.judged_pattern().name()
        );
        cues.push(Cue::PlaybackStarted {
            judged: self.selection.judged,
        });
    }

    fn evaluate(&self, session: &JudgementSession) -> Evaluation {
        let outcome = session.evaluate(&self.windows);
        let (score, verdict) = self.evaluator.evaluate(&outcome.result);
        Evaluation {
            instrument: self.selection.judged,
            result: outcome.result,
            score,
            verdict,
        }
    }
}
