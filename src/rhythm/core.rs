use std::fmt;

use super::score::Verdict;

/// Number of sixteenth-note steps in one measure.
pub const STEPS_PER_MEASURE: usize = 16;

/// The two instruments a measure is played on.
///
/// Exactly one of them is judged per measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Maracas,
    Tambourine,
}

impl Instrument {
    /// Both instruments in playback order.
    pub const ALL: [Instrument; 2] = [Instrument::Maracas, Instrument::Tambourine];

    /// Returns the lowercase display name.
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Maracas => "maracas",
            Instrument::Tambourine => "tambourine",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metronome click type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Click on step 0 of the measure
    Downbeat,
    /// Click on any other step
    Regular,
}

impl ClickKind {
    /// Returns the click kind for a step within the measure.
    pub fn for_step(step: usize) -> Self {
        if step == 0 {
            ClickKind::Downbeat
        } else {
            ClickKind::Regular
        }
    }
}

/// A signal emitted by the machine for the audio and UI collaborators.
///
/// Cues are fire-and-forget: the host maps each one to a one-shot sound (or a
/// UI update) and never reports back.
///
/// # Examples
///
/// ```
/// use shakebeat::{Cue, Instrument};
///
/// fn sound_name(cue: &Cue) -> &'static str {
///     match cue {
///         Cue::Note(Instrument::Maracas) => "maracas.wav",
///         Cue::Note(Instrument::Tambourine) => "tambourine.wav",
///         _ => "other.wav",
///     }
/// }
///
/// assert_eq!(sound_name(&Cue::Note(Instrument::Maracas)), "maracas.wav");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// Play one note of an instrument's pattern
    Note(Instrument),
    /// Metronome click
    Click(ClickKind),
    /// A playback measure begins; announce the instrument the user will reproduce
    PlaybackStarted { judged: Instrument },
    /// The judged phase begins
    UserInputStarted { judged: Instrument },
    /// A shake was accepted during the judged phase
    ShakeFeedback(Instrument),
    /// The judged phase was evaluated
    Verdict(Verdict),
}
