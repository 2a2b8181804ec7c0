//! Interactive shake rhythm game.
//!
//! Listen to one measure of maracas and tambourine, then reproduce the
//! announced instrument's rhythm by pressing SPACE (a "shake") along with the
//! metronome. Press Q or ESC to quit.
//!
//! Optionally pass a JSON pattern file:
//!
//! ```text
//! cargo run --example shake_game -- patterns.json
//! ```
//!
//! with the shape `{"patterns": [{"name": "...", "pattern": [1,0,...]}]}`.

mod common;

use anyhow::{Context, Result};
use common::{DemoAudioState, LoopAction, is_quit_key, run_interactive_demo};
use crossterm::{ExecutableCommand, event::KeyCode, event::KeyEventKind};
use shakebeat::{
    AudioClock, ClickKind, Cue, Instrument, JudgeConfig, MonotonicClock, Pattern, PatternSet,
    PlayState, RhythmMachine, Verdict, steps,
};
use std::io::{Write, stdout};

/// A decaying sine blip.
struct Blip {
    frequency: f64,
    amplitude: f64,
    position: usize,
    length: usize,
}

struct AudioState {
    sample_rate: f64,
    blips: Vec<Blip>,
}

impl AudioState {
    fn new() -> Self {
        Self {
            sample_rate: 44100.0,
            blips: Vec::new(),
        }
    }

    fn trigger(&mut self, frequency: f64, amplitude: f64, seconds: f64) {
        self.blips.push(Blip {
            frequency,
            amplitude,
            position: 0,
            length: (seconds * self.sample_rate) as usize,
        });
    }

    fn play_cue(&mut self, cue: Cue) {
        match cue {
            Cue::Note(instrument) | Cue::ShakeFeedback(instrument) => {
                self.trigger(instrument_frequency(instrument), 0.3, 0.06)
            }
            Cue::Click(ClickKind::Downbeat) => self.trigger(1200.0, 0.25, 0.01),
            Cue::Click(ClickKind::Regular) => self.trigger(800.0, 0.15, 0.01),
            Cue::PlaybackStarted { judged } => {
                self.trigger(instrument_frequency(judged) / 2.0, 0.2, 0.3)
            }
            Cue::UserInputStarted { .. } => self.trigger(440.0, 0.2, 0.15),
            Cue::Verdict(Verdict::Pass) => self.trigger(880.0, 0.3, 0.4),
            Cue::Verdict(Verdict::Fail) => self.trigger(220.0, 0.3, 0.4),
        }
    }
}

impl DemoAudioState for AudioState {
    fn next_sample(&mut self) -> f64 {
        let sample_rate = self.sample_rate;
        let mut out = 0.0;
        for blip in &mut self.blips {
            let t = blip.position as f64 / sample_rate;
            let progress = blip.position as f64 / blip.length.max(1) as f64;
            let envelope = (-progress * 6.0).exp();
            out += (std::f64::consts::TAU * blip.frequency * t).sin() * envelope * blip.amplitude;
            blip.position += 1;
        }
        self.blips.retain(|b| b.position < b.length);
        out.clamp(-1.0, 1.0)
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }
}

fn instrument_frequency(instrument: Instrument) -> f64 {
    match instrument {
        Instrument::Maracas => 1800.0,
        Instrument::Tambourine => 2600.0,
    }
}

fn builtin_patterns() -> Result<PatternSet> {
    Ok(PatternSet::new(vec![
        Pattern::new("four on the floor", steps!("x... x... x... x...")),
        Pattern::new("offbeats", steps!("..x. ..x. ..x. ..x.")),
        Pattern::new("son clave", steps!("x..x ..x. ..x. x...")),
        Pattern::new("gallop", steps!("x.xx x.xx x.xx x.xx")),
        Pattern::new("backbeat", steps!(".... x... .... x...")),
    ])?)
}

fn load_patterns() -> Result<PatternSet> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text =
                std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))
        }
        None => builtin_patterns(),
    }
}

fn draw_ui(machine: &RhythmMachine) -> Result<()> {
    let mut stdout = stdout();
    stdout.execute(crossterm::terminal::Clear(
        crossterm::terminal::ClearType::All,
    ))?;
    stdout.execute(crossterm::cursor::MoveTo(0, 0))?;

    let phase = match machine.current_state() {
        PlayState::Playing => "LISTEN",
        PlayState::UserInput => "SHAKE!",
    };
    let step = machine.clock().map_or(0, |c| c.current_step());
    let bar: String = (0..16)
        .map(|i| if i == step { '#' } else { '.' })
        .collect();

    write!(
        stdout,
        "{} | judged: {} ('{}') | {}\r\n",
        phase,
        machine.judged_instrument(),
        machine.judged_pattern().name(),
        bar
    )?;
    if let Some(evaluation) = machine.last_result() {
        let r = evaluation.result;
        write!(
            stdout,
            "last: {:?} {:.0}% (perfect {} good {} miss {} extra {})\r\n",
            evaluation.verdict,
            evaluation.score * 100.0,
            r.perfect,
            r.good,
            r.missed,
            r.extra
        )?;
    }
    write!(stdout, "SPACE=shake  Q=quit\r\n")?;
    stdout.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let patterns = load_patterns()?;
    let clock = MonotonicClock::new();
    let mut machine = RhythmMachine::new(JudgeConfig::default(), patterns)?;
    let mut pending = machine.start(clock.now())?;

    run_interactive_demo(AudioState::new(), |state, key_event| {
        pending.extend(machine.poll(&clock));

        if let Some(key_event) = key_event {
            if is_quit_key(key_event.code) {
                return Ok(LoopAction::Exit);
            }
            if key_event.code == KeyCode::Char(' ') && key_event.kind == KeyEventKind::Press {
                pending.extend(machine.shake_now(&clock));
            }
        }

        if pending.is_empty() && key_event.is_none() {
            return Ok(LoopAction::Continue);
        }

        let mut audio = state
            .lock()
            .map_err(|_| anyhow::anyhow!("audio state poisoned"))?;
        for cue in pending.drain(..) {
            audio.play_cue(cue);
        }
        drop(audio);

        draw_ui(&machine)?;
        Ok(LoopAction::Continue)
    })?;

    println!("\nGoodbye!");
    Ok(())
}
