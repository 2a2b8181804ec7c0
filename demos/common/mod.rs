//! Terminal and audio plumbing shared by the demos.

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Audio state that can generate samples.
pub trait DemoAudioState: Send + 'static {
    fn next_sample(&mut self) -> f64;

    /// Called once the output device is known.
    fn set_sample_rate(&mut self, _sample_rate: f64) {}
}

/// Frame handling result that controls the event loop
pub enum LoopAction {
    Continue,
    Exit,
}

/// Runs an interactive demo with audio output and a raw-mode terminal.
///
/// `on_frame` is called every few milliseconds, with the key event when one
/// arrived. The short poll interval keeps the rhythm machine ticking well
/// below one step duration.
pub fn run_interactive_demo<S, F>(state: S, mut on_frame: F) -> Result<()>
where
    S: DemoAudioState,
    F: FnMut(&Arc<Mutex<S>>, Option<&KeyEvent>) -> Result<LoopAction>,
{
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let config = device.default_output_config()?;
    let state = Arc::new(Mutex::new(state));
    state
        .lock()
        .map_err(|_| anyhow::anyhow!("audio state poisoned"))?
        .set_sample_rate(config.sample_rate().0 as f64);

    let _stream = match config.sample_format() {
        SampleFormat::F32 => create_audio_stream::<f32, S>(&device, &config.into(), state.clone())?,
        SampleFormat::I16 => create_audio_stream::<i16, S>(&device, &config.into(), state.clone())?,
        SampleFormat::U16 => create_audio_stream::<u16, S>(&device, &config.into(), state.clone())?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    let result = event_loop(&state, &mut on_frame);
    cleanup_terminal();
    result
}

fn event_loop<S, F>(state: &Arc<Mutex<S>>, on_frame: &mut F) -> Result<()>
where
    F: FnMut(&Arc<Mutex<S>>, Option<&KeyEvent>) -> Result<LoopAction>,
{
    loop {
        let key = if event::poll(Duration::from_millis(2))? {
            match event::read()? {
                Event::Key(key_event) => Some(key_event),
                _ => None,
            }
        } else {
            None
        };

        if let LoopAction::Exit = on_frame(state, key.as_ref())? {
            return Ok(());
        }
    }
}

fn create_audio_stream<T, S>(
    device: &cpal::Device,
    config: &StreamConfig,
    state: Arc<Mutex<S>>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f64> + cpal::SizedSample,
    S: DemoAudioState,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let Ok(mut state) = state.lock() else {
                return;
            };
            for frame in data.chunks_mut(channels) {
                let value: T = T::from_sample(state.next_sample());
                for s in frame.iter_mut() {
                    *s = value;
                }
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
