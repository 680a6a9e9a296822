//! In-process audio backend driven by explicit time steps
//!
//! Stands in for a real audio engine in tests and in the headless player.
//! Time only moves when [`SimulatedBackend::advance`] is called, which keeps
//! every transition (fade-out, end of track, delayed length readiness)
//! deterministic.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::audio_file::DecodedSamples;
use crate::config::{AnalyzerConfig, TrackSource};
use crate::error::{Readiness, Result, TracklineError};
use crate::types::{EngineState, StopMode};

use super::{AudioBackend, PlaybackInstance, SpectrumFrame};

/// Default fade-out length for `StopMode::AllowFadeout`
pub const DEFAULT_FADE_MS: f64 = 250.0;

/// Channels reported by the synthetic analyser while audio is flowing
const SPECTRUM_CHANNELS: usize = 2;

/// A registered source the backend can instantiate
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    /// Native length in milliseconds
    pub length_ms: u32,
    /// Number of length queries that report "pending" before the length is known
    pub ready_after_polls: u32,
    /// Decoded sample data for offline waveforms
    pub samples: DecodedSamples,
}

impl SimulatedSource {
    /// A silent mono source of the given length (1 kHz sample rate)
    pub fn silent(length_ms: u32) -> Self {
        Self {
            length_ms,
            ready_after_polls: 0,
            samples: DecodedSamples::new(vec![0.0; length_ms as usize], 1, 1000),
        }
    }

    /// A source backed by decoded samples, length derived from their duration
    pub fn from_decoded(samples: DecodedSamples) -> Self {
        Self {
            length_ms: samples.duration_ms(),
            ready_after_polls: 0,
            samples,
        }
    }

    /// Delay length readiness by `polls` queries
    pub fn with_ready_after(mut self, polls: u32) -> Self {
        self.ready_after_polls = polls;
        self
    }
}

/// Engine-side state of one instance
#[derive(Debug)]
struct Voice {
    name: String,
    length_ms: u32,
    pending_polls: Cell<u32>,
    state: EngineState,
    paused: bool,
    position_ms: f64,
    pitch: f32,
    fade_remaining_ms: f64,
    valid: bool,
    released: bool,
    analyzer: Option<AnalyzerConfig>,
    commands: u32,
}

impl Voice {
    fn producing_audio(&self) -> bool {
        self.valid
            && !self.paused
            && matches!(self.state, EngineState::Playing | EngineState::Stopping)
    }

    fn advance(&mut self, dt_ms: f64, fade_ms: f64) {
        if !self.valid || self.paused {
            return;
        }
        match self.state {
            EngineState::Stopped => {}
            EngineState::Playing => {
                self.position_ms += dt_ms * self.pitch as f64;
                if self.position_ms >= self.length_ms as f64 {
                    self.position_ms = self.length_ms as f64;
                    self.state = EngineState::Stopped;
                    log::debug!("simulated: '{}' reached its end", self.name);
                }
            }
            EngineState::Stopping => {
                self.position_ms =
                    (self.position_ms + dt_ms * self.pitch as f64).min(self.length_ms as f64);
                self.fade_remaining_ms -= dt_ms;
                if self.fade_remaining_ms <= 0.0 || fade_ms <= 0.0 {
                    self.state = EngineState::Stopped;
                    self.fade_remaining_ms = 0.0;
                }
            }
        }
    }

    /// Deterministic magnitudes that move with the playhead
    fn synthetic_spectrum(&self, bins: usize) -> Vec<f32> {
        let phase = (self.position_ms / 100.0) as f32;
        (0..bins)
            .map(|i| {
                let falloff = 1.0 / (1.0 + i as f32);
                falloff * (0.55 + 0.45 * (phase + i as f32 * 0.3).sin())
            })
            .collect()
    }
}

/// Read-only copy of a voice for assertions and status output
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSnapshot {
    pub state: EngineState,
    pub paused: bool,
    pub position_ms: u32,
    pub pitch: f32,
    pub valid: bool,
    pub released: bool,
    pub analyzer_attached: bool,
    /// Number of control commands the voice has received
    pub commands: u32,
}

/// Deterministic audio backend
pub struct SimulatedBackend {
    sources: HashMap<String, SimulatedSource>,
    voices: Vec<Rc<RefCell<Voice>>>,
    /// Released voices already pruned from `voices`
    pruned: usize,
    fade_ms: f64,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    /// Create an empty backend with the default fade-out
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            voices: Vec::new(),
            pruned: 0,
            fade_ms: DEFAULT_FADE_MS,
        }
    }

    /// Override the fade-out length
    pub fn with_fade_ms(mut self, fade_ms: f64) -> Self {
        self.fade_ms = fade_ms.max(0.0);
        self
    }

    /// Register a source under `name`
    pub fn add_source(&mut self, name: impl Into<String>, source: SimulatedSource) {
        self.sources.insert(name.into(), source);
    }

    /// Move time forward for every live instance
    ///
    /// Released voices are dropped here; their snapshots are gone afterwards.
    pub fn advance(&mut self, dt_ms: f64) {
        let before = self.voices.len();
        self.voices.retain(|v| !v.borrow().released);
        self.pruned += before - self.voices.len();
        for voice in &self.voices {
            voice.borrow_mut().advance(dt_ms, self.fade_ms);
        }
    }

    /// Dispose every instance created from `name` (simulates an engine-side release)
    pub fn invalidate(&mut self, name: &str) {
        for voice in &self.voices {
            let mut voice = voice.borrow_mut();
            if voice.name == name {
                voice.valid = false;
            }
        }
    }

    /// Snapshot of the most recently created instance of `name`
    pub fn voice(&self, name: &str) -> Option<VoiceSnapshot> {
        self.voices
            .iter()
            .rev()
            .map(|v| v.borrow())
            .find(|v| v.name == name)
            .map(|v| VoiceSnapshot {
                state: v.state,
                paused: v.paused,
                position_ms: v.position_ms as u32,
                pitch: v.pitch,
                valid: v.valid,
                released: v.released,
                analyzer_attached: v.analyzer.is_some(),
                commands: v.commands,
            })
    }

    /// Number of instances that have been released
    pub fn released_count(&self) -> usize {
        self.pruned + self.voices.iter().filter(|v| v.borrow().released).count()
    }
}

impl AudioBackend for SimulatedBackend {
    fn create_instance(&mut self, source: &TrackSource) -> Result<Box<dyn PlaybackInstance>> {
        let registered = self
            .sources
            .get(&source.name)
            .ok_or_else(|| TracklineError::Source(format!("unknown source '{}'", source.name)))?;

        let voice = Rc::new(RefCell::new(Voice {
            name: source.name.clone(),
            length_ms: registered.length_ms,
            pending_polls: Cell::new(registered.ready_after_polls),
            state: EngineState::Stopped,
            paused: false,
            position_ms: 0.0,
            pitch: 1.0,
            fade_remaining_ms: 0.0,
            valid: true,
            released: false,
            analyzer: None,
            commands: 0,
        }));
        self.voices.push(Rc::clone(&voice));

        log::debug!("simulated: created instance of '{}'", source.name);
        Ok(Box::new(SimulatedInstance {
            voice,
            fade_ms: self.fade_ms,
        }))
    }

    fn read_samples(&mut self, source: &TrackSource) -> Result<DecodedSamples> {
        self.sources
            .get(&source.name)
            .map(|s| s.samples.clone())
            .ok_or_else(|| TracklineError::Source(format!("unknown source '{}'", source.name)))
    }
}

/// Handle to a simulated voice
pub struct SimulatedInstance {
    voice: Rc<RefCell<Voice>>,
    fade_ms: f64,
}

impl PlaybackInstance for SimulatedInstance {
    fn is_valid(&self) -> bool {
        let voice = self.voice.borrow();
        voice.valid && !voice.released
    }

    fn engine_state(&self) -> EngineState {
        self.voice.borrow().state
    }

    fn is_paused(&self) -> bool {
        self.voice.borrow().paused
    }

    fn start(&mut self) {
        let mut voice = self.voice.borrow_mut();
        voice.commands += 1;
        if !voice.valid {
            return;
        }
        voice.paused = false;
        voice.state = EngineState::Playing;
        if voice.position_ms >= voice.length_ms as f64 {
            voice.position_ms = 0.0;
        }
    }

    fn stop(&mut self, mode: StopMode) {
        let mut voice = self.voice.borrow_mut();
        voice.commands += 1;
        if !voice.valid || voice.state == EngineState::Stopped {
            return;
        }
        match mode {
            StopMode::AllowFadeout if self.fade_ms > 0.0 => {
                voice.state = EngineState::Stopping;
                voice.fade_remaining_ms = self.fade_ms;
            }
            _ => {
                voice.state = EngineState::Stopped;
                voice.fade_remaining_ms = 0.0;
            }
        }
        voice.paused = false;
    }

    fn set_paused(&mut self, paused: bool) {
        let mut voice = self.voice.borrow_mut();
        voice.commands += 1;
        voice.paused = paused;
    }

    fn timeline_position(&self) -> u32 {
        self.voice.borrow().position_ms as u32
    }

    fn set_timeline_position(&mut self, position_ms: u32) {
        let mut voice = self.voice.borrow_mut();
        voice.commands += 1;
        voice.position_ms = position_ms as f64;
    }

    fn pitch(&self) -> f32 {
        self.voice.borrow().pitch
    }

    fn set_pitch(&mut self, pitch: f32) {
        let mut voice = self.voice.borrow_mut();
        voice.commands += 1;
        voice.pitch = pitch;
    }

    fn length(&self) -> Readiness<u32> {
        let voice = self.voice.borrow();
        if !voice.valid {
            return Readiness::Failed(format!("instance of '{}' is invalid", voice.name));
        }
        let pending = voice.pending_polls.get();
        if pending > 0 {
            voice.pending_polls.set(pending - 1);
            return Readiness::Pending;
        }
        Readiness::Ready(voice.length_ms)
    }

    fn attach_analyzer(&mut self, config: &AnalyzerConfig) {
        self.voice.borrow_mut().analyzer = Some(config.clone());
    }

    fn spectrum(&self) -> Option<SpectrumFrame> {
        let voice = self.voice.borrow();
        let analyzer = voice.analyzer.as_ref()?;
        if !voice.producing_audio() {
            return Some(SpectrumFrame::empty());
        }
        let bins = voice.synthetic_spectrum(analyzer.bin_count());
        Some(SpectrumFrame::new(vec![bins; SPECTRUM_CHANNELS]))
    }

    fn release(&mut self) {
        let mut voice = self.voice.borrow_mut();
        if !voice.released {
            voice.released = true;
            log::debug!("simulated: released instance of '{}'", voice.name);
        }
    }
}
