//! Collaborator interfaces for the audio and presentation subsystems
//!
//! Trackline never decodes audio, runs an FFT or touches a GPU itself. The
//! audio subsystem hands out [`PlaybackInstance`]s and decoded sample data
//! through [`AudioBackend`]; the presentation subsystem receives finished
//! waveform images, cursor positions and polylines through [`Presenter`].
//!
//! # Tick model
//!
//! All reads on an instance (state, position, spectrum) are snapshots taken
//! once per tick. Nothing here blocks: a stop request returns immediately and
//! the `Stopping -> Stopped` transition is observed on a later tick.
//!
//! ```ignore
//! let mut backend = SimulatedBackend::new();
//! backend.add_source("kick", SimulatedSource::silent(4_000));
//! let instance = backend.create_instance(&TrackSource::named("kick"))?;
//! ```

mod simulated;

pub use simulated::{SimulatedBackend, SimulatedInstance, SimulatedSource, VoiceSnapshot};

use crate::audio_file::DecodedSamples;
use crate::config::{AnalyzerConfig, TrackSource};
use crate::error::{Readiness, Result};
use crate::types::{EngineState, Point, StopMode, TrackId};
use crate::waveform::WaveformImage;

/// One tick's frequency-domain snapshot from an attached analyser
///
/// Laid out as channels of per-bin linear magnitudes. A frame with zero
/// channels means the analyser saw no signal this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    channels: Vec<Vec<f32>>,
}

impl SpectrumFrame {
    /// Create a frame from per-channel bin magnitudes
    pub fn new(channels: Vec<Vec<f32>>) -> Self {
        Self { channels }
    }

    /// A frame with no channels
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of channels the analyser reported
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Bins of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(|c| c.as_slice())
    }

    /// Number of bins per channel (0 if there are no channels)
    pub fn bin_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }
}

/// Control surface of a single playable instance owned by the audio engine
pub trait PlaybackInstance {
    /// Whether the engine still considers this handle alive
    fn is_valid(&self) -> bool;

    /// Raw engine state (pause is reported separately)
    fn engine_state(&self) -> EngineState;

    /// Whether the pause flag is set
    fn is_paused(&self) -> bool;

    /// Start playback from the current timeline position, clearing any pause
    fn start(&mut self);

    /// Request a stop
    fn stop(&mut self, mode: StopMode);

    /// Set or clear the pause flag
    fn set_paused(&mut self, paused: bool);

    /// Current timeline position in milliseconds
    fn timeline_position(&self) -> u32;

    /// Move the timeline position (milliseconds)
    fn set_timeline_position(&mut self, position_ms: u32);

    /// Current pitch multiplier (1.0 = native speed)
    fn pitch(&self) -> f32;

    /// Set the pitch multiplier
    fn set_pitch(&mut self, pitch: f32);

    /// Native length in milliseconds, pending until the asset has loaded
    ///
    /// A loaded asset with no audio reports `Ready(0)`, not `Pending`.
    fn length(&self) -> Readiness<u32>;

    /// Attach a spectrum analyser to the instance output
    fn attach_analyzer(&mut self, config: &AnalyzerConfig);

    /// Latest spectrum, `None` when no analyser is attached
    fn spectrum(&self) -> Option<SpectrumFrame>;

    /// Release the engine-side resources; called exactly once by the owner
    fn release(&mut self);
}

/// The audio subsystem: creates instances and decodes static sources
pub trait AudioBackend {
    /// Create a playable instance from a source reference
    fn create_instance(&mut self, source: &TrackSource) -> Result<Box<dyn PlaybackInstance>>;

    /// Read the decoded sample data of a static source (for offline waveforms)
    fn read_samples(&mut self, source: &TrackSource) -> Result<DecodedSamples>;
}

/// Which on-screen cursor a placement refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorId {
    /// The shared cursor spanning the whole sample group
    Group,
    /// A single track's own cursor
    Track(TrackId),
}

/// The presentation subsystem
pub trait Presenter {
    /// Bind a finished waveform image as the track's sprite at `origin`
    fn bind_waveform(&mut self, track: TrackId, origin: Point, image: &WaveformImage);

    /// Move a cursor to `position`
    fn place_cursor(&mut self, cursor: CursorId, position: Point);

    /// Draw (replace) the live spectrum polyline
    fn draw_polyline(&mut self, points: &[Point]);
}

/// A presenter that discards everything
///
/// Useful for headless runs where only the tick report matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn bind_waveform(&mut self, _track: TrackId, _origin: Point, _image: &WaveformImage) {}

    fn place_cursor(&mut self, _cursor: CursorId, _position: Point) {}

    fn draw_polyline(&mut self, _points: &[Point]) {}
}
