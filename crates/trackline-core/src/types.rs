//! Common types for Trackline
//!
//! Playback states, track identifiers, colours and the handful of constants
//! shared by the timeline and waveform code.

use serde::{Deserialize, Serialize};

/// Headroom factor applied to the target length to obtain the reference length.
///
/// Leaves room on the timeline for pitch-driven stretching of the sample tracks.
pub const REFERENCE_HEADROOM: u32 = 2;

/// Default timeline width in pixels
pub const DEFAULT_TIMELINE_WIDTH: u32 = 1024;

/// Default timeline (per track row) height in pixels
pub const DEFAULT_TIMELINE_HEIGHT: u32 = 256;

/// Milliseconds per second, as f32 for the position math
pub const MS_PER_SECOND: f32 = 1000.0;

/// Track identifier (position in its group, 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TrackId(pub usize);

impl TrackId {
    /// Id of the target track, outside every sample group's index range
    pub const TARGET: TrackId = TrackId(usize::MAX);

    /// Create a new track id
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == TrackId::TARGET {
            write!(f, "target")
        } else {
            write!(f, "track-{}", self.0)
        }
    }
}

/// Playback state of a single track as seen by the coordination logic
///
/// `Stopping` is the fade-out window between a stop request and the engine
/// reporting `Stopped`. It is not a restartable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Stopping,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Derive the playback state from the engine state and the pause flag
    ///
    /// Audio engines keep a paused instance in their "playing" state and carry
    /// the pause as a separate flag; the coordination logic wants one value.
    pub fn from_engine(engine: EngineState, paused: bool) -> Self {
        match engine {
            EngineState::Playing if paused => PlaybackState::Paused,
            EngineState::Playing => PlaybackState::Playing,
            EngineState::Stopping => PlaybackState::Stopping,
            EngineState::Stopped => PlaybackState::Stopped,
        }
    }

    /// True for `Stopped` and `Stopping`
    pub fn is_stopped_or_stopping(&self) -> bool {
        matches!(self, PlaybackState::Stopped | PlaybackState::Stopping)
    }

    /// Short name for logs and status lines
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Stopping => "stopping",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

/// Raw state reported by the audio engine for an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Stopped,
    Playing,
    Stopping,
}

/// How a stop request should end playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Let the engine fade out; the instance passes through `Stopping`
    #[default]
    AllowFadeout,
    /// Cut immediately
    Immediate,
}

/// An RGBA colour, 8 bits per channel
///
/// `#[repr(C)]` keeps the layout `[r, g, b, a]` so pixel grids can be viewed
/// as raw bytes for texture upload without a copy.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    bytemuck::Pod, bytemuck::Zeroable,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 235, 4);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour with alpha
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A point in presentation space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
