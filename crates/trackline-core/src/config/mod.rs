//! Session configuration
//!
//! Configuration is stored as YAML. Every section is `#[serde(default)]`, so a
//! partial file only overrides what it names.
//!
//! # Usage
//!
//! ```ignore
//! use trackline_core::config::{default_config_path, load_config, SessionConfig};
//!
//! let config: SessionConfig = load_config(&default_config_path());
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::default_config_path;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{Color, StopMode, DEFAULT_TIMELINE_HEIGHT, DEFAULT_TIMELINE_WIDTH};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Timeline dimensions shared by every track
    pub timeline: TimelineConfig,
    /// The target (reference) track
    pub target: TrackSource,
    /// The sample tracks, in display order
    pub samples: Vec<TrackSource>,
    /// Playback behaviour
    pub playback: PlaybackConfig,
    /// Cursor placement
    pub cursor: CursorConfig,
    /// Spectrum analyser attached to every instance
    pub analyzer: AnalyzerConfig,
    /// Waveform image appearance
    pub waveform: WaveformStyle,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            target: TrackSource::named("target"),
            samples: Vec::new(),
            playback: PlaybackConfig::default(),
            cursor: CursorConfig::default(),
            analyzer: AnalyzerConfig::default(),
            waveform: WaveformStyle::default(),
        }
    }
}

/// Reference to a playable source
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSource {
    /// Name the audio backend knows the source by
    pub name: String,
    /// Optional file the source was decoded from
    pub path: Option<PathBuf>,
}

impl TrackSource {
    /// Source known only by name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    /// Source backed by a file
    pub fn with_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }
}

/// Timeline dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Width in pixels that corresponds to the full reference length
    pub width_px: u32,
    /// Height of one track row in pixels
    pub height_px: u32,
    /// Canvas height as a multiple of the row height
    pub canvas_height_factor: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_TIMELINE_WIDTH,
            height_px: DEFAULT_TIMELINE_HEIGHT,
            canvas_height_factor: 3,
        }
    }
}

impl TimelineConfig {
    /// Total canvas height in pixels
    pub fn canvas_height_px(&self) -> u32 {
        self.height_px.saturating_mul(self.canvas_height_factor)
    }
}

/// When a sample group toggle may bulk-start its tracks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Every track must be fully `Stopped`
    #[default]
    AllStopped,
    /// Any track in `Stopped` or `Stopping` is enough
    AnyStopped,
}

/// Playback behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Group bulk-start policy
    pub start_policy: StartPolicy,
    /// Pitch step applied by pitch up/down commands
    pub pitch_delta: f32,
    /// How stop requests end playback
    pub stop_mode: StopMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_policy: StartPolicy::default(),
            pitch_delta: 0.001,
            stop_mode: StopMode::AllowFadeout,
        }
    }
}

/// Which track's length scales the shared group cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleReference {
    /// The longest track in the group
    #[default]
    Longest,
    /// A fixed track index
    FixedIndex(usize),
}

/// Cursor placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Track whose position drives the shared group cursor
    pub position_reference_index: usize,
    /// Track whose length scales the shared group cursor
    pub scale_reference: ScaleReference,
    /// Width of the cursor sprite in pixels; half of it is the origin offset
    pub cursor_width_px: f32,
    /// Pixels per presentation unit (1.0 draws in pixels)
    pub pixels_per_unit: f32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            position_reference_index: 0,
            scale_reference: ScaleReference::Longest,
            cursor_width_px: 16.0,
            pixels_per_unit: 1.0,
        }
    }
}

impl CursorConfig {
    /// Offset that centres the cursor sprite on its position
    pub fn origin_offset(&self) -> f32 {
        self.cursor_width_px / 2.0
    }
}

/// Analyser window shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowShape {
    #[default]
    Rectangular,
    Triangle,
    Hamming,
    Hann,
    Blackman,
}

/// Spectrum analyser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Number of spectrum bins; the transform window is twice this size
    pub window_size: u32,
    /// Window function
    pub window_shape: WindowShape,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            window_shape: WindowShape::Rectangular,
        }
    }
}

impl AnalyzerConfig {
    /// Transform window length in samples
    pub fn transform_size(&self) -> u32 {
        self.window_size.saturating_mul(2)
    }

    /// Number of magnitude bins per channel
    pub fn bin_count(&self) -> usize {
        self.window_size as usize
    }
}

/// How raw magnitudes are turned into column heights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeScale {
    /// Time-domain PCM in [-1.0, 1.0]
    #[default]
    LinearPcm,
    /// Spectrum magnitudes (much larger numeric range)
    Spectrum,
}

/// Waveform image appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformStyle {
    pub background: Color,
    pub foreground: Color,
    pub amplitude: AmplitudeScale,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            background: Color::BLACK,
            foreground: Color::YELLOW,
            amplitude: AmplitudeScale::LinearPcm,
        }
    }
}
