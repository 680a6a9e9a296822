//! Trackline Core - shared-timeline playback for a target track and sample tracks
//!
//! A session holds one *target* track, whose length defines the timeline scale,
//! and any number of *sample* tracks that are controlled as a group and drawn
//! on the same timeline. Audio decoding, DSP and drawing are delegated to the
//! collaborator traits in [`backend`]; this crate owns the timing math, the
//! playback state machine and the waveform rasterisation.

pub mod audio_file;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod timeline;
pub mod track;
pub mod types;
pub mod waveform;

pub use error::{Readiness, Result, TracklineError};
pub use session::{CommandOutcome, Session, SessionCommand, TickReport};
pub use types::*;
