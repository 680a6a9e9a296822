//! Playback coordination
//!
//! - [`PlaybackController`]: one engine instance, start/stop/pause/toggle
//! - [`TrackGroup`]: ordered tracks driven as a unit
//! - [`AggregateStateEvaluator`]: group state from per-track states

mod controller;
mod group;

pub use controller::{ControlAction, PlaybackController};
pub use group::{AggregateStateEvaluator, GroupOutcome, ToggleDecision, TrackGroup};
