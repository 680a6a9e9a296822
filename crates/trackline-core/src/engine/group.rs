//! Track groups and aggregate state
//!
//! A [`TrackGroup`] keeps its tracks in insertion order; "first track"
//! comparisons elsewhere rely on that order. Group operations derive an
//! aggregate state with [`AggregateStateEvaluator`] and then drive every
//! track's controller individually.
//!
//! All group operations fail closed: if any track's handle is invalid the
//! whole operation is skipped and nothing is sent to the engine.

use crate::config::StartPolicy;
use crate::error::Readiness;
use crate::track::Track;
use crate::types::{PlaybackState, StopMode};

use super::controller::ControlAction;

/// Result of a group operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Number of tracks that were started
    Started(usize),
    /// Number of tracks that were paused
    Paused(usize),
    /// Number of tracks that were resumed
    Resumed(usize),
    /// Number of tracks asked to stop
    Stopped(usize),
    /// Number of tracks whose position was reset
    Reset(usize),
    /// Number of tracks whose pitch was adjusted
    Adjusted(usize),
    /// At least one handle was invalid; nothing was done
    Skipped,
    /// Nothing to do in the current aggregate state
    NoOp,
}

/// What a group toggle should do, derived from the tracks' states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDecision {
    StartAll,
    PauseAll,
    ResumeAll,
    Nothing,
}

/// Derives group-level state from per-track states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStateEvaluator {
    policy: StartPolicy,
}

impl AggregateStateEvaluator {
    pub fn new(policy: StartPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> StartPolicy {
        self.policy
    }

    /// Some track is `Playing`
    pub fn any_playing(states: &[PlaybackState]) -> bool {
        states.iter().any(|s| *s == PlaybackState::Playing)
    }

    /// Some track is `Stopped` or `Stopping`
    pub fn any_stopped(states: &[PlaybackState]) -> bool {
        states.iter().any(|s| s.is_stopped_or_stopping())
    }

    /// Every track is exactly `Stopped` (false for an empty group)
    pub fn all_stopped(states: &[PlaybackState]) -> bool {
        !states.is_empty() && states.iter().all(|s| *s == PlaybackState::Stopped)
    }

    /// Some track is `Paused`
    pub fn any_paused(states: &[PlaybackState]) -> bool {
        states.iter().any(|s| *s == PlaybackState::Paused)
    }

    /// Whether a bulk start is allowed under the configured policy
    pub fn can_start(&self, states: &[PlaybackState]) -> bool {
        match self.policy {
            StartPolicy::AllStopped => Self::all_stopped(states),
            StartPolicy::AnyStopped => Self::any_stopped(states),
        }
    }

    /// Precedence: start, then pause, then resume
    pub fn decide_toggle(&self, states: &[PlaybackState]) -> ToggleDecision {
        if self.can_start(states) {
            ToggleDecision::StartAll
        } else if Self::any_playing(states) {
            ToggleDecision::PauseAll
        } else if Self::any_paused(states) {
            ToggleDecision::ResumeAll
        } else {
            ToggleDecision::Nothing
        }
    }
}

/// Ordered collection of tracks controlled as one unit
pub struct TrackGroup {
    tracks: Vec<Track>,
    evaluator: AggregateStateEvaluator,
    stop_mode: StopMode,
}

impl TrackGroup {
    pub fn new(policy: StartPolicy, stop_mode: StopMode) -> Self {
        Self {
            tracks: Vec::new(),
            evaluator: AggregateStateEvaluator::new(policy),
            stop_mode,
        }
    }

    /// Append a track; iteration order is insertion order
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [Track] {
        &mut self.tracks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn evaluator(&self) -> &AggregateStateEvaluator {
        &self.evaluator
    }

    /// Snapshot of every track's state, in order
    pub fn states(&self) -> Vec<PlaybackState> {
        self.tracks.iter().map(|t| t.state()).collect()
    }

    /// Every track reports a valid handle
    pub fn all_valid(&self) -> bool {
        self.tracks.iter().all(|t| t.is_valid())
    }

    fn gate(&self, operation: &str) -> bool {
        if let Some(invalid) = self.tracks.iter().find(|t| !t.is_valid()) {
            log::warn!(
                "group {}: skipped, {} has an invalid handle",
                operation,
                invalid.id()
            );
            return false;
        }
        true
    }

    /// Apply `f` to every track, counting the calls that produced `expected`
    fn for_each(
        &mut self,
        f: impl FnMut(&mut Track) -> ControlAction,
        expected: ControlAction,
    ) -> usize {
        self.tracks
            .iter_mut()
            .map(f)
            .filter(|action| *action == expected)
            .count()
    }

    /// Start, pause or resume the whole group depending on its aggregate state
    pub fn toggle(&mut self) -> GroupOutcome {
        if !self.gate("toggle") {
            return GroupOutcome::Skipped;
        }
        let states = self.states();
        let decision = self.evaluator.decide_toggle(&states);
        log::debug!("group toggle: {:?} from {:?}", decision, states);

        match decision {
            ToggleDecision::StartAll => GroupOutcome::Started(
                self.for_each(|t| t.controller_mut().start(), ControlAction::Started),
            ),
            ToggleDecision::PauseAll => GroupOutcome::Paused(
                self.for_each(|t| t.controller_mut().pause(), ControlAction::Paused),
            ),
            ToggleDecision::ResumeAll => GroupOutcome::Resumed(
                self.for_each(|t| t.controller_mut().resume(), ControlAction::Resumed),
            ),
            ToggleDecision::Nothing => GroupOutcome::NoOp,
        }
    }

    /// Stop every `Playing` track; each fades out independently
    pub fn stop(&mut self) -> GroupOutcome {
        if !self.gate("stop") {
            return GroupOutcome::Skipped;
        }
        if !AggregateStateEvaluator::any_playing(&self.states()) {
            return GroupOutcome::NoOp;
        }
        let mode = self.stop_mode;
        let stopped = self.for_each(
            |t| {
                if t.state() == PlaybackState::Playing {
                    t.controller_mut().stop(mode)
                } else {
                    ControlAction::Ignored
                }
            },
            ControlAction::Stopped,
        );
        GroupOutcome::Stopped(stopped)
    }

    /// Move every track's raw position back to zero
    pub fn reset_positions(&mut self) -> GroupOutcome {
        if !self.gate("reset") {
            return GroupOutcome::Skipped;
        }
        for track in &mut self.tracks {
            track.controller_mut().set_position(0);
        }
        GroupOutcome::Reset(self.tracks.len())
    }

    /// Add `delta` to every track's pitch
    pub fn adjust_pitch(&mut self, delta: f32) -> GroupOutcome {
        if !self.gate("pitch") {
            return GroupOutcome::Skipped;
        }
        for track in &mut self.tracks {
            track.controller_mut().adjust_pitch(delta);
        }
        GroupOutcome::Adjusted(self.tracks.len())
    }

    /// Poll every track's length; true once all are resolved
    pub fn poll_lengths(&mut self) -> bool {
        let mut all_ready = true;
        for track in &mut self.tracks {
            if !matches!(track.poll_length(), Readiness::Ready(_)) {
                all_ready = false;
            }
        }
        all_ready
    }

    /// Longest resolved native length in the group
    pub fn longest_length(&self) -> Option<u32> {
        self.tracks.iter().filter_map(|t| t.length_ms()).max()
    }
}
