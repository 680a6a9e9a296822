//! Per-track playback control
//!
//! A [`PlaybackController`] exclusively owns one engine instance handle and
//! releases it exactly once when dropped. Every control call issues at most
//! one command to the engine; nothing is retried.

use crate::backend::{PlaybackInstance, SpectrumFrame};
use crate::config::AnalyzerConfig;
use crate::error::Readiness;
use crate::types::{PlaybackState, StopMode, TrackId};

/// What a control call actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Started,
    Paused,
    Resumed,
    Stopped,
    /// The call had no effect in the current state
    Ignored,
}

/// Control surface for a single track
pub struct PlaybackController {
    id: TrackId,
    instance: Box<dyn PlaybackInstance>,
    released: bool,
}

impl PlaybackController {
    /// Take ownership of an instance handle
    pub fn new(id: TrackId, instance: Box<dyn PlaybackInstance>) -> Self {
        Self {
            id,
            instance,
            released: false,
        }
    }

    /// Take ownership of an instance handle and attach a spectrum analyser to it
    pub fn with_analyzer(
        id: TrackId,
        mut instance: Box<dyn PlaybackInstance>,
        analyzer: &AnalyzerConfig,
    ) -> Self {
        log::debug!(
            "{}: attaching analyser ({:?}, {} bins, transform {})",
            id,
            analyzer.window_shape,
            analyzer.bin_count(),
            analyzer.transform_size()
        );
        instance.attach_analyzer(analyzer);
        Self::new(id, instance)
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Whether the underlying handle is still usable
    pub fn is_valid(&self) -> bool {
        !self.released && self.instance.is_valid()
    }

    /// Current playback state (snapshot)
    ///
    /// An invalid handle reads as `Stopped`.
    pub fn state(&self) -> PlaybackState {
        if !self.is_valid() {
            return PlaybackState::Stopped;
        }
        PlaybackState::from_engine(self.instance.engine_state(), self.instance.is_paused())
    }

    /// Current raw position in milliseconds (snapshot)
    pub fn position(&self) -> u32 {
        if !self.is_valid() {
            return 0;
        }
        self.instance.timeline_position()
    }

    /// Native length, pending until the source has loaded
    pub fn length(&self) -> Readiness<u32> {
        if !self.is_valid() {
            return Readiness::Failed(format!("{} has no valid instance", self.id));
        }
        self.instance.length()
    }

    /// Latest spectrum frame, `None` without an analyser or a valid handle
    pub fn spectrum(&self) -> Option<SpectrumFrame> {
        if !self.is_valid() {
            return None;
        }
        self.instance.spectrum()
    }

    // --- Playback controls ---

    /// Start playback; only acts on a `Stopped` track
    pub fn start(&mut self) -> ControlAction {
        if !self.is_valid() {
            log::debug!("{}: start ignored, invalid handle", self.id);
            return ControlAction::Ignored;
        }
        match self.state() {
            PlaybackState::Stopped => {
                self.instance.start();
                log::info!("{}: start", self.id);
                ControlAction::Started
            }
            _ => ControlAction::Ignored,
        }
    }

    /// Pause a `Playing` track
    pub fn pause(&mut self) -> ControlAction {
        if self.state() != PlaybackState::Playing {
            return ControlAction::Ignored;
        }
        self.instance.set_paused(true);
        log::info!("{}: pause", self.id);
        ControlAction::Paused
    }

    /// Resume a `Paused` track
    pub fn resume(&mut self) -> ControlAction {
        if self.state() != PlaybackState::Paused {
            return ControlAction::Ignored;
        }
        self.instance.set_paused(false);
        log::info!("{}: resume", self.id);
        ControlAction::Resumed
    }

    /// Stopped starts, Playing pauses, Paused resumes, Stopping is left to finish
    pub fn toggle(&mut self) -> ControlAction {
        match self.state() {
            PlaybackState::Stopped => self.start(),
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Stopping => {
                log::debug!("{}: toggle ignored while stopping", self.id);
                ControlAction::Ignored
            }
        }
    }

    /// Request a stop from `Playing` or `Paused`
    ///
    /// With a fade-out the engine reports `Stopping` first; the final
    /// `Stopped` is only visible on a later poll.
    pub fn stop(&mut self, mode: StopMode) -> ControlAction {
        match self.state() {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.instance.stop(mode);
                log::info!("{}: stop ({:?})", self.id, mode);
                ControlAction::Stopped
            }
            _ => ControlAction::Ignored,
        }
    }

    /// Move the raw playback cursor; range checks are the engine's concern
    pub fn set_position(&mut self, position_ms: u32) {
        if !self.is_valid() {
            return;
        }
        self.instance.set_timeline_position(position_ms);
        log::trace!("{}: position -> {} ms", self.id, position_ms);
    }

    /// Current pitch multiplier
    pub fn pitch(&self) -> f32 {
        self.instance.pitch()
    }

    /// Add `delta` to the current pitch and return the new value
    pub fn adjust_pitch(&mut self, delta: f32) -> f32 {
        if !self.is_valid() {
            return self.instance.pitch();
        }
        let pitch = self.instance.pitch() + delta;
        self.instance.set_pitch(pitch);
        log::debug!("{}: pitch -> {:.3}", self.id, pitch);
        pitch
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if !self.released {
            self.instance.release();
            self.released = true;
            log::debug!("{}: released instance", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioBackend, SimulatedBackend, SimulatedSource};
    use crate::config::TrackSource;

    fn controller(backend: &mut SimulatedBackend, name: &str) -> PlaybackController {
        let instance = backend.create_instance(&TrackSource::named(name)).unwrap();
        PlaybackController::new(TrackId::new(0), instance)
    }

    fn backend() -> SimulatedBackend {
        let mut backend = SimulatedBackend::new().with_fade_ms(100.0);
        backend.add_source("a", SimulatedSource::silent(10_000));
        backend
    }

    #[test]
    fn test_toggle_cycle() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        assert_eq!(track.state(), PlaybackState::Stopped);

        assert_eq!(track.toggle(), ControlAction::Started);
        assert_eq!(track.state(), PlaybackState::Playing);

        assert_eq!(track.toggle(), ControlAction::Paused);
        assert_eq!(track.state(), PlaybackState::Paused);

        assert_eq!(track.toggle(), ControlAction::Resumed);
        assert_eq!(track.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_stop_is_not_synchronous() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        track.start();

        assert_eq!(track.stop(StopMode::AllowFadeout), ControlAction::Stopped);
        assert_eq!(track.state(), PlaybackState::Stopping);

        // Toggle must not restart a fading track
        assert_eq!(track.toggle(), ControlAction::Ignored);
        assert_eq!(track.state(), PlaybackState::Stopping);

        backend.advance(150.0);
        assert_eq!(track.state(), PlaybackState::Stopped);
        assert_eq!(track.toggle(), ControlAction::Started);
    }

    #[test]
    fn test_stop_from_paused() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        track.start();
        track.pause();
        assert_eq!(track.stop(StopMode::Immediate), ControlAction::Stopped);
        assert_eq!(track.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_stop_when_stopped_issues_nothing() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        assert_eq!(track.stop(StopMode::AllowFadeout), ControlAction::Ignored);
        assert_eq!(backend.voice("a").unwrap().commands, 0);
    }

    #[test]
    fn test_one_command_per_call() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        track.toggle();
        assert_eq!(backend.voice("a").unwrap().commands, 1);
        track.toggle();
        assert_eq!(backend.voice("a").unwrap().commands, 2);
        track.stop(StopMode::AllowFadeout);
        assert_eq!(backend.voice("a").unwrap().commands, 3);
    }

    #[test]
    fn test_invalid_handle_is_a_silent_noop() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        backend.invalidate("a");

        assert!(!track.is_valid());
        assert_eq!(track.toggle(), ControlAction::Ignored);
        assert_eq!(track.state(), PlaybackState::Stopped);
        assert!(matches!(track.length(), Readiness::Failed(_)));
        assert_eq!(backend.voice("a").unwrap().commands, 0);
    }

    #[test]
    fn test_position_and_pitch() {
        let mut backend = backend();
        let mut track = controller(&mut backend, "a");
        track.set_position(2_500);
        assert_eq!(track.position(), 2_500);

        let pitch = track.adjust_pitch(0.001);
        assert!((pitch - 1.001).abs() < 1e-6);
        assert!((track.pitch() - 1.001).abs() < 1e-6);
    }

    #[test]
    fn test_analyzer_attached_on_creation() {
        let mut backend = backend();
        let instance = backend.create_instance(&TrackSource::named("a")).unwrap();
        let track =
            PlaybackController::with_analyzer(TrackId::new(0), instance, &AnalyzerConfig::default());
        assert!(backend.voice("a").unwrap().analyzer_attached);
        assert_eq!(track.spectrum().map(|f| f.num_channels()), Some(0));
    }

    #[test]
    fn test_release_exactly_once_on_drop() {
        let mut backend = backend();
        let track = controller(&mut backend, "a");
        assert_eq!(backend.released_count(), 0);
        drop(track);
        assert_eq!(backend.released_count(), 1);
        assert!(backend.voice("a").unwrap().released);
    }
}
