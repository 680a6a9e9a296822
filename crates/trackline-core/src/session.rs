//! Per-tick coordination of the target track and the sample group
//!
//! A [`Session`] owns every track for its lifetime. Callers drive it from a
//! single loop:
//!
//! ```ignore
//! let mut session = Session::new(config, &mut backend)?;
//! loop {
//!     for command in pending_commands() {
//!         session.apply(command, &mut presenter);
//!     }
//!     let report = session.tick(&mut backend, &mut presenter);
//! }
//! ```
//!
//! Each tick polls readiness (target length, reference scale, sample
//! lengths), builds any waveform that became buildable, places cursors and
//! redraws the live spectrum curve. Nothing in a tick blocks.

use crate::backend::{AudioBackend, CursorId, Presenter};
use crate::config::{AnalyzerConfig, SessionConfig, TrackSource};
use crate::engine::{ControlAction, GroupOutcome, PlaybackController, TrackGroup};
use crate::error::{Readiness, Result};
use crate::timeline::{
    CursorPlacement, ReferenceLengthCalculator, ReferenceScale, TimelineMapper, TrackTiming,
};
use crate::track::Track;
use crate::types::{PlaybackState, Point, TrackId};
use crate::waveform::{LiveSpectrumCurve, WaveformRenderer, CURVE_POINTS};

/// Control commands a session accepts between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Play/pause the target track
    ToggleTarget,
    /// Stop the target track and flatten its curve
    StopTarget,
    /// Start/pause/resume the sample group
    ToggleSamples,
    /// Stop the sample group and return it to the origin
    StopSamples,
    /// Raise every sample track's pitch by the configured step
    PitchUp,
    /// Lower every sample track's pitch by the configured step
    PitchDown,
}

/// What a command did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Target(ControlAction),
    Samples(GroupOutcome),
}

/// Summary of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub target_state: PlaybackState,
    pub target_position_ms: u32,
    pub sample_states: Vec<PlaybackState>,
    pub scale: Option<ReferenceScale>,
    /// Waveform images bound during this tick
    pub waveforms_built: usize,
    pub group_cursor: Option<CursorPlacement>,
    /// The live curve was recomputed and redrawn this tick
    pub curve_redrawn: bool,
}

/// Target track plus sample group on one shared timeline
pub struct Session {
    config: SessionConfig,
    target: Track,
    samples: TrackGroup,
    sample_sources: Vec<TrackSource>,
    calculator: ReferenceLengthCalculator,
    mapper: TimelineMapper,
    renderer: WaveformRenderer,
    curve: LiveSpectrumCurve,
    group_origin: Point,
    scale_failure_reported: bool,
}

impl Session {
    /// Create every instance named by `config`
    ///
    /// The target must exist. Sample sources the backend cannot instantiate
    /// are logged and left out of the group.
    pub fn new(config: SessionConfig, backend: &mut dyn AudioBackend) -> Result<Self> {
        let timeline = &config.timeline;
        let height = timeline.height_px as f32;

        let target_analyzer = AnalyzerConfig {
            window_size: CURVE_POINTS as u32,
            window_shape: config.analyzer.window_shape,
        };
        let target_origin = Point::new(0.0, height);
        let instance = backend.create_instance(&config.target)?;
        let target = Track::new(
            PlaybackController::with_analyzer(TrackId::TARGET, instance, &target_analyzer),
            target_origin,
        );

        let group_origin = Point::new(0.0, 0.0);
        let mut samples = TrackGroup::new(config.playback.start_policy, config.playback.stop_mode);
        let mut sample_sources = Vec::with_capacity(config.samples.len());
        for source in &config.samples {
            let instance = match backend.create_instance(source) {
                Ok(instance) => instance,
                Err(e) => {
                    log::warn!("Skipping sample '{}': {}", source.name, e);
                    continue;
                }
            };
            let index = samples.len();
            let id = TrackId::new(index);
            let origin = Point::new(group_origin.x, group_origin.y - index as f32 * height);
            samples.push(Track::new(
                PlaybackController::with_analyzer(id, instance, &config.analyzer),
                origin,
            ));
            sample_sources.push(source.clone());
            log::info!("{}: '{}' at ({}, {})", id, source.name, origin.x, origin.y);
        }

        log::info!(
            "Session: target '{}', {} sample track(s), timeline {}x{} (canvas height {})",
            config.target.name,
            samples.len(),
            timeline.width_px,
            timeline.height_px,
            timeline.canvas_height_px()
        );

        Ok(Self {
            calculator: ReferenceLengthCalculator::new(timeline.width_px, timeline.height_px),
            mapper: TimelineMapper::new(&config.cursor),
            renderer: WaveformRenderer::new(config.waveform.clone()),
            curve: LiveSpectrumCurve::new(target_origin),
            target,
            samples,
            sample_sources,
            group_origin,
            scale_failure_reported: false,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn target(&self) -> &Track {
        &self.target
    }

    pub fn samples(&self) -> &TrackGroup {
        &self.samples
    }

    pub fn scale(&self) -> Option<ReferenceScale> {
        self.calculator.scale()
    }

    pub fn curve(&self) -> &LiveSpectrumCurve {
        &self.curve
    }

    /// Apply one control command
    pub fn apply(&mut self, command: SessionCommand, presenter: &mut dyn Presenter) -> CommandOutcome {
        log::debug!("Session: {:?}", command);
        let delta = self.config.playback.pitch_delta;
        match command {
            SessionCommand::ToggleTarget => {
                CommandOutcome::Target(self.target.controller_mut().toggle())
            }
            SessionCommand::StopTarget => {
                let action = self
                    .target
                    .controller_mut()
                    .stop(self.config.playback.stop_mode);
                if action == ControlAction::Stopped {
                    self.curve.reset();
                    presenter.draw_polyline(self.curve.points());
                }
                CommandOutcome::Target(action)
            }
            SessionCommand::ToggleSamples => CommandOutcome::Samples(self.samples.toggle()),
            SessionCommand::StopSamples => {
                let outcome = self.samples.stop();
                if outcome != GroupOutcome::Skipped {
                    self.cursor_to_origin(presenter);
                }
                CommandOutcome::Samples(outcome)
            }
            SessionCommand::PitchUp => CommandOutcome::Samples(self.samples.adjust_pitch(delta)),
            SessionCommand::PitchDown => CommandOutcome::Samples(self.samples.adjust_pitch(-delta)),
        }
    }

    /// Reset every sample position and park the shared cursor at the group origin
    fn cursor_to_origin(&mut self, presenter: &mut dyn Presenter) {
        self.samples.reset_positions();
        presenter.place_cursor(CursorId::Group, self.group_origin);
    }

    /// Run one tick
    pub fn tick(&mut self, backend: &mut dyn AudioBackend, presenter: &mut dyn Presenter) -> TickReport {
        self.update_scale();
        self.samples.poll_lengths();
        let waveforms_built = self.build_waveforms(backend, presenter);
        let group_cursor = self.place_cursors(presenter);
        let curve_redrawn = self.redraw_curve(presenter);

        let report = TickReport {
            target_state: self.target.state(),
            target_position_ms: self.target.position(),
            sample_states: self.samples.states(),
            scale: self.calculator.scale(),
            waveforms_built,
            group_cursor,
            curve_redrawn,
        };
        log::trace!("tick: {:?}", report);
        report
    }

    fn update_scale(&mut self) {
        let target_length = self.target.poll_length();
        match self.calculator.poll(target_length) {
            Readiness::Ready(_) => {
                self.calculator
                    .propagate(std::slice::from_mut(&mut self.target));
                self.calculator.propagate(self.samples.tracks_mut());
            }
            Readiness::Pending => {}
            Readiness::Failed(reason) => {
                if !self.scale_failure_reported {
                    log::warn!("Reference length unavailable: {}", reason);
                    self.scale_failure_reported = true;
                }
            }
        }
    }

    fn build_waveforms(&mut self, backend: &mut dyn AudioBackend, presenter: &mut dyn Presenter) -> usize {
        let mut built = 0;
        for (track, source) in self
            .samples
            .tracks_mut()
            .iter_mut()
            .zip(self.sample_sources.iter())
        {
            if !track.needs_waveform() {
                continue;
            }
            let decoded = match backend.read_samples(source) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!(
                        "{}: no sample data for '{}' ({}), rendering background only",
                        track.id(),
                        source.name,
                        e
                    );
                    Default::default()
                }
            };
            match track.build_waveform(decoded.samples(), &self.renderer) {
                Ok(image) => {
                    presenter.bind_waveform(track.id(), track.origin(), &image);
                    built += 1;
                }
                Err(e) => log::warn!("{}: waveform not built: {}", track.id(), e),
            }
        }
        built
    }

    fn place_cursors(&mut self, presenter: &mut dyn Presenter) -> Option<CursorPlacement> {
        let width_per_ms = self.calculator.scale()?.width_per_ms();

        for track in self.samples.tracks_mut() {
            let Some(length_ms) = track.length_ms() else {
                continue;
            };
            let placement = self.mapper.place(track.position(), length_ms, width_per_ms);
            if placement.degenerate && track.report_zero_length() {
                log::warn!("{}: zero native length, cursor held at origin", track.id());
            }
            let origin = track.origin();
            presenter.place_cursor(
                CursorId::Track(track.id()),
                Point::new(origin.x + placement.x, origin.y),
            );
        }

        let timings: Vec<TrackTiming> = self
            .samples
            .iter()
            .map(|t| TrackTiming {
                position_ms: t.position(),
                length_ms: t.length_ms(),
            })
            .collect();
        let placement = self.mapper.place_group(&timings, width_per_ms)?;
        presenter.place_cursor(
            CursorId::Group,
            Point::new(self.group_origin.x + placement.x, self.group_origin.y),
        );
        Some(placement)
    }

    /// Redraw while audio is flowing; a zero-channel frame skips the tick
    fn redraw_curve(&mut self, presenter: &mut dyn Presenter) -> bool {
        if !matches!(
            self.target.state(),
            PlaybackState::Playing | PlaybackState::Stopping
        ) {
            return false;
        }
        let Some(frame) = self.target.controller().spectrum() else {
            return false;
        };
        if !self.curve.update(&frame) {
            return false;
        }
        presenter.draw_polyline(self.curve.points());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_file::DecodedSamples;
    use crate::backend::{PlaybackInstance, SimulatedBackend, SimulatedSource};
    use crate::config::StartPolicy;
    use crate::track::TrackPhase;
    use crate::waveform::WaveformImage;

    #[derive(Default)]
    struct RecordingPresenter {
        waveforms: Vec<(TrackId, Point, u32, u32)>,
        cursors: Vec<(CursorId, Point)>,
        polylines: Vec<Vec<Point>>,
    }

    impl RecordingPresenter {
        fn last_cursor(&self, id: CursorId) -> Option<Point> {
            self.cursors
                .iter()
                .rev()
                .find(|(c, _)| *c == id)
                .map(|(_, p)| *p)
        }
    }

    impl Presenter for RecordingPresenter {
        fn bind_waveform(&mut self, track: TrackId, origin: Point, image: &WaveformImage) {
            self.waveforms
                .push((track, origin, image.width(), image.height()));
        }

        fn place_cursor(&mut self, cursor: CursorId, position: Point) {
            self.cursors.push((cursor, position));
        }

        fn draw_polyline(&mut self, points: &[Point]) {
            self.polylines.push(points.to_vec());
        }
    }

    /// Counts decoded-sample reads on top of a simulated backend
    struct CountingBackend {
        inner: SimulatedBackend,
        reads: usize,
    }

    impl AudioBackend for CountingBackend {
        fn create_instance(&mut self, source: &TrackSource) -> Result<Box<dyn PlaybackInstance>> {
            self.inner.create_instance(source)
        }

        fn read_samples(&mut self, source: &TrackSource) -> Result<DecodedSamples> {
            self.reads += 1;
            self.inner.read_samples(source)
        }
    }

    const EPS: f32 = 1e-2;

    fn config(samples: &[&str]) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.target = TrackSource::named("target");
        config.samples = samples.iter().map(|s| TrackSource::named(*s)).collect();
        config
    }

    fn backend() -> SimulatedBackend {
        let mut backend = SimulatedBackend::new().with_fade_ms(100.0);
        backend.add_source("target", SimulatedSource::silent(60_000));
        backend.add_source("half", SimulatedSource::silent(30_000));
        backend.add_source("quarter", SimulatedSource::silent(15_000));
        backend
    }

    #[test]
    fn test_end_to_end_timeline() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["half"]), &mut backend).unwrap();

        let report = session.tick(&mut backend, &mut presenter);
        let scale = report.scale.unwrap();
        assert_eq!(scale.reference_length_ms, 120_000);
        assert!((scale.width_per_ms() - 0.008_533).abs() < 1e-5);
        assert_eq!(report.waveforms_built, 1);
        assert_eq!(presenter.waveforms, vec![(TrackId::new(0), Point::new(0.0, 0.0), 256, 256)]);

        session.apply(SessionCommand::ToggleSamples, &mut presenter);
        backend.advance(15_000.0);
        let report = session.tick(&mut backend, &mut presenter);

        // x_raw = 128, origin offset = 8
        let cursor = report.group_cursor.unwrap();
        assert!((cursor.fraction - 0.5).abs() < 1e-4);
        assert!((cursor.x - 120.0).abs() < EPS);
        let track_cursor = presenter.last_cursor(CursorId::Track(TrackId::new(0))).unwrap();
        assert!((track_cursor.x - 120.0).abs() < EPS);
    }

    #[test]
    fn test_waits_for_target_length() {
        let mut backend = backend();
        backend.add_source("slow", SimulatedSource::silent(60_000).with_ready_after(2));
        let mut config = config(&["half"]);
        config.target = TrackSource::named("slow");
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config, &mut backend).unwrap();

        for _ in 0..2 {
            let report = session.tick(&mut backend, &mut presenter);
            assert!(report.scale.is_none());
            assert!(report.group_cursor.is_none());
            assert_eq!(report.waveforms_built, 0);
        }
        let report = session.tick(&mut backend, &mut presenter);
        assert_eq!(report.scale.map(|s| s.reference_length_ms), Some(120_000));
        assert_eq!(report.waveforms_built, 1);
    }

    #[test]
    fn test_waveforms_built_once() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["half", "quarter"]), &mut backend).unwrap();

        for _ in 0..5 {
            session.tick(&mut backend, &mut presenter);
        }
        assert_eq!(presenter.waveforms.len(), 2);
        assert_eq!(presenter.waveforms[1], (TrackId::new(1), Point::new(0.0, -256.0), 128, 256));
    }

    #[test]
    fn test_group_cursor_uses_longest_track() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut config = config(&["quarter", "half"]);
        config.cursor.cursor_width_px = 0.0;
        let mut session = Session::new(config, &mut backend).unwrap();

        session.tick(&mut backend, &mut presenter);
        session.apply(SessionCommand::ToggleSamples, &mut presenter);
        backend.advance(7_500.0);
        let report = session.tick(&mut backend, &mut presenter);

        // first track is half way; width comes from the 30 s track (256 px)
        let cursor = report.group_cursor.unwrap();
        assert!((cursor.x - 128.0).abs() < EPS);
        let first = presenter.last_cursor(CursorId::Track(TrackId::new(0))).unwrap();
        assert!((first.x - 64.0).abs() < EPS);
    }

    #[test]
    fn test_stop_samples_returns_to_origin() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["half", "quarter"]), &mut backend).unwrap();

        session.tick(&mut backend, &mut presenter);
        session.apply(SessionCommand::ToggleSamples, &mut presenter);
        backend.advance(2_000.0);

        let outcome = session.apply(SessionCommand::StopSamples, &mut presenter);
        assert_eq!(outcome, CommandOutcome::Samples(GroupOutcome::Stopped(2)));
        assert_eq!(presenter.last_cursor(CursorId::Group), Some(Point::new(0.0, 0.0)));
        assert!(session.samples().iter().all(|t| t.position() == 0));

        let report = session.tick(&mut backend, &mut presenter);
        assert_eq!(report.sample_states, vec![PlaybackState::Stopping; 2]);
        backend.advance(200.0);
        let report = session.tick(&mut backend, &mut presenter);
        assert_eq!(report.sample_states, vec![PlaybackState::Stopped; 2]);
    }

    #[test]
    fn test_live_curve_follows_target() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&[]), &mut backend).unwrap();

        let report = session.tick(&mut backend, &mut presenter);
        assert!(!report.curve_redrawn);

        session.apply(SessionCommand::ToggleTarget, &mut presenter);
        backend.advance(16.0);
        let report = session.tick(&mut backend, &mut presenter);
        assert!(report.curve_redrawn);
        assert_eq!(presenter.polylines.last().map(|p| p.len()), Some(CURVE_POINTS));
        assert!(!session.curve().is_flat());

        // Paused: no redraw
        session.apply(SessionCommand::ToggleTarget, &mut presenter);
        let report = session.tick(&mut backend, &mut presenter);
        assert!(!report.curve_redrawn);

        session.apply(SessionCommand::ToggleTarget, &mut presenter);
        let outcome = session.apply(SessionCommand::StopTarget, &mut presenter);
        assert_eq!(outcome, CommandOutcome::Target(ControlAction::Stopped));
        assert!(session.curve().is_flat());
        let last = presenter.polylines.last().unwrap();
        assert!(last.iter().all(|p| p.y == session.curve().origin().y));
    }

    #[test]
    fn test_invalid_sample_skips_group_toggle() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["half", "quarter"]), &mut backend).unwrap();
        backend.invalidate("quarter");

        let outcome = session.apply(SessionCommand::ToggleSamples, &mut presenter);
        assert_eq!(outcome, CommandOutcome::Samples(GroupOutcome::Skipped));
        assert_eq!(backend.voice("half").unwrap().commands, 0);
    }

    #[test]
    fn test_pitch_commands() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["half", "quarter"]), &mut backend).unwrap();

        session.apply(SessionCommand::PitchUp, &mut presenter);
        session.apply(SessionCommand::PitchUp, &mut presenter);
        session.apply(SessionCommand::PitchDown, &mut presenter);
        for name in ["half", "quarter"] {
            let pitch = backend.voice(name).unwrap().pitch;
            assert!((pitch - 1.001).abs() < 1e-5);
        }
        assert!((backend.voice("target").unwrap().pitch - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_sample_is_left_out() {
        let mut backend = backend();
        let session = Session::new(config(&["half", "missing", "quarter"]), &mut backend).unwrap();
        assert_eq!(session.samples().len(), 2);
        assert_eq!(session.samples().get(1).map(|t| t.id()), Some(TrackId::new(1)));
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let mut backend = SimulatedBackend::new();
        assert!(Session::new(config(&[]), &mut backend).is_err());
    }

    #[test]
    fn test_any_stopped_policy_through_session() {
        let mut backend = backend();
        let mut presenter = RecordingPresenter::default();
        let mut config = config(&["half", "quarter"]);
        config.playback.start_policy = StartPolicy::AnyStopped;
        let mut session = Session::new(config, &mut backend).unwrap();

        session.apply(SessionCommand::ToggleSamples, &mut presenter);
        // quarter (15 s) ends first and reports Stopped; half keeps playing
        backend.advance(20_000.0);
        let report = session.tick(&mut backend, &mut presenter);
        assert_eq!(
            report.sample_states,
            vec![PlaybackState::Playing, PlaybackState::Stopped]
        );

        let outcome = session.apply(SessionCommand::ToggleSamples, &mut presenter);
        assert_eq!(outcome, CommandOutcome::Samples(GroupOutcome::Started(1)));
    }

    #[test]
    fn test_too_narrow_waveform_is_read_once() {
        let mut inner = backend();
        inner.add_source("short", SimulatedSource::silent(50));
        let mut backend = CountingBackend { inner, reads: 0 };
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["short"]), &mut backend).unwrap();

        for _ in 0..100 {
            session.tick(&mut backend, &mut presenter);
        }
        assert_eq!(backend.reads, 1);
        assert_eq!(session.samples().get(0).map(|t| t.phase()), Some(TrackPhase::Degenerate));
        assert!(presenter.waveforms.is_empty());
    }

    #[test]
    fn test_zero_length_sample_holds_cursor_at_origin() {
        let mut backend = backend();
        backend.add_source("empty", SimulatedSource::silent(0));
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config(&["empty", "half"]), &mut backend).unwrap();

        for _ in 0..9 {
            session.tick(&mut backend, &mut presenter);
        }
        let report = session.tick(&mut backend, &mut presenter);
        let empty = session.samples().get(0).unwrap();
        assert_eq!(empty.length_ms(), Some(0));
        assert_eq!(empty.phase(), TrackPhase::Degenerate);
        assert_eq!(presenter.waveforms.len(), 1);
        assert_eq!(presenter.waveforms[0].0, TrackId::new(1));

        // Position reference is the empty track: clamped to the origin and flagged
        let cursor = report.group_cursor.unwrap();
        assert!(cursor.degenerate);
        assert_eq!(cursor.fraction, 0.0);
        assert_eq!(cursor.x, -8.0);
        let track_cursor = presenter.last_cursor(CursorId::Track(TrackId::new(0))).unwrap();
        assert_eq!(track_cursor, Point::new(-8.0, 0.0));
    }

    #[test]
    fn test_zero_length_target_never_scales() {
        let mut backend = backend();
        backend.add_source("silence", SimulatedSource::silent(0));
        let mut config = config(&["half"]);
        config.target = TrackSource::named("silence");
        let mut presenter = RecordingPresenter::default();
        let mut session = Session::new(config, &mut backend).unwrap();

        for _ in 0..3 {
            let report = session.tick(&mut backend, &mut presenter);
            assert!(report.scale.is_none());
            assert!(report.group_cursor.is_none());
        }
        assert!(presenter.waveforms.is_empty());
    }
}
