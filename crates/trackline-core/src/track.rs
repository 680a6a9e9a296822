//! Track entity and its initialisation phases
//!
//! A track is created as soon as its engine instance exists, long before the
//! shared timeline scale is known. Construction therefore advances through
//! explicit phases:
//!
//! ```text
//! Uninitialized --(scale applied)--> ScaleReady --(waveform built)--> WaveformBuilt
//!                                               \--(no drawable area)--> Degenerate
//! ```
//!
//! `WaveformBuilt` and `Degenerate` are terminal. Each transition happens at
//! most once. Re-applying a scale or re-building a
//! waveform is a no-op, so late or repeated propagation can never corrupt an
//! image that is already bound.

use crate::engine::PlaybackController;
use crate::error::{Readiness, Result, TracklineError};
use crate::timeline::ReferenceScale;
use crate::types::{PlaybackState, Point, TrackId};
use crate::waveform::{WaveformImage, WaveformRenderer};

/// Initialisation phase of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TrackPhase {
    /// Instance exists, no timeline scale yet
    #[default]
    Uninitialized,
    /// Shared scale received, waveform not built
    ScaleReady,
    /// Waveform image built and handed to the presenter
    WaveformBuilt,
    /// Waveform would be empty (zero width or height); never retried
    Degenerate,
}

/// One playable track on the shared timeline
pub struct Track {
    id: TrackId,
    controller: PlaybackController,
    origin: Point,
    length_ms: Option<u32>,
    scale: Option<ReferenceScale>,
    phase: TrackPhase,
    zero_length_reported: bool,
}

impl Track {
    /// Wrap a controller; `origin` is fixed for the lifetime of the track
    pub fn new(controller: PlaybackController, origin: Point) -> Self {
        Self {
            id: controller.id(),
            controller,
            origin,
            length_ms: None,
            scale: None,
            phase: TrackPhase::Uninitialized,
            zero_length_reported: false,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn phase(&self) -> TrackPhase {
        self.phase
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn position(&self) -> u32 {
        self.controller.position()
    }

    pub fn is_valid(&self) -> bool {
        self.controller.is_valid()
    }

    /// Poll the native length, caching it once the engine reports it
    ///
    /// After the first `Ready` the cached value is returned without asking the
    /// engine again; the native length is fixed once resolved.
    pub fn poll_length(&mut self) -> Readiness<u32> {
        if let Some(length) = self.length_ms {
            return Readiness::Ready(length);
        }
        let readiness = self.controller.length();
        if let Readiness::Ready(length) = readiness {
            log::debug!("{}: native length {} ms", self.id, length);
            self.length_ms = Some(length);
        }
        readiness
    }

    /// Cached native length, if resolved
    pub fn length_ms(&self) -> Option<u32> {
        self.length_ms
    }

    /// Shared scale, once applied
    pub fn scale(&self) -> Option<&ReferenceScale> {
        self.scale.as_ref()
    }

    /// Receive the shared timeline scale
    ///
    /// Returns `true` if this call advanced the phase.
    pub fn apply_scale(&mut self, scale: ReferenceScale) -> bool {
        if self.phase != TrackPhase::Uninitialized {
            log::trace!("{}: scale already applied", self.id);
            return false;
        }
        self.scale = Some(scale);
        self.phase = TrackPhase::ScaleReady;
        true
    }

    /// Rendered width of this track on the shared timeline
    pub fn width_px(&self) -> Option<f32> {
        let scale = self.scale.as_ref()?;
        let length = self.length_ms?;
        Some(scale.track_width_px(length))
    }

    /// Whether the waveform can be built now
    pub fn needs_waveform(&self) -> bool {
        self.phase == TrackPhase::ScaleReady
            && self.length_ms.is_some()
            && self
                .scale
                .as_ref()
                .is_some_and(|s| s.reference_length_ms > 0)
    }

    /// Render the static waveform from decoded samples
    ///
    /// Only valid in `ScaleReady` with a resolved length; advances to
    /// `WaveformBuilt` on success, or to `Degenerate` when the image would
    /// have no pixels.
    pub fn build_waveform(
        &mut self,
        samples: &[f32],
        renderer: &WaveformRenderer,
    ) -> Result<WaveformImage> {
        if matches!(self.phase, TrackPhase::WaveformBuilt | TrackPhase::Degenerate) {
            return Err(TracklineError::NotReady(format!(
                "{} waveform already settled ({:?})",
                self.id, self.phase
            )));
        }
        if !self.needs_waveform() {
            return Err(TracklineError::NotReady(format!(
                "{} has no timeline scale or length yet",
                self.id
            )));
        }
        let width = self.width_px().unwrap_or(0.0).round() as u32;
        let height = self
            .scale
            .as_ref()
            .map(|s| s.timeline_height_px)
            .unwrap_or(0);

        let image = match renderer.render(samples, width, height) {
            Ok(image) => image,
            Err(e @ TracklineError::DegenerateInput(_)) => {
                self.phase = TrackPhase::Degenerate;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.phase = TrackPhase::WaveformBuilt;
        log::info!(
            "{}: waveform created {}x{}",
            self.id,
            image.width(),
            image.height()
        );
        Ok(image)
    }

    /// Note a zero-length cursor placement; returns `true` only the first time
    pub fn report_zero_length(&mut self) -> bool {
        if self.zero_length_reported {
            return false;
        }
        self.zero_length_reported = true;
        true
    }
}
