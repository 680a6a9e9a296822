//! Shared timeline scale
//!
//! The reference length is the target track's length times
//! [`REFERENCE_HEADROOM`]. Every track shares one px/ms rate derived from it,
//! so relative durations stay comparable on the same timeline.

use crate::error::{Readiness, Result, TracklineError};
use crate::track::Track;
use crate::types::REFERENCE_HEADROOM;

/// Immutable timeline scale, computed once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceScale {
    pub reference_length_ms: u32,
    pub timeline_width_px: u32,
    pub timeline_height_px: u32,
}

impl ReferenceScale {
    /// Horizontal pixels per millisecond
    pub fn width_per_ms(&self) -> f32 {
        self.timeline_width_px as f32 / self.reference_length_ms as f32
    }

    /// Pixel width of a track of `length_ms` on this timeline
    pub fn track_width_px(&self, length_ms: u32) -> f32 {
        (length_ms as f64 * self.timeline_width_px as f64 / self.reference_length_ms as f64) as f32
    }
}

/// Computes the [`ReferenceScale`] from the target length, exactly once
#[derive(Debug, Clone)]
pub struct ReferenceLengthCalculator {
    timeline_width_px: u32,
    timeline_height_px: u32,
    scale: Option<ReferenceScale>,
}

impl ReferenceLengthCalculator {
    pub fn new(timeline_width_px: u32, timeline_height_px: u32) -> Self {
        Self {
            timeline_width_px,
            timeline_height_px,
            scale: None,
        }
    }

    /// Pure computation of the scale for a target length
    pub fn compute(
        target_length_ms: u32,
        timeline_width_px: u32,
        timeline_height_px: u32,
    ) -> Result<ReferenceScale> {
        if target_length_ms == 0 {
            return Err(TracklineError::DegenerateInput(
                "target length is zero".to_string(),
            ));
        }
        if timeline_width_px == 0 || timeline_height_px == 0 {
            return Err(TracklineError::Config(format!(
                "timeline must be non-empty, got {}x{}",
                timeline_width_px, timeline_height_px
            )));
        }
        let reference_length_ms = target_length_ms.checked_mul(REFERENCE_HEADROOM).ok_or_else(|| {
            TracklineError::DegenerateInput(format!(
                "target length {} ms overflows the reference length",
                target_length_ms
            ))
        })?;
        Ok(ReferenceScale {
            reference_length_ms,
            timeline_width_px,
            timeline_height_px,
        })
    }

    /// Feed the latest target length readiness
    ///
    /// Once a scale has been computed it is returned unchanged forever, even
    /// if a later poll reports a different target length.
    pub fn poll(&mut self, target_length: Readiness<u32>) -> Readiness<ReferenceScale> {
        if let Some(scale) = self.scale {
            return Readiness::Ready(scale);
        }
        match target_length {
            Readiness::Pending => Readiness::Pending,
            Readiness::Failed(reason) => Readiness::Failed(reason),
            Readiness::Ready(length) => {
                match Self::compute(length, self.timeline_width_px, self.timeline_height_px) {
                    Ok(scale) => {
                        log::info!(
                            "Reference length {} ms (target {} ms), {:.6} px/ms",
                            scale.reference_length_ms,
                            length,
                            scale.width_per_ms()
                        );
                        self.scale = Some(scale);
                        Readiness::Ready(scale)
                    }
                    Err(e) => Readiness::Failed(e.to_string()),
                }
            }
        }
    }

    /// The computed scale, if any
    pub fn scale(&self) -> Option<ReferenceScale> {
        self.scale
    }

    /// Hand the scale to every track
    ///
    /// Safe to call repeatedly; tracks ignore a scale once they have one.
    /// Returns how many tracks advanced.
    pub fn propagate(&self, tracks: &mut [Track]) -> usize {
        let Some(scale) = self.scale else {
            return 0;
        };
        let advanced = tracks
            .iter_mut()
            .map(|t| t.apply_scale(scale))
            .filter(|advanced| *advanced)
            .count();
        if advanced > 0 {
            log::info!(
                "Timeline {}x{} propagated to {} track(s)",
                scale.timeline_width_px,
                scale.timeline_height_px,
                advanced
            );
        }
        advanced
    }
}
