//! Position to cursor mapping
//!
//! ```text
//! fraction = (position_ms / 1000) / (length_ms / 1000)
//! x_raw    = fraction * (length_ms * width_per_ms)
//! x        = (x_raw - origin_offset) / pixels_per_unit
//! ```
//!
//! A zero length never divides: the cursor stays at the origin and the
//! placement is flagged degenerate.

use crate::config::{CursorConfig, ScaleReference};
use crate::types::MS_PER_SECOND;

/// Where a cursor goes this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPlacement {
    /// Horizontal offset from the track origin, in presentation units
    pub x: f32,
    /// Playback fraction of the track's own length
    pub fraction: f32,
    /// The track had a zero length; `x` is the bare origin offset
    pub degenerate: bool,
}

/// Position and resolved length of one track, sampled once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTiming {
    pub position_ms: u32,
    pub length_ms: Option<u32>,
}

/// Maps raw positions onto the shared timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineMapper {
    origin_offset: f32,
    pixels_per_unit: f32,
    position_reference_index: usize,
    scale_reference: ScaleReference,
}

impl TimelineMapper {
    pub fn new(cursor: &CursorConfig) -> Self {
        let pixels_per_unit = if cursor.pixels_per_unit > 0.0 {
            cursor.pixels_per_unit
        } else {
            log::warn!(
                "pixels_per_unit {} is not positive, using 1.0",
                cursor.pixels_per_unit
            );
            1.0
        };
        Self {
            origin_offset: cursor.origin_offset(),
            pixels_per_unit,
            position_reference_index: cursor.position_reference_index,
            scale_reference: cursor.scale_reference,
        }
    }

    /// Half the cursor sprite width, captured at setup
    pub fn origin_offset(&self) -> f32 {
        self.origin_offset
    }

    /// `position / length`, or `None` for a zero length
    pub fn normalized_fraction(position_ms: u32, length_ms: u32) -> Option<f32> {
        if length_ms == 0 {
            return None;
        }
        let current_seconds = position_ms as f64 / MS_PER_SECOND as f64;
        let length_seconds = length_ms as f64 / MS_PER_SECOND as f64;
        Some((current_seconds / length_seconds) as f32)
    }

    fn finish(&self, x_raw: f32, fraction: f32, degenerate: bool) -> CursorPlacement {
        CursorPlacement {
            x: (x_raw - self.origin_offset) / self.pixels_per_unit,
            fraction,
            degenerate,
        }
    }

    fn degenerate(&self) -> CursorPlacement {
        self.finish(0.0, 0.0, true)
    }

    /// Cursor for a single track scaled by its own rendered width
    pub fn place(&self, position_ms: u32, length_ms: u32, width_per_ms: f32) -> CursorPlacement {
        self.place_scaled(position_ms, length_ms, length_ms, width_per_ms)
    }

    /// Cursor whose fraction comes from one length and whose width from another
    fn place_scaled(
        &self,
        position_ms: u32,
        length_ms: u32,
        scale_length_ms: u32,
        width_per_ms: f32,
    ) -> CursorPlacement {
        match Self::normalized_fraction(position_ms, length_ms) {
            Some(fraction) => {
                let width_px = scale_length_ms as f32 * width_per_ms;
                self.finish(fraction * width_px, fraction, false)
            }
            None => self.degenerate(),
        }
    }

    /// Length that scales the shared group cursor
    pub fn scale_length(&self, timings: &[TrackTiming]) -> Option<u32> {
        match self.scale_reference {
            ScaleReference::Longest => timings.iter().filter_map(|t| t.length_ms).max(),
            ScaleReference::FixedIndex(index) => timings.get(index).and_then(|t| t.length_ms),
        }
    }

    /// The shared cursor for a group
    ///
    /// Position and fraction come from the track at `position_reference_index`;
    /// the width comes from the scale reference track (the longest by default).
    /// Returns `None` until the lengths involved are resolved.
    pub fn place_group(&self, timings: &[TrackTiming], width_per_ms: f32) -> Option<CursorPlacement> {
        let reference = timings.get(self.position_reference_index)?;
        let length_ms = reference.length_ms?;
        let scale_length_ms = self.scale_length(timings)?;
        Some(self.place_scaled(
            reference.position_ms,
            length_ms,
            scale_length_ms,
            width_per_ms,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn mapper(cursor_width_px: f32) -> TimelineMapper {
        TimelineMapper::new(&CursorConfig {
            cursor_width_px,
            ..CursorConfig::default()
        })
    }

    fn width_per_ms() -> f32 {
        1024.0 / 120_000.0
    }

    #[test]
    fn test_fraction_in_unit_range() {
        for length in [1, 7, 1_000, 30_000, 599_999] {
            for position in [0, length / 3, length / 2, length] {
                let f = TimelineMapper::normalized_fraction(position, length).unwrap();
                assert!((0.0..=1.0).contains(&f), "{} / {} -> {}", position, length, f);
            }
        }
    }

    #[test]
    fn test_end_to_end_scale() {
        let m = mapper(16.0);
        let placement = m.place(15_000, 30_000, width_per_ms());
        assert!((placement.fraction - 0.5).abs() < EPS);
        assert!((placement.x + m.origin_offset() - 128.0).abs() < EPS);
        assert!((placement.x - 120.0).abs() < EPS);
        assert!(!placement.degenerate);
    }

    #[test]
    fn test_zero_length_stays_at_origin() {
        let m = mapper(16.0);
        let placement = m.place(5_000, 0, width_per_ms());
        assert!(placement.degenerate);
        assert_eq!(placement.fraction, 0.0);
        assert_eq!(placement.x, -8.0);
        assert!(placement.x.is_finite());
    }

    #[test]
    fn test_pixels_per_unit_divides_output() {
        let m = TimelineMapper::new(&CursorConfig {
            cursor_width_px: 16.0,
            pixels_per_unit: 100.0,
            ..CursorConfig::default()
        });
        let placement = m.place(15_000, 30_000, width_per_ms());
        assert!((placement.x - 1.2).abs() < EPS);
    }

    #[test]
    fn test_group_uses_first_position_and_longest_width() {
        let m = mapper(0.0);
        let timings = [
            TrackTiming { position_ms: 5_000, length_ms: Some(10_000) },
            TrackTiming { position_ms: 1_000, length_ms: Some(30_000) },
        ];
        let placement = m.place_group(&timings, width_per_ms()).unwrap();
        // half of the first track, scaled by the 30 s track's 256 px
        assert!((placement.fraction - 0.5).abs() < EPS);
        assert!((placement.x - 128.0).abs() < EPS);
    }

    #[test]
    fn test_group_fixed_scale_reference() {
        let m = TimelineMapper::new(&CursorConfig {
            cursor_width_px: 0.0,
            position_reference_index: 1,
            scale_reference: ScaleReference::FixedIndex(0),
            ..CursorConfig::default()
        });
        let timings = [
            TrackTiming { position_ms: 0, length_ms: Some(15_000) },
            TrackTiming { position_ms: 7_500, length_ms: Some(30_000) },
        ];
        let placement = m.place_group(&timings, width_per_ms()).unwrap();
        assert!((placement.fraction - 0.25).abs() < EPS);
        assert!((placement.x - 32.0).abs() < EPS);
    }

    #[test]
    fn test_group_waits_for_lengths() {
        let m = mapper(16.0);
        assert!(m.place_group(&[], width_per_ms()).is_none());

        let timings = [TrackTiming { position_ms: 0, length_ms: None }];
        assert!(m.place_group(&timings, width_per_ms()).is_none());
    }

    #[test]
    fn test_group_degenerate_reference() {
        let m = mapper(16.0);
        let timings = [
            TrackTiming { position_ms: 0, length_ms: Some(0) },
            TrackTiming { position_ms: 0, length_ms: Some(30_000) },
        ];
        let placement = m.place_group(&timings, width_per_ms()).unwrap();
        assert!(placement.degenerate);
        assert_eq!(placement.x, -8.0);
    }
}
