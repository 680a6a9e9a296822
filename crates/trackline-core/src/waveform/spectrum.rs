//! Live spectrum curve for the target track
//!
//! Unlike the static waveform this is a polyline recomputed every tick from
//! the analyser's first channel. Each point's height is the bin level in dB:
//!
//! ```text
//! level_db = clamp(log10(magnitude) * 15, -100, 0)
//! y        = origin.y + (level_db - 300) * 0.01
//! ```

use crate::backend::SpectrumFrame;
use crate::types::Point;

/// Points on the curve (also the analyser bin count used for the target)
pub const CURVE_POINTS: usize = 84;

/// Horizontal extent of the curve in presentation units
pub const CURVE_WIDTH: f32 = 3.0;

/// Vertical units per dB
pub const CURVE_HEIGHT: f32 = 0.01;

/// dB offset that places the curve below its origin
pub const CURVE_DB_OFFSET: f32 = 300.0;

const DB_FLOOR: f32 = -100.0;

/// Linear magnitude to a clamped dB level
///
/// Zero, negative and NaN magnitudes sit at the floor.
pub fn lin_to_db(linear: f32) -> f32 {
    if linear.is_nan() || linear <= 0.0 {
        return DB_FLOOR;
    }
    (linear.log10() * 15.0).clamp(DB_FLOOR, 0.0)
}

/// Continuously updated spectrum polyline
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSpectrumCurve {
    origin: Point,
    points: Vec<Point>,
}

impl LiveSpectrumCurve {
    /// A flat curve anchored at `origin`
    pub fn new(origin: Point) -> Self {
        let mut curve = Self {
            origin,
            points: Vec::with_capacity(CURVE_POINTS),
        };
        curve.reset();
        curve
    }

    fn x_at(&self, index: usize) -> f32 {
        self.origin.x + (index + 1) as f32 * (CURVE_WIDTH / CURVE_POINTS as f32)
    }

    /// Recompute from a spectrum frame
    ///
    /// A frame with zero channels leaves the previous curve untouched and
    /// returns `false`. Missing bins read as silence.
    pub fn update(&mut self, frame: &SpectrumFrame) -> bool {
        let Some(bins) = frame.channel(0) else {
            return false;
        };
        self.points = (0..CURVE_POINTS)
            .map(|i| {
                let level = lin_to_db(bins.get(i).copied().unwrap_or(0.0));
                Point::new(
                    self.x_at(i),
                    self.origin.y + (level - CURVE_DB_OFFSET) * CURVE_HEIGHT,
                )
            })
            .collect();
        true
    }

    /// Flatten every point onto the origin line
    pub fn reset(&mut self) {
        self.points = (0..CURVE_POINTS)
            .map(|i| Point::new(self.x_at(i), self.origin.y))
            .collect();
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Whether the curve is flat on its baseline
    pub fn is_flat(&self) -> bool {
        self.points.iter().all(|p| p.y == self.origin.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_lin_to_db_clamps() {
        assert_eq!(lin_to_db(1.0), 0.0);
        assert_eq!(lin_to_db(10.0), 0.0);
        assert!((lin_to_db(0.1) + 15.0).abs() < EPS);
        assert_eq!(lin_to_db(0.0), -100.0);
        assert_eq!(lin_to_db(-1.0), -100.0);
        assert_eq!(lin_to_db(f32::NAN), -100.0);
        assert_eq!(lin_to_db(1e-12), -100.0);
    }

    #[test]
    fn test_new_curve_is_flat() {
        let curve = LiveSpectrumCurve::new(Point::new(1.0, 2.0));
        assert_eq!(curve.points().len(), CURVE_POINTS);
        assert!(curve.is_flat());
        let last = curve.points()[CURVE_POINTS - 1];
        assert!((last.x - 4.0).abs() < EPS);
    }

    #[test]
    fn test_update_maps_levels() {
        let mut curve = LiveSpectrumCurve::new(Point::new(0.0, 0.0));
        let mut bins = vec![0.0; CURVE_POINTS];
        bins[0] = 1.0;
        bins[1] = 0.1;
        assert!(curve.update(&SpectrumFrame::new(vec![bins])));

        let points = curve.points();
        assert!((points[0].y - (-3.0)).abs() < EPS);
        assert!((points[1].y - (-3.15)).abs() < EPS);
        assert!((points[2].y - (-4.0)).abs() < EPS);
    }

    #[test]
    fn test_zero_channels_keeps_previous_curve() {
        let mut curve = LiveSpectrumCurve::new(Point::new(0.0, 0.0));
        curve.update(&SpectrumFrame::new(vec![vec![1.0; CURVE_POINTS]]));
        let before = curve.points().to_vec();

        assert!(!curve.update(&SpectrumFrame::empty()));
        assert_eq!(curve.points(), before.as_slice());
    }

    #[test]
    fn test_short_frame_pads_with_silence() {
        let mut curve = LiveSpectrumCurve::new(Point::new(0.0, 0.0));
        curve.update(&SpectrumFrame::new(vec![vec![1.0; 4]]));
        assert!((curve.points()[3].y + 3.0).abs() < EPS);
        assert!((curve.points()[4].y + 4.0).abs() < EPS);
    }

    #[test]
    fn test_reset_flattens() {
        let mut curve = LiveSpectrumCurve::new(Point::new(0.0, 5.0));
        curve.update(&SpectrumFrame::new(vec![vec![0.5; CURVE_POINTS]]));
        assert!(!curve.is_flat());
        curve.reset();
        assert!(curve.is_flat());
    }
}
