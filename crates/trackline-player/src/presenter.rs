//! Presenter that reports to the log instead of a screen

use std::collections::HashMap;

use trackline_core::backend::{CursorId, Presenter};
use trackline_core::waveform::WaveformImage;
use trackline_core::{Point, TrackId};

/// Logs presentation calls and remembers the latest cursor positions
#[derive(Debug, Default)]
pub struct LogPresenter {
    cursors: HashMap<CursorId, Point>,
    waveforms: usize,
    polylines: usize,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest position of a cursor
    pub fn cursor(&self, id: CursorId) -> Option<Point> {
        self.cursors.get(&id).copied()
    }

    pub fn waveforms_bound(&self) -> usize {
        self.waveforms
    }

    pub fn polylines_drawn(&self) -> usize {
        self.polylines
    }
}

impl Presenter for LogPresenter {
    fn bind_waveform(&mut self, track: TrackId, origin: Point, image: &WaveformImage) {
        self.waveforms += 1;
        log::info!(
            "{}: waveform {}x{} ({} bytes) bound at ({:.1}, {:.1})",
            track,
            image.width(),
            image.height(),
            image.as_bytes().len(),
            origin.x,
            origin.y
        );
    }

    fn place_cursor(&mut self, cursor: CursorId, position: Point) {
        log::trace!("{:?} cursor -> ({:.2}, {:.2})", cursor, position.x, position.y);
        self.cursors.insert(cursor, position);
    }

    fn draw_polyline(&mut self, points: &[Point]) {
        self.polylines += 1;
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            log::trace!(
                "spectrum curve: {} points, ({:.2}, {:.2}) .. ({:.2}, {:.2})",
                points.len(),
                first.x,
                first.y,
                last.x,
                last.y
            );
        }
    }
}
