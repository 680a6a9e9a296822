//! Shared timeline: reference scale and cursor mapping

mod mapper;
mod reference;

pub use mapper::{CursorPlacement, TimelineMapper, TrackTiming};
pub use reference::{ReferenceLengthCalculator, ReferenceScale};
