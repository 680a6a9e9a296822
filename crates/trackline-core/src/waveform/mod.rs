//! Waveform images and the live spectrum curve
//!
//! - [`WaveformRenderer`]: one-shot static image per track
//! - [`LiveSpectrumCurve`]: per-tick polyline for the target track

mod image;
mod render;
mod spectrum;

pub use image::WaveformImage;
pub use render::{
    decimate, height_scale, sample_index, WaveformRenderer, PCM_HEIGHT_FACTOR,
    SPECTRUM_HEIGHT_FACTOR,
};
pub use spectrum::{
    lin_to_db, LiveSpectrumCurve, CURVE_DB_OFFSET, CURVE_HEIGHT, CURVE_POINTS, CURVE_WIDTH,
};
