//! Static waveform rendering
//!
//! One image per track, built once the timeline scale is known:
//!
//! 1. decimate the input to one magnitude per column (nearest neighbour,
//!    `pack_size = total / width`, column `w` reads index `w * pack_size`)
//! 2. scale each magnitude to a bar height
//! 3. fill the canvas with the background colour
//! 4. paint each bar symmetric about the vertical midline

use crate::config::{AmplitudeScale, WaveformStyle};
use crate::error::{Result, TracklineError};

use super::WaveformImage;

/// Bar height per unit of linear PCM amplitude, as a fraction of image height
pub const PCM_HEIGHT_FACTOR: f32 = 0.75;

/// Bar height per unit of spectrum magnitude, as a fraction of half the image height
pub const SPECTRUM_HEIGHT_FACTOR: f32 = 0.0025;

/// Input index sampled for output `column`
///
/// When there are fewer inputs than columns, column `w` reads index `w`
/// while it exists and the remaining columns are silent.
pub fn sample_index(column: usize, total: usize, width: usize) -> Option<usize> {
    if width == 0 || total == 0 {
        return None;
    }
    let pack_size = total / width;
    let index = if pack_size == 0 {
        column
    } else {
        column * pack_size
    };
    (index < total).then_some(index)
}

/// Nearest-neighbour decimation to `width` absolute magnitudes
pub fn decimate(samples: &[f32], width: usize) -> Vec<f32> {
    (0..width)
        .map(|w| {
            sample_index(w, samples.len(), width)
                .map(|i| samples[i].abs())
                .unwrap_or(0.0)
        })
        .collect()
}

/// Pixels of bar height per unit of magnitude
pub fn height_scale(amplitude: AmplitudeScale, height: u32) -> f32 {
    match amplitude {
        AmplitudeScale::LinearPcm => height as f32 * PCM_HEIGHT_FACTOR,
        AmplitudeScale::Spectrum => (height / 2) as f32 * SPECTRUM_HEIGHT_FACTOR,
    }
}

/// Turns magnitude buffers into [`WaveformImage`]s
#[derive(Debug, Clone, Default)]
pub struct WaveformRenderer {
    style: WaveformStyle,
}

impl WaveformRenderer {
    pub fn new(style: WaveformStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &WaveformStyle {
        &self.style
    }

    /// Render with the configured amplitude scale
    pub fn render(&self, samples: &[f32], width: u32, height: u32) -> Result<WaveformImage> {
        self.render_with(samples, width, height, self.style.amplitude)
    }

    /// Render with an explicit amplitude scale
    ///
    /// An empty or all-zero input yields a background-only image.
    pub fn render_with(
        &self,
        samples: &[f32],
        width: u32,
        height: u32,
        amplitude: AmplitudeScale,
    ) -> Result<WaveformImage> {
        if width == 0 || height == 0 {
            return Err(TracklineError::DegenerateInput(format!(
                "waveform image would be {}x{}",
                width, height
            )));
        }
        if samples.is_empty() {
            log::warn!("Waveform input is empty, rendering background only");
        }

        let mut image = WaveformImage::filled(width, height, self.style.background);
        let columns = decimate(samples, width as usize);
        let scale = height_scale(amplitude, height);
        let half = height / 2;

        for (x, magnitude) in columns.iter().enumerate() {
            let bar = (magnitude * scale).ceil();
            if bar.is_nan() || bar <= 0.0 {
                continue;
            }
            // Bars taller than the image are clipped at the edges
            let bar = (bar as u32).min(half + 1);
            for y in 0..bar {
                image.set_pixel(x as u32, half + y, self.style.foreground);
                if let Some(up) = half.checked_sub(y) {
                    image.set_pixel(x as u32, up, self.style.foreground);
                }
            }
        }

        log::debug!(
            "Rendered waveform {}x{} from {} samples ({:?})",
            width,
            height,
            samples.len(),
            amplitude
        );
        Ok(image)
    }
}
