//! Decoded sample data for offline waveform construction
//!
//! Static sources are decoded once into interleaved f32 samples. The waveform
//! renderer only needs the flat sample buffer; channel count and sample rate
//! are kept to derive the native length.

use std::path::Path;

use thiserror::Error;

use crate::types::MS_PER_SECOND;

/// Audio file errors
#[derive(Error, Debug)]
pub enum AudioFileError {
    /// File not found or couldn't be opened
    #[error("IO error: {0}")]
    IoError(String),

    /// Invalid or unsupported file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Unsupported bit depth for integer samples
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

impl From<hound::Error> for AudioFileError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => AudioFileError::IoError(e.to_string()),
            other => AudioFileError::InvalidFormat(other.to_string()),
        }
    }
}

impl From<AudioFileError> for crate::error::TracklineError {
    fn from(err: AudioFileError) -> Self {
        crate::error::TracklineError::Source(err.to_string())
    }
}

/// Interleaved decoded samples in the range [-1.0, 1.0]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedSamples {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedSamples {
    /// Wrap interleaved samples
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// All samples, interleaved
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Total sample count across all channels
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if there is no sample data
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in whole milliseconds (0 for degenerate formats)
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as f64 * MS_PER_SECOND as f64 / self.sample_rate as f64) as u32
    }
}

/// WAV reader producing [`DecodedSamples`]
pub struct WavSampleReader;

impl WavSampleReader {
    /// Read a WAV file, normalising integer formats to [-1.0, 1.0]
    pub fn read(path: &Path) -> Result<DecodedSamples, AudioFileError> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(AudioFileError::UnsupportedBitDepth(spec.bits_per_sample));
                }
                let max_val = 2.0_f32.powi(spec.bits_per_sample as i32 - 1);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let decoded = DecodedSamples::new(samples, spec.channels, spec.sample_rate);
        log::info!(
            "WavSampleReader: {:?} - {} channels, {} Hz, {} ms",
            path,
            decoded.channels(),
            decoded.sample_rate(),
            decoded.duration_ms()
        );
        Ok(decoded)
    }
}
