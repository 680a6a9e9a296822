//! Backend setup from configured sources

use trackline_core::audio_file::WavSampleReader;
use trackline_core::backend::{SimulatedBackend, SimulatedSource};
use trackline_core::config::{SessionConfig, TrackSource};

/// Length used for the target when it has no readable file
pub const FALLBACK_TARGET_MS: u32 = 60_000;

/// Length used for a sample when it has no readable file
pub const FALLBACK_SAMPLE_MS: u32 = 30_000;

fn load_source(source: &TrackSource, fallback_ms: u32) -> SimulatedSource {
    let Some(path) = &source.path else {
        log::info!(
            "'{}': no file configured, using {} ms of silence",
            source.name,
            fallback_ms
        );
        return SimulatedSource::silent(fallback_ms);
    };
    match WavSampleReader::read(path) {
        Ok(decoded) if decoded.duration_ms() > 0 => SimulatedSource::from_decoded(decoded),
        Ok(_) => {
            log::warn!(
                "'{}': {:?} is empty, using {} ms of silence",
                source.name,
                path,
                fallback_ms
            );
            SimulatedSource::silent(fallback_ms)
        }
        Err(e) => {
            log::warn!(
                "'{}': failed to read {:?}: {}, using {} ms of silence",
                source.name,
                path,
                e,
                fallback_ms
            );
            SimulatedSource::silent(fallback_ms)
        }
    }
}

/// Register every configured source with a fresh simulated backend
pub fn build_backend(config: &SessionConfig) -> SimulatedBackend {
    let mut backend = SimulatedBackend::new();
    backend.add_source(
        config.target.name.clone(),
        load_source(&config.target, FALLBACK_TARGET_MS),
    );
    for source in &config.samples {
        backend.add_source(source.name.clone(), load_source(source, FALLBACK_SAMPLE_MS));
    }
    backend
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackline_core::backend::AudioBackend;
    use trackline_core::error::Readiness;

    #[test]
    fn test_missing_files_fall_back_to_silence() {
        let mut config = SessionConfig::default();
        config.target = TrackSource::with_path("target", "/nonexistent/target.wav");
        config.samples = vec![TrackSource::named("kick")];

        let mut backend = build_backend(&config);
        let target = backend.create_instance(&config.target).unwrap();
        assert_eq!(target.length(), Readiness::Ready(FALLBACK_TARGET_MS));
        let kick = backend.create_instance(&config.samples[0]).unwrap();
        assert_eq!(kick.length(), Readiness::Ready(FALLBACK_SAMPLE_MS));
    }
}
