//! Fixture utilities for deterministic tests and the CLI harness.
//!
//! This module synthesizes reproducible signals (silence, tones, tone bursts,
//! seeded white noise) and writes them as WAV files so the whole pipeline can
//! be exercised without recorded audio.

use std::f32::consts::PI;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::audio::AudioSignal;
use crate::error::AudioError;

/// Default seed for noise fixtures.
pub const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// Shape of a synthetic signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyntheticPattern {
    /// All-zero samples
    Silence,
    /// Continuous sine tone
    Sine { frequency_hz: f32 },
    /// Sine tone between `start_s` and `end_s`, silence elsewhere
    ToneBurst {
        frequency_hz: f32,
        start_s: f32,
        end_s: f32,
    },
    /// Uniform white noise from a seeded generator
    WhiteNoise { seed: u64 },
}

/// Full description of a synthetic signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    pub sample_rate: u32,
    pub duration_s: f32,
    /// Peak amplitude in [0, 1]
    pub amplitude: f32,
}

impl SyntheticSpec {
    pub fn new(pattern: SyntheticPattern, sample_rate: u32, duration_s: f32) -> Self {
        Self {
            pattern,
            sample_rate,
            duration_s,
            amplitude: 0.8,
        }
    }

    /// Number of samples this signal description produces
    pub fn sample_count(&self) -> usize {
        (self.duration_s.max(0.0) * self.sample_rate as f32).round() as usize
    }
}

/// Generate the samples described by a [`SyntheticSpec`].
pub fn generate(spec: &SyntheticSpec) -> Result<AudioSignal, AudioError> {
    let n = spec.sample_count();
    let sr = spec.sample_rate.max(1) as f32;
    let amplitude = spec.amplitude.clamp(0.0, 1.0);

    let samples = match &spec.pattern {
        SyntheticPattern::Silence => vec![0.0; n],
        SyntheticPattern::Sine { frequency_hz } => (0..n)
            .map(|i| amplitude * (2.0 * PI * frequency_hz * i as f32 / sr).sin())
            .collect(),
        SyntheticPattern::ToneBurst {
            frequency_hz,
            start_s,
            end_s,
        } => (0..n)
            .map(|i| {
                let t = i as f32 / sr;
                if t >= *start_s && t < *end_s {
                    amplitude * (2.0 * PI * frequency_hz * t).sin()
                } else {
                    0.0
                }
            })
            .collect(),
        SyntheticPattern::WhiteNoise { seed } => {
            let mut rng = StdRng::seed_from_u64(*seed);
            (0..n)
                .map(|_| amplitude * rng.gen_range(-1.0f32..1.0))
                .collect()
        }
    };

    AudioSignal::new(samples, spec.sample_rate)
}

/// Write a mono signal as a 32-bit float WAV file.
pub fn write_wav(path: &Path, signal: &AudioSignal) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let write_failed = |err: hound::Error| AudioError::WriteFailed {
        reason: format!("{}: {}", path.display(), err),
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(write_failed)?;
    for &sample in signal.samples() {
        writer.write_sample(sample).map_err(write_failed)?;
    }
    writer.finalize().map_err(write_failed)?;

    tracing::debug!(
        "[Fixtures] Wrote {} samples at {} Hz to {}",
        signal.len(),
        signal.sample_rate(),
        path.display()
    );
    Ok(())
}
