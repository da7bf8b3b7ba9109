//! Decoded mono audio signals.
//!
//! An [`AudioSignal`] is the only input the analysis core accepts: mono
//! `f32` samples plus their sample rate. Multi-channel input is averaged to
//! mono when it is constructed, and the signal is immutable afterwards.

use std::path::Path;

use crate::audio::windowing::Windows;
use crate::error::AudioError;

/// Mono audio samples at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Wrap mono samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Average interleaved multi-channel frames down to mono.
    pub fn from_interleaved(
        samples: &[f32],
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        if channels == 0 {
            return Err(AudioError::UnsupportedFormat {
                details: "audio must have at least one channel".to_string(),
            });
        }

        if channels == 1 {
            return Self::new(samples.to_vec(), sample_rate);
        }

        let mono = samples
            .chunks_exact(channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::new(mono, sample_rate)
    }

    /// Decode a WAV file into a mono signal at its native sample rate.
    pub fn load_wav(path: &Path) -> Result<Self, AudioError> {
        if !path.exists() {
            return Err(AudioError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let mut reader = hound::WavReader::open(path).map_err(|err| AudioError::DecodeFailed {
            reason: format!("failed to open {}: {err}", path.display()),
        })?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<f32>, _>>()?,
            hound::SampleFormat::Int => match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|v| v as f32 / i16::MAX as f32))
                    .collect::<Result<Vec<f32>, _>>()?,
                24 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / 8_388_607.0))
                    .collect::<Result<Vec<f32>, _>>()?,
                32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / i32::MAX as f32))
                    .collect::<Result<Vec<f32>, _>>()?,
                bits => {
                    return Err(AudioError::UnsupportedFormat {
                        details: format!(
                            "unsupported bits_per_sample={} for {}",
                            bits,
                            path.display()
                        ),
                    })
                }
            },
        };

        Self::from_interleaved(&samples, spec.channels, spec.sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Return this signal at `target_rate`, resampling only when rates differ.
    pub fn resampled(self, target_rate: u32) -> Result<Self, AudioError> {
        if target_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: target_rate });
        }
        if target_rate == self.sample_rate {
            return Ok(self);
        }

        tracing::debug!(
            "[AudioSignal] Resampling {} samples from {} Hz to {} Hz",
            self.samples.len(),
            self.sample_rate,
            target_rate
        );
        let samples = resample_linear(&self.samples, self.sample_rate, target_rate);
        Self::new(samples, target_rate)
    }

    /// Iterate over complete windows of `window_len` samples.
    pub fn windows(&self, window_len: usize) -> Windows<'_> {
        Windows::new(&self.samples, window_len)
    }
}

/// Linear-interpolation resampler.
///
/// Output length is `round(len * target_rate / source_rate)`.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let out_len =
        (samples.len() as f64 * target_rate as f64 / source_rate as f64).round() as usize;
    let ratio = source_rate as f64 / target_rate as f64;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let cursor = i as f64 * ratio;
            let idx = (cursor.floor() as usize).min(last);
            let next_idx = (idx + 1).min(last);
            let frac = (cursor - idx as f64).clamp(0.0, 1.0) as f32;
            if next_idx == idx {
                samples[idx]
            } else {
                (1.0 - frac) * samples[idx] + frac * samples[next_idx]
            }
        })
        .collect()
}
