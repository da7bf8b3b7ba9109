// Temporal module - Time-domain feature extraction
//
// This module computes features directly from time-domain audio signals:
// loudness statistics and the frame-wise zero-crossing rate.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Guard added inside logarithms and divisions
pub const EPSILON: f32 = 1e-6;

/// Loudness statistics of a (normalized) window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    /// Mean absolute amplitude
    pub amplitude: f32,
    /// Root-mean-square amplitude
    pub rms: f32,
    /// Maximum absolute amplitude
    pub peak: f32,
    /// 20·log10(rms + ε)
    pub db: f32,
}

/// Temporal feature computation functions
pub struct TemporalFeatures {
    frame_length: usize,
    hop_length: usize,
}

impl TemporalFeatures {
    /// Create a new temporal features processor
    ///
    /// # Arguments
    /// * `frame_length` - Frame length for zero-crossing analysis
    /// * `hop_length` - Hop between zero-crossing frames
    pub fn new(frame_length: usize, hop_length: usize) -> Self {
        Self {
            frame_length: frame_length.max(2),
            hop_length: hop_length.max(1),
        }
    }

    /// Divide by `max(|x|) + ε` so the output lies in [-1, 1]
    ///
    /// A silent window stays silent instead of dividing by zero.
    pub fn normalize(audio: &[f32]) -> Vec<f32> {
        let max_abs = audio.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let scale = max_abs + EPSILON;
        audio.iter().map(|&x| x / scale).collect()
    }

    /// Compute amplitude, RMS, peak and dB of a window
    pub fn compute_levels(audio: &[f32]) -> LevelStats {
        if audio.is_empty() {
            return LevelStats {
                amplitude: 0.0,
                rms: 0.0,
                peak: 0.0,
                db: 20.0 * EPSILON.log10(),
            };
        }

        let n = audio.len() as f32;
        let amplitude = audio.iter().map(|x| x.abs()).sum::<f32>() / n;
        let rms = (audio.iter().map(|x| x * x).sum::<f32>() / n).sqrt();
        let peak = audio.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let db = 20.0 * (rms + EPSILON).log10();

        LevelStats {
            amplitude,
            rms,
            peak,
            db,
        }
    }

    /// Compute zero-crossing rate (ZCR) of one frame
    ///
    /// Formula: ZCR = crossings / frame length
    ///
    /// Zero counts as positive, so silence never crosses.
    ///
    /// # Returns
    /// Zero-crossing rate (0.0 to 1.0)
    pub fn compute_zcr(&self, audio: &[f32]) -> f32 {
        if audio.len() < 2 {
            return 0.0;
        }

        let crossings = audio
            .windows(2)
            .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
            .count();

        crossings as f32 / audio.len() as f32
    }

    /// Zero-crossing rate of every frame
    ///
    /// Signals shorter than one frame are treated as a single frame.
    pub fn frame_zcr(&self, audio: &[f32]) -> Vec<f32> {
        if audio.len() <= self.frame_length {
            return vec![self.compute_zcr(audio)];
        }

        (0..=(audio.len() - self.frame_length) / self.hop_length)
            .map(|i| {
                let start = i * self.hop_length;
                self.compute_zcr(&audio[start..start + self.frame_length])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bounds_output() {
        let normalized = TemporalFeatures::normalize(&[0.5, -2.0, 1.0]);
        assert!(normalized.iter().all(|x| x.abs() <= 1.0));
        assert!((normalized[1] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_silence_stays_zero() {
        let normalized = TemporalFeatures::normalize(&[0.0; 16]);
        assert!(normalized.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_levels_of_square_wave() {
        let audio: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let levels = TemporalFeatures::compute_levels(&audio);
        assert!((levels.rms - 1.0).abs() < 1e-6);
        assert!((levels.peak - 1.0).abs() < 1e-6);
        assert!((levels.amplitude - 1.0).abs() < 1e-6);
        assert!(levels.db.abs() < 1e-3);
    }

    #[test]
    fn test_levels_of_silence() {
        let levels = TemporalFeatures::compute_levels(&[0.0; 64]);
        assert_eq!(levels.rms, 0.0);
        assert!((levels.db + 120.0).abs() < 1e-3, "got {}", levels.db);
    }

    #[test]
    fn test_zcr_alternating_signal() {
        let temporal = TemporalFeatures::new(2048, 512);
        let audio: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        // 99 crossings over 100 samples
        assert!((temporal.compute_zcr(&audio) - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_frame_zcr_frame_count() {
        let temporal = TemporalFeatures::new(2048, 512);
        assert_eq!(temporal.frame_zcr(&vec![0.0; 10_000]).len(), (10_000 - 2048) / 512 + 1);
        assert_eq!(temporal.frame_zcr(&[0.0; 100]).len(), 1);
    }
}
