// Types module - Data structures for audio features
//
// This module defines the per-window feature record produced by the
// extraction pipeline and consumed by cry detection and danger scoring.

use serde::{Deserialize, Serialize};

/// Features extracted from one analysis window
///
/// Every field is always present and finite. Statistics that cannot be
/// computed (for example on a silent window) fall back to defined values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean absolute amplitude of the normalized window
    pub amplitude: f32,

    /// Root-mean-square amplitude of the normalized window
    pub rms: f32,

    /// 20·log10(rms + 1e-6); about -120 for silence
    pub db: f32,

    /// Maximum absolute amplitude of the normalized window
    pub peak: f32,

    /// Quality score, min(100, rms × 100)
    pub score: f32,

    /// Spectral centroid in Hz, mean across frames
    ///
    /// Measures the "brightness" of the sound and drives cry classification.
    pub centroid_mean: f32,

    /// Spectral centroid in Hz, standard deviation across frames
    pub centroid_std: f32,

    /// Spectral bandwidth in Hz, mean across frames
    pub bandwidth_mean: f32,

    /// Spectral flatness (0.0 tonal to 1.0 noise-like), mean across frames
    pub flatness_mean: f32,

    /// Mean of the cepstral coefficients across frames and coefficient index
    pub mfcc_mean: f32,

    /// Standard deviation of the cepstral coefficients
    pub mfcc_std: f32,

    /// Mean of the per-channel energy normalized mel spectrogram
    pub pcen_mean: f32,

    /// Standard deviation of the per-channel energy normalized mel spectrogram
    pub pcen_std: f32,

    /// Zero-crossing rate, mean across frames
    pub zcr_mean: f32,
}

impl FeatureVector {
    /// Field values in declaration order, paired with their names
    pub fn named_values(&self) -> [(&'static str, f32); 14] {
        [
            ("amplitude", self.amplitude),
            ("rms", self.rms),
            ("db", self.db),
            ("peak", self.peak),
            ("score", self.score),
            ("centroid_mean", self.centroid_mean),
            ("centroid_std", self.centroid_std),
            ("bandwidth_mean", self.bandwidth_mean),
            ("flatness_mean", self.flatness_mean),
            ("mfcc_mean", self.mfcc_mean),
            ("mfcc_std", self.mfcc_std),
            ("pcen_mean", self.pcen_mean),
            ("pcen_std", self.pcen_std),
            ("zcr_mean", self.zcr_mean),
        ]
    }

    /// True when no field is NaN or infinite
    pub fn all_finite(&self) -> bool {
        self.named_values().iter().all(|(_, v)| v.is_finite())
    }
}
