// Spectral module - Frequency-domain feature extraction
//
// This module computes per-frame spectral shape descriptors from magnitude
// spectra. Frame-level values are aggregated (mean/std) by the coordinator.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Floor applied to power values before taking logarithms
const POWER_FLOOR: f32 = 1e-10;

/// Spectral feature computation functions
pub struct SpectralFeatures {
    /// Center frequency of every magnitude bin in Hz
    frequencies: Vec<f32>,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `frequencies` - Bin center frequencies matching the spectra passed in
    pub fn new(frequencies: Vec<f32>) -> Self {
        Self { frequencies }
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / Σ|X[i]|
    ///
    /// # Returns
    /// Spectral centroid in Hz, 0.0 for an empty frame
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f32 {
        let magnitude_sum: f32 = spectrum.iter().sum();
        if magnitude_sum <= 1e-10 {
            return 0.0;
        }

        let weighted_sum: f32 = spectrum
            .iter()
            .zip(&self.frequencies)
            .map(|(&mag, &freq)| freq * mag)
            .sum();

        weighted_sum / magnitude_sum
    }

    /// Compute spectral bandwidth (second-order spread around the centroid)
    ///
    /// Formula: bandwidth = sqrt(Σ p_i × (f_i - centroid)²), p_i = |X[i]| / Σ|X|
    ///
    /// # Returns
    /// Bandwidth in Hz, 0.0 for an empty frame
    pub fn compute_bandwidth(&self, spectrum: &[f32], centroid: f32) -> f32 {
        let magnitude_sum: f32 = spectrum.iter().sum();
        if magnitude_sum <= 1e-10 {
            return 0.0;
        }

        let variance: f32 = spectrum
            .iter()
            .zip(&self.frequencies)
            .map(|(&mag, &freq)| (mag / magnitude_sum) * (freq - centroid).powi(2))
            .sum();

        variance.max(0.0).sqrt()
    }

    /// Compute spectral flatness (tonality measure) on the power spectrum
    ///
    /// Formula: flatness = geometric_mean(P) / arithmetic_mean(P), P = max(|X|², 1e-10)
    ///
    /// Returns a value between 0 (tonal, e.g., sine wave) and 1 (noise-like).
    /// A silent frame is perfectly flat and yields 1.0.
    pub fn compute_flatness(&self, spectrum: &[f32]) -> f32 {
        if spectrum.is_empty() {
            return 0.0;
        }

        let n = spectrum.len() as f32;
        let mut log_sum = 0.0f32;
        let mut sum = 0.0f32;
        for &mag in spectrum {
            let power = (mag * mag).max(POWER_FLOOR);
            log_sum += power.ln();
            sum += power;
        }

        let geometric_mean = (log_sum / n).exp();
        let arithmetic_mean = sum / n;
        (geometric_mean / arithmetic_mean).clamp(0.0, 1.0)
    }
}
