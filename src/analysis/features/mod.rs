// FeatureExtractor - DSP feature extraction for acoustic danger analysis
//
// This module extracts the per-window descriptors used by cry detection and
// danger scoring. Features are computed from time-domain and
// frequency-domain representations of a normalized window.
//
// Module organization:
// - types: Data structures (FeatureVector)
// - stft: Centered magnitude STFT and segment power spectrogram
// - spectral: Frequency-domain features (centroid, bandwidth, flatness)
// - temporal: Time-domain features (levels, ZCR)
// - cepstral: Mel filterbank and cepstral coefficients
// - pcen: Per-channel energy normalization
// - mod.rs: Coordinator (FeatureExtractor)
//
// Features extracted:
// 1. Levels: amplitude, RMS, peak, dB and quality score
// 2. Spectral centroid: mean and std across frames
// 3. Spectral bandwidth and flatness: mean across frames
// 4. Cepstral coefficients: mean and std over the first n_mfcc coefficients
// 5. PCEN: mean and std over the normalized mel spectrogram
// 6. Zero-crossing rate: mean across frames
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

mod cepstral;
mod pcen;
mod spectral;
mod stft;
mod temporal;
mod types;

pub use pcen::{Pcen, PcenParams};
pub use stft::{PowerSpectrogram, SegmentSpectrogram, Stft};
pub use temporal::EPSILON;
pub use types::FeatureVector;

use cepstral::{CepstralFeatures, MelFilterBank};
use spectral::SpectralFeatures;
use temporal::TemporalFeatures;

use crate::config::AnalysisConfig;

/// Mean and population standard deviation; (0, 0) for an empty input
pub(crate) fn mean_std<I>(values: I) -> (f32, f32)
where
    I: IntoIterator<Item = f32>,
{
    let values: Vec<f32> = values.into_iter().collect();
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean as f32, variance.sqrt() as f32)
}

/// Replace NaN and infinities with zero
pub(crate) fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// FeatureExtractor coordinates DSP feature extraction pipeline
///
/// Pure function of its input: the same window always yields the same
/// [`FeatureVector`].
pub struct FeatureExtractor {
    stft: Stft,
    spectral_features: SpectralFeatures,
    temporal_features: TemporalFeatures,
    mel_bank: MelFilterBank,
    cepstral_features: CepstralFeatures,
    pcen: Pcen,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor for the configured sample rate and frame geometry
    pub fn new(config: &AnalysisConfig) -> Self {
        let stft = Stft::new(config.n_fft, config.hop_length);
        let frequencies = stft.bin_frequencies(config.sample_rate);

        Self {
            spectral_features: SpectralFeatures::new(frequencies),
            temporal_features: TemporalFeatures::new(stft.n_fft(), stft.hop_length()),
            mel_bank: MelFilterBank::new(config.sample_rate, stft.n_fft(), config.n_mels),
            cepstral_features: CepstralFeatures::new(config.n_mfcc, config.n_mels),
            pcen: Pcen::new(PcenParams::default(), config.sample_rate, stft.hop_length()),
            stft,
        }
    }

    /// Scale a window into [-1, 1] by its peak
    pub fn normalize(audio: &[f32]) -> Vec<f32> {
        TemporalFeatures::normalize(audio)
    }

    /// Extract all features from a raw (unnormalized) window
    ///
    /// This method coordinates the entire feature extraction pipeline:
    /// 1. Normalize the window by its peak
    /// 2. Compute level statistics in the time domain
    /// 3. Compute magnitude frames and the spectral shape statistics
    /// 4. Project frame power onto mel bands for cepstral and PCEN statistics
    /// 5. Compute the frame-wise zero-crossing rate
    ///
    /// Non-finite intermediate values are replaced by zero so the result is
    /// always usable.
    pub fn extract(&self, audio: &[f32]) -> FeatureVector {
        let normalized = Self::normalize(audio);

        let levels = TemporalFeatures::compute_levels(&normalized);
        let magnitude_frames = self.stft.magnitude_frames(&normalized);

        let mut centroids = Vec::with_capacity(magnitude_frames.len());
        let mut bandwidths = Vec::with_capacity(magnitude_frames.len());
        let mut flatness = Vec::with_capacity(magnitude_frames.len());
        let mut mel_frames = Vec::with_capacity(magnitude_frames.len());

        for frame in &magnitude_frames {
            let centroid = self.spectral_features.compute_centroid(frame);
            centroids.push(centroid);
            bandwidths.push(self.spectral_features.compute_bandwidth(frame, centroid));
            flatness.push(self.spectral_features.compute_flatness(frame));

            let power: Vec<f32> = frame.iter().map(|m| m * m).collect();
            mel_frames.push(self.mel_bank.apply(&power));
        }

        let (centroid_mean, centroid_std) = mean_std(centroids);
        let (bandwidth_mean, _) = mean_std(bandwidths);
        let (flatness_mean, _) = mean_std(flatness);

        let mfcc = self.cepstral_features.compute_mfcc(&mel_frames);
        let (mfcc_mean, mfcc_std) = mean_std(mfcc.into_iter().flatten());

        let pcen = self.pcen.apply(&mel_frames);
        let (pcen_mean, pcen_std) = mean_std(pcen.into_iter().flatten());

        let (zcr_mean, _) = mean_std(self.temporal_features.frame_zcr(&normalized));

        let rms = finite_or_zero(levels.rms);
        FeatureVector {
            amplitude: finite_or_zero(levels.amplitude),
            rms,
            db: finite_or_zero(levels.db),
            peak: finite_or_zero(levels.peak),
            score: (rms * 100.0).min(100.0),
            centroid_mean: finite_or_zero(centroid_mean),
            centroid_std: finite_or_zero(centroid_std),
            bandwidth_mean: finite_or_zero(bandwidth_mean),
            flatness_mean: finite_or_zero(flatness_mean),
            mfcc_mean: finite_or_zero(mfcc_mean),
            mfcc_std: finite_or_zero(mfcc_std),
            pcen_mean: finite_or_zero(pcen_mean),
            pcen_std: finite_or_zero(pcen_std),
            zcr_mean: finite_or_zero(zcr_mean),
        }
    }
}
