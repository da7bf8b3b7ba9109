// Cepstral module - mel filterbank and MFCC-equivalent coefficients
//
// Pipeline per frame:
// 1. Power spectrum |X|² projected onto a Slaney-style mel filterbank
//    (area-normalized triangles, linear below 1 kHz, logarithmic above)
// 2. Power to decibels: 10·log10(max(S, 1e-10)), floored at max - 80 dB
// 3. Orthonormal DCT-II along the mel axis, first `n_mfcc` coefficients kept

use std::f32::consts::PI;

const MIN_POWER: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Convert Hz to mel (Slaney scale)
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz < MIN_LOG_HZ {
        hz / F_SP
    } else {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    }
}

/// Convert mel to Hz (Slaney scale)
pub fn mel_to_hz(mel: f32) -> f32 {
    if mel < MIN_LOG_MEL {
        mel * F_SP
    } else {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    }
}

/// One triangular filter stored as a contiguous run of non-zero weights
#[derive(Debug, Clone)]
struct MelFilter {
    first_bin: usize,
    weights: Vec<f32>,
}

/// Mel filterbank over a fixed FFT geometry
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
}

impl MelFilterBank {
    /// Build `n_mels` filters spanning 0 Hz to Nyquist
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let n_bins = n_fft / 2 + 1;
        let bin_width = sample_rate as f32 / n_fft as f32;
        let max_mel = hz_to_mel(sample_rate as f32 / 2.0);
        let hz_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (hz_points[m], hz_points[m + 1], hz_points[m + 2]);
                let enorm = 2.0 / (upper - lower);
                let mut first_bin = None;
                let mut weights = Vec::new();

                for k in 0..n_bins {
                    let freq = k as f32 * bin_width;
                    let rising = (freq - lower) / (center - lower);
                    let falling = (upper - freq) / (upper - center);
                    let weight = rising.min(falling).max(0.0) * enorm;
                    if weight > 0.0 {
                        first_bin.get_or_insert(k);
                        weights.push(weight);
                    } else if first_bin.is_some() {
                        break;
                    }
                }

                MelFilter {
                    first_bin: first_bin.unwrap_or(0),
                    weights,
                }
            })
            .collect();

        Self { filters }
    }

    /// Project one power spectrum onto the mel bands
    pub fn apply(&self, power_spectrum: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                power_spectrum
                    .iter()
                    .skip(filter.first_bin)
                    .zip(&filter.weights)
                    .map(|(p, w)| p * w)
                    .sum()
            })
            .collect()
    }
}

/// MFCC computation over mel power frames
pub struct CepstralFeatures {
    /// Row-major `n_mfcc × n_mels` orthonormal DCT-II basis
    dct: Vec<Vec<f32>>,
}

impl CepstralFeatures {
    pub fn new(n_mfcc: usize, n_mels: usize) -> Self {
        let n = n_mels.max(1) as f32;
        let dct = (0..n_mfcc)
            .map(|k| {
                let norm = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
                (0..n_mels)
                    .map(|i| norm * (PI * k as f32 * (2.0 * i as f32 + 1.0) / (2.0 * n)).cos())
                    .collect()
            })
            .collect();

        Self { dct }
    }

    /// Coefficients for every frame (`frames × n_mfcc`)
    pub fn compute_mfcc(&self, mel_frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let log_frames: Vec<Vec<f32>> = mel_frames
            .iter()
            .map(|frame| frame.iter().map(|&p| 10.0 * p.max(MIN_POWER).log10()).collect())
            .collect();

        let max_db = log_frames
            .iter()
            .flatten()
            .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        let floor = max_db - TOP_DB;

        log_frames
            .iter()
            .map(|frame| {
                self.dct
                    .iter()
                    .map(|basis| {
                        basis
                            .iter()
                            .zip(frame)
                            .map(|(b, &v)| b * v.max(floor))
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_roundtrip() {
        for hz in [0.0, 440.0, 1000.0, 4000.0, 22_050.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < hz.max(1.0) * 1e-4, "{} -> {}", hz, back);
        }
    }

    #[test]
    fn test_mel_scale_is_linear_below_1khz() {
        assert!((hz_to_mel(600.0) - 9.0).abs() < 1e-4);
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_filterbank_shape() {
        let bank = MelFilterBank::new(44_100, 2048, 128);
        assert_eq!(bank.filters.len(), 128);
        let mel = bank.apply(&vec![1.0; 1025]);
        assert_eq!(mel.len(), 128);
        assert!(mel.iter().all(|&v| v >= 0.0 && v.is_finite()));
    }

    #[test]
    fn test_silence_mfcc_is_constant_log_floor() {
        let cepstral = CepstralFeatures::new(13, 128);
        let mfcc = cepstral.compute_mfcc(&vec![vec![0.0; 128]; 4]);
        assert_eq!(mfcc.len(), 4);
        assert_eq!(mfcc[0].len(), 13);
        // c0 = -100 dB * sqrt(128), higher coefficients vanish
        assert!((mfcc[0][0] + 100.0 * 128f32.sqrt()).abs() < 0.1);
        assert!(mfcc[0][1..].iter().all(|c| c.abs() < 1e-2));
    }

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let cepstral = CepstralFeatures::new(13, 32);
        for a in 0..13 {
            for b in 0..13 {
                let dot: f32 = cepstral.dct[a]
                    .iter()
                    .zip(&cepstral.dct[b])
                    .map(|(x, y)| x * y)
                    .sum();
                let expected = if a == b { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-4);
            }
        }
    }
}
