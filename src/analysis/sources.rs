// Source counting - how many sound sources are active in a window
//
// The primary estimator factors the magnitude spectrogram V (bins × frames)
// into W·H with non-negative matrix factorization and counts the components
// whose peak contribution is significant. The fallback looks only at the
// window's time-domain spread. `WithFallback` joins the two so callers get
// an infallible count.
//
// References:
// - Lee, D. & Seung, H. (2001). Algorithms for non-negative matrix
//   factorization

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::features::Stft;
use crate::config::SourceCountConfig;
use crate::error::AnalysisError;

const NMF_SEED: u64 = 0x5A5A_FFF0;
const UPDATE_EPS: f32 = 1e-9;

/// Estimate of simultaneous sound sources in a window
pub trait SourceCountEstimator {
    /// Count sources in a peak-normalized window
    fn estimate(&self, window: &[f32]) -> Result<usize, AnalysisError>;
}

/// NMF-based estimator over the magnitude spectrogram
pub struct NmfSourceEstimator {
    stft: Stft,
    n_components: usize,
    activation_threshold: f32,
    iterations: usize,
}

impl NmfSourceEstimator {
    pub fn new(config: &SourceCountConfig, n_fft: usize, hop_length: usize) -> Self {
        Self {
            stft: Stft::new(n_fft, hop_length),
            n_components: config.n_components.max(1),
            activation_threshold: config.activation_threshold,
            iterations: config.nmf_iterations,
        }
    }

    /// Factor `v` (frames × bins) into `n_components` spectral templates and activations
    ///
    /// Returns `(w, h)` with `w[f][k]` the template weights and `h[k][t]`
    /// the activations.
    fn factorize(&self, v: &[Vec<f32>]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
        let k = self.n_components;
        let n_frames = v.len();
        let n_bins = v.first().map_or(0, Vec::len);

        let total: f64 = v.iter().flatten().map(|&x| x as f64).sum();
        let mean = (total / (n_frames * n_bins).max(1) as f64) as f32;
        let scale = (mean / k as f32).sqrt();

        let mut rng = StdRng::seed_from_u64(NMF_SEED);
        let mut w: Vec<Vec<f32>> = (0..n_bins)
            .map(|_| (0..k).map(|_| scale * rng.gen::<f32>()).collect())
            .collect();
        let mut h: Vec<Vec<f32>> = (0..k)
            .map(|_| (0..n_frames).map(|_| scale * rng.gen::<f32>()).collect())
            .collect();

        for _ in 0..self.iterations {
            // H <- H * (WᵀV) / (WᵀW H)
            let wtw = gram(&w, k);
            for t in 0..n_frames {
                let mut numer = vec![0.0f32; k];
                for (f, &value) in v[t].iter().enumerate() {
                    for (c, n) in numer.iter_mut().enumerate() {
                        *n += w[f][c] * value;
                    }
                }
                let denom: Vec<f32> = (0..k)
                    .map(|c| (0..k).map(|j| wtw[c][j] * h[j][t]).sum())
                    .collect();
                for c in 0..k {
                    h[c][t] *= numer[c] / (denom[c] + UPDATE_EPS);
                }
            }

            // W <- W * (VHᵀ) / (W HHᵀ)
            let hht: Vec<Vec<f32>> = (0..k)
                .map(|a| {
                    (0..k)
                        .map(|b| h[a].iter().zip(&h[b]).map(|(x, y)| x * y).sum())
                        .collect()
                })
                .collect();
            let mut numer = vec![vec![0.0f32; k]; n_bins];
            for (t, frame) in v.iter().enumerate() {
                for (f, &value) in frame.iter().enumerate() {
                    for c in 0..k {
                        numer[f][c] += value * h[c][t];
                    }
                }
            }
            for (row, numer_row) in w.iter_mut().zip(&numer) {
                let denom: Vec<f32> = (0..k)
                    .map(|c| (0..k).map(|j| row[j] * hht[j][c]).sum())
                    .collect();
                for c in 0..k {
                    row[c] *= numer_row[c] / (denom[c] + UPDATE_EPS);
                }
            }
        }

        (w, h)
    }
}

/// `WᵀW` for a bins × k template matrix
fn gram(w: &[Vec<f32>], k: usize) -> Vec<Vec<f32>> {
    let mut out = vec![vec![0.0f32; k]; k];
    for row in w {
        for a in 0..k {
            for b in 0..k {
                out[a][b] += row[a] * row[b];
            }
        }
    }
    out
}

impl SourceCountEstimator for NmfSourceEstimator {
    fn estimate(&self, window: &[f32]) -> Result<usize, AnalysisError> {
        let v = self.stft.magnitude_frames(window);
        let energy: f32 = v.iter().flatten().sum();
        if !energy.is_finite() {
            return Err(AnalysisError::DecompositionFailed {
                reason: "non-finite spectrogram".to_string(),
            });
        }
        if energy < 1e-8 {
            return Err(AnalysisError::DegenerateSignal {
                reason: "spectrogram has no energy".to_string(),
            });
        }

        let (w, h) = self.factorize(&v);

        // Peak contribution of each component: max activation × max template weight
        let mut strengths: Vec<f32> = (0..self.n_components)
            .map(|c| {
                let peak_activation = h[c].iter().fold(0.0f32, |acc, &x| acc.max(x));
                let peak_template = w.iter().fold(0.0f32, |acc, row| acc.max(row[c]));
                peak_activation * peak_template
            })
            .collect();

        if strengths.iter().any(|s| !s.is_finite()) {
            return Err(AnalysisError::DecompositionFailed {
                reason: "factorization diverged".to_string(),
            });
        }

        strengths.sort_by(|a, b| b.total_cmp(a));
        let strongest = strengths[0];
        if strongest <= 0.0 {
            return Err(AnalysisError::DecompositionFailed {
                reason: "all components vanished".to_string(),
            });
        }

        // NMF leaves the split of scale between W and H arbitrary, so a raw
        // peak of H is not comparable across components or windows. The
        // peak activation is measured as max(H_k)·max(W_k) relative to the
        // strongest component, which makes the 0.1 threshold level-independent.
        let active = strengths
            .iter()
            .filter(|&&s| s / strongest > self.activation_threshold)
            .count();
        Ok(active.clamp(1, self.n_components))
    }
}

/// Fallback: one source for quiet windows, two otherwise
pub struct StdDevSourceEstimator {
    quiet_threshold: f32,
}

impl StdDevSourceEstimator {
    pub fn new(config: &SourceCountConfig) -> Self {
        Self {
            quiet_threshold: config.quiet_std_threshold,
        }
    }

    /// Infallible count
    pub fn count(&self, window: &[f32]) -> usize {
        let (_, std) = super::features::mean_std(window.iter().copied());
        if std < self.quiet_threshold {
            1
        } else {
            2
        }
    }
}

impl SourceCountEstimator for StdDevSourceEstimator {
    fn estimate(&self, window: &[f32]) -> Result<usize, AnalysisError> {
        Ok(self.count(window))
    }
}

/// Try `primary`, resolve any failure with `fallback`
pub struct WithFallback<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> WithFallback<P, F>
where
    P: SourceCountEstimator,
    F: SourceCountEstimator,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    /// Source count that never fails; both failing yields one source
    pub fn count(&self, window: &[f32]) -> usize {
        match self.primary.estimate(window) {
            Ok(count) => count,
            Err(err @ AnalysisError::DegenerateSignal { .. }) => {
                log::debug!("[SourceCount] {}, using fallback", err);
                self.fallback.estimate(window).unwrap_or(1)
            }
            Err(err) => {
                log::warn!("[SourceCount] Primary estimator failed ({}), using fallback", err);
                self.fallback.estimate(window).unwrap_or(1)
            }
        }
    }
}

impl<P, F> SourceCountEstimator for WithFallback<P, F>
where
    P: SourceCountEstimator,
    F: SourceCountEstimator,
{
    fn estimate(&self, window: &[f32]) -> Result<usize, AnalysisError> {
        Ok(self.count(window))
    }
}

/// The estimator the analysis pipeline uses by default
pub type DefaultSourceEstimator = WithFallback<NmfSourceEstimator, StdDevSourceEstimator>;

impl DefaultSourceEstimator {
    pub fn from_config(config: &SourceCountConfig, n_fft: usize, hop_length: usize) -> Self {
        WithFallback::new(
            NmfSourceEstimator::new(config, n_fft, hop_length),
            StdDevSourceEstimator::new(config),
        )
    }
}
