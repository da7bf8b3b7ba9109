// STFT module - short-time Fourier transforms
//
// Two framings are provided:
// - `Stft`: centered, zero-padded Hann frames returning magnitudes. This feeds
//   every FeatureExtractor statistic and the NMF source estimator.
// - `SegmentSpectrogram`: uncentered Tukey(0.25) segments with 1/8 overlap,
//   mean-detrended and scaled to a one-sided power spectral density. This
//   feeds the cry detector's band ratio.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Centered magnitude STFT with a periodic Hann window
pub struct Stft {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_length: usize,
    /// Hann window (pre-computed)
    window: Vec<f32>,
}

impl Stft {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - Frame length (typically 2048 for feature extraction)
    /// * `hop_length` - Hop between frame starts
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let n_fft = n_fft.max(2);
        let window = (0..n_fft)
            .map(|i| 0.5 * (1.0 - ((2.0 * PI * i as f32) / n_fft as f32).cos()))
            .collect();

        Self {
            fft: FftPlanner::new().plan_fft_forward(n_fft),
            n_fft,
            hop_length: hop_length.max(1),
            window,
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of positive-frequency bins per frame
    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Center frequency of every bin in Hz
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f32> {
        let bin_width = sample_rate as f32 / self.n_fft as f32;
        (0..self.n_bins()).map(|k| k as f32 * bin_width).collect()
    }

    /// Compute magnitude frames
    ///
    /// The signal is padded with `n_fft / 2` zeros on both sides so frame `t`
    /// is centered on sample `t * hop_length`.
    ///
    /// # Returns
    /// One magnitude spectrum (size = n_fft / 2 + 1) per frame,
    /// `1 + len / hop_length` frames
    pub fn magnitude_frames(&self, audio: &[f32]) -> Vec<Vec<f32>> {
        let pad = self.n_fft / 2;
        let n_frames = 1 + audio.len() / self.hop_length;
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut frames = Vec::with_capacity(n_frames);

        for frame_idx in 0..n_frames {
            let center = frame_idx * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                // Position in the unpadded signal
                let sample = (center + i)
                    .checked_sub(pad)
                    .and_then(|pos| audio.get(pos))
                    .copied()
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut buffer);
            frames.push(buffer[..self.n_bins()].iter().map(|c| c.norm()).collect());
        }

        frames
    }
}

/// Power spectral density over uncentered, overlapping segments
pub struct SegmentSpectrogram {
    fft: Arc<dyn Fft<f32>>,
    segment_len: usize,
    step: usize,
    window: Vec<f32>,
    /// Density scaling: 1 / (fs * Σw²)
    scale: f32,
    sample_rate: u32,
}

/// Result of [`SegmentSpectrogram::compute`]
#[derive(Debug, Clone)]
pub struct PowerSpectrogram {
    /// Bin frequencies in Hz
    pub frequencies: Vec<f32>,
    /// Segment center times in seconds
    pub times: Vec<f32>,
    /// One PSD row per segment
    pub frames: Vec<Vec<f32>>,
    /// Seconds between consecutive segments
    pub frame_step_s: f32,
}

impl SegmentSpectrogram {
    /// Create a spectrogram processor with `segment_len / 8` samples of overlap
    pub fn new(segment_len: usize, sample_rate: u32) -> Self {
        let segment_len = segment_len.max(8);
        let overlap = segment_len / 8;
        let window = tukey_window(segment_len, 0.25);
        let window_energy: f32 = window.iter().map(|w| w * w).sum();

        Self {
            fft: FftPlanner::new().plan_fft_forward(segment_len),
            segment_len,
            step: segment_len - overlap,
            window,
            scale: 1.0 / (sample_rate as f32 * window_energy),
            sample_rate,
        }
    }

    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Compute the one-sided PSD of every complete segment
    pub fn compute(&self, audio: &[f32]) -> PowerSpectrogram {
        let n_bins = self.segment_len / 2 + 1;
        let bin_width = self.sample_rate as f32 / self.segment_len as f32;
        let frequencies = (0..n_bins).map(|k| k as f32 * bin_width).collect();
        let frame_step_s = self.step as f32 / self.sample_rate as f32;

        let mut frames = Vec::new();
        let mut times = Vec::new();
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.segment_len];

        let mut start = 0;
        while start + self.segment_len <= audio.len() {
            let segment = &audio[start..start + self.segment_len];
            let mean = segment.iter().sum::<f32>() / self.segment_len as f32;

            for ((slot, &sample), &w) in buffer.iter_mut().zip(segment).zip(&self.window) {
                *slot = Complex::new((sample - mean) * w, 0.0);
            }
            self.fft.process(&mut buffer);

            let last_bin = n_bins - 1;
            let row = buffer[..n_bins]
                .iter()
                .enumerate()
                .map(|(k, c)| {
                    let power = c.norm_sqr() * self.scale;
                    // One-sided spectrum folds negative frequencies onto positive ones
                    let is_unpaired = k == 0 || (self.segment_len % 2 == 0 && k == last_bin);
                    if is_unpaired {
                        power
                    } else {
                        2.0 * power
                    }
                })
                .collect();

            frames.push(row);
            times.push((start as f32 + self.segment_len as f32 / 2.0) / self.sample_rate as f32);
            start += self.step;
        }

        PowerSpectrogram {
            frequencies,
            times,
            frames,
            frame_step_s,
        }
    }
}

/// Tapered cosine window; `alpha = 0` is rectangular, `alpha = 1` is Hann
fn tukey_window(len: usize, alpha: f32) -> Vec<f32> {
    if len < 2 || alpha <= 0.0 {
        return vec![1.0; len];
    }

    let n = (len - 1) as f32;
    let taper = alpha * n / 2.0;
    (0..len)
        .map(|i| {
            let x = i as f32;
            if x < taper {
                0.5 * (1.0 + (PI * (x / taper - 1.0)).cos())
            } else if x > n - taper {
                0.5 * (1.0 + (PI * ((x - n) / taper + 1.0)).cos())
            } else {
                1.0
            }
        })
        .collect()
}
