// CryDetector - band-energy cry event detection
//
// A cry shows up as a sustained burst of energy concentrated in the
// 1.5-6 kHz band. Per window:
// 1. Segment power spectrogram (1024-sample Tukey segments)
// 2. Per-frame ratio of mean in-band power to mean total power
// 3. Gaussian smoothing of the ratio series (sigma = 2 frames)
// 4. Adaptive threshold = max(floor, 90th percentile), local maxima at least
//    5 frames apart
// 5. Interval seeded at +/-0.2 s around each peak, then grown in 0.1 s steps
//    while the ratio stays above half the threshold; the event is accepted
//    when it lasts long enough
// 6. Accepted events are classified by the window's spectral centroid

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::features::{SegmentSpectrogram, EPSILON};
use crate::config::CryDetectionConfig;

/// Half-width of the interval placed around a peak before expansion
const SEED_HALF_WIDTH_S: f32 = 0.2;
/// Expansion increment on each side of the interval
const EXPANSION_STEP_S: f32 = 0.1;

/// Rough speaker category of a detected cry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryType {
    Baby,
    Child,
    Adult,
    #[default]
    None,
}

impl CryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CryType::Baby => "baby",
            CryType::Child => "child",
            CryType::Adult => "adult",
            CryType::None => "none",
        }
    }

    /// Boost applied to the danger score when a cry of this type is detected
    pub fn danger_boost(&self) -> f32 {
        match self {
            CryType::Baby => 1.5,
            CryType::Child => 1.3,
            CryType::Adult | CryType::None => 1.2,
        }
    }
}

impl fmt::Display for CryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of cry detection for one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryEvent {
    pub detected: bool,
    pub cry_type: CryType,
}

impl CryEvent {
    /// No cry in this window
    pub fn none() -> Self {
        Self::default()
    }

    pub fn detected(cry_type: CryType) -> Self {
        Self {
            detected: true,
            cry_type,
        }
    }
}

/// Adaptive band-ratio cry detector
pub struct CryDetector {
    config: CryDetectionConfig,
    spectrogram: SegmentSpectrogram,
    kernel: Vec<f32>,
}

impl CryDetector {
    pub fn new(config: &CryDetectionConfig, sample_rate: u32) -> Self {
        Self {
            spectrogram: SegmentSpectrogram::new(config.segment_len, sample_rate),
            kernel: gaussian_kernel(config.smoothing_sigma),
            config: config.clone(),
        }
    }

    /// Detect a cry in a peak-normalized window
    ///
    /// `centroid_mean` is the window's mean spectral centroid from feature
    /// extraction, used only to classify an accepted event.
    pub fn detect(&self, window: &[f32], centroid_mean: f32) -> CryEvent {
        let spectrogram = self.spectrogram.compute(window);

        if spectrogram.frames.len() < 3 {
            tracing::debug!(
                "[CryDetector] Only {} spectrogram frames, skipping",
                spectrogram.frames.len()
            );
            return CryEvent::none();
        }

        let ratio = self.band_ratio(&spectrogram.frequencies, &spectrogram.frames);
        let smoothed = self.smooth(&ratio);
        let threshold = self
            .config
            .power_threshold
            .max(percentile(&smoothed, self.config.threshold_percentile));

        let peaks = find_peaks(&smoothed, threshold, self.config.min_peak_distance);
        let accepted = peaks.iter().any(|&peak| {
            let (start, end) =
                expand_interval(&smoothed, &spectrogram.times, peak, threshold / 2.0);
            end - start >= self.config.min_duration_s
        });

        if !accepted {
            return CryEvent::none();
        }

        let cry_type = self.classify(centroid_mean);
        tracing::debug!(
            "[CryDetector] Cry detected: type={}, threshold={:.3}, peaks={}",
            cry_type,
            threshold,
            peaks.len()
        );
        CryEvent::detected(cry_type)
    }

    /// Classify an accepted event by spectral centroid (descending thresholds)
    pub fn classify(&self, centroid_mean: f32) -> CryType {
        if centroid_mean > self.config.baby_centroid_hz {
            CryType::Baby
        } else if centroid_mean > self.config.child_centroid_hz {
            CryType::Child
        } else {
            CryType::Adult
        }
    }

    /// Mean in-band power over mean total power, per frame
    ///
    /// A tone inside the band scores about `n_bins / n_band_bins`; a flat
    /// spectrum scores about 1.
    pub fn band_ratio(&self, frequencies: &[f32], frames: &[Vec<f32>]) -> Vec<f32> {
        let (lo, hi) = (self.config.band_min_hz, self.config.band_max_hz);
        frames
            .iter()
            .map(|frame| {
                let mut band = 0.0f32;
                let mut band_bins = 0usize;
                let mut total = 0.0f32;
                for (&power, &freq) in frame.iter().zip(frequencies) {
                    total += power;
                    if freq >= lo && freq <= hi {
                        band += power;
                        band_bins += 1;
                    }
                }
                if band_bins == 0 || frame.is_empty() {
                    return 0.0;
                }
                let band_mean = band / band_bins as f32;
                let total_mean = total / frame.len() as f32;
                // Only an all-zero frame needs the guard
                let denominator = if total_mean > 0.0 { total_mean } else { EPSILON };
                let ratio = band_mean / denominator;
                if ratio.is_finite() {
                    ratio
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn smooth(&self, series: &[f32]) -> Vec<f32> {
        gaussian_filter(series, &self.kernel)
    }
}

/// Normalized Gaussian weights truncated at four sigma
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (4.0 * sigma + 0.5) as i64;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f32 / sigma).powi(2)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Convolve with edges mirrored about the outer sample boundary (d c b a | a b c d | d c b a)
fn gaussian_filter(series: &[f32], kernel: &[f32]) -> Vec<f32> {
    let n = series.len() as i64;
    if n == 0 {
        return Vec::new();
    }
    let radius = (kernel.len() / 2) as i64;
    let reflect = |i: i64| -> usize {
        let period = 2 * n;
        let m = i.rem_euclid(period);
        (if m < n { m } else { period - 1 - m }) as usize
    };

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * series[reflect(i + k as i64 - radius)])
                .sum()
        })
        .collect()
}

/// Percentile with linear interpolation between closest ranks
fn percentile(values: &[f32], q: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Local maxima at or above `height`, thinned to `distance` frames apart
///
/// Flat peaks report their middle sample. When two peaks are closer than
/// `distance`, the higher one wins.
fn find_peaks(series: &[f32], height: f32, distance: usize) -> Vec<usize> {
    let n = series.len();
    let mut candidates = Vec::new();

    let mut i = 1;
    while i + 1 < n {
        if series[i - 1] < series[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && series[ahead] == series[i] {
                ahead += 1;
            }
            if series[ahead] < series[i] {
                let middle = (i + ahead - 1) / 2;
                if series[middle] >= height {
                    candidates.push(middle);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    if distance <= 1 {
        return candidates;
    }

    let mut by_height = candidates.clone();
    by_height.sort_by(|&a, &b| {
        series[b]
            .partial_cmp(&series[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept: Vec<usize> = Vec::new();
    for peak in by_height {
        if kept.iter().all(|&k| k.abs_diff(peak) >= distance) {
            kept.push(peak);
        }
    }
    kept.sort_unstable();
    kept
}

/// Event interval in seconds around `peak`
///
/// Starts at `times[peak] ± SEED_HALF_WIDTH_S`, clamped to `[0, last frame time]`,
/// and widens by `EXPANSION_STEP_S` per side while the series at the current
/// edge stays above `floor`.
fn expand_interval(series: &[f32], times: &[f32], peak: usize, floor: f32) -> (f32, f32) {
    let (Some(&center), Some(&last)) = (times.get(peak), times.last()) else {
        return (0.0, 0.0);
    };

    let mut start = (center - SEED_HALF_WIDTH_S).max(0.0);
    let mut end = (center + SEED_HALF_WIDTH_S).min(last);

    while start > 0.0 && series[frame_at(times, start)] > floor {
        start = (start - EXPANSION_STEP_S).max(0.0);
    }
    while end < last && series[frame_at(times, end)] > floor {
        end = (end + EXPANSION_STEP_S).min(last);
    }
    (start, end)
}

/// Index of the frame whose center time is nearest to `time`
fn frame_at(times: &[f32], time: f32) -> usize {
    let last = times.len().saturating_sub(1);
    match (times.first(), times.get(1)) {
        (Some(&first), Some(&second)) if second > first => {
            let index = ((time - first) / (second - first)).round();
            (index.max(0.0) as usize).min(last)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44_100;

    fn detector() -> CryDetector {
        CryDetector::new(&CryDetectionConfig::default(), SAMPLE_RATE)
    }

    /// Silence with a tone between `start_s` and `end_s`
    fn tone_burst(frequency: f32, start_s: f32, end_s: f32, total_s: f32) -> Vec<f32> {
        let n = (total_s * SAMPLE_RATE as f32) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                if t >= start_s && t < end_s {
                    0.8 * (2.0 * PI * frequency * t).sin()
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn test_tone_burst_in_band_is_detected() {
        let audio = tone_burst(3000.0, 2.0, 3.0, 5.0);
        let event = detector().detect(&audio, 3000.0);
        assert!(event.detected, "3 kHz burst should be detected");
        assert_eq!(event.cry_type, CryType::Baby);
    }

    #[test]
    fn test_brief_burst_mid_window_is_detected() {
        // The seeded +/-0.2 s interval already spans the minimum duration
        let audio = tone_burst(3000.0, 2.0, 2.12, 5.0);
        let event = detector().detect(&audio, 3000.0);
        assert_eq!(event, CryEvent::detected(CryType::Baby));
    }

    #[test]
    fn test_burst_clipped_by_window_start_is_rejected() {
        // The ratio only falls after the first frame, so there is no interior peak
        let audio = tone_burst(3000.0, 0.0, 0.05, 5.0);
        let event = detector().detect(&audio, 3000.0);
        assert_eq!(event, CryEvent::none());
    }

    fn white_noise() -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(0x5A5A_FFF0);
        (0..5 * SAMPLE_RATE as usize)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect()
    }

    #[test]
    fn test_white_noise_ratio_hovers_near_one() {
        let detector = detector();
        let spectrogram = detector.spectrogram.compute(&white_noise());
        let ratio = detector.band_ratio(&spectrogram.frequencies, &spectrogram.frames);
        let mean = ratio.iter().sum::<f32>() / ratio.len() as f32;
        assert!((mean - 1.0).abs() < 0.15, "mean band ratio {}", mean);
    }

    #[test]
    fn test_white_noise_against_threshold_floor() {
        // A flat spectrum stays above half of a 0.3 floor everywhere
        let event = detector().detect(&white_noise(), 11_000.0);
        assert_eq!(event, CryEvent::detected(CryType::Baby));

        // A floor above the flat-spectrum level leaves nothing to detect
        let config = CryDetectionConfig {
            power_threshold: 1.5,
            ..CryDetectionConfig::default()
        };
        let strict = CryDetector::new(&config, SAMPLE_RATE);
        assert_eq!(strict.detect(&white_noise(), 11_000.0), CryEvent::none());
    }

    #[test]
    fn test_silence_and_low_tone_not_detected() {
        assert_eq!(detector().detect(&vec![0.0; 220_500], 0.0), CryEvent::none());
        let low = tone_burst(200.0, 0.0, 5.0, 5.0);
        assert_eq!(detector().detect(&low, 200.0), CryEvent::none());
    }

    #[test]
    fn test_too_short_window_not_detected() {
        assert_eq!(detector().detect(&[0.5; 1500], 3000.0), CryEvent::none());
    }

    #[test]
    fn test_classification_thresholds() {
        let detector = detector();
        assert_eq!(detector.classify(2600.0), CryType::Baby);
        assert_eq!(detector.classify(2500.0), CryType::Child);
        assert_eq!(detector.classify(2100.0), CryType::Child);
        assert_eq!(detector.classify(2000.0), CryType::Adult);
        assert_eq!(detector.classify(0.0), CryType::Adult);
    }

    #[test]
    fn test_band_ratio_compares_band_mean_to_total_mean() {
        let detector = detector();
        let frequencies = vec![500.0, 2000.0, 4000.0, 8000.0];
        let frames = vec![vec![0.0, 2.0, 2.0, 0.0], vec![1.0, 1.0, 1.0, 1.0], vec![0.0; 4]];
        let ratio = detector.band_ratio(&frequencies, &frames);
        assert!((ratio[0] - 2.0).abs() < 1e-4, "ratio {:?}", ratio);
        assert!((ratio[1] - 1.0).abs() < 1e-4, "ratio {:?}", ratio);
        assert_eq!(ratio[2], 0.0);
    }

    #[test]
    fn test_in_band_tone_ratio_tracks_bin_counts() {
        let detector = detector();
        let audio = tone_burst(3000.0, 0.0, 1.0, 1.0);
        let spectrogram = detector.spectrogram.compute(&audio);
        let ratio = detector.band_ratio(&spectrogram.frequencies, &spectrogram.frames);
        // 513 bins in total, 105 of them between 1500 and 6000 Hz
        let expected = 513.0 / 105.0;
        for r in ratio {
            assert!((r - expected).abs() < 0.1, "ratio {} vs {}", r, expected);
        }
    }

    #[test]
    fn test_gaussian_filter_preserves_constant_and_spreads_spike() {
        let kernel = gaussian_kernel(2.0);
        assert_eq!(kernel.len(), 17);
        let constant = gaussian_filter(&[0.4; 20], &kernel);
        assert!(constant.iter().all(|v| (v - 0.4).abs() < 1e-5));

        let mut spike = vec![0.0; 21];
        spike[10] = 1.0;
        let smoothed = gaussian_filter(&spike, &kernel);
        assert!(smoothed[10] < 0.25);
        assert!((smoothed.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert!((percentile(&values, 90.0) - 9.0).abs() < 1e-5);
        assert!((percentile(&[1.0, 2.0], 50.0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_find_peaks_height_distance_and_plateau() {
        let series = [0.0, 0.5, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7, 0.7, 0.7, 0.0];
        assert_eq!(find_peaks(&series, 0.3, 1), vec![1, 3, 10]);
        // 0.5 at index 1 is within 5 frames of the higher 0.9
        assert_eq!(find_peaks(&series, 0.3, 5), vec![3, 10]);
        assert_eq!(find_peaks(&series, 0.8, 5), vec![3]);
    }

    #[test]
    fn test_expand_interval_seeds_then_grows() {
        let times: Vec<f32> = (0..21).map(|i| i as f32 * 0.05).collect();

        let mut spike = vec![0.0; 21];
        spike[10] = 1.0;
        let (start, end) = expand_interval(&spike, &times, 10, 0.3);
        assert!((start - 0.3).abs() < 1e-4 && (end - 0.7).abs() < 1e-4, "{start}..{end}");

        let (start, end) = expand_interval(&[1.0; 21], &times, 10, 0.3);
        assert_eq!((start, end), (0.0, times[20]));

        // Near the edge the seed is clipped and nothing extends it
        let mut edge = vec![0.0; 21];
        edge[1] = 1.0;
        let (start, end) = expand_interval(&edge, &times, 1, 0.3);
        assert_eq!(start, 0.0);
        assert!((end - 0.25).abs() < 1e-4, "end {end}");
    }

    #[test]
    fn test_frame_at_rounds_and_clamps() {
        let times = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(frame_at(&times, 0.0), 0);
        assert_eq!(frame_at(&times, 0.26), 2);
        assert_eq!(frame_at(&times, 9.0), 3);
        assert_eq!(frame_at(&[0.5], 0.7), 0);
    }
}
