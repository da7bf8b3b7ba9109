// Envelope - decimated amplitude envelope and a loudness-only danger estimate
//
// Used for quick previews of a recording: the envelope is a short list of
// evenly spaced samples scaled into [-1, 1], and the amplitude danger needs
// nothing but those points.

use serde::{Deserialize, Serialize};

use super::features::{mean_std, EPSILON};

/// Default number of points the decimation step aims for
pub const DEFAULT_TARGET_POINTS: usize = 100;
/// Default number of envelope points returned
pub const DEFAULT_LIMIT: usize = 50;

/// Decimate `samples` to about `target_points` values, scale by the peak and keep the first `limit`
///
/// The step is `max(1, len / target_points)`. Silence is returned unscaled.
pub fn extract_amplitudes(samples: &[f32], target_points: usize, limit: usize) -> Vec<f32> {
    let step = (samples.len() / target_points.max(1)).max(1);
    let decimated: Vec<f32> = samples.iter().step_by(step).copied().collect();

    let max_abs = decimated.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    decimated
        .into_iter()
        .take(limit)
        .map(|x| if max_abs > 0.0 { x / max_abs } else { x })
        .collect()
}

/// Loudness-only danger estimate from envelope points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeDanger {
    pub rms: f32,
    /// 20·log10(rms + 1e-6) + 100
    pub db: f32,
    pub peak: f32,
    /// Population standard deviation of the points
    pub variation: f32,
    /// 0.4·db + 30·peak + 20·variation
    pub score: f32,
    /// `min(100, trunc(score))`
    pub percent: u32,
}

pub fn amplitude_danger(amplitudes: &[f32]) -> AmplitudeDanger {
    if amplitudes.is_empty() {
        return AmplitudeDanger::default();
    }

    let n = amplitudes.len() as f32;
    let rms = (amplitudes.iter().map(|a| a * a).sum::<f32>() / n).sqrt();
    let db = 20.0 * (rms + EPSILON).log10() + 100.0;
    let peak = amplitudes.iter().fold(0.0f32, |acc, &a| acc.max(a.abs()));
    let (_, variation) = mean_std(amplitudes.iter().copied());
    let score = 0.4 * db + 30.0 * peak + 20.0 * variation;
    let percent = score.max(0.0).trunc().min(100.0) as u32;

    AmplitudeDanger {
        rms,
        db,
        peak,
        variation,
        score,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_limit() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32).collect();
        let envelope = extract_amplitudes(&samples, 100, 50);
        assert_eq!(envelope.len(), 50);
        // step 10, scaled by the decimated max (990)
        assert!((envelope[1] - 10.0 / 990.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_input_uses_unit_step() {
        let envelope = extract_amplitudes(&[0.5, -1.0, 0.25], 100, 50);
        assert_eq!(envelope, vec![0.5, -1.0, 0.25]);
    }

    #[test]
    fn test_silence_envelope_unscaled() {
        assert_eq!(extract_amplitudes(&[0.0; 10], 100, 50), vec![0.0; 10]);
        assert!(extract_amplitudes(&[], 100, 50).is_empty());
    }

    #[test]
    fn test_amplitude_danger_constant_level() {
        // rms 0.5 -> db ≈ 93.98, peak 0.5, no variation -> 37.59 + 15 = 52.59
        let danger = amplitude_danger(&[0.5; 4]);
        assert!((danger.db - 93.979).abs() < 1e-2);
        assert_eq!(danger.variation, 0.0);
        assert!((danger.score - 52.59).abs() < 1e-2);
        assert_eq!(danger.percent, 52);
    }

    #[test]
    fn test_amplitude_danger_is_capped() {
        let danger = amplitude_danger(&[1.0, -1.0, 1.0, -1.0, 1.0, -1.0]);
        assert!(danger.percent <= 100);
        assert_eq!(amplitude_danger(&[]).percent, 0);
    }

    #[test]
    fn test_amplitude_danger_silence() {
        let danger = amplitude_danger(&[0.0; 10]);
        // db = 20*log10(1e-6) + 100 = -20 -> score -8 -> percent 0
        assert!((danger.db + 20.0).abs() < 1e-3);
        assert_eq!(danger.percent, 0);
    }
}
