// PCEN module - per-channel energy normalization of mel power frames
//
// A first-order IIR smoother M tracks each mel band; the band energy is
// divided by M^gain (automatic gain control) then compressed with a root:
//
//   M[t]   = (1 - b)·M[t-1] + b·S[t],   M[-1] = 1
//   PCEN   = bias^power · (exp(power · ln(1 + S·(ε + M)^-gain / bias)) - 1)
//
// The smoothing coefficient b comes from a time constant expressed in frames.
//
// References:
// - Wang, Y. et al. (2017). Trainable frontend for robust and far-field
//   keyword spotting

/// PCEN parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcenParams {
    pub gain: f32,
    pub bias: f32,
    pub power: f32,
    pub time_constant_s: f32,
    pub eps: f32,
}

impl Default for PcenParams {
    fn default() -> Self {
        Self {
            gain: 0.98,
            bias: 2.0,
            power: 0.5,
            time_constant_s: 0.4,
            eps: 1e-6,
        }
    }
}

/// PCEN processor bound to a frame rate
pub struct Pcen {
    params: PcenParams,
    smoothing: f32,
}

impl Pcen {
    pub fn new(params: PcenParams, sample_rate: u32, hop_length: usize) -> Self {
        let t_frames = params.time_constant_s * sample_rate as f32 / hop_length.max(1) as f32;
        let smoothing = ((1.0 + 4.0 * t_frames * t_frames).sqrt() - 1.0) / (2.0 * t_frames * t_frames);
        Self { params, smoothing }
    }

    /// Smoothing coefficient `b` derived from the time constant
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    /// Normalize a sequence of mel frames (`frames × n_mels`)
    pub fn apply(&self, mel_frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
        let Some(first) = mel_frames.first() else {
            return Vec::new();
        };

        let p = self.params;
        let b = self.smoothing;
        let offset = p.bias.powf(p.power);
        let mut state = vec![1.0f32; first.len()];

        mel_frames
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .zip(state.iter_mut())
                    .map(|(&s, m)| {
                        *m = (1.0 - b) * *m + b * s;
                        let agc = s * (p.eps + *m).powf(-p.gain);
                        offset * (p.power * (agc / p.bias).ln_1p()).exp_m1()
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
    fn test_smoothing_coefficient_range() {
        let pcen = Pcen::new(PcenParams::default(), 44_100, 512);
        // T ≈ 34.45 frames -> b ≈ 0.0286
        assert!(pcen.smoothing() > 0.02 && pcen.smoothing() < 0.04, "b = {}", pcen.smoothing());
    }

    #[test]
    fn test_silence_maps_to_zero() {
        let pcen = Pcen::new(PcenParams::default(), 44_100, 512);
        let out = pcen.apply(&vec![vec![0.0; 8]; 5]);
        assert!(out.iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn test_output_positive_for_energy() {
        let pcen = Pcen::new(PcenParams::default(), 44_100, 512);
        let out = pcen.apply(&vec![vec![1.0; 4]; 10]);
        assert!(out.iter().flatten().all(|&v| v > 0.0 && v.is_finite()));
    }

    #[test]
    fn test_stationary_input_is_compressed_over_time() {
        // The smoother catches up with a constant level, so later frames shrink
        let pcen = Pcen::new(PcenParams::default(), 44_100, 512);
        let out = pcen.apply(&vec![vec![100.0]; 200]);
        assert!(out[199][0] < out[0][0]);
    }

    #[test]
    fn test_empty_input() {
        let pcen = Pcen::new(PcenParams::default(), 44_100, 512);
        assert!(pcen.apply(&[]).is_empty());
    }
}
