// DangerScorer - weighted fusion of window features into a 0-100 danger score
//
// Per window:
// 1. Map each feature onto 0-100 with a fixed linear clamp
// 2. Weighted sum (weights sum to 1.0)
// 3. Cry boost by type, capped at 100
// 4. Multi-source penalty: × (1 + 0.1 × (sources - 1))
// 5. Blend with the mean of the last three scores: 0.7 × score + 0.3 × mean
// 6. Record the blended score, report it clamped to [10, 100]

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::cry::CryEvent;
use super::features::{finite_or_zero, FeatureVector};

/// Lowest reported danger; no window is considered fully safe
pub const DANGER_FLOOR: f32 = 10.0;
/// Highest reported danger
pub const DANGER_CEILING: f32 = 100.0;
/// History entries blended into the current score
pub const HISTORY_LOOKBACK: usize = 3;

/// Feature weights; they sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DangerWeights {
    pub rms: f32,
    pub peak: f32,
    pub centroid: f32,
    pub bandwidth: f32,
    pub mfcc: f32,
    pub pcen: f32,
    pub zcr: f32,
}

impl Default for DangerWeights {
    fn default() -> Self {
        Self {
            rms: 0.30,
            peak: 0.20,
            centroid: 0.15,
            bandwidth: 0.10,
            mfcc: 0.10,
            pcen: 0.10,
            zcr: 0.05,
        }
    }
}

/// Features mapped onto a common 0-100 scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DangerComponents {
    pub rms: f32,
    pub peak: f32,
    pub centroid: f32,
    pub bandwidth: f32,
    pub mfcc: f32,
    pub pcen: f32,
    pub zcr: f32,
}

impl DangerComponents {
    pub fn from_features(features: &FeatureVector) -> Self {
        let scale = |value: f32| finite_or_zero(value).clamp(0.0, 100.0);
        Self {
            rms: scale(features.rms * 100.0),
            peak: scale(features.peak * 100.0),
            centroid: scale(features.centroid_mean / 5000.0 * 100.0),
            bandwidth: scale(features.bandwidth_mean / 3000.0 * 100.0),
            mfcc: scale((features.mfcc_mean + 300.0) / 3.0),
            pcen: scale(features.pcen_mean * 20.0),
            zcr: scale(features.zcr_mean * 500.0),
        }
    }

    pub fn weighted_sum(&self, weights: &DangerWeights) -> f32 {
        self.rms * weights.rms
            + self.peak * weights.peak
            + self.centroid * weights.centroid
            + self.bandwidth * weights.bandwidth
            + self.mfcc * weights.mfcc
            + self.pcen * weights.pcen
            + self.zcr * weights.zcr
    }
}

/// Recent danger scores of one scorer, oldest first
///
/// Holds at most `HISTORY_LOOKBACK` entries; older scores are dropped on push.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DangerHistory {
    scores: VecDeque<f32>,
}

impl DangerHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: f32) {
        if self.scores.len() == HISTORY_LOOKBACK {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Mean of the last `HISTORY_LOOKBACK` entries, `None` when empty
    pub fn recent_mean(&self) -> Option<f32> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.iter().sum::<f32>() / self.scores.len() as f32)
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}

/// Stateful danger scorer
///
/// Windows must be scored in chronological order. A scorer belongs to one
/// file (or one sequential session); concurrent files need separate scorers.
#[derive(Debug, Clone, Default)]
pub struct DangerScorer {
    weights: DangerWeights,
    history: DangerHistory,
}

impl DangerScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: DangerWeights) -> Self {
        Self {
            weights,
            history: DangerHistory::new(),
        }
    }

    pub fn history(&self) -> &DangerHistory {
        &self.history
    }

    /// Forget all previous windows
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Score one window and record it in the history
    ///
    /// # Returns
    /// Danger in [10, 100]
    pub fn score(&mut self, features: &FeatureVector, cry: &CryEvent, source_count: usize) -> f32 {
        let mut score = DangerComponents::from_features(features).weighted_sum(&self.weights);

        if cry.detected {
            score = (score * cry.cry_type.danger_boost()).min(DANGER_CEILING);
        }

        score *= 1.0 + 0.1 * (source_count.max(1) - 1) as f32;

        if let Some(recent) = self.history.recent_mean() {
            score = 0.7 * score + 0.3 * recent;
        }

        let score = finite_or_zero(score);
        self.history.push(score);
        score.clamp(DANGER_FLOOR, DANGER_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::cry::CryType;

    fn loud_features() -> FeatureVector {
        FeatureVector {
            rms: 0.5,
            peak: 1.0,
            centroid_mean: 2500.0,
            bandwidth_mean: 1500.0,
            mfcc_mean: -150.0,
            pcen_mean: 2.5,
            zcr_mean: 0.1,
            ..FeatureVector::default()
        }
    }

    fn silent_features() -> FeatureVector {
        FeatureVector {
            db: -120.0,
            mfcc_mean: -87.03,
            ..FeatureVector::default()
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let w = DangerWeights::default();
        let sum = w.rms + w.peak + w.centroid + w.bandwidth + w.mfcc + w.pcen + w.zcr;
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_components_are_clamped() {
        let features = FeatureVector {
            rms: 3.0,
            centroid_mean: 20_000.0,
            mfcc_mean: -900.0,
            zcr_mean: f32::NAN,
            ..FeatureVector::default()
        };
        let c = DangerComponents::from_features(&features);
        assert_eq!(c.rms, 100.0);
        assert_eq!(c.centroid, 100.0);
        assert_eq!(c.mfcc, 0.0);
        assert_eq!(c.zcr, 0.0);
    }

    #[test]
    fn test_silent_window_hits_floor() {
        let mut scorer = DangerScorer::new();
        let first = scorer.score(&silent_features(), &CryEvent::none(), 1);
        let second = scorer.score(&silent_features(), &CryEvent::none(), 1);
        assert_eq!(first, DANGER_FLOOR);
        assert_eq!(second, DANGER_FLOOR);
        // Raw scores are recorded before the floor is applied
        assert!(scorer.history().recent_mean().unwrap() < DANGER_FLOOR);
    }

    #[test]
    fn test_known_first_score() {
        // 0.3*50 + 0.2*100 + 0.15*50 + 0.1*50 + 0.1*50 + 0.1*50 + 0.05*50 = 60
        let mut scorer = DangerScorer::new();
        let score = scorer.score(&loud_features(), &CryEvent::none(), 1);
        assert!((score - 60.0).abs() < 1e-3, "score = {}", score);
    }

    #[test]
    fn test_cry_boost_and_source_penalty() {
        let mut scorer = DangerScorer::new();
        let baby = CryEvent::detected(CryType::Baby);
        // 60 * 1.5 = 90, then * 1.2 for three sources
        let score = scorer.score(&loud_features(), &baby, 3);
        assert!((score - 100.0).abs() < 1e-3);
        assert!((scorer.history().recent_mean().unwrap() - 108.0).abs() < 1e-3);
    }

    #[test]
    fn test_history_blending() {
        let mut scorer = DangerScorer::new();
        scorer.score(&loud_features(), &CryEvent::none(), 1); // 60
        let second = scorer.score(&silent_features(), &CryEvent::none(), 1);
        // 0.7 * 7.097 + 0.3 * 60
        assert!((second - (0.7 * 7.097 + 18.0)).abs() < 0.05, "second = {}", second);
    }

    #[test]
    fn test_history_lookback_is_three() {
        let mut history = DangerHistory::new();
        assert_eq!(history.recent_mean(), None);
        for score in [100.0, 10.0, 20.0, 30.0] {
            history.push(score);
        }
        assert_eq!(history.len(), HISTORY_LOOKBACK);
        assert!((history.recent_mean().unwrap() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_history_stays_bounded_over_long_sessions() {
        let mut scorer = DangerScorer::new();
        for _ in 0..1_000 {
            scorer.score(&loud_features(), &CryEvent::none(), 1);
        }
        assert_eq!(scorer.history().len(), HISTORY_LOOKBACK);
    }

    #[test]
    fn test_reset_isolates_files() {
        let mut scorer = DangerScorer::new();
        scorer.score(&loud_features(), &CryEvent::none(), 1);
        scorer.reset();
        assert!(scorer.history().is_empty());
        let fresh = scorer.score(&loud_features(), &CryEvent::none(), 1);
        assert!((fresh - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_output_always_in_range() {
        let mut scorer = DangerScorer::new();
        let extreme = FeatureVector {
            rms: f32::INFINITY,
            peak: 1e9,
            centroid_mean: -5.0,
            ..FeatureVector::default()
        };
        for sources in 0..5 {
            let score = scorer.score(&extreme, &CryEvent::detected(CryType::Child), sources);
            assert!((DANGER_FLOOR..=DANGER_CEILING).contains(&score));
        }
    }
}
