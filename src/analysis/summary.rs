// Summary - per-window records and per-file aggregation
//
// WindowResults are immutable once scored except for `moy_danger`, the
// file-level smoothed danger (0.7 × max + 0.3 × mean) that is only known
// after the last window and is then written into every window of the file.

use serde::{Deserialize, Serialize};

use super::cry::{CryEvent, CryType};
use super::features::{mean_std, FeatureVector};

/// Analysis result of one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    /// File the window belongs to
    pub title: String,
    /// 1-based position of the window in its file
    pub index: usize,
    #[serde(flatten)]
    pub features: FeatureVector,
    pub source_count: usize,
    #[serde(flatten)]
    pub cry: CryEvent,
    /// Smoothed heuristic danger in [10, 100]
    pub danger: f32,
    /// File-level danger, 0.7 × max + 0.3 × mean over the file's windows
    pub moy_danger: f32,
}

/// Aggregate over all windows of one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub title: String,
    pub window_count: usize,
    pub cry_count: usize,
    pub dominant_cry_type: CryType,
    pub danger_max: f32,
    pub danger_mean: f32,
    /// Sample standard deviation; 0 with fewer than two windows
    pub danger_std: f32,
    pub moy_danger: f32,
    pub source_count_mean: f32,
    /// Mean of every feature across windows
    pub feature_means: FeatureVector,
}

/// Windows and summary of one analyzed file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub windows: Vec<WindowResult>,
    pub summary: FileSummary,
}

/// File-level smoothed danger; 0 for no windows
pub fn moy_danger(dangers: &[f32]) -> f32 {
    if dangers.is_empty() {
        return 0.0;
    }
    let max = dangers.iter().fold(f32::NEG_INFINITY, |acc, &d| acc.max(d));
    let mean = dangers.iter().sum::<f32>() / dangers.len() as f32;
    0.7 * max + 0.3 * mean
}

/// Most frequent detected cry type
///
/// Ties go to the type whose name sorts first (`adult` < `baby` < `child`).
/// `CryType::None` when nothing was detected.
pub fn dominant_cry_type<'a, I>(events: I) -> CryType
where
    I: IntoIterator<Item = &'a CryEvent>,
{
    let mut counts: Vec<(CryType, usize)> = Vec::new();
    for event in events {
        if !event.detected || event.cry_type == CryType::None {
            continue;
        }
        match counts.iter_mut().find(|(t, _)| *t == event.cry_type) {
            Some((_, n)) => *n += 1,
            None => counts.push((event.cry_type, 1)),
        }
    }

    counts
        .into_iter()
        .max_by(|(a, na), (b, nb)| na.cmp(nb).then_with(|| b.as_str().cmp(a.as_str())))
        .map_or(CryType::None, |(t, _)| t)
}

/// Collects the windows of one file in order and builds its summary
#[derive(Debug, Clone, Default)]
pub struct FileAggregator {
    title: String,
    windows: Vec<WindowResult>,
}

impl FileAggregator {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            windows: Vec::new(),
        }
    }

    pub fn push(&mut self, window: WindowResult) {
        self.windows.push(window);
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Backfill `moy_danger` and summarize
    pub fn finish(mut self) -> FileAnalysis {
        let dangers: Vec<f32> = self.windows.iter().map(|w| w.danger).collect();
        let moy = moy_danger(&dangers);
        for window in &mut self.windows {
            window.moy_danger = moy;
        }

        let summary = if self.windows.is_empty() {
            FileSummary {
                title: self.title,
                ..FileSummary::default()
            }
        } else {
            let n = self.windows.len() as f32;
            let (danger_mean, _) = mean_std(dangers.iter().copied());
            let danger_std = if dangers.len() < 2 {
                0.0
            } else {
                let ss: f32 = dangers.iter().map(|d| (d - danger_mean).powi(2)).sum();
                (ss / (dangers.len() - 1) as f32).sqrt()
            };

            FileSummary {
                window_count: self.windows.len(),
                cry_count: self.windows.iter().filter(|w| w.cry.detected).count(),
                dominant_cry_type: dominant_cry_type(self.windows.iter().map(|w| &w.cry)),
                danger_max: dangers.iter().fold(f32::NEG_INFINITY, |acc, &d| acc.max(d)),
                danger_mean,
                danger_std,
                moy_danger: moy,
                source_count_mean: self.windows.iter().map(|w| w.source_count as f32).sum::<f32>()
                    / n,
                feature_means: mean_features(self.windows.iter().map(|w| &w.features)),
                title: self.title,
            }
        };

        FileAnalysis {
            windows: self.windows,
            summary,
        }
    }
}

fn mean_features<'a, I>(features: I) -> FeatureVector
where
    I: IntoIterator<Item = &'a FeatureVector>,
{
    let mut sum = FeatureVector::default();
    let mut n = 0usize;
    for f in features {
        sum.amplitude += f.amplitude;
        sum.rms += f.rms;
        sum.db += f.db;
        sum.peak += f.peak;
        sum.score += f.score;
        sum.centroid_mean += f.centroid_mean;
        sum.centroid_std += f.centroid_std;
        sum.bandwidth_mean += f.bandwidth_mean;
        sum.flatness_mean += f.flatness_mean;
        sum.mfcc_mean += f.mfcc_mean;
        sum.mfcc_std += f.mfcc_std;
        sum.pcen_mean += f.pcen_mean;
        sum.pcen_std += f.pcen_std;
        sum.zcr_mean += f.zcr_mean;
        n += 1;
    }
    if n == 0 {
        return sum;
    }

    let n = n as f32;
    FeatureVector {
        amplitude: sum.amplitude / n,
        rms: sum.rms / n,
        db: sum.db / n,
        peak: sum.peak / n,
        score: sum.score / n,
        centroid_mean: sum.centroid_mean / n,
        centroid_std: sum.centroid_std / n,
        bandwidth_mean: sum.bandwidth_mean / n,
        flatness_mean: sum.flatness_mean / n,
        mfcc_mean: sum.mfcc_mean / n,
        mfcc_std: sum.mfcc_std / n,
        pcen_mean: sum.pcen_mean / n,
        pcen_std: sum.pcen_std / n,
        zcr_mean: sum.zcr_mean / n,
    }
}
