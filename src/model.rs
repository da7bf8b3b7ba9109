//! Prediction capabilities and danger reports.
//!
//! Trained regression models live outside this crate. They are plugged in
//! as already-loaded predictors: a [`SlicePredictor`] scores one window, a
//! [`FilePredictor`] scores a whole file summary. [`HeuristicPredictor`]
//! reuses the heuristic danger score so reports work without any model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::cry::CryType;
use crate::analysis::summary::{FileAnalysis, FileSummary, WindowResult};
use crate::error::AnalysisError;

/// Scores one analyzed window
pub trait SlicePredictor {
    fn predict(&self, window: &WindowResult) -> f32;
}

impl<F> SlicePredictor for F
where
    F: Fn(&WindowResult) -> f32,
{
    fn predict(&self, window: &WindowResult) -> f32 {
        self(window)
    }
}

/// File-level danger statistics predicted from a summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilePrediction {
    pub danger_max: f32,
    pub danger_mean: f32,
    pub danger_std: f32,
}

/// Scores one file summary
pub trait FilePredictor {
    fn predict(&self, summary: &FileSummary) -> FilePrediction;
}

/// Predictor that echoes the heuristic danger
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl SlicePredictor for HeuristicPredictor {
    fn predict(&self, window: &WindowResult) -> f32 {
        window.danger
    }
}

impl FilePredictor for HeuristicPredictor {
    fn predict(&self, summary: &FileSummary) -> FilePrediction {
        FilePrediction {
            danger_max: summary.danger_max,
            danger_mean: summary.danger_mean,
            danger_std: summary.danger_std,
        }
    }
}

/// Coarse risk category of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify from average and maximum predicted danger
    pub fn from_scores(average: f32, max: f32) -> Self {
        if max >= 80.0 || average >= 70.0 {
            RiskLevel::Critical
        } else if max >= 60.0 || average >= 50.0 {
            RiskLevel::High
        } else if max >= 40.0 || average >= 30.0 {
            RiskLevel::Moderate
        } else if max >= 20.0 || average >= 15.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Danger report for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub title: String,
    /// Integer part of the mean window prediction
    pub percent: u32,
    pub predictions: Vec<f32>,
    pub average: f32,
    pub max: f32,
    pub min: f32,
    pub file_prediction: Option<FilePrediction>,
    pub window_count: usize,
    pub cry_count: usize,
    /// Distinct detected cry types in order of first appearance
    pub cry_types: Vec<CryType>,
    pub risk: RiskLevel,
}

impl PredictionReport {
    /// Build a report from window predictions and an optional file-level model
    ///
    /// # Errors
    /// `EmptyInput` when the analysis has no windows.
    pub fn build(
        analysis: &FileAnalysis,
        slice_predictor: &dyn SlicePredictor,
        file_predictor: Option<&dyn FilePredictor>,
    ) -> Result<Self, AnalysisError> {
        if analysis.windows.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let predictions: Vec<f32> = analysis
            .windows
            .iter()
            .map(|w| {
                let p = slice_predictor.predict(w);
                if p.is_finite() {
                    p
                } else {
                    0.0
                }
            })
            .collect();

        let average = predictions.iter().sum::<f32>() / predictions.len() as f32;
        let max = predictions.iter().fold(f32::NEG_INFINITY, |acc, &p| acc.max(p));
        let min = predictions.iter().fold(f32::INFINITY, |acc, &p| acc.min(p));

        let mut cry_types = Vec::new();
        for window in analysis.windows.iter().filter(|w| w.cry.detected) {
            if !cry_types.contains(&window.cry.cry_type) {
                cry_types.push(window.cry.cry_type);
            }
        }

        let report = Self {
            title: analysis.summary.title.clone(),
            percent: average.max(0.0).trunc() as u32,
            file_prediction: file_predictor.map(|p| p.predict(&analysis.summary)),
            window_count: analysis.windows.len(),
            cry_count: analysis.windows.iter().filter(|w| w.cry.detected).count(),
            cry_types,
            risk: RiskLevel::from_scores(average, max),
            predictions,
            average,
            max,
            min,
        };

        log::info!(
            "[Report] {}: percent={}, risk={}, windows={}",
            report.title,
            report.percent,
            report.risk,
            report.window_count
        );
        Ok(report)
    }
}
