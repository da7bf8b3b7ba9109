// Analysis module - window pipeline for acoustic danger scoring
//
// This module orchestrates the complete analysis pipeline for recorded
// audio, turning decoded signals into per-window results and per-file
// summaries.
//
// Architecture:
// - AudioAnalyzer: owns the extractors and the session's DangerScorer
// - Pipeline: Windowing → FeatureExtractor + CryDetector + source count →
//   DangerScorer → FileAggregator
// - Output: FileAnalysis (ordered WindowResults + FileSummary)
//
// Windows of one file are scored strictly in order because the scorer keeps
// a short history. Files are processed one after another; with the default
// per-file history scope the scorer is reset before each file.

pub mod cry;
pub mod danger;
pub mod envelope;
pub mod features;
pub mod sources;
pub mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::AudioSignal;
use crate::config::{AppConfig, HistoryScope};
use crate::error::{log_analysis_error, log_audio_error, AnalysisError, AudioError};
use cry::CryDetector;
use danger::DangerScorer;
use features::FeatureExtractor;
use sources::DefaultSourceEstimator;
use summary::{FileAggregator, FileAnalysis, WindowResult};

/// Outcome of one file in a directory run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    /// `None` when the file could not be read
    pub analysis: Option<FileAnalysis>,
    pub error: Option<String>,
}

/// End-to-end analyzer for recorded audio
pub struct AudioAnalyzer {
    config: AppConfig,
    extractor: FeatureExtractor,
    cry_detector: CryDetector,
    source_estimator: DefaultSourceEstimator,
    scorer: DangerScorer,
}

impl AudioAnalyzer {
    pub fn new(config: AppConfig) -> Self {
        let analysis = &config.analysis;
        tracing::info!(
            "[AudioAnalyzer] Initialized: sample_rate={} Hz, window={} s, history_scope={:?}",
            analysis.sample_rate,
            analysis.window_seconds,
            analysis.history_scope
        );

        Self {
            extractor: FeatureExtractor::new(analysis),
            cry_detector: CryDetector::new(&config.cry, analysis.sample_rate),
            source_estimator: DefaultSourceEstimator::from_config(
                &config.sources,
                analysis.n_fft,
                analysis.hop_length,
            ),
            scorer: DangerScorer::new(),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scorer(&self) -> &DangerScorer {
        &self.scorer
    }

    /// Clear the danger history carried between windows
    pub fn reset_history(&mut self) {
        self.scorer.reset();
    }

    /// Analyze one window and score it against the current history
    ///
    /// # Errors
    /// `InvalidWindowLength` when the window does not hold exactly one
    /// window's worth of samples. The history is left untouched in that case.
    pub fn analyze_window(
        &mut self,
        window: &[f32],
        title: &str,
        index: usize,
    ) -> Result<WindowResult, AnalysisError> {
        let expected = self.config.analysis.samples_per_window();
        if window.len() != expected || expected == 0 {
            return Err(AnalysisError::InvalidWindowLength {
                expected,
                actual: window.len(),
            });
        }

        let features = self.extractor.extract(window);
        let normalized = FeatureExtractor::normalize(window);
        let cry = self.cry_detector.detect(&normalized, features.centroid_mean);
        let source_count = self.source_estimator.count(&normalized);
        let danger = self.scorer.score(&features, &cry, source_count);

        tracing::debug!(
            "[AudioAnalyzer] {} window {}: danger={:.1}, sources={}, cry={}",
            title,
            index,
            danger,
            source_count,
            cry.cry_type
        );

        Ok(WindowResult {
            title: title.to_string(),
            index,
            features,
            source_count,
            cry,
            danger,
            moy_danger: 0.0,
        })
    }

    /// Analyze every complete window of a signal
    ///
    /// The signal is resampled to the pipeline rate first. Windows that fail
    /// are logged and dropped; the rest of the file is still processed.
    pub fn analyze_signal(
        &mut self,
        signal: AudioSignal,
        title: &str,
    ) -> Result<FileAnalysis, AudioError> {
        let signal = signal.resampled(self.config.analysis.sample_rate)?;

        if self.config.analysis.history_scope == HistoryScope::PerFile {
            self.scorer.reset();
        }

        let window_len = self.config.analysis.samples_per_window();
        let mut aggregator = FileAggregator::new(title);
        for (i, window) in signal.windows(window_len).enumerate() {
            match self.analyze_window(window, title, i + 1) {
                Ok(result) => aggregator.push(result),
                Err(err) => log_analysis_error(&err, title),
            }
        }

        let analysis = aggregator.finish();
        tracing::info!(
            "[AudioAnalyzer] {}: {} windows, moy_danger={:.1}, cries={}",
            title,
            analysis.summary.window_count,
            analysis.summary.moy_danger,
            analysis.summary.cry_count
        );
        Ok(analysis)
    }

    /// Decode a WAV file and analyze it
    pub fn analyze_file(&mut self, path: &Path) -> Result<FileAnalysis, AudioError> {
        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let signal = AudioSignal::load_wav(path)?;
        self.analyze_signal(signal, &title)
    }

    /// Analyze every `.wav` file in a directory, in file name order
    ///
    /// Files that cannot be read yield an entry without analysis; the
    /// remaining files are still processed.
    pub fn analyze_directory(&mut self, dir: &Path) -> Result<Vec<DirectoryEntry>, AudioError> {
        if !dir.is_dir() {
            return Err(AudioError::FileNotFound {
                path: dir.display().to_string(),
            });
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_wav(path))
            .collect();
        paths.sort();

        tracing::info!(
            "[AudioAnalyzer] Analyzing {} files in {}",
            paths.len(),
            dir.display()
        );

        Ok(paths
            .into_iter()
            .map(|path| match self.analyze_file(&path) {
                Ok(analysis) => DirectoryEntry {
                    path,
                    analysis: Some(analysis),
                    error: None,
                },
                Err(err) => {
                    log_audio_error(&err, &path.display().to_string());
                    DirectoryEntry {
                        path,
                        analysis: None,
                        error: Some(err.to_string()),
                    }
                }
            })
            .collect())
    }
}

fn is_wav(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("wav"))
}
