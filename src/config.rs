//! Configuration management for analysis parameter tuning
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling fast iteration without recompilation. Window geometry, cry
//! detection thresholds and source-count heuristics can be adjusted via the
//! config file for rapid experimentation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cry: CryDetectionConfig,
    #[serde(default)]
    pub sources: SourceCountConfig,
}

/// Lifetime of a [`crate::analysis::danger::DangerScorer`] history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryScope {
    /// Fresh history for every file
    #[default]
    PerFile,
    /// One history carried across every file of a session
    Session,
}

/// Windowing and feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pipeline sample rate in Hz; inputs are resampled to it
    pub sample_rate: u32,
    /// Window duration in seconds
    pub window_seconds: u32,
    /// Number of cepstral coefficients kept per frame
    pub n_mfcc: usize,
    /// STFT frame length for feature extraction
    pub n_fft: usize,
    /// STFT hop between frames
    pub hop_length: usize,
    /// Mel bands feeding the cepstral and PCEN statistics
    pub n_mels: usize,
    /// Whether danger history is reset between files
    pub history_scope: HistoryScope,
}

impl AnalysisConfig {
    /// Number of samples in one window
    pub fn samples_per_window(&self) -> usize {
        self.sample_rate as usize * self.window_seconds as usize
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            window_seconds: 5,
            n_mfcc: 13,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            history_scope: HistoryScope::PerFile,
        }
    }
}

/// Cry detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryDetectionConfig {
    /// Lower edge of the cry band in Hz
    pub band_min_hz: f32,
    /// Upper edge of the cry band in Hz
    pub band_max_hz: f32,
    /// Fixed floor of the adaptive threshold
    pub power_threshold: f32,
    /// Minimum accepted event duration in seconds
    pub min_duration_s: f32,
    /// Spectrogram segment length in samples
    pub segment_len: usize,
    /// Gaussian smoothing sigma in frames
    pub smoothing_sigma: f32,
    /// Minimum distance between candidate peaks in frames
    pub min_peak_distance: usize,
    /// Percentile of the smoothed ratio used as adaptive threshold
    pub threshold_percentile: f32,
    /// Centroid above which a cry is classified as a baby
    pub baby_centroid_hz: f32,
    /// Centroid above which a cry is classified as a child
    pub child_centroid_hz: f32,
}

impl Default for CryDetectionConfig {
    fn default() -> Self {
        Self {
            band_min_hz: 1500.0,
            band_max_hz: 6000.0,
            power_threshold: 0.3,
            min_duration_s: 0.3,
            segment_len: 1024,
            smoothing_sigma: 2.0,
            min_peak_distance: 5,
            threshold_percentile: 90.0,
            baby_centroid_hz: 2500.0,
            child_centroid_hz: 2000.0,
        }
    }
}

/// Concurrent source estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceCountConfig {
    /// Number of NMF components (also the maximum source count)
    pub n_components: usize,
    /// Relative peak activation a component needs to count as a source
    pub activation_threshold: f32,
    /// Multiplicative update iterations
    pub nmf_iterations: usize,
    /// Time-domain std-dev below which the fallback reports one source
    pub quiet_std_threshold: f32,
}

impl Default for SourceCountConfig {
    fn default() -> Self {
        Self {
            n_components: 3,
            activation_threshold: 0.1,
            nmf_iterations: 50,
            quiet_std_threshold: 0.05,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or defaults if the file doesn't exist or the
    /// JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/danger_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.analysis.sample_rate, 44_100);
        assert_eq!(config.analysis.window_seconds, 5);
        assert_eq!(config.analysis.n_mfcc, 13);
        assert_eq!(config.analysis.samples_per_window(), 220_500);
        assert_eq!(config.analysis.history_scope, HistoryScope::PerFile);
        assert_eq!(config.cry.band_min_hz, 1500.0);
        assert_eq!(config.cry.band_max_hz, 6000.0);
        assert_eq!(config.cry.power_threshold, 0.3);
        assert_eq!(config.cry.min_duration_s, 0.3);
        assert_eq!(config.sources.n_components, 3);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "analysis": { "window_seconds": 2, "history_scope": "session" } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.analysis.window_seconds, 2);
        assert_eq!(parsed.analysis.sample_rate, 44_100);
        assert_eq!(parsed.analysis.history_scope, HistoryScope::Session);
        assert_eq!(parsed.cry, CryDetectionConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/danger_config.json");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_bundled_asset_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/danger_config.json");
        let contents = fs::read_to_string(path).expect("bundled config");
        let parsed: AppConfig = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }
}
