// Window analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Error code range: 2001-2004
pub struct AnalysisErrorCodes;

impl AnalysisErrorCodes {
    /// Window does not have the configured sample count
    pub const INVALID_WINDOW_LENGTH: i32 = 2001;

    /// Signal carries no usable energy for the requested computation
    pub const DEGENERATE_SIGNAL: i32 = 2002;

    /// Spectral decomposition did not produce a usable factorization
    pub const DECOMPOSITION_FAILED: i32 = 2003;

    /// Operation needs at least one analyzed window
    pub const EMPTY_INPUT: i32 = 2004;
}

/// Log an analysis error with structured context
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=AudioAnalyzer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Analysis-related errors
///
/// None of these are fatal to a file: a failing window is dropped and the
/// remaining windows are still processed.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Window length differs from `sample_rate * window_seconds`
    InvalidWindowLength { expected: usize, actual: usize },

    /// Signal is silent or otherwise carries no information
    DegenerateSignal { reason: String },

    /// Non-negative factorization failed
    DecompositionFailed { reason: String },

    /// No windows available
    EmptyInput,
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InvalidWindowLength { .. } => AnalysisErrorCodes::INVALID_WINDOW_LENGTH,
            AnalysisError::DegenerateSignal { .. } => AnalysisErrorCodes::DEGENERATE_SIGNAL,
            AnalysisError::DecompositionFailed { .. } => AnalysisErrorCodes::DECOMPOSITION_FAILED,
            AnalysisError::EmptyInput => AnalysisErrorCodes::EMPTY_INPUT,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InvalidWindowLength { expected, actual } => {
                format!(
                    "Invalid window length: need {} samples, got {}",
                    expected, actual
                )
            }
            AnalysisError::DegenerateSignal { reason } => {
                format!("Degenerate signal: {}", reason)
            }
            AnalysisError::DecompositionFailed { reason } => {
                format!("Decomposition failed: {}", reason)
            }
            AnalysisError::EmptyInput => "No analyzed windows available".to_string(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
