// Error types for the acoustic danger analyzer
//
// This module defines custom error types for audio input and window analysis,
// providing structured error handling with stable numeric error codes that
// downstream collaborators (CLI, services) can report verbatim.

mod analysis;
mod audio;

pub use analysis::{log_analysis_error, AnalysisError, AnalysisErrorCodes};
pub use audio::{log_audio_error, AudioError, AudioErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the crate boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
