// Audio input error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the numeric codes reported for input errors.
///
/// Error code range: 1001-1005
pub struct AudioErrorCodes;

impl AudioErrorCodes {
    /// Audio file does not exist
    pub const FILE_NOT_FOUND: i32 = 1001;

    /// Audio file exists but could not be decoded
    pub const DECODE_FAILED: i32 = 1002;

    /// Sample format or layout is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 1003;

    /// Sample rate is zero or otherwise unusable
    pub const INVALID_SAMPLE_RATE: i32 = 1004;

    /// Audio could not be written to disk
    pub const WRITE_FAILED: i32 = 1005;
}

/// Log an audio error with structured context
///
/// This function logs audio errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioInput, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio input errors
///
/// These errors cover reading, decoding and writing audio files. They are
/// reported to the caller as "no results for this file"; batch processing
/// continues with the next file.
///
/// Error code range: 1001-1005
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Audio file does not exist
    FileNotFound { path: String },

    /// Audio file could not be decoded
    DecodeFailed { reason: String },

    /// Unsupported sample format (bit depth, channel layout)
    UnsupportedFormat { details: String },

    /// Sample rate is unusable (zero)
    InvalidSampleRate { rate: u32 },

    /// Writing audio to disk failed
    WriteFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::FileNotFound { .. } => AudioErrorCodes::FILE_NOT_FOUND,
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::InvalidSampleRate { .. } => AudioErrorCodes::INVALID_SAMPLE_RATE,
            AudioError::WriteFailed { .. } => AudioErrorCodes::WRITE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::FileNotFound { path } => format!("Audio file not found: {}", path),
            AudioError::DecodeFailed { reason } => format!("Failed to decode audio: {}", reason),
            AudioError::UnsupportedFormat { details } => {
                format!("Unsupported audio format: {}", details)
            }
            AudioError::InvalidSampleRate { rate } => {
                format!("Sample rate must be greater than 0 (got {})", rate)
            }
            AudioError::WriteFailed { reason } => format!("Failed to write audio: {}", reason),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => AudioError::UnsupportedFormat {
                details: "unsupported WAV encoding".to_string(),
            },
            other => AudioError::DecodeFailed {
                reason: other.to_string(),
            },
        }
    }
}
