// Audio decoding error types

use crate::error::ErrorCode;
use std::fmt;

/// Errors raised while turning an input file into a mono waveform.
///
/// Error code range: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The file could not be opened or read
    Unreadable { path: String, reason: String },

    /// The container decoded but holds no samples
    Empty,

    /// The container or sample encoding is not supported
    UnsupportedFormat { details: String },

    /// Sample rate of zero or an unusable target rate
    InvalidSampleRate { rate: u32 },

    /// Resampling to the pipeline rate failed
    Resample { reason: String },

    /// Sample data was truncated or corrupt mid-stream
    Decode { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::Unreadable { .. } => 1001,
            AudioError::Empty => 1002,
            AudioError::UnsupportedFormat { .. } => 1003,
            AudioError::InvalidSampleRate { .. } => 1004,
            AudioError::Resample { .. } => 1005,
            AudioError::Decode { .. } => 1006,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::Unreadable { path, reason } => {
                format!("Cannot read audio file {}: {}", path, reason)
            }
            AudioError::Empty => "Audio file contains no samples".to_string(),
            AudioError::UnsupportedFormat { details } => {
                format!("Unsupported audio format: {}", details)
            }
            AudioError::InvalidSampleRate { rate } => {
                format!("Invalid sample rate: {} Hz", rate)
            }
            AudioError::Resample { reason } => format!("Resampling failed: {}", reason),
            AudioError::Decode { reason } => format!("Corrupt audio data: {}", reason),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

/// hound reports both I/O and format problems through one error type; sort
/// them into the matching decode kinds.
impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => AudioError::Decode {
                reason: io.to_string(),
            },
            hound::Error::FormatError(details) => AudioError::UnsupportedFormat {
                details: details.to_string(),
            },
            hound::Error::Unsupported => AudioError::UnsupportedFormat {
                details: "unsupported WAV feature".to_string(),
            },
            other => AudioError::Decode {
                reason: other.to_string(),
            },
        }
    }
}
