// Artifact loading error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log an artifact error with structured context
///
/// Artifact errors are only raised at startup, so they are always logged at
/// error level before the caller refuses to build the pipeline.
pub fn log_artifact_error(err: &ArtifactError, context: &str) {
    error!(
        "Artifact error in {}: code={}, component=ArtifactLoader, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or cross-checking trained artifacts.
///
/// Error code range: 2001-2005
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactError {
    /// Artifact file could not be read
    Io { path: String, reason: String },

    /// Artifact file is not valid JSON for its schema
    Parse { path: String, reason: String },

    /// Two artifacts (or an artifact and the extractor) disagree on a dimension
    SchemaMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// ONNX Runtime rejects the model, or its tensor shapes cannot carry one
    /// feature vector and one class distribution
    InvalidModel { reason: String },

    /// Configuration, scaler or label values are unusable
    InvalidParameters { reason: String },
}

impl ErrorCode for ArtifactError {
    fn code(&self) -> i32 {
        match self {
            ArtifactError::Io { .. } => 2001,
            ArtifactError::Parse { .. } => 2002,
            ArtifactError::SchemaMismatch { .. } => 2003,
            ArtifactError::InvalidModel { .. } => 2004,
            ArtifactError::InvalidParameters { .. } => 2005,
        }
    }

    fn message(&self) -> String {
        match self {
            ArtifactError::Io { path, reason } => {
                format!("Cannot read artifact {}: {}", path, reason)
            }
            ArtifactError::Parse { path, reason } => {
                format!("Cannot parse artifact {}: {}", path, reason)
            }
            ArtifactError::SchemaMismatch {
                what,
                expected,
                found,
            } => format!(
                "Schema mismatch for {}: expected {}, found {}",
                what, expected, found
            ),
            ArtifactError::InvalidModel { reason } => format!("Invalid model: {}", reason),
            ArtifactError::InvalidParameters { reason } => {
                format!("Invalid parameters: {}", reason)
            }
        }
    }
}

impl fmt::Display for ArtifactError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for ArtifactError {}
