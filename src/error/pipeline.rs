// Per-request pipeline error types

use crate::error::{AudioError, ErrorCode};
use log::{error, warn};
use std::fmt;

/// Log a pipeline error with structured context
///
/// Decode and extraction failures are expected for bad uploads and log at
/// warn. Schema and label failures mean the loaded artifacts are skewed and
/// log at error.
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    match err {
        PipelineError::SchemaMismatch { .. } | PipelineError::UnknownLabel { .. } => error!(
            "Pipeline error in {}: code={}, component=EmotionPipeline, message={}",
            context,
            err.code(),
            err.message()
        ),
        _ => warn!(
            "Pipeline error in {}: code={}, component=EmotionPipeline, message={}",
            context,
            err.code(),
            err.message()
        ),
    }
}

/// Errors raised by a single prediction request.
///
/// Error code range: 3001-3006
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input could not be decoded into a waveform
    Decode(AudioError),

    /// Waveform produced an empty or non-finite feature vector
    FeatureExtraction { reason: String },

    /// Feature vector length disagrees with the loaded normalization parameters
    SchemaMismatch { expected: usize, found: usize },

    /// Classifier produced an unusable distribution
    Inference { reason: String },

    /// Arg-max class index has no entry in the label encoding
    UnknownLabel { index: usize, known: usize },

    /// Hosting deadline expired before the prediction finished
    Timeout { limit_ms: u64 },
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Decode(_) => 3001,
            PipelineError::FeatureExtraction { .. } => 3002,
            PipelineError::SchemaMismatch { .. } => 3003,
            PipelineError::Inference { .. } => 3004,
            PipelineError::UnknownLabel { .. } => 3005,
            PipelineError::Timeout { .. } => 3006,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Decode(inner) => format!("Decode failed: {}", inner.message()),
            PipelineError::FeatureExtraction { reason } => {
                format!("Feature extraction failed: {}", reason)
            }
            PipelineError::SchemaMismatch { expected, found } => format!(
                "Feature vector has {} dimensions but normalizer expects {}",
                found, expected
            ),
            PipelineError::Inference { reason } => format!("Inference failed: {}", reason),
            PipelineError::UnknownLabel { index, known } => format!(
                "Predicted class {} has no label ({} labels loaded)",
                index, known
            ),
            PipelineError::Timeout { limit_ms } => {
                format!("Prediction exceeded deadline of {} ms", limit_ms)
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PipelineError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Decode(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<AudioError> for PipelineError {
    fn from(err: AudioError) -> Self {
        PipelineError::Decode(err)
    }
}
