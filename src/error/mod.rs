// Error types for the emotion inference pipeline
//
// This module defines the structured error kinds raised by the waveform
// loader, the artifact loader and the per-request pipeline stages. Every kind
// carries a numeric code so callers and logs can classify failures without
// matching on message text.

mod artifact;
mod audio;
mod pipeline;

pub use artifact::{log_artifact_error, ArtifactError};
pub use audio::AudioError;
pub use pipeline::{log_pipeline_error, PipelineError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the pipeline boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
