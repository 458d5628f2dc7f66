// Emotion Pipeline - speech emotion inference from WAV clips
// Waveform → features → normalization → classifier → (emotion, confidence)

pub mod analysis;
pub mod artifacts;
pub mod audio;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod pipeline;
pub mod testing;

pub use config::PipelineConfig;
pub use pipeline::{predict_with_timeout, EmotionPipeline, FailureReason, PredictionResult};
