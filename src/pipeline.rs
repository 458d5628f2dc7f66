// Pipeline - request orchestration from audio input to (emotion, confidence)
//
// Stages run in a fixed order: load → extract → normalize → classify →
// resolve. The first failing stage short-circuits the rest and the request
// ends as `PredictionResult::Failure`; typed stage errors never cross this
// boundary.
//
// The pipeline owns its extractor and artifacts, never mutates them, and keeps
// every per-request buffer local to the call, so one `Arc<EmotionPipeline>`
// can serve concurrent requests. The only lock is the classifier's session,
// held for one model run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::analysis::{FeatureExtractor, LabelScore};
use crate::artifacts::ArtifactBundle;
use crate::audio::{load_waveform, load_waveform_from_reader, Waveform};
use crate::config::PipelineConfig;
use crate::error::{
    log_artifact_error, log_pipeline_error, ArtifactError, AudioError, ErrorCode, PipelineError,
};

/// Message shown to end users for any failed prediction
pub const FAILURE_DISPLAY_MESSAGE: &str = "Error in processing the audio file.";

/// Failure category reported across the pipeline boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Decode,
    FeatureExtraction,
    SchemaMismatch,
    Inference,
    UnknownLabel,
    Timeout,
}

impl From<&PipelineError> for FailureReason {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::Decode(_) => FailureReason::Decode,
            PipelineError::FeatureExtraction { .. } => FailureReason::FeatureExtraction,
            PipelineError::SchemaMismatch { .. } => FailureReason::SchemaMismatch,
            PipelineError::Inference { .. } => FailureReason::Inference,
            PipelineError::UnknownLabel { .. } => FailureReason::UnknownLabel,
            PipelineError::Timeout { .. } => FailureReason::Timeout,
        }
    }
}

/// Outcome of one prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    Success {
        emotion: String,
        /// Arg-max probability as a percentage in [0, 100]
        confidence: f32,
        /// Every class, most probable first; only filled by detailed predictions
        #[serde(skip_serializing_if = "Option::is_none")]
        distribution: Option<Vec<LabelScore>>,
    },
    Failure {
        reason: FailureReason,
        code: i32,
        /// Diagnostic text for logs, not for display
        message: String,
    },
}

impl PredictionResult {
    /// Failure outcome for a stage error
    pub fn from_error(err: &PipelineError) -> Self {
        PredictionResult::Failure {
            reason: FailureReason::from(err),
            code: err.code(),
            message: err.message(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success { .. })
    }

    pub fn emotion(&self) -> Option<&str> {
        match self {
            PredictionResult::Success { emotion, .. } => Some(emotion),
            PredictionResult::Failure { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            PredictionResult::Success { confidence, .. } => Some(*confidence),
            PredictionResult::Failure { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            PredictionResult::Success { .. } => None,
            PredictionResult::Failure { reason, .. } => Some(*reason),
        }
    }

    /// `(label, Some(confidence))` on success, `(generic message, None)` on failure
    pub fn display_pair(&self) -> (String, Option<f32>) {
        match self {
            PredictionResult::Success {
                emotion,
                confidence,
                ..
            } => (emotion.clone(), Some(*confidence)),
            PredictionResult::Failure { .. } => (FAILURE_DISPLAY_MESSAGE.to_string(), None),
        }
    }
}

/// EmotionPipeline sequences the stages over shared read-only state
pub struct EmotionPipeline {
    extractor: FeatureExtractor,
    artifacts: ArtifactBundle,
}

impl EmotionPipeline {
    /// Assemble a pipeline, refusing artifacts that disagree with the extractor
    ///
    /// # Errors
    /// `SchemaMismatch` if the scaler, model and labels do not match the
    /// extractor's output length and each other
    pub fn new(
        extractor: FeatureExtractor,
        artifacts: ArtifactBundle,
    ) -> Result<Self, ArtifactError> {
        if let Err(err) = artifacts.validate_against(extractor.output_len()) {
            log_artifact_error(&err, "EmotionPipeline::new");
            return Err(err);
        }

        tracing::info!(
            "[EmotionPipeline] Ready: {} Hz, {} features, {} classes",
            extractor.sample_rate(),
            extractor.output_len(),
            artifacts.labels.len()
        );

        Ok(Self {
            extractor,
            artifacts,
        })
    }

    /// Build the extractor and load artifacts as described by `config`
    ///
    /// Relative artifact paths resolve against `base_dir`.
    pub fn from_config(config: &PipelineConfig, base_dir: &Path) -> Result<Self, ArtifactError> {
        let extractor = FeatureExtractor::new(config.audio.sample_rate, &config.features)
            .inspect_err(|err| log_artifact_error(err, "EmotionPipeline::from_config"))?;
        let paths = config.artifacts.relative_to(base_dir);
        let artifacts = ArtifactBundle::load(&paths)
            .inspect_err(|err| log_artifact_error(err, "EmotionPipeline::from_config"))?;
        Self::new(extractor, artifacts)
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn artifacts(&self) -> &ArtifactBundle {
        &self.artifacts
    }

    /// Predict the emotion of a WAV file
    pub fn predict<P: AsRef<Path>>(&self, path: P) -> PredictionResult {
        let path = path.as_ref();
        self.run(
            || load_waveform(path, self.extractor.sample_rate()),
            false,
            &path.display().to_string(),
        )
    }

    /// Predict the emotion of in-memory WAV bytes
    pub fn predict_bytes(&self, bytes: &[u8]) -> PredictionResult {
        self.run(
            || {
                if bytes.is_empty() {
                    return Err(AudioError::Empty);
                }
                load_waveform_from_reader(bytes, self.extractor.sample_rate())
            },
            false,
            "<bytes>",
        )
    }

    /// Like [`EmotionPipeline::predict`], also reporting the ranked distribution
    pub fn predict_detailed<P: AsRef<Path>>(&self, path: P) -> PredictionResult {
        let path = path.as_ref();
        self.run(
            || load_waveform(path, self.extractor.sample_rate()),
            true,
            &path.display().to_string(),
        )
    }

    /// Predict from an already-decoded waveform
    pub fn predict_waveform(&self, waveform: &Waveform) -> PredictionResult {
        match self.infer(waveform, false) {
            Ok(result) => result,
            Err(err) => {
                log_pipeline_error(&err, "<waveform>");
                PredictionResult::from_error(&err)
            }
        }
    }

    fn run<F>(&self, load: F, detailed: bool, source: &str) -> PredictionResult
    where
        F: FnOnce() -> Result<Waveform, AudioError>,
    {
        let started = Instant::now();
        let outcome = load()
            .map_err(PipelineError::from)
            .and_then(|waveform| {
                tracing::debug!(
                    "[EmotionPipeline] Loaded {} ({:.2}s) in {:?}",
                    source,
                    waveform.duration_secs(),
                    started.elapsed()
                );
                self.infer(&waveform, detailed)
            });

        match outcome {
            Ok(result) => {
                if let PredictionResult::Success {
                    emotion,
                    confidence,
                    ..
                } = &result
                {
                    tracing::info!(
                        "[EmotionPipeline] {} -> {} ({:.1}%) in {:?}",
                        source,
                        emotion,
                        confidence,
                        started.elapsed()
                    );
                }
                result
            }
            Err(err) => {
                log_pipeline_error(&err, source);
                PredictionResult::from_error(&err)
            }
        }
    }

    /// Stages 2-5 on a decoded waveform
    fn infer(
        &self,
        waveform: &Waveform,
        detailed: bool,
    ) -> Result<PredictionResult, PipelineError> {
        let stage = Instant::now();
        let features = self.extractor.extract(waveform)?;
        tracing::debug!("[EmotionPipeline] Extracted features in {:?}", stage.elapsed());

        let normalized = self.artifacts.normalizer.transform(&features)?;

        let stage = Instant::now();
        let probabilities = self.artifacts.classifier.predict(&normalized)?;
        tracing::debug!("[EmotionPipeline] Classified in {:?}", stage.elapsed());

        let top = self.artifacts.labels.resolve(&probabilities)?;

        Ok(PredictionResult::Success {
            emotion: top.label,
            confidence: top.confidence,
            distribution: detailed.then(|| self.artifacts.labels.ranked(&probabilities)),
        })
    }
}

/// Run [`EmotionPipeline::predict`] on a blocking worker under a deadline
///
/// Expiry yields `Failure(Timeout)`. The worker is not interrupted; it
/// finishes in the background and its result is dropped.
pub async fn predict_with_timeout(
    pipeline: Arc<EmotionPipeline>,
    path: PathBuf,
    limit: Duration,
) -> PredictionResult {
    let task = tokio::task::spawn_blocking(move || pipeline.predict(&path));

    let err = match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => return result,
        Ok(Err(join_err)) => PipelineError::Inference {
            reason: format!("prediction worker failed: {}", join_err),
        },
        Err(_) => PipelineError::Timeout {
            limit_ms: limit.as_millis() as u64,
        },
    };
    log_pipeline_error(&err, "predict_with_timeout");
    PredictionResult::from_error(&err)
}
