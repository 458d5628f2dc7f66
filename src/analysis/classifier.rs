// Classifier - pre-trained ONNX network over normalized features
//
// The model is exported from the training notebook as a single-input,
// single-output ONNX graph. Its input is a `(batch, len, 1)` float tensor and
// its output a `(batch, classes)` probability distribution. Both dimensions
// are read from the session metadata at load, so a model that cannot accept
// one feature vector fails at startup instead of on the first request.
//
// `Session::run` needs `&mut`, so the session sits behind a mutex and the
// classifier can still be shared across threads (`Arc<EmotionClassifier>`).

use std::fmt;
use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, IxDyn};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{ArtifactError, PipelineError};

/// Tolerance on the sum of the output distribution
const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// EmotionClassifier runs one ONNX session with validated tensor shapes
pub struct EmotionClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Input tensor shape for a batch of one, e.g. `[1, 182, 1]`
    input_shape: Vec<usize>,
    input_len: usize,
    output_len: usize,
}

impl EmotionClassifier {
    /// Load an ONNX model file
    ///
    /// # Errors
    /// * `Io` - the file does not exist
    /// * `InvalidModel` - ONNX Runtime rejects the graph, or its input/output
    ///   shapes cannot carry one feature vector and one distribution
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::Io {
                path: path.display().to_string(),
                reason: "model file not found".to_string(),
            });
        }

        let session = Session::builder()
            .map_err(|e| invalid_model(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| invalid_model(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| invalid_model(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| invalid_model(format!("{}: {}", path.display(), e)))?;

        Self::from_session(session)
    }

    /// Load an ONNX model already held in memory
    pub fn from_memory(model: &[u8]) -> Result<Self, ArtifactError> {
        let session = Session::builder()
            .map_err(|e| invalid_model(e.to_string()))?
            .with_intra_threads(1)
            .map_err(|e| invalid_model(e.to_string()))?
            .commit_from_memory(model)
            .map_err(|e| invalid_model(e.to_string()))?;

        Self::from_session(session)
    }

    fn from_session(session: Session) -> Result<Self, ArtifactError> {
        if session.inputs().len() != 1 || session.outputs().is_empty() {
            return Err(invalid_model(format!(
                "expected one input and at least one output, found {} and {}",
                session.inputs().len(),
                session.outputs().len()
            )));
        }

        let input = &session.inputs()[0];
        let input_dims =
            tensor_dims(input.name(), input.dtype().tensor_shape().map(|s| &s[..]))?;
        let output = &session.outputs()[0];
        let output_dims =
            tensor_dims(output.name(), output.dtype().tensor_shape().map(|s| &s[..]))?;

        let input_shape: Vec<usize> =
            std::iter::once(1).chain(input_dims.iter().copied()).collect();
        let input_len = input_dims.iter().product();
        let output_len = output_dims.iter().product();

        log::debug!(
            "[EmotionClassifier] input '{}' {:?}, output '{}' {:?}",
            input.name(),
            input_shape,
            output.name(),
            output_dims
        );

        Ok(Self {
            input_name: input.name().to_string(),
            output_name: output.name().to_string(),
            input_shape,
            input_len,
            output_len,
            session: Mutex::new(session),
        })
    }

    /// Length of the normalized vector the network accepts
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Number of classes in the output distribution
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Tensor shape fed to the session for one feature vector
    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    /// Run the network on one normalized feature vector
    ///
    /// # Returns
    /// Probability distribution over `output_len` classes (non-negative, sums to 1)
    ///
    /// # Errors
    /// * `SchemaMismatch` - `normalized` does not have `input_len` entries
    /// * `Inference` - the session fails, or its output is not a finite
    ///   probability distribution of `output_len` classes
    pub fn predict(&self, normalized: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if normalized.len() != self.input_len {
            return Err(PipelineError::SchemaMismatch {
                expected: self.input_len,
                found: normalized.len(),
            });
        }

        let array = ArrayD::from_shape_vec(IxDyn(&self.input_shape), normalized.to_vec())
            .map_err(|e| inference(format!("input tensor: {}", e)))?;
        let input_tensor =
            Tensor::from_array(array).map_err(|e| inference(format!("input tensor: {}", e)))?;

        let output = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| inference("session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| inference(e.to_string()))?;
            let (_, value) = outputs
                .iter()
                .next()
                .ok_or_else(|| inference("no output tensor".to_string()))?;
            let (_shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| inference(format!("output tensor: {}", e)))?;
            data.to_vec()
        };

        if output.len() != self.output_len {
            return Err(inference(format!(
                "expected {} class probabilities, got {}",
                self.output_len,
                output.len()
            )));
        }
        if let Some(idx) = output.iter().position(|p| !p.is_finite() || *p < 0.0) {
            return Err(inference(format!(
                "class {} probability is {}",
                idx, output[idx]
            )));
        }
        let total: f32 = output.iter().sum();
        if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(inference(format!("probabilities sum to {}", total)));
        }

        Ok(output)
    }
}

impl fmt::Debug for EmotionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmotionClassifier")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_shape", &self.input_shape)
            .field("output_len", &self.output_len)
            .finish_non_exhaustive()
    }
}

/// Non-batch dimensions of a tensor outlet
///
/// The leading dimension is the batch axis and may be dynamic; every other
/// dimension must be fixed and positive.
fn tensor_dims(name: &str, shape: Option<&[i64]>) -> Result<Vec<usize>, ArtifactError> {
    let shape = shape.ok_or_else(|| invalid_model(format!("'{}' is not a tensor", name)))?;
    if shape.len() < 2 {
        return Err(invalid_model(format!(
            "'{}' has rank {}, expected a batch axis plus data axes",
            name,
            shape.len()
        )));
    }
    shape[1..]
        .iter()
        .map(|&dim| {
            usize::try_from(dim)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| {
                    invalid_model(format!("'{}' has unsupported shape {:?}", name, shape))
                })
        })
        .collect()
}

fn invalid_model(reason: String) -> ArtifactError {
    ArtifactError::InvalidModel { reason }
}

fn inference(reason: String) -> PipelineError {
    PipelineError::Inference { reason }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
