// Normalizer - pre-fit affine standardization of feature vectors
//
// Applies `(x - mean) / scale` per dimension with parameters fit at training
// time. Parameters are validated once at load and never change afterwards.

use serde::{Deserialize, Serialize};

use crate::analysis::features::FeatureVector;
use crate::error::{ArtifactError, PipelineError};

/// Per-dimension standardization parameters as exported by training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

/// Feature normalizer owning validated parameters
#[derive(Debug, Clone)]
pub struct FeatureNormalizer {
    params: NormalizationParameters,
}

impl FeatureNormalizer {
    /// Validate parameters and build a normalizer
    ///
    /// # Errors
    /// * `SchemaMismatch` - `mean` and `scale` have different lengths
    /// * `InvalidParameters` - empty parameters, non-finite values, or a zero scale
    pub fn new(params: NormalizationParameters) -> Result<Self, ArtifactError> {
        if params.mean.len() != params.scale.len() {
            return Err(ArtifactError::SchemaMismatch {
                what: "scaler scale length vs mean length".to_string(),
                expected: params.mean.len(),
                found: params.scale.len(),
            });
        }
        if params.mean.is_empty() {
            return Err(ArtifactError::InvalidParameters {
                reason: "scaler has no dimensions".to_string(),
            });
        }
        if let Some(idx) = params.mean.iter().position(|m| !m.is_finite()) {
            return Err(ArtifactError::InvalidParameters {
                reason: format!("scaler mean[{}] is not finite", idx),
            });
        }
        if let Some(idx) = params
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ArtifactError::InvalidParameters {
                reason: format!("scaler scale[{}] must be finite and non-zero", idx),
            });
        }

        Ok(Self { params })
    }

    /// Number of feature dimensions the parameters were fit on
    pub fn dimension(&self) -> usize {
        self.params.mean.len()
    }

    pub fn parameters(&self) -> &NormalizationParameters {
        &self.params
    }

    /// Standardize a feature vector
    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f32>, PipelineError> {
        self.transform_slice(features.as_slice())
    }

    /// Standardize raw feature values
    ///
    /// # Errors
    /// `SchemaMismatch` if `values` does not have exactly [`Self::dimension`] entries
    pub fn transform_slice(&self, values: &[f32]) -> Result<Vec<f32>, PipelineError> {
        if values.len() != self.dimension() {
            return Err(PipelineError::SchemaMismatch {
                expected: self.dimension(),
                found: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(&self.params.mean)
            .zip(&self.params.scale)
            .map(|((&x, &mean), &scale)| (x - mean) / scale)
            .collect())
    }
}
