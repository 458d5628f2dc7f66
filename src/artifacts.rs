// Artifacts - startup loading of the trained scaler, model and labels
//
// The three artifacts are fit together at training time. They are loaded once,
// validated individually, then cross-checked against each other and against
// the feature extractor so skew between them is caught before the first
// request instead of surfacing as wrong predictions.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::analysis::{
    EmotionClassifier, FeatureNormalizer, LabelEncoding, NormalizationParameters,
};
use crate::config::ArtifactPaths;
use crate::error::ArtifactError;

/// Validated scaler, classifier and label encoding
#[derive(Debug)]
pub struct ArtifactBundle {
    pub normalizer: FeatureNormalizer,
    pub classifier: EmotionClassifier,
    pub labels: LabelEncoding,
}

impl ArtifactBundle {
    /// Build a bundle from parsed parts and in-memory ONNX model bytes
    pub fn from_parts(
        scaler: NormalizationParameters,
        model: &[u8],
        labels: LabelEncoding,
    ) -> Result<Self, ArtifactError> {
        Ok(Self {
            normalizer: FeatureNormalizer::new(scaler)?,
            classifier: EmotionClassifier::from_memory(model)?,
            labels,
        })
    }

    /// Read and validate all three artifacts
    ///
    /// # Errors
    /// * `Io` / `Parse` - a file is missing or a JSON artifact does not match its schema
    /// * `InvalidModel` - ONNX Runtime cannot load the model or its shapes are unusable
    /// * `InvalidParameters` - the scaler or labels fail their own checks
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let scaler: NormalizationParameters = read_json(&paths.scaler)?;
        let labels: LabelEncoding = read_json(&paths.labels)?;

        let bundle = Self {
            normalizer: FeatureNormalizer::new(scaler)?,
            classifier: EmotionClassifier::from_file(&paths.model)?,
            labels,
        };
        log::info!(
            "[Artifacts] Loaded scaler ({} dims), model ({} {:?} -> {} classes), {} labels",
            bundle.normalizer.dimension(),
            bundle.classifier.input_name(),
            bundle.classifier.input_shape(),
            bundle.classifier.output_len(),
            bundle.labels.len()
        );
        Ok(bundle)
    }

    /// Cross-check artifact dimensions against each other and the extractor
    ///
    /// # Errors
    /// `SchemaMismatch` naming the first pair of dimensions that disagree
    pub fn validate_against(&self, feature_len: usize) -> Result<(), ArtifactError> {
        let checks = [
            (
                "scaler dimension vs feature vector length",
                feature_len,
                self.normalizer.dimension(),
            ),
            (
                "model input length vs feature vector length",
                feature_len,
                self.classifier.input_len(),
            ),
            (
                "model output classes vs label count",
                self.labels.len(),
                self.classifier.output_len(),
            ),
        ];

        for (what, expected, found) in checks {
            if expected != found {
                return Err(ArtifactError::SchemaMismatch {
                    what: what.to_string(),
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }
}

/// Read a JSON artifact into its schema type
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|err| ArtifactError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|err| ArtifactError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FeatureLayout;
    use crate::testing::artifacts::{synthetic_artifacts, write_artifacts};
    use crate::testing::onnx::linear_classifier;

    #[test]
    fn test_load_synthetic_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FeatureLayout::default();
        let set = synthetic_artifacts(layout).unwrap();
        let paths = write_artifacts(dir.path(), &set).unwrap();

        let bundle = ArtifactBundle::load(&paths).unwrap();
        assert_eq!(bundle.normalizer.dimension(), layout.len());
        assert_eq!(bundle.classifier.input_len(), layout.len());
        assert_eq!(bundle.labels.len(), bundle.classifier.output_len());
        bundle.validate_against(layout.len()).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::default().relative_to(dir.path());
        assert!(matches!(
            ArtifactBundle::load(&paths),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let set = synthetic_artifacts(FeatureLayout::default()).unwrap();
        let paths = write_artifacts(dir.path(), &set).unwrap();
        fs::write(&paths.labels, "{ \"classes\": [").unwrap();

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }), "Got {:?}", err);
    }

    #[test]
    fn test_corrupt_model_is_invalid_model() {
        let dir = tempfile::tempdir().unwrap();
        let set = synthetic_artifacts(FeatureLayout::default()).unwrap();
        let paths = write_artifacts(dir.path(), &set).unwrap();
        fs::write(&paths.model, b"not an onnx graph").unwrap();

        let err = ArtifactBundle::load(&paths).unwrap_err();
        assert!(
            matches!(err, ArtifactError::InvalidModel { .. }),
            "Got {:?}",
            err
        );
    }

    #[test]
    fn test_model_input_mismatch_detected() {
        let layout = FeatureLayout::default();
        let mut set = synthetic_artifacts(layout).unwrap();
        let wide = layout.len() + 2;
        set.model = linear_classifier(wide, &vec![0.0; wide * 2], &[0.0; 2], true).unwrap();
        let bundle = ArtifactBundle::from_parts(set.scaler, &set.model, set.labels).unwrap();

        assert_eq!(
            bundle.validate_against(layout.len()),
            Err(ArtifactError::SchemaMismatch {
                what: "model input length vs feature vector length".to_string(),
                expected: layout.len(),
                found: layout.len() + 2,
            })
        );
    }

    #[test]
    fn test_scaler_dimension_mismatch_detected() {
        let layout = FeatureLayout::default();
        let mut set = synthetic_artifacts(layout).unwrap();
        set.scaler.mean.pop();
        set.scaler.scale.pop();
        let bundle = ArtifactBundle::from_parts(set.scaler, &set.model, set.labels).unwrap();

        assert_eq!(
            bundle.validate_against(layout.len()),
            Err(ArtifactError::SchemaMismatch {
                what: "scaler dimension vs feature vector length".to_string(),
                expected: layout.len(),
                found: layout.len() - 1,
            })
        );
    }

    #[test]
    fn test_label_count_mismatch_detected() {
        let layout = FeatureLayout::default();
        let mut set = synthetic_artifacts(layout).unwrap();
        let mut classes = set.labels.classes().to_vec();
        classes.push("surprised".to_string());
        set.labels = LabelEncoding::new(classes).unwrap();
        let bundle = ArtifactBundle::from_parts(set.scaler, &set.model, set.labels).unwrap();

        let err = bundle.validate_against(layout.len()).unwrap_err();
        assert!(
            matches!(&err, ArtifactError::SchemaMismatch { what, .. } if what.contains("label")),
            "Got {:?}",
            err
        );
    }
}
