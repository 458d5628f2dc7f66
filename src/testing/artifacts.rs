//! Synthetic artifact sets for tests and demos.
//!
//! The synthetic classifier keys on the zero-crossing rate alone: a clip whose
//! mean ZCR is above [`ZCR_DECISION_THRESHOLD`] is "happy", anything below is
//! "calm". A high tone (e.g. 5 kHz) therefore scores happy with high
//! confidence and a low tone or silence scores calm, which makes end-to-end
//! behaviour predictable without a trained model.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::{FeatureLayout, LabelEncoding, NormalizationParameters};
use crate::config::ArtifactPaths;
use crate::error::ArtifactError;
use crate::testing::onnx::linear_classifier;

pub const SYNTHETIC_LABELS: [&str; 2] = ["calm", "happy"];

/// Mean ZCR at which the synthetic classifier is split 50/50
pub const ZCR_DECISION_THRESHOLD: f32 = 0.1;

/// Logit slope per unit of ZCR for each class
const ZCR_GAIN: f32 = 10.0;

/// Scaler, ONNX model bytes and labels that agree on one feature layout
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub scaler: NormalizationParameters,
    pub model: Vec<u8>,
    pub labels: LabelEncoding,
}

/// Identity scaler plus a ZCR-keyed calm/happy classifier for `layout`.
pub fn synthetic_artifacts(layout: FeatureLayout) -> Result<ArtifactSet, ArtifactError> {
    let dims = layout.len();
    let zcr = layout.zcr().start;
    let units = SYNTHETIC_LABELS.len();

    let mut weights = vec![0.0; dims * units];
    weights[zcr * units] = -ZCR_GAIN;
    weights[zcr * units + 1] = ZCR_GAIN;
    let offset = ZCR_GAIN * ZCR_DECISION_THRESHOLD;

    Ok(ArtifactSet {
        scaler: identity_scaler(dims),
        model: linear_classifier(dims, &weights, &[offset, -offset], true)?,
        labels: labels(&SYNTHETIC_LABELS)?,
    })
}

/// Classifier that returns a uniform distribution over `classes` for any input.
pub fn uniform_artifacts(
    layout: FeatureLayout,
    classes: &[&str],
) -> Result<ArtifactSet, ArtifactError> {
    let dims = layout.len();
    Ok(ArtifactSet {
        scaler: identity_scaler(dims),
        model: linear_classifier(
            dims,
            &vec![0.0; dims * classes.len()],
            &vec![0.0; classes.len()],
            true,
        )?,
        labels: labels(classes)?,
    })
}

/// Write the scaler and labels as JSON and the model as ONNX into `dir`.
pub fn write_artifacts(dir: &Path, set: &ArtifactSet) -> Result<ArtifactPaths> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let paths = ArtifactPaths {
        model: dir.join("model.onnx"),
        scaler: dir.join("scaler.json"),
        labels: dir.join("labels.json"),
    };
    write_json(&paths.scaler, &set.scaler)?;
    fs::write(&paths.model, &set.model)
        .with_context(|| format!("writing {}", paths.model.display()))?;
    write_json(&paths.labels, &set.labels)?;
    Ok(paths)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn identity_scaler(dims: usize) -> NormalizationParameters {
    NormalizationParameters {
        mean: vec![0.0; dims],
        scale: vec![1.0; dims],
    }
}

fn labels(classes: &[&str]) -> Result<LabelEncoding, ArtifactError> {
    LabelEncoding::new(classes.iter().map(|c| c.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EmotionClassifier;

    fn probabilities(zcr: f32) -> Vec<f32> {
        let layout = FeatureLayout::default();
        let set = synthetic_artifacts(layout).unwrap();
        let classifier = EmotionClassifier::from_memory(&set.model).unwrap();
        let mut input = vec![0.3; layout.len()];
        input[0] = zcr;
        classifier.predict(&input).unwrap()
    }

    #[test]
    fn test_threshold_splits_evenly() {
        let probs = probabilities(ZCR_DECISION_THRESHOLD);
        assert!((probs[0] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_high_zcr_is_happy() {
        let probs = probabilities(0.25);
        assert!(probs[1] > 0.9, "Expected happy > 0.9, got {:?}", probs);
    }

    #[test]
    fn test_low_zcr_is_calm() {
        let probs = probabilities(0.0);
        assert!(probs[0] > 0.8, "Expected calm > 0.8, got {:?}", probs);
    }

    #[test]
    fn test_uniform_artifacts_give_equal_probabilities() {
        let layout = FeatureLayout::default();
        let set = uniform_artifacts(layout, &["a", "b", "c", "d"]).unwrap();
        let classifier = EmotionClassifier::from_memory(&set.model).unwrap();
        let probs = classifier.predict(&vec![1.0; layout.len()]).unwrap();
        assert!(probs.iter().all(|&p| (p - 0.25).abs() < 1e-6));
    }
}
