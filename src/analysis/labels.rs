// Labels - class index to emotion name mapping
//
// The label encoding is fixed at training time; index i of the classifier
// output corresponds to `classes[i]`.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PipelineError};

/// Ordered class names as exported by training
///
/// Deserialization runs the same checks as [`LabelEncoding::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLabelEncoding")]
pub struct LabelEncoding {
    classes: Vec<String>,
}

#[derive(Deserialize)]
struct RawLabelEncoding {
    classes: Vec<String>,
}

impl TryFrom<RawLabelEncoding> for LabelEncoding {
    type Error = ArtifactError;

    fn try_from(raw: RawLabelEncoding) -> Result<Self, Self::Error> {
        Self::new(raw.classes)
    }
}

/// Top class of a distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelScore {
    pub index: usize,
    pub label: String,
    /// Probability scaled to a percentage in [0, 100]
    pub confidence: f32,
}

impl LabelEncoding {
    /// Validate and build a label encoding
    ///
    /// # Errors
    /// `InvalidParameters` if there are no classes, a class name is blank, or
    /// a name appears twice
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::InvalidParameters {
                reason: "label encoding has no classes".to_string(),
            });
        }
        for (idx, name) in classes.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ArtifactError::InvalidParameters {
                    reason: format!("label {} is blank", idx),
                });
            }
            if classes[..idx].contains(name) {
                return Err(ArtifactError::InvalidParameters {
                    reason: format!("label '{}' appears more than once", name),
                });
            }
        }
        Ok(Self { classes })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Pick the most probable class
    ///
    /// Ties resolve to the lowest index.
    ///
    /// # Errors
    /// * `Inference` - the distribution is empty
    /// * `UnknownLabel` - the winning index is outside the encoding
    pub fn resolve(&self, probabilities: &[f32]) -> Result<LabelScore, PipelineError> {
        let (index, max) = arg_max(probabilities).ok_or_else(|| PipelineError::Inference {
            reason: "empty probability distribution".to_string(),
        })?;
        let label = self.get(index).ok_or(PipelineError::UnknownLabel {
            index,
            known: self.len(),
        })?;

        Ok(LabelScore {
            index,
            label: label.to_string(),
            confidence: max * 100.0,
        })
    }

    /// All classes with their percentage, most probable first
    ///
    /// Classes with equal probability keep their encoding order.
    pub fn ranked(&self, probabilities: &[f32]) -> Vec<LabelScore> {
        let mut scores: Vec<LabelScore> = probabilities
            .iter()
            .enumerate()
            .filter_map(|(index, &p)| {
                self.get(index).map(|label| LabelScore {
                    index,
                    label: label.to_string(),
                    confidence: p * 100.0,
                })
            })
            .collect();
        scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        scores
    }
}

/// Index and value of the maximum; the first occurrence wins ties
fn arg_max(values: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &v) in values.iter().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((idx, v)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding(names: &[&str]) -> LabelEncoding {
        LabelEncoding::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_resolve_picks_max() {
        let labels = encoding(&["angry", "happy", "sad"]);
        let score = labels.resolve(&[0.1, 0.7, 0.2]).unwrap();
        assert_eq!(score.index, 1);
        assert_eq!(score.label, "happy");
        assert!((score.confidence - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_tie_resolves_to_lowest_index() {
        let labels = encoding(&["a", "b", "c"]);
        let score = labels.resolve(&[0.4, 0.4, 0.2]).unwrap();
        assert_eq!(score.index, 0);
        assert_eq!(score.label, "a");
        assert!((score.confidence - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_uniform_distribution() {
        let labels = encoding(&["neutral", "calm", "happy", "sad"]);
        let score = labels.resolve(&[0.25; 4]).unwrap();
        assert_eq!(score.label, "neutral");
        assert_eq!(score.confidence, 25.0);
    }

    #[test]
    fn test_index_outside_encoding_is_unknown_label() {
        let labels = encoding(&["a", "b"]);
        assert_eq!(
            labels.resolve(&[0.1, 0.2, 0.7]),
            Err(PipelineError::UnknownLabel { index: 2, known: 2 })
        );
    }

    #[test]
    fn test_empty_distribution_fails() {
        let labels = encoding(&["a"]);
        assert!(matches!(
            labels.resolve(&[]),
            Err(PipelineError::Inference { .. })
        ));
    }

    #[test]
    fn test_ranked_orders_descending_and_keeps_ties_stable() {
        let labels = encoding(&["a", "b", "c", "d"]);
        let ranked = labels.ranked(&[0.1, 0.4, 0.1, 0.4]);
        let order: Vec<&str> = ranked.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_duplicate_and_blank_labels_rejected() {
        assert!(LabelEncoding::new(vec!["x".into(), "x".into()]).is_err());
        assert!(LabelEncoding::new(vec!["x".into(), " ".into()]).is_err());
        assert!(LabelEncoding::new(Vec::new()).is_err());
    }

    #[test]
    fn test_parse_labels_json() {
        let labels: LabelEncoding =
            serde_json::from_str(r#"{ "classes": ["angry", "calm"] }"#).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get(1), Some("calm"));

        let duplicate = serde_json::from_str::<LabelEncoding>(r#"{ "classes": ["a", "a"] }"#);
        assert!(duplicate.is_err());
    }
}
