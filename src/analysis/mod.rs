// Analysis module - feature extraction and emotion inference stages
//
// Stages, in request order:
// - features: Waveform → fixed-length FeatureVector
// - normalizer: FeatureVector → standardized values
// - classifier (ONNX Runtime session): standardized values → class probabilities
// - labels: class probabilities → (emotion, confidence)
//
// Every stage is immutable after construction; the pipeline module wires
// them together and owns the startup schema checks.

pub mod classifier;
pub mod features;
pub mod labels;
pub mod normalizer;

pub use classifier::EmotionClassifier;
pub use features::{FeatureExtractor, FeatureLayout, FeatureVector};
pub use labels::{LabelEncoding, LabelScore};
pub use normalizer::{FeatureNormalizer, NormalizationParameters};
