use super::*;
use crate::testing::onnx::{linear_classifier, INPUT_NAME, OUTPUT_NAME};

/// Logits `[x0 - x1, x1 - x0]` over a 2-feature input
fn difference_model(softmax: bool) -> Vec<u8> {
    linear_classifier(2, &[1.0, -1.0, -1.0, 1.0], &[0.0, 0.0], softmax).unwrap()
}

#[test]
fn test_shapes_read_from_session_metadata() {
    let model = linear_classifier(4, &[0.1; 12], &[0.0; 3], true).unwrap();
    let classifier = EmotionClassifier::from_memory(&model).unwrap();
    assert_eq!(classifier.input_len(), 4);
    assert_eq!(classifier.output_len(), 3);
    assert_eq!(classifier.input_shape(), &[1, 4, 1]);
    assert_eq!(classifier.input_name(), INPUT_NAME);
    assert_eq!(classifier.output_name(), OUTPUT_NAME);
}

#[test]
fn test_predicts_distribution() {
    let weights = [0.1, 0.2, 0.3, -0.2, 0.4, 0.1, 0.5, -0.3, 0.2, 0.0, 0.1, -0.1];
    let model = linear_classifier(4, &weights, &[0.0; 3], true).unwrap();
    let classifier = EmotionClassifier::from_memory(&model).unwrap();

    let probs = classifier.predict(&[0.5, -1.0, 2.0, 0.0]).unwrap();
    assert_eq!(probs.len(), 3);
    let sum: f32 = probs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "Expected sum 1.0, got {}", sum);
    assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_prediction_is_deterministic() {
    let classifier = EmotionClassifier::from_memory(&difference_model(true)).unwrap();
    let input = [0.3, -0.7];
    assert_eq!(
        classifier.predict(&input).unwrap(),
        classifier.predict(&input).unwrap()
    );
}

#[test]
fn test_linear_model_matches_hand_computation() {
    let classifier = EmotionClassifier::from_memory(&difference_model(true)).unwrap();
    let probs = classifier.predict(&[1.0, 0.0]).unwrap();

    let expected = 1.0 / (1.0 + (-2.0f32).exp());
    assert!((probs[0] - expected).abs() < 1e-5);
    assert!((probs[1] - (1.0 - expected)).abs() < 1e-5);
}

#[test]
fn test_wrong_input_length_is_schema_mismatch() {
    let classifier = EmotionClassifier::from_memory(&difference_model(true)).unwrap();
    assert_eq!(
        classifier.predict(&[0.0; 5]),
        Err(PipelineError::SchemaMismatch {
            expected: 2,
            found: 5
        })
    );
}

#[test]
fn test_logits_output_is_inference_error() {
    // [2, -2] is neither non-negative nor normalized
    let classifier = EmotionClassifier::from_memory(&difference_model(false)).unwrap();
    let err = classifier.predict(&[1.0, 0.0]).unwrap_err();
    assert!(
        matches!(&err, PipelineError::Inference { .. }),
        "Unexpected error: {:?}",
        err
    );
}

#[test]
fn test_garbage_bytes_rejected() {
    let err = EmotionClassifier::from_memory(b"definitely not protobuf").unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidModel { .. }));
}

#[test]
fn test_missing_model_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EmotionClassifier::from_file(&dir.path().join("model.onnx")).unwrap_err();
    assert!(matches!(err, ArtifactError::Io { .. }), "Got {:?}", err);
}

#[test]
fn test_model_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, difference_model(true)).unwrap();

    let classifier = EmotionClassifier::from_file(&path).unwrap();
    assert_eq!(classifier.output_len(), 2);
}

#[test]
fn test_rank_one_outlet_rejected() {
    assert!(tensor_dims("input", Some(&[182][..])).is_err());
    assert!(tensor_dims("input", None).is_err());
}

#[test]
fn test_dynamic_batch_with_fixed_features_accepted() {
    assert_eq!(tensor_dims("input", Some(&[-1, 182, 1][..])).unwrap(), vec![182, 1]);
    assert!(tensor_dims("input", Some(&[-1, -1, 1][..])).is_err());
}

#[test]
fn test_shared_across_threads() {
    let classifier =
        std::sync::Arc::new(EmotionClassifier::from_memory(&difference_model(true)).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let classifier = std::sync::Arc::clone(&classifier);
            std::thread::spawn(move || classifier.predict(&[i as f32, 0.0]).unwrap())
        })
        .collect();
    for handle in handles {
        let probs = handle.join().unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_classifier_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EmotionClassifier>();
}
