mod common;

use common::{flu_engine, FailingClassifier, FixedClassifier};
use symptomatic::{
    ClassProbabilities, DiagnosisEngine, DiagnosisError, FeatureSchema, FeatureVector,
    InferenceMode, ProbabilisticClassifier,
};

/// Declares `flu` and `cold` but scores whatever it was given.
#[derive(Debug)]
struct MislabeledClassifier {
    labels: Vec<String>,
    scores: Vec<(&'static str, f32)>,
}

impl ProbabilisticClassifier for MislabeledClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_len(&self) -> usize {
        2
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        ClassProbabilities::new(self.scores.iter().map(|(l, p)| (l.to_string(), *p)).collect())
    }
}

fn mislabeled_engine(scores: &[(&'static str, f32)]) -> DiagnosisEngine {
    DiagnosisEngine::builder()
        .with_schema(FeatureSchema::new(["cough", "fever"]).unwrap())
        .with_classifier(MislabeledClassifier {
            labels: vec!["flu".to_string(), "cold".to_string()],
            scores: scores.to_vec(),
        })
        .build()
        .expect("Failed to create engine")
}

#[test]
fn test_schema_and_classifier_must_agree() {
    let result = DiagnosisEngine::builder()
        .with_schema(FeatureSchema::new(["cough", "fever", "headache"]).unwrap())
        .with_classifier(FixedClassifier::new(132, &[("flu", 1.0)]))
        .build();

    assert!(matches!(result.unwrap_err(), DiagnosisError::BuildError(_)));
}

#[test]
fn test_vector_length_mismatch() -> Result<(), DiagnosisError> {
    let engine = flu_engine();
    let vector = FeatureVector::zeros(132);
    assert_eq!(
        engine.infer(&vector, InferenceMode::TopOne),
        Err(DiagnosisError::FeatureVectorMismatch { expected: 3, actual: 132 })
    );
    assert_eq!(
        engine.decode(&vector),
        Err(DiagnosisError::FeatureVectorMismatch { expected: 3, actual: 132 })
    );
    Ok(())
}

#[test]
fn test_invalid_thresholds() -> Result<(), DiagnosisError> {
    let engine = flu_engine();
    let vector = engine.encode(["fever"])?;
    for threshold in [-0.01, 1.01, f32::NAN, f32::INFINITY] {
        let result = engine.infer(&vector, InferenceMode::Threshold(threshold));
        assert!(matches!(result, Err(DiagnosisError::ValidationError(_))));
    }
    Ok(())
}

#[test]
fn test_threshold_checked_before_classifier_runs() -> Result<(), DiagnosisError> {
    let engine = DiagnosisEngine::builder()
        .with_schema(FeatureSchema::new(["cough", "fever"])?)
        .with_classifier(FailingClassifier::new(2))
        .build()?;

    let result = engine.predict(["cough"], InferenceMode::Threshold(2.0));
    assert!(matches!(result, Err(DiagnosisError::ValidationError(_))));
    Ok(())
}

#[test]
fn test_classifier_must_score_its_declared_classes() {
    // Dropped class
    let engine = mislabeled_engine(&[("flu", 0.9)]);
    assert!(matches!(
        engine.predict(["cough"], InferenceMode::TopOne),
        Err(DiagnosisError::ClassifierInvocation(_))
    ));

    // Invented class
    let engine = mislabeled_engine(&[("flu", 0.5), ("covid", 0.5)]);
    assert!(matches!(
        engine.predict(["cough"], InferenceMode::Threshold(0.1)),
        Err(DiagnosisError::ClassifierInvocation(_))
    ));

    // Extra class on top of the declared ones
    let engine = mislabeled_engine(&[("flu", 0.5), ("cold", 0.3), ("covid", 0.2)]);
    let vector = engine.encode(["fever"]).unwrap();
    assert!(matches!(
        engine.probabilities(&vector),
        Err(DiagnosisError::ClassifierInvocation(_))
    ));

    let engine = mislabeled_engine(&[("cold", 0.4), ("flu", 0.6)]);
    let result = engine.predict(["cough"], InferenceMode::TopOne).unwrap();
    assert_eq!(result.labels(), vec!["flu"]);
}

#[test]
fn test_out_of_range_probabilities_are_rejected() {
    let engine = mislabeled_engine(&[("flu", 1.5), ("cold", -0.5)]);
    assert!(matches!(
        engine.predict(["cough", "fever"], InferenceMode::TopOne),
        Err(DiagnosisError::ClassifierInvocation(_))
    ));
}

#[test]
fn test_classifier_failure_is_propagated() -> Result<(), DiagnosisError> {
    let engine = DiagnosisEngine::builder()
        .with_schema(FeatureSchema::new(["cough", "fever"])?)
        .with_classifier(FailingClassifier::new(2))
        .build()?;

    let result = engine.predict(["cough"], InferenceMode::Threshold(0.5));
    assert_eq!(
        result,
        Err(DiagnosisError::ClassifierInvocation("session run failed".into()))
    );
    Ok(())
}

#[test]
fn test_empty_threshold_result_is_not_an_error() -> Result<(), DiagnosisError> {
    let engine = flu_engine();
    let result = engine.predict(["fever", "cough"], InferenceMode::Threshold(1.0))?;
    assert!(result.is_empty());
    assert!(result.labels().is_empty());
    Ok(())
}

#[test]
fn test_unknown_names_are_all_listed() {
    let engine = flu_engine();
    let selection = ["fever", "rash", "acne", "rash"];
    assert_eq!(
        engine.feature_schema().unknown(selection),
        vec!["acne".to_string(), "rash".to_string()]
    );
    assert_eq!(
        engine.encode(selection),
        Err(DiagnosisError::UnknownSymptom("acne".into()))
    );
}

#[test]
fn test_inconsistent_source_names_are_canonicalized() -> Result<(), DiagnosisError> {
    let schema = FeatureSchema::new(["itching", "dischromic _patches", "toxic_look_(typhos)"])?;
    assert_eq!(schema.names(), &["itching", "dischromic_patches", "toxic_look_typhos"]);

    let engine = DiagnosisEngine::builder()
        .with_schema(schema)
        .with_classifier(FixedClassifier::new(3, &[("Psoriasis", 0.6), ("Typhoid", 0.4)]))
        .build()?;
    let canonical = engine.encode(["dischromic_patches", "toxic_look_typhos"])?;
    let raw = engine.encode(["dischromic _patches", "toxic_look_(typhos)"])?;
    assert_eq!(canonical, raw);
    Ok(())
}

#[test]
fn test_duplicate_schema_names() {
    let result = FeatureSchema::new(["cough", "fever", "Cough"]);
    assert!(matches!(result, Err(DiagnosisError::SchemaError(_))));
}
