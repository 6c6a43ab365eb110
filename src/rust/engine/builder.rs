use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use log::{error, info};

use super::backend::{OnnxClassifier, ProbabilisticClassifier};
use super::engine::{DiagnosisEngine, DEFAULT_MIN_SYMPTOMS};
use super::error::DiagnosisError;
use super::schema::FeatureSchema;
use crate::{ModelManager, runtime::RuntimeConfig};

/// A builder for constructing a DiagnosisEngine with a fluent interface.
///
/// The schema and the classifier must come from the same artifact. Loading
/// a bundle with [`with_model`](Self::with_model) or
/// [`with_model_dir`](Self::with_model_dir) sets both at once.
#[derive(Default, Debug)]
pub struct EngineBuilder {
    model_path: Option<String>,
    schema: Option<FeatureSchema>,
    classifier: Option<Arc<dyn ProbabilisticClassifier>>,
    min_symptoms: Option<usize>,
    runtime_config: RuntimeConfig,
}

impl EngineBuilder {
    /// Creates a new empty EngineBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use symptomatic::EngineBuilder;
    ///
    /// let builder = EngineBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Only affects bundles loaded after this call.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Minimum symptom count below which results are flagged
    /// `low_confidence_input`. Defaults to 4.
    pub fn with_min_symptoms(mut self, min_symptoms: usize) -> Self {
        self.min_symptoms = Some(min_symptoms);
        self
    }

    /// Loads the named bundle from the default models directory.
    ///
    /// # Errors
    /// * `BuildError` if a model was already set or the bundle is not present
    /// * `SchemaError` / `ModelError` if the bundle cannot be loaded
    ///
    /// # Example
    /// ```no_run
    /// use symptomatic::EngineBuilder;
    ///
    /// let builder = EngineBuilder::new().with_model("disease");
    /// ```
    pub fn with_model(self, name: &str) -> Result<Self, DiagnosisError> {
        let manager = ModelManager::new_default()
            .map_err(|e| DiagnosisError::BuildError(format!("Failed to create model manager: {}", e)))?;

        if !manager.is_model_downloaded(name) {
            return Err(DiagnosisError::BuildError(format!(
                "Model '{}' is not downloaded. Please download it first using ModelManager::download_model()",
                name
            )));
        }

        self.with_model_dir(manager.get_model_dir(name))
    }

    /// Loads a bundle (`model.onnx` + `metadata.json`) from `dir`.
    ///
    /// The schema is built from the bundle's feature ordering, never from a
    /// separately maintained list.
    pub fn with_model_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, DiagnosisError> {
        if self.schema.is_some() || self.classifier.is_some() {
            return Err(DiagnosisError::BuildError("Model already set".to_string()));
        }
        let dir = dir.as_ref();

        let metadata = ModelManager::read_metadata(&dir.join(ModelManager::METADATA_FILE))
            .map_err(|e| {
                error!("Failed to read model metadata in {}: {}", dir.display(), e);
                DiagnosisError::ModelError(format!("Failed to read model metadata: {}", e))
            })?;

        let schema = FeatureSchema::new(&metadata.features)?;
        info!("Feature schema loaded ({} symptoms)", schema.size());

        let model_path = dir.join(ModelManager::MODEL_FILE);
        let classifier = OnnxClassifier::from_file(&model_path, &metadata, &self.runtime_config)?;

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.schema = Some(schema);
        self.classifier = Some(Arc::new(classifier));
        Ok(self)
    }

    /// Sets the feature schema directly, for classifiers supplied through
    /// [`with_classifier`](Self::with_classifier).
    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the classifier directly.
    pub fn with_classifier(mut self, classifier: impl ProbabilisticClassifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Checks the classifier against the schema. A mismatch here means the
    /// two came from different training runs.
    fn validate_classifier(
        schema: &FeatureSchema,
        classifier: &dyn ProbabilisticClassifier,
    ) -> Result<(), DiagnosisError> {
        if classifier.input_len() != schema.size() {
            return Err(DiagnosisError::BuildError(format!(
                "Classifier expects {} features but the schema has {}",
                classifier.input_len(), schema.size()
            )));
        }

        let labels = classifier.labels();
        if labels.is_empty() {
            return Err(DiagnosisError::BuildError("Classifier must know at least one class".into()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(DiagnosisError::BuildError(format!("Duplicate class label '{}'", duplicate)));
        }
        Ok(())
    }

    /// Builds and returns the final DiagnosisEngine instance
    ///
    /// # Errors
    /// * `BuildError` if no schema or classifier is set
    /// * `BuildError` if the classifier input length differs from the schema size
    /// * `BuildError` if the classifier has no labels or repeats a label
    pub fn build(self) -> Result<DiagnosisEngine, DiagnosisError> {
        let schema = self.schema
            .ok_or_else(|| DiagnosisError::BuildError("Feature schema must be set".to_string()))?;
        let classifier = self.classifier
            .ok_or_else(|| DiagnosisError::BuildError("Classifier must be set".to_string()))?;

        Self::validate_classifier(&schema, &*classifier)?;

        let min_symptoms = self.min_symptoms.unwrap_or(DEFAULT_MIN_SYMPTOMS);
        info!(
            "Engine ready: {} symptoms, {} classes, advisory minimum {}",
            schema.size(), classifier.labels().len(), min_symptoms
        );

        Ok(DiagnosisEngine {
            model_path: self.model_path,
            schema: Arc::new(schema),
            classifier,
            min_symptoms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ClassProbabilities, FeatureVector};

    #[derive(Debug)]
    struct Uniform {
        labels: Vec<String>,
        input_len: usize,
    }

    impl ProbabilisticClassifier for Uniform {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn input_len(&self) -> usize {
            self.input_len
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
            let p = 1.0 / self.labels.len() as f32;
            ClassProbabilities::new(self.labels.iter().map(|l| (l.clone(), p)).collect())
        }
    }

    fn uniform(labels: &[&str], input_len: usize) -> Uniform {
        Uniform { labels: labels.iter().map(|l| l.to_string()).collect(), input_len }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["cough", "fever"]).expect("valid schema")
    }

    #[test]
    fn test_missing_parts() {
        assert!(matches!(
            EngineBuilder::new().with_schema(schema()).build(),
            Err(DiagnosisError::BuildError(_))
        ));
        assert!(matches!(
            EngineBuilder::new().with_classifier(uniform(&["flu"], 2)).build(),
            Err(DiagnosisError::BuildError(_))
        ));
    }

    #[test]
    fn test_input_length_must_match_schema() {
        let result = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(uniform(&["flu"], 132))
            .build();
        assert!(matches!(result, Err(DiagnosisError::BuildError(_))));
    }

    #[test]
    fn test_label_validation() {
        let result = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(uniform(&[], 2))
            .build();
        assert!(result.is_err());

        let result = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(uniform(&["flu", "flu"], 2))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_min_symptoms() -> Result<(), DiagnosisError> {
        let engine = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(uniform(&["flu", "cold"], 2))
            .with_min_symptoms(1)
            .build()?;
        let result = engine.predict(["cough"], crate::InferenceMode::TopOne)?;
        assert!(!result.low_confidence_input);
        Ok(())
    }

    #[test]
    fn test_shared_classifier() -> Result<(), DiagnosisError> {
        let shared = Arc::new(uniform(&["flu", "cold"], 2));
        let first = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(Arc::clone(&shared))
            .build()?;
        let second = EngineBuilder::new()
            .with_schema(schema())
            .with_classifier(shared)
            .with_min_symptoms(2)
            .build()?;
        assert_eq!(first.info().class_labels, second.info().class_labels);
        Ok(())
    }

    #[test]
    fn test_missing_bundle_dir() {
        let result = EngineBuilder::new().with_model_dir("/nonexistent/symptomatic/bundle");
        assert!(matches!(result, Err(DiagnosisError::ModelError(_))));
    }
}
