use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use ort::session::Session;
use ort::value::Tensor;
use ndarray::Array2;
use log::{debug, error, info};

use super::encoding::FeatureVector;
use super::error::DiagnosisError;
use super::prediction::ClassProbabilities;
use crate::models::ModelMetadata;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A pre-trained multi-class probabilistic classifier.
///
/// Implementations must not mutate themselves during inference: the engine
/// calls `predict_proba` concurrently through a shared reference.
pub trait ProbabilisticClassifier: Send + Sync + fmt::Debug {
    /// Class labels in the order the model emits them
    fn labels(&self) -> &[String];

    /// Number of features the model expects per sample
    fn input_len(&self) -> usize;

    /// Estimates one probability per label for a single sample.
    ///
    /// Failures are reported as `ClassifierInvocation` and are not retried.
    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError>;
}

impl<T: ProbabilisticClassifier + ?Sized> ProbabilisticClassifier for Arc<T> {
    fn labels(&self) -> &[String] {
        (**self).labels()
    }

    fn input_len(&self) -> usize {
        (**self).input_len()
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        (**self).predict_proba(features)
    }
}

/// Runs an exported classifier through ONNX Runtime.
///
/// The model is expected to:
/// - Accept one `f32` input of shape `[1, input_len]`
/// - Emit a probability tensor of shape `[1, labels.len()]`, either under
///   the output named in the metadata or as the last output (scikit-learn
///   exports with `zipmap` disabled put `output_probability` last)
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    probability_output: String,
    labels: Vec<String>,
    input_len: usize,
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_name", &self.input_name)
            .field("probability_output", &self.probability_output)
            .field("labels", &self.labels)
            .field("input_len", &self.input_len)
            .finish()
    }
}

impl OnnxClassifier {
    /// Loads `model_path` and binds it to the labels and feature count in `metadata`.
    ///
    /// # Errors
    /// - `ModelError` if the file is missing or the session cannot be created
    /// - `ModelError` if the graph does not have the expected inputs and outputs
    pub fn from_file(
        model_path: &Path,
        metadata: &ModelMetadata,
        config: &RuntimeConfig,
    ) -> Result<Self, DiagnosisError> {
        if !model_path.exists() {
            return Err(DiagnosisError::ModelError(
                format!("Model file not found: {}", model_path.display())
            ));
        }

        let session = create_session_builder(config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load model {}: {}", model_path.display(), e);
                DiagnosisError::ModelError(format!("Failed to load model: {}", e))
            })?;

        let (input_name, probability_output) = Self::validate_model(&session, metadata)?;
        info!(
            "Loaded classifier '{}' v{} ({} features, {} classes)",
            metadata.name, metadata.version, metadata.features.len(), metadata.labels.len()
        );

        Ok(Self {
            session,
            input_name,
            probability_output,
            labels: metadata.labels.clone(),
            input_len: metadata.features.len(),
        })
    }

    /// Resolves the input and probability output names, checking they exist
    fn validate_model(
        session: &Session,
        metadata: &ModelMetadata,
    ) -> Result<(String, String), DiagnosisError> {
        let input_name = match &metadata.input_name {
            Some(name) => session.inputs.iter()
                .find(|input| &input.name == name)
                .map(|input| input.name.clone())
                .ok_or_else(|| DiagnosisError::ModelError(format!("Model has no input named '{}'", name)))?,
            None => session.inputs.first()
                .map(|input| input.name.clone())
                .ok_or_else(|| DiagnosisError::ModelError("Model must have at least 1 input".into()))?,
        };

        let probability_output = match &metadata.probability_output {
            Some(name) => session.outputs.iter()
                .find(|output| &output.name == name)
                .map(|output| output.name.clone())
                .ok_or_else(|| DiagnosisError::ModelError(format!("Model has no output named '{}'", name)))?,
            None => session.outputs.last()
                .map(|output| output.name.clone())
                .ok_or_else(|| DiagnosisError::ModelError("Model must have at least 1 output for probabilities".into()))?,
        };

        debug!("Model input '{}', probability output '{}'", input_name, probability_output);
        Ok((input_name, probability_output))
    }
}

impl ProbabilisticClassifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        let invocation = |msg: String| DiagnosisError::ClassifierInvocation(msg);

        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| invocation(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.clone(), Tensor::from_array(&input)
            .map_err(|e| invocation(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| invocation(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.probability_output.as_str()].try_extract_tensor::<f32>()
            .map_err(|e| invocation(format!("Failed to extract probability tensor: {}", e)))?;

        let row: Vec<f32> = output_tensor.iter().copied().collect();
        if row.len() != self.labels.len() {
            return Err(invocation(format!(
                "Model produced {} probabilities for {} labels", row.len(), self.labels.len()
            )));
        }

        ClassProbabilities::new(self.labels.iter().cloned().zip(row).collect())
    }
}
