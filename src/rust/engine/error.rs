use ort::Error as OrtError;

/// Errors surfaced by schema construction, encoding and inference.
///
/// "No class above the threshold" is deliberately absent: it is a successful
/// [`Outcome`](super::Outcome), never an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiagnosisError {
    /// A symptom name that is not part of the active feature schema
    #[error("Unknown symptom: {0}")]
    UnknownSymptom(String),
    /// A feature vector whose length differs from the schema size
    #[error("Feature vector mismatch: expected {expected} features, got {actual}")]
    FeatureVectorMismatch { expected: usize, actual: usize },
    /// The classifier failed while estimating probabilities
    #[error("Classifier invocation failed: {0}")]
    ClassifierInvocation(String),
    /// Invalid input parameters (threshold range, vector entries)
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// The feature ordering could not be turned into a schema
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// Loading or running the model artifact failed
    #[error("Model error: {0}")]
    ModelError(String),
    /// The engine could not be assembled
    #[error("Build error: {0}")]
    BuildError(String),
}

impl From<OrtError> for DiagnosisError {
    fn from(err: OrtError) -> Self {
        DiagnosisError::ModelError(err.to_string())
    }
}
