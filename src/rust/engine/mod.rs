mod error;
mod schema;
mod encoding;
mod prediction;
mod backend;
mod engine;
pub mod builder;

pub use error::DiagnosisError;
pub use schema::{canonical_symptom_name, FeatureSchema};
pub use encoding::FeatureVector;
pub use prediction::{ClassProbabilities, ClassScore, InferenceMode, Outcome, PredictionResult};
pub use backend::{OnnxClassifier, ProbabilisticClassifier};
pub use engine::{DiagnosisEngine, DEFAULT_MIN_SYMPTOMS};
pub use builder::EngineBuilder;

/// Information about the model an engine is serving
#[derive(Debug, Clone)]
pub struct EngineInfo {
    /// Path to the ONNX model file, if the engine was loaded from a bundle
    pub model_path: Option<String>,
    /// Number of symptoms in the feature schema
    pub num_features: usize,
    /// Number of disease classes the classifier knows
    pub num_classes: usize,
    /// Labels of the classes, in model order
    pub class_labels: Vec<String>,
    /// Symptom count below which results carry the low-confidence advisory
    pub min_symptoms: usize,
}
