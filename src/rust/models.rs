use serde::{Deserialize, Serialize};

/// Contents of a bundle's `metadata.json`, written by the training pipeline
/// alongside `model.onnx`.
///
/// `features` is the authoritative feature ordering: the schema is built from
/// it and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Symptom column names in training order
    pub features: Vec<String>,
    /// Disease labels in the order the model emits probabilities
    pub labels: Vec<String>,
    /// Hex SHA-256 of `model.onnx`
    #[serde(default)]
    pub model_sha256: Option<String>,
    /// Name of the feature input; the first input when absent
    #[serde(default)]
    pub input_name: Option<String>,
    /// Name of the probability output; the last output when absent
    #[serde(default)]
    pub probability_output: Option<String>,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl ModelMetadata {
    pub fn characteristics(&self) -> ModelCharacteristics {
        ModelCharacteristics {
            num_features: self.features.len(),
            num_classes: self.labels.len(),
        }
    }
}

/// Where to fetch a model bundle from.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub metadata_url: String,
}

/// Shape of a model's input and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCharacteristics {
    pub num_features: usize,
    pub num_classes: usize,
}
