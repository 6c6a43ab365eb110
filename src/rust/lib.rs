//! Symptom-to-disease prediction over a pre-trained probabilistic classifier.
//!
//! A [`FeatureSchema`] fixes the order of the symptoms the model was trained
//! on. A [`DiagnosisEngine`] encodes a set of symptom names into a binary
//! [`FeatureVector`] aligned to that schema, asks the classifier for class
//! probabilities, and reports either the most probable disease or every
//! disease above a threshold.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::collections::HashMap;
//! use symptomatic::{
//!     ClassProbabilities, DiagnosisEngine, DiagnosisError, FeatureSchema,
//!     FeatureVector, InferenceMode, Outcome, ProbabilisticClassifier,
//! };
//!
//! #[derive(Debug)]
//! struct FluOrCold(Vec<String>);
//!
//! impl ProbabilisticClassifier for FluOrCold {
//!     fn labels(&self) -> &[String] { &self.0 }
//!     fn input_len(&self) -> usize { 3 }
//!     fn predict_proba(&self, _: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
//!         ClassProbabilities::new(HashMap::from([
//!             ("flu".to_string(), 0.7),
//!             ("cold".to_string(), 0.3),
//!         ]))
//!     }
//! }
//!
//! let engine = DiagnosisEngine::builder()
//!     .with_schema(FeatureSchema::new(["cough", "fever", "headache"])?)
//!     .with_classifier(FluOrCold(vec!["cold".into(), "flu".into()]))
//!     .build()?;
//!
//! let vector = engine.encode(["fever"])?;
//! let result = engine.infer(&vector, InferenceMode::Threshold(0.5))?;
//! assert_eq!(result.labels(), vec!["flu"]);
//!
//! let result = engine.infer(&vector, InferenceMode::Threshold(0.8))?;
//! assert!(matches!(result.outcome, Outcome::NoneAboveThreshold { .. }));
//! # Ok(())
//! # }
//! ```
//!
//! # Loading a model bundle
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use symptomatic::{DiagnosisEngine, InferenceMode};
//!
//! let engine = DiagnosisEngine::builder()
//!     .with_model_dir("/var/lib/symptomatic/disease")?
//!     .build()?;
//! let result = engine.predict(["itching", "skin_rash", "nodal_skin_eruptions"], InferenceMode::TopOne)?;
//! println!("{:?}", result.labels());
//! # Ok(())
//! # }
//! ```

pub mod engine;
mod runtime;
pub mod model_manager;
pub mod models;

pub use engine::{
    canonical_symptom_name, ClassProbabilities, ClassScore, DiagnosisEngine, DiagnosisError,
    EngineBuilder, EngineInfo, FeatureSchema, FeatureVector, InferenceMode, OnnxClassifier,
    Outcome, PredictionResult, ProbabilisticClassifier, DEFAULT_MIN_SYMPTOMS,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{ModelCharacteristics, ModelInfo, ModelMetadata};

pub fn init_logger() {
    env_logger::init();
}
