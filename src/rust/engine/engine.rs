use std::collections::BTreeSet;
use std::sync::Arc;
use log::{debug, warn};

use super::backend::ProbabilisticClassifier;
use super::encoding::{check_length, FeatureVector, SymptomEncoding};
use super::error::DiagnosisError;
use super::prediction::{apply_mode, ClassProbabilities, InferenceMode, PredictionResult};
use super::schema::FeatureSchema;

/// Default for the low-information advisory.
pub const DEFAULT_MIN_SYMPTOMS: usize = 4;

/// Turns symptom selections into disease predictions.
///
/// The engine holds no per-request state. The schema and classifier sit
/// behind `Arc` and are only read, so one engine can serve many threads:
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use symptomatic::{DiagnosisEngine, InferenceMode};
/// use std::sync::Arc;
/// use std::thread;
///
/// let engine = Arc::new(DiagnosisEngine::builder()
///     .with_model("disease")?
///     .build()?);
///
/// let engine_clone = Arc::clone(&engine);
/// thread::spawn(move || {
///     engine_clone.predict(["itching", "skin_rash"], InferenceMode::TopOne).unwrap();
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosisEngine {
    pub(super) model_path: Option<String>,
    pub(super) schema: Arc<FeatureSchema>,
    pub(super) classifier: Arc<dyn ProbabilisticClassifier>,
    pub(super) min_symptoms: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<DiagnosisEngine>();
    }
};

impl SymptomEncoding for DiagnosisEngine {
    fn schema(&self) -> Option<&FeatureSchema> {
        Some(&self.schema)
    }
}

impl DiagnosisEngine {
    /// Creates an EngineBuilder for fluent construction
    pub fn builder() -> super::builder::EngineBuilder {
        super::builder::EngineBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::EngineInfo {
        super::EngineInfo {
            model_path: self.model_path.clone(),
            num_features: self.schema.size(),
            num_classes: self.classifier.labels().len(),
            class_labels: self.classifier.labels().to_vec(),
            min_symptoms: self.min_symptoms,
        }
    }

    pub fn feature_schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encodes a selection of symptom names into a schema-aligned vector.
    ///
    /// # Errors
    /// * `UnknownSymptom` if any name is not in the schema; no vector is
    ///   returned in that case. Use [`FeatureSchema::unknown`] to list them all.
    pub fn encode<I, S>(&self, selection: I) -> Result<FeatureVector, DiagnosisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.encode_symptoms(selection)
    }

    /// Recovers the canonical symptom names set in `vector`.
    pub fn decode(&self, vector: &FeatureVector) -> Result<BTreeSet<String>, DiagnosisError> {
        self.decode_symptoms(vector)
    }

    /// Raw class probabilities for a vector, without applying a mode.
    pub fn probabilities(&self, vector: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        check_length(&self.schema, vector)?;
        self.classify(vector)
    }

    /// Calls the classifier and checks it scored exactly the classes it declares.
    fn classify(&self, vector: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        let probabilities = self.classifier.predict_proba(vector)?;
        let labels = self.classifier.labels();
        let missing = labels.iter().find(|label| probabilities.get(label).is_none());
        if probabilities.len() != labels.len() || missing.is_some() {
            return Err(DiagnosisError::ClassifierInvocation(format!(
                "Classifier scored {} classes but declares {} ({})",
                probabilities.len(),
                labels.len(),
                missing.map_or("unexpected label".to_string(), |label| format!("missing '{}'", label))
            )));
        }
        Ok(probabilities)
    }

    /// Runs the classifier and applies the requested reporting mode.
    ///
    /// # Arguments
    /// * `vector` - A vector produced by [`encode`](Self::encode) (or built by
    ///   the caller with the schema's length)
    /// * `mode` - [`InferenceMode::TopOne`] or [`InferenceMode::Threshold`]
    ///
    /// # Returns
    /// A [`PredictionResult`]. In threshold mode an empty selection is the
    /// successful `NoneAboveThreshold` outcome. The result is flagged
    /// `low_confidence_input` when fewer symptoms than the configured minimum
    /// are set; the outcome is reported regardless.
    ///
    /// # Errors
    /// * `FeatureVectorMismatch` if the vector length differs from the schema size
    /// * `ValidationError` if the threshold is outside `[0, 1]`
    /// * `ClassifierInvocation` if the classifier fails or scores a different
    ///   set of classes than it declares
    pub fn infer(&self, vector: &FeatureVector, mode: InferenceMode) -> Result<PredictionResult, DiagnosisError> {
        check_length(&self.schema, vector)?;
        mode.validate()?;

        let probabilities = self.classify(vector)?;
        let outcome = apply_mode(&probabilities, mode)?;

        let symptom_count = vector.present_count();
        let low_confidence_input = symptom_count < self.min_symptoms;
        if low_confidence_input {
            warn!(
                "Prediction made from {} symptom(s), fewer than the advised minimum of {}",
                symptom_count, self.min_symptoms
            );
        }
        debug!("Inference ({:?}) over {} symptom(s): {:?}", mode, symptom_count, outcome);

        Ok(PredictionResult {
            outcome,
            symptom_count,
            low_confidence_input,
        })
    }

    /// Encodes `selection` and runs [`infer`](Self::infer) on the result.
    pub fn predict<I, S>(&self, selection: I, mode: InferenceMode) -> Result<PredictionResult, DiagnosisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vector = self.encode(selection)?;
        self.infer(&vector, mode)
    }
}
