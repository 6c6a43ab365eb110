use std::cmp::Ordering;
use std::collections::HashMap;
use serde::Serialize;

use super::error::DiagnosisError;

/// How class probabilities are turned into reported diagnoses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InferenceMode {
    /// Report the single most probable class
    TopOne,
    /// Report every class whose probability strictly exceeds the threshold
    Threshold(f32),
}

impl InferenceMode {
    /// Checks the threshold is a number in `[0, 1]`.
    pub fn validate(&self) -> Result<(), DiagnosisError> {
        match *self {
            Self::TopOne => Ok(()),
            Self::Threshold(t) if (0.0..=1.0).contains(&t) => Ok(()),
            Self::Threshold(t) => Err(DiagnosisError::ValidationError(
                format!("Threshold must be within [0, 1], got {}", t)
            )),
        }
    }
}

/// A disease label with the probability the classifier assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScore {
    pub label: String,
    pub probability: f32,
}

/// Descending probability, then ascending label.
fn rank(a: &ClassScore, b: &ClassScore) -> Ordering {
    b.probability
        .total_cmp(&a.probability)
        .then_with(|| a.label.cmp(&b.label))
}

/// Probability per disease label, as produced by one classifier call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassProbabilities {
    scores: HashMap<String, f32>,
}

impl ClassProbabilities {
    /// Wraps classifier output, rejecting empty distributions and any value
    /// that is not a probability in `[0, 1]`.
    ///
    /// Probabilities are not required to sum to one; that is the classifier's
    /// contract.
    pub fn new(scores: HashMap<String, f32>) -> Result<Self, DiagnosisError> {
        if scores.is_empty() {
            return Err(DiagnosisError::ClassifierInvocation(
                "Classifier returned no class probabilities".into()
            ));
        }
        if let Some((label, p)) = scores.iter().find(|(_, p)| !(0.0..=1.0).contains(*p)) {
            return Err(DiagnosisError::ClassifierInvocation(
                format!("Classifier returned an invalid probability for '{}': {}", label, p)
            ));
        }
        Ok(Self { scores })
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.scores.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// All classes, most probable first.
    pub fn ranked(&self) -> Vec<ClassScore> {
        let mut ranked: Vec<ClassScore> = self.scores
            .iter()
            .map(|(label, &probability)| ClassScore { label: label.clone(), probability })
            .collect();
        ranked.sort_by(rank);
        ranked
    }

    /// The most probable class; ties go to the label that sorts first.
    pub fn top_one(&self) -> Option<ClassScore> {
        self.scores
            .iter()
            .map(|(label, &probability)| ClassScore { label: label.clone(), probability })
            .min_by(rank)
    }

    /// Classes whose probability is strictly greater than `threshold`, ranked.
    pub fn above(&self, threshold: f32) -> Vec<ClassScore> {
        let mut selected: Vec<ClassScore> = self.scores
            .iter()
            .filter(|&(_, &p)| p > threshold)
            .map(|(label, &probability)| ClassScore { label: label.clone(), probability })
            .collect();
        selected.sort_by(rank);
        selected
    }
}

impl From<ClassProbabilities> for HashMap<String, f32> {
    fn from(probabilities: ClassProbabilities) -> Self {
        probabilities.scores
    }
}

/// What the threshold policy decided.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Top-1 mode: exactly one class
    TopOne { class: ClassScore },
    /// Threshold mode: at least one class cleared the threshold
    AboveThreshold { threshold: f32, classes: Vec<ClassScore> },
    /// Threshold mode: no class cleared the threshold
    NoneAboveThreshold { threshold: f32 },
}

/// The reported prediction for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub outcome: Outcome,
    /// Number of symptoms set in the input vector
    pub symptom_count: usize,
    /// Advisory: fewer symptoms than the configured minimum were given.
    /// Never suppresses the outcome.
    pub low_confidence_input: bool,
}

impl PredictionResult {
    /// Labels reported by the outcome, most probable first.
    pub fn labels(&self) -> Vec<&str> {
        match &self.outcome {
            Outcome::TopOne { class } => vec![class.label.as_str()],
            Outcome::AboveThreshold { classes, .. } => {
                classes.iter().map(|c| c.label.as_str()).collect()
            }
            Outcome::NoneAboveThreshold { .. } => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, Outcome::NoneAboveThreshold { .. })
    }
}

/// Applies an already validated `mode` to a probability distribution.
pub(crate) fn apply_mode(
    probabilities: &ClassProbabilities,
    mode: InferenceMode,
) -> Result<Outcome, DiagnosisError> {
    match mode {
        InferenceMode::TopOne => {
            let class = probabilities.top_one().ok_or_else(|| {
                DiagnosisError::ClassifierInvocation("Classifier returned no class probabilities".into())
            })?;
            Ok(Outcome::TopOne { class })
        }
        InferenceMode::Threshold(threshold) => {
            let classes = probabilities.above(threshold);
            if classes.is_empty() {
                Ok(Outcome::NoneAboveThreshold { threshold })
            } else {
                Ok(Outcome::AboveThreshold { threshold, classes })
            }
        }
    }
}
