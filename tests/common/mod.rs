#![allow(dead_code)]

use std::collections::HashMap;
use symptomatic::{
    ClassProbabilities, DiagnosisEngine, DiagnosisError, FeatureSchema, FeatureVector,
    ProbabilisticClassifier,
};

/// Feature ordering of the reference deployment's disease model.
pub const REFERENCE_SYMPTOMS: [&str; 132] = [
    "loss_of_smell", "internal_itching", "hip_joint_pain", "increased_appetite", "malaise",
    "inflammatory_nails", "enlarged_thyroid", "blood_in_sputum", "yellow_crust_ooze",
    "nodal_skin_eruptions", "unsteadiness", "irritability", "weight_loss", "prominent_veins_on_calf",
    "fluid_overload.1", "depression", "lack_of_concentration", "muscle_pain", "mild_fever",
    "neck_pain", "altered_sensorium", "back_pain", "slurred_speech", "movement_stiffness",
    "shivering", "belly_pain", "continuous_feel_of_urine", "itching", "rusty_sputum",
    "receiving_unsterile_injections", "patches_in_throat", "dark_urine", "nausea", "family_history",
    "stomach_pain", "loss_of_appetite", "stomach_bleeding", "pus_filled_pimples", "bloody_stool",
    "sunken_eyes", "breathlessness", "dischromic_patches", "abdominal_pain", "continuous_sneezing",
    "knee_pain", "dehydration", "blackheads", "sweating", "burning_micturition", "joint_pain",
    "weakness_of_one_body_side", "red_spots_over_body", "extra_marital_contacts", "chest_pain",
    "spinning_movements", "diarrhoea", "bladder_discomfort", "high_fever", "red_sore_around_nose",
    "yellowing_of_eyes", "yellowish_skin", "watering_from_eyes", "indigestion", "headache",
    "skin_peeling", "constipation", "scurring", "pain_behind_the_eyes", "silver_like_dusting",
    "cough", "vomiting", "skin_rash", "blister", "small_dents_in_nails", "chills", "acidity",
    "ulcers_on_tongue", "muscle_wasting", "spotting_urination", "irregular_sugar_level",
    "fatigue", "weight_gain", "anxiety", "cold_hands_and_feets", "mood_swings", "restlessness",
    "lethargy", "yellow_urine", "throat_irritation", "acute_liver_failure", "loss_of_balance",
    "excessive_hunger", "drying_and_tingling_lips", "palpitations", "history_of_alcohol_consumption",
    "muscle_weakness", "stiff_neck", "swelling_joints", "distention_of_abdomen", "coma",
    "brittle_nails", "foul_smell_of_urine", "passage_of_gases", "receiving_blood_transfusion",
    "toxic_look_typhos", "visual_disturbances", "mucoid_sputum", "polyuria", "abnormal_menstruation",
    "swollen_extremeties", "painful_walking", "fluid_overload", "weakness_in_limbs", "swelling_of_stomach",
    "swelled_lymph_nodes", "blurred_and_distorted_vision", "phlegm", "redness_of_eyes",
    "sinus_pressure", "runny_nose", "congestion", "fast_heart_rate", "puffy_face_and_eyes",
    "pain_during_bowel_movements", "pain_in_anal_region", "irritation_in_anus", "dizziness",
    "bruising", "obesity", "swollen_legs", "swollen_blood_vessels", "cramps",
];

/// Returns the same distribution for every input.
#[derive(Debug)]
pub struct FixedClassifier {
    labels: Vec<String>,
    scores: HashMap<String, f32>,
    input_len: usize,
}

impl FixedClassifier {
    pub fn new(input_len: usize, scores: &[(&str, f32)]) -> Self {
        Self {
            labels: scores.iter().map(|(l, _)| l.to_string()).collect(),
            scores: scores.iter().map(|(l, p)| (l.to_string(), *p)).collect(),
            input_len,
        }
    }
}

impl ProbabilisticClassifier for FixedClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        ClassProbabilities::new(self.scores.clone())
    }
}

/// Scores each disease by how many of its characteristic symptoms are set,
/// normalized to sum to one. A disease with no matches keeps weight 1.
#[derive(Debug)]
pub struct OverlapClassifier {
    labels: Vec<String>,
    profiles: Vec<Vec<usize>>,
    input_len: usize,
}

impl OverlapClassifier {
    pub fn new(schema: &FeatureSchema, diseases: &[(&str, &[&str])]) -> Self {
        Self {
            labels: diseases.iter().map(|(l, _)| l.to_string()).collect(),
            profiles: diseases
                .iter()
                .map(|(_, symptoms)| {
                    symptoms.iter().map(|s| schema.index_of(s).expect("known symptom")).collect()
                })
                .collect(),
            input_len: schema.size(),
        }
    }
}

impl ProbabilisticClassifier for OverlapClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        let values = features.as_array();
        let weights: Vec<f32> = self.profiles
            .iter()
            .map(|profile| 1.0 + profile.iter().map(|&i| values[i]).sum::<f32>() * 4.0)
            .collect();
        let total: f32 = weights.iter().sum();
        ClassProbabilities::new(
            self.labels.iter().cloned().zip(weights.iter().map(|w| w / total)).collect()
        )
    }
}

/// Always fails, as a broken model artifact would.
#[derive(Debug)]
pub struct FailingClassifier {
    labels: Vec<String>,
    input_len: usize,
}

impl FailingClassifier {
    pub fn new(input_len: usize) -> Self {
        Self { labels: vec!["flu".to_string()], input_len }
    }
}

impl ProbabilisticClassifier for FailingClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_len(&self) -> usize {
        self.input_len
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<ClassProbabilities, DiagnosisError> {
        Err(DiagnosisError::ClassifierInvocation("session run failed".into()))
    }
}

pub fn flu_engine() -> DiagnosisEngine {
    DiagnosisEngine::builder()
        .with_schema(FeatureSchema::new(["cough", "fever", "headache"]).unwrap())
        .with_classifier(FixedClassifier::new(3, &[("flu", 0.7), ("cold", 0.3)]))
        .build()
        .expect("Failed to create engine")
}

pub fn reference_engine() -> DiagnosisEngine {
    let schema = FeatureSchema::new(REFERENCE_SYMPTOMS).unwrap();
    let classifier = OverlapClassifier::new(&schema, &[
        ("Fungal infection", &["itching", "skin_rash", "nodal_skin_eruptions", "dischromic_patches"]),
        ("Allergy", &["continuous_sneezing", "shivering", "chills", "watering_from_eyes"]),
        ("Common Cold", &["continuous_sneezing", "chills", "fatigue", "cough", "high_fever", "headache", "runny_nose"]),
        ("Typhoid", &["chills", "vomiting", "fatigue", "high_fever", "nausea", "constipation", "toxic_look_typhos"]),
        ("Migraine", &["acidity", "indigestion", "headache", "blurred_and_distorted_vision", "depression"]),
    ]);
    DiagnosisEngine::builder()
        .with_schema(schema)
        .with_classifier(classifier)
        .build()
        .expect("Failed to create engine")
}
