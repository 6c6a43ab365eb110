use std::collections::BTreeSet;
use ndarray::Array1;

use super::error::DiagnosisError;
use super::schema::FeatureSchema;

/// A binary presence/absence vector aligned to a [`FeatureSchema`].
///
/// Entry `i` is `1.0` iff the schema's `i`-th symptom was selected. Values
/// are stored as `f32` because that is what the classifier consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f32>,
}

impl FeatureVector {
    /// All-zero vector of length `len`.
    pub fn zeros(len: usize) -> Self {
        Self { values: Array1::zeros(len) }
    }

    /// Wraps caller-supplied values after checking every entry is 0 or 1.
    ///
    /// Length is not checked here; that happens against the schema at
    /// inference time.
    pub fn from_values(values: Vec<f32>) -> Result<Self, DiagnosisError> {
        if let Some(pos) = values.iter().position(|&v| v != 0.0 && v != 1.0) {
            return Err(DiagnosisError::ValidationError(
                format!("Feature {} must be 0 or 1, got {}", pos, values[pos])
            ));
        }
        Ok(Self { values: Array1::from(values) })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of entries set to 1.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|&&v| v == 1.0).count()
    }

    /// Indices of the entries set to 1, ascending.
    pub fn present_indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1.0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }
}

/// Converts symptom selections to and from schema-aligned feature vectors.
///
/// Implementors only provide access to the schema; encoding itself is shared.
/// Encoding never partially succeeds: either every name resolves and the full
/// vector is returned, or the first unresolvable name (in sorted order) is
/// reported and no vector is produced.
pub(crate) trait SymptomEncoding {
    /// Returns the schema the vectors are aligned to, if one is set
    fn schema(&self) -> Option<&FeatureSchema>;

    fn require_schema(&self) -> Result<&FeatureSchema, DiagnosisError> {
        self.schema()
            .ok_or_else(|| DiagnosisError::SchemaError("Feature schema not initialized".into()))
    }

    /// Encodes a set of symptom names.
    ///
    /// Repeated names are no-ops and iteration order does not matter. An
    /// empty selection yields the all-zero vector.
    ///
    /// # Errors
    /// - `UnknownSymptom` for the lexicographically first name the schema
    ///   cannot resolve
    fn encode_symptoms<I, S>(&self, selection: I) -> Result<FeatureVector, DiagnosisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schema = self.require_schema()?;

        // Sorting makes the reported name independent of iteration order.
        let selection: BTreeSet<String> = selection
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        let indices = selection
            .iter()
            .map(|name| schema.index_of(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut vector = FeatureVector::zeros(schema.size());
        for index in indices {
            vector.values[index] = 1.0;
        }
        Ok(vector)
    }

    /// Maps the set entries of a vector back to canonical symptom names.
    ///
    /// # Errors
    /// - `FeatureVectorMismatch` if the vector length differs from the schema size
    fn decode_symptoms(&self, vector: &FeatureVector) -> Result<BTreeSet<String>, DiagnosisError> {
        let schema = self.require_schema()?;
        check_length(schema, vector)?;
        Ok(vector
            .present_indices()
            .into_iter()
            .filter_map(|i| schema.name_at(i).map(str::to_string))
            .collect())
    }
}

pub(crate) fn check_length(schema: &FeatureSchema, vector: &FeatureVector) -> Result<(), DiagnosisError> {
    if vector.len() != schema.size() {
        return Err(DiagnosisError::FeatureVectorMismatch {
            expected: schema.size(),
            actual: vector.len(),
        });
    }
    Ok(())
}

impl SymptomEncoding for FeatureSchema {
    fn schema(&self) -> Option<&FeatureSchema> {
        Some(self)
    }
}
