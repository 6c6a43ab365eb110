use std::collections::HashMap;
use log::debug;

use super::error::DiagnosisError;

/// Reduces a raw symptom column name to its canonical form.
///
/// The policy is fixed: surrounding whitespace is trimmed, ASCII letters are
/// lowercased, whitespace runs become `_`, parentheses are dropped, runs of
/// `_` collapse into one, and leading or trailing `_` are stripped. Other
/// characters (including pandas-style `.1` suffixes) are kept as they are.
///
/// ```
/// use symptomatic::canonical_symptom_name;
///
/// assert_eq!(canonical_symptom_name("dischromic _patches"), "dischromic_patches");
/// assert_eq!(canonical_symptom_name("toxic_look_(typhos)"), "toxic_look_typhos");
/// assert_eq!(canonical_symptom_name("fluid_overload.1"), "fluid_overload.1");
/// ```
pub fn canonical_symptom_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let c = if c.is_whitespace() { '_' } else { c.to_ascii_lowercase() };
        match c {
            '(' | ')' => {}
            '_' if out.ends_with('_') => {}
            _ => out.push(c),
        }
    }
    out.trim_matches('_').to_string()
}

/// The fixed, ordered list of symptom names a classifier was trained on.
///
/// Built once from the artifact's feature ordering and immutable afterwards.
/// Names are canonicalized at construction; the artifact's original spelling
/// of each name stays resolvable as an alias, so request-time lookup is a
/// single exact map hit.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Builds a schema from the feature ordering of a model artifact.
    ///
    /// # Errors
    /// * `SchemaError` if the ordering is empty, contains a name that is empty
    ///   after canonicalization, or two names collapse to the same canonical form
    pub fn new<I, S>(ordering: I) -> Result<Self, DiagnosisError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut index = HashMap::new();
        let mut aliases = Vec::new();

        for (position, raw) in ordering.into_iter().enumerate() {
            let raw = raw.as_ref();
            let canonical = canonical_symptom_name(raw);
            if canonical.is_empty() {
                return Err(DiagnosisError::SchemaError(
                    format!("Feature {} has an empty name ({:?})", position, raw)
                ));
            }
            if let Some(&existing) = index.get(&canonical) {
                return Err(DiagnosisError::SchemaError(format!(
                    "Feature '{}' at index {} duplicates '{}' at index {}",
                    raw, position, names[existing], existing
                )));
            }
            if canonical != raw {
                debug!("Canonicalized feature '{}' -> '{}'", raw, canonical);
                aliases.push((raw.to_string(), position));
            }
            index.insert(canonical.clone(), position);
            names.push(canonical);
        }

        if names.is_empty() {
            return Err(DiagnosisError::SchemaError("Feature ordering cannot be empty".into()));
        }

        // A raw spelling may coincide with another feature's canonical name;
        // the canonical entry wins.
        for (alias, position) in aliases {
            index.entry(alias).or_insert(position);
        }

        Ok(Self { names, index })
    }

    /// Returns the fixed index of a symptom.
    pub fn index_of(&self, name: &str) -> Result<usize, DiagnosisError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| DiagnosisError::UnknownSymptom(name.to_string()))
    }

    /// Number of features (N).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Canonical name stored at `index`, if in range.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Canonical names in feature order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Every name in `selection` that the schema cannot resolve, sorted and
    /// without duplicates.
    pub fn unknown<I, S>(&self, selection: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unknown: Vec<String> = selection
            .into_iter()
            .filter(|name| !self.contains(name.as_ref()))
            .map(|name| name.as_ref().to_string())
            .collect();
        unknown.sort();
        unknown.dedup();
        unknown
    }
}
