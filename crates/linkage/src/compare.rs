//! Column-level feature comparators.
//!
//! Each comparator looks at one column of two records and answers "does this
//! feature agree". Comparators are total: null, empty, or missing values yield
//! a defined boolean and never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LinkageError;
use crate::model::Value;

/// Similarity threshold used when a fuzzy comparator does not name one.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Number of leading characters compared by [`Comparator::FourChar`].
const PREFIX_LEN: usize = 4;

/// Caller-supplied comparator: `(record_a, record_b, column) -> agrees`.
pub type FeatureFn = fn(&[Value], &[Value], usize) -> bool;

// ---------------------------------------------------------------------------
// Similarity measures
// ---------------------------------------------------------------------------

/// String similarity measure, normalized to `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMeasure {
    #[default]
    #[serde(alias = "JaroWinkler")]
    JaroWinkler,
    #[serde(alias = "Jaro")]
    Jaro,
    #[serde(alias = "Levenshtein")]
    Levenshtein,
    #[serde(alias = "DamerauLevenshtein")]
    DamerauLevenshtein,
}

impl SimilarityMeasure {
    pub fn similarity(self, a: &str, b: &str) -> f64 {
        // Two blanks are identical by convention, regardless of measure.
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        match self {
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
            Self::Jaro => strsim::jaro(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::DamerauLevenshtein => strsim::normalized_damerau_levenshtein(a, b),
        }
    }
}

impl std::fmt::Display for SimilarityMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JaroWinkler => write!(f, "jaro_winkler"),
            Self::Jaro => write!(f, "jaro"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::DamerauLevenshtein => write!(f, "damerau_levenshtein"),
        }
    }
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum Comparator {
    Exact,
    Fuzzy {
        measure: SimilarityMeasure,
        threshold: f64,
    },
    FourChar,
    Custom(FeatureFn),
}

impl Comparator {
    /// Fuzzy comparator with the default measure and threshold.
    pub fn fuzzy() -> Self {
        Self::Fuzzy {
            measure: SimilarityMeasure::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn fuzzy_with(measure: SimilarityMeasure, threshold: f64) -> Self {
        Self::Fuzzy { measure, threshold }
    }

    pub fn compare(&self, a: &[Value], b: &[Value], col: usize) -> bool {
        match *self {
            Self::Exact => feature_match_exact(a, b, col),
            Self::Fuzzy { measure, threshold } => {
                feature_match_fuzzy_string(a, b, col, measure, threshold)
            }
            Self::FourChar => feature_match_four_char(a, b, col),
            Self::Custom(f) => f(a, b, col),
        }
    }
}

/// Exact equality. Two nulls carry no matching information and do not agree.
pub fn feature_match_exact(a: &[Value], b: &[Value], col: usize) -> bool {
    match (&a[col], &b[col]) {
        (Value::Null, _) | (_, Value::Null) => false,
        (x, y) => x == y,
    }
}

/// Similarity of the two text forms meets `threshold`. Null never agrees.
pub fn feature_match_fuzzy_string(
    a: &[Value],
    b: &[Value],
    col: usize,
    measure: SimilarityMeasure,
    threshold: f64,
) -> bool {
    match (a[col].as_text(), b[col].as_text()) {
        (Some(x), Some(y)) => measure.similarity(&x, &y) >= threshold,
        _ => false,
    }
}

/// First four characters equal ignoring case; shorter values compare on their full length.
pub fn feature_match_four_char(a: &[Value], b: &[Value], col: usize) -> bool {
    let folded = |s: &str| -> String {
        s.chars().take(PREFIX_LEN).flat_map(char::to_lowercase).collect()
    };
    match (a[col].as_text(), b[col].as_text()) {
        (Some(x), Some(y)) => folded(&x) == folded(&y),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Feature set
// ---------------------------------------------------------------------------

/// Comparator table keyed by column index, passed explicitly into each pass.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    features: BTreeMap<usize, Comparator>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, col: usize, comparator: Comparator) -> Self {
        self.features.insert(col, comparator);
        self
    }

    pub fn insert(&mut self, col: usize, comparator: Comparator) -> Option<Comparator> {
        self.features.insert(col, comparator)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Comparator)> {
        self.features.iter().map(|(col, cmp)| (*col, cmp))
    }

    /// Every key must be a column of a `width`-wide record.
    pub fn validate(&self, width: usize) -> Result<(), LinkageError> {
        match self.features.keys().find(|&&col| col >= width) {
            Some(col) => Err(LinkageError::InvalidArgument(format!(
                "feature column {col} out of range for {width}-column records"
            ))),
            None => Ok(()),
        }
    }

    /// Per-feature agreement between two records, in column order.
    pub fn compare(&self, a: &[Value], b: &[Value]) -> Vec<bool> {
        self.features
            .iter()
            .map(|(&col, cmp)| cmp.compare(a, b, col))
            .collect()
    }
}

impl FromIterator<(usize, Comparator)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (usize, Comparator)>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
