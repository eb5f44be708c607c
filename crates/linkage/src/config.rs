use std::collections::HashSet;

use serde::Deserialize;

use crate::compare::{Comparator, FeatureSet, SimilarityMeasure, DEFAULT_THRESHOLD};
use crate::error::LinkageError;
use crate::evaluate::MatchRule;
use crate::model::Dataset;
use crate::pass::PassSpec;
use crate::standardize::NameOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LinkageConfig {
    pub name: String,
    pub id_column: String,
    #[serde(default)]
    pub standardize: Option<StandardizeConfig>,
    pub passes: Vec<PassConfig>,
}

// ---------------------------------------------------------------------------
// Standardization
// ---------------------------------------------------------------------------

/// Name columns cleaned with [`crate::standardize::standardize_name`] before any pass runs.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardizeConfig {
    pub columns: Vec<String>,
    #[serde(flatten)]
    pub options: NameOptions,
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PassConfig {
    pub name: String,
    pub blocks: Vec<String>,
    pub features: Vec<FeatureConfig>,
    #[serde(default)]
    pub rule: MatchRule,
    #[serde(default)]
    pub cluster_ratio: Option<f64>,
}

impl PassConfig {
    /// Resolve column names against a dataset schema.
    pub fn to_spec(&self, dataset: &Dataset) -> Result<PassSpec, LinkageError> {
        let mut features = FeatureSet::new();
        for feature in &self.features {
            let col = dataset.column_index(&feature.column)?;
            features.insert(col, feature.comparator());
        }
        Ok(PassSpec {
            block_columns: self.blocks.clone(),
            features,
            rule: self.rule,
            cluster_ratio: self.cluster_ratio,
        })
    }
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureConfig {
    pub column: String,
    pub comparator: ComparatorKind,
    #[serde(default)]
    pub measure: SimilarityMeasure,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    Exact,
    Fuzzy,
    FourChar,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl FeatureConfig {
    pub fn comparator(&self) -> Comparator {
        match self.comparator {
            ComparatorKind::Exact => Comparator::Exact,
            ComparatorKind::Fuzzy => Comparator::fuzzy_with(self.measure, self.threshold),
            ComparatorKind::FourChar => Comparator::FourChar,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

fn unit_interval(what: &str, pass: &str, value: f64) -> Result<(), LinkageError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LinkageError::ConfigValidation(format!(
            "pass '{pass}': {what} must be within [0, 1], got {value}"
        )))
    }
}

impl LinkageConfig {
    pub fn from_toml(input: &str) -> Result<Self, LinkageError> {
        let config: LinkageConfig =
            toml::from_str(input).map_err(|e| LinkageError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinkageError> {
        if self.passes.is_empty() {
            return Err(LinkageError::ConfigValidation(
                "at least one pass is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for pass in &self.passes {
            if !names.insert(pass.name.as_str()) {
                return Err(LinkageError::ConfigValidation(format!(
                    "duplicate pass name '{}'",
                    pass.name
                )));
            }

            if pass.blocks.is_empty() {
                return Err(LinkageError::ConfigValidation(format!(
                    "pass '{}': at least one block column is required",
                    pass.name
                )));
            }

            if pass.features.is_empty() {
                return Err(LinkageError::ConfigValidation(format!(
                    "pass '{}': at least one feature is required",
                    pass.name
                )));
            }

            let mut columns = HashSet::new();
            for feature in &pass.features {
                if !columns.insert(feature.column.as_str()) {
                    return Err(LinkageError::ConfigValidation(format!(
                        "pass '{}': column '{}' has more than one feature",
                        pass.name, feature.column
                    )));
                }
                unit_interval("threshold", &pass.name, feature.threshold)?;
            }

            if let Some(ratio) = pass.cluster_ratio {
                unit_interval("cluster_ratio", &pass.name, ratio)?;
            }
            if let MatchRule::MinAgreement { fraction } = pass.rule {
                unit_interval("min_agreement fraction", &pass.name, fraction)?;
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::standardize::NameCase;

    const VALID: &str = r#"
name = "MPI nightly"
id_column = "ID"

[[passes]]
name = "zip"
blocks = ["ZIP"]

[[passes.features]]
column = "FIRST"
comparator = "four_char"

[[passes.features]]
column = "LAST"
comparator = "fuzzy"
measure = "levenshtein"
threshold = 0.8

[[passes]]
name = "birthdate"
blocks = ["BIRTHDATE"]
rule = { min_agreement = { fraction = 0.5 } }
cluster_ratio = 0.75

[[passes.features]]
column = "LAST"
comparator = "exact"
"#;

    #[test]
    fn parse_valid() {
        let config = LinkageConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "MPI nightly");
        assert_eq!(config.id_column, "ID");
        assert!(config.standardize.is_none());
        assert_eq!(config.passes.len(), 2);

        let zip = &config.passes[0];
        assert_eq!(zip.rule, MatchRule::Perfect);
        assert_eq!(zip.cluster_ratio, None);
        assert_eq!(zip.features[0].comparator, ComparatorKind::FourChar);
        assert_eq!(zip.features[1].measure, SimilarityMeasure::Levenshtein);
        assert_eq!(zip.features[1].threshold, 0.8);

        let dob = &config.passes[1];
        assert_eq!(dob.rule, MatchRule::MinAgreement { fraction: 0.5 });
        assert_eq!(dob.cluster_ratio, Some(0.75));
    }

    #[test]
    fn fuzzy_defaults() {
        let input = VALID.replace("measure = \"levenshtein\"\nthreshold = 0.8\n", "");
        let config = LinkageConfig::from_toml(&input).unwrap();
        let f = &config.passes[0].features[1];
        assert_eq!(f.measure, SimilarityMeasure::JaroWinkler);
        assert_eq!(f.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn parse_standardize_section() {
        let input = format!(
            r#"{VALID}
[standardize]
columns = ["FIRST", "LAST"]
case = "title"
"#
        );
        let config = LinkageConfig::from_toml(&input).unwrap();
        let s = config.standardize.unwrap();
        assert_eq!(s.columns, vec!["FIRST", "LAST"]);
        assert_eq!(s.options.case, NameCase::Title);
        assert!(s.options.trim);
        assert!(s.options.remove_numbers);
    }

    #[test]
    fn to_spec_resolves_columns() {
        let config = LinkageConfig::from_toml(VALID).unwrap();
        let data = Dataset::new(
            vec!["ID".into(), "FIRST".into(), "LAST".into(), "ZIP".into()],
            vec![vec![Value::Int(1), "a".into(), "b".into(), "c".into()]],
            "ID",
        )
        .unwrap();
        let spec = config.passes[0].to_spec(&data).unwrap();
        assert_eq!(spec.block_columns, vec!["ZIP"]);
        let cols: Vec<usize> = spec.features.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, vec![1, 2]);

        let err = config.passes[1].to_spec(&data).and_then(|s| s.validate(&data));
        assert_eq!(
            err.unwrap_err(),
            LinkageError::MissingColumn {
                column: "BIRTHDATE".into()
            }
        );
    }

    #[test]
    fn reject_no_passes() {
        let err = LinkageConfig::from_toml("name = \"x\"\nid_column = \"ID\"\npasses = []\n")
            .unwrap_err();
        assert!(err.to_string().contains("at least one pass"));
    }

    #[test]
    fn reject_unknown_comparator() {
        let input = VALID.replace("\"four_char\"", "\"soundex\"");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, LinkageError::ConfigParse(_)));
    }

    #[test]
    fn reject_bad_threshold() {
        let input = VALID.replace("threshold = 0.8", "threshold = 8.0");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("threshold must be within [0, 1]"));
    }

    #[test]
    fn reject_bad_cluster_ratio() {
        let input = VALID.replace("cluster_ratio = 0.75", "cluster_ratio = -0.1");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("cluster_ratio"));
    }

    #[test]
    fn reject_duplicate_feature_column() {
        let input = VALID.replace("column = \"FIRST\"", "column = \"LAST\"");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("more than one feature"));
    }

    #[test]
    fn reject_duplicate_pass_name() {
        let input = VALID.replace("name = \"birthdate\"", "name = \"zip\"");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("duplicate pass name 'zip'"));
    }

    #[test]
    fn reject_empty_blocks() {
        let input = VALID.replace("blocks = [\"ZIP\"]", "blocks = []");
        let err = LinkageConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("block column"));
    }
}
