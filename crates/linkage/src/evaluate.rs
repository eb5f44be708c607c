use serde::{Deserialize, Serialize};

/// Policy that folds per-feature agreement into a single match decision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Every feature must agree.
    #[default]
    Perfect,
    /// At least `fraction` of the features must agree.
    MinAgreement { fraction: f64 },
}

impl MatchRule {
    /// An empty feature vector is vacuously a match under either rule.
    pub fn evaluate(&self, features: &[bool]) -> bool {
        match *self {
            Self::Perfect => eval_perfect_match(features),
            Self::MinAgreement { fraction } => {
                if features.is_empty() {
                    return true;
                }
                let agreed = features.iter().filter(|&&f| f).count();
                agreed as f64 / features.len() as f64 >= fraction
            }
        }
    }
}

pub fn eval_perfect_match(features: &[bool]) -> bool {
    features.iter().all(|&f| f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_match() {
        assert!(eval_perfect_match(&[true, true, true]));
        assert!(!eval_perfect_match(&[true, true, false]));
        assert!(!eval_perfect_match(&[true, false, false]));
        assert!(!eval_perfect_match(&[false, false, false]));
        assert!(eval_perfect_match(&[]));
    }

    #[test]
    fn min_agreement() {
        let rule = MatchRule::MinAgreement { fraction: 0.75 };
        assert!(rule.evaluate(&[true, true, true, false]));
        assert!(!rule.evaluate(&[true, true, false, false]));
        assert!(rule.evaluate(&[]));
    }

    #[test]
    fn rule_from_toml() {
        #[derive(Deserialize)]
        struct Wrap {
            rule: MatchRule,
        }
        let w: Wrap = toml::from_str(r#"rule = "perfect""#).unwrap();
        assert_eq!(w.rule, MatchRule::Perfect);
        let w: Wrap = toml::from_str("rule = { min_agreement = { fraction = 0.5 } }").unwrap();
        assert_eq!(w.rule, MatchRule::MinAgreement { fraction: 0.5 });
    }
}
