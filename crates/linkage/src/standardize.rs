//! Light name clean-up applied before records reach linkage.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCase {
    #[default]
    Upper,
    Lower,
    Title,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameOptions {
    #[serde(default = "default_true")]
    pub trim: bool,
    #[serde(default)]
    pub case: NameCase,
    #[serde(default = "default_true")]
    pub remove_numbers: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NameOptions {
    fn default() -> Self {
        Self {
            trim: true,
            case: NameCase::Upper,
            remove_numbers: true,
        }
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Strip punctuation, then optionally drop digits, trim, and force a case.
pub fn standardize_name(raw: &str, options: &NameOptions) -> String {
    let mut cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .filter(|c| !(options.remove_numbers && c.is_numeric()))
        .collect();

    if options.trim {
        cleaned = cleaned.trim().to_string();
    }

    match options.case {
        NameCase::Upper => cleaned.to_uppercase(),
        NameCase::Lower => cleaned.to_lowercase(),
        NameCase::Title => title_case(&cleaned),
    }
}

pub fn standardize_names(raw: &[&str], options: &NameOptions) -> Vec<String> {
    raw.iter().map(|n| standardize_name(n, options)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_upper_trim_no_digits() {
        let opts = NameOptions::default();
        assert_eq!(standardize_name(" Johnny T. Walker ", &opts), "JOHNNY T WALKER");
        assert_eq!(standardize_name("Paul2 McCartney1", &opts), "PAUL MCCARTNEY");
        assert_eq!(standardize_name("O'Brien-Smith", &opts), "OBRIENSMITH");
    }

    #[test]
    fn keep_numbers_and_spacing() {
        let opts = NameOptions {
            trim: false,
            case: NameCase::Lower,
            remove_numbers: false,
        };
        assert_eq!(standardize_name(" Louis XIV 14 ", &opts), " louis xiv 14 ");
    }

    #[test]
    fn title_casing() {
        let opts = NameOptions {
            case: NameCase::Title,
            ..NameOptions::default()
        };
        assert_eq!(
            standardize_names(&["mary ANN", "de la cruz"], &opts),
            vec!["Mary Ann", "De La Cruz"]
        );
    }
}
