//! Classification verdicts and policy actions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensitivity category of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Uniquely identifies a person on its own (name, CPF, e-mail)
    Identifier,
    /// Re-identifies in combination with other fields (postal code, birth date)
    QuasiIdentifier,
    /// Monetary magnitudes (salary, balance)
    Financial,
    /// Demographic magnitudes (age, household size)
    Demographic,
    /// Safe to release as is
    NonSensitive,
    /// Label the oracle returned that maps to none of the above
    Unrecognized(String),
}

impl Category {
    /// Parse a category label in English or Portuguese
    ///
    /// Matching ignores case, accents, spaces and hyphens. Unknown labels are
    /// preserved as [`Category::Unrecognized`].
    ///
    /// ```
    /// use sheetguard::anonymization::models::Category;
    ///
    /// assert_eq!(Category::parse("Quasi-Identifier"), Category::QuasiIdentifier);
    /// assert_eq!(Category::parse("demográfico"), Category::Demographic);
    /// assert_eq!(Category::parse("texto"), Category::NonSensitive);
    /// ```
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(fold_accent)
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match key.as_str() {
            "identifier" | "direct_identifier" | "identificador" => Self::Identifier,
            "quasi_identifier" | "quasiidentifier" | "quase_identificador"
            | "quasi_identificador" => Self::QuasiIdentifier,
            "financial" | "financeiro" => Self::Financial,
            "demographic" | "demografico" => Self::Demographic,
            "non_sensitive" | "nonsensitive" | "not_sensitive" | "none" | "text" | "texto"
            | "nao_sensivel" => Self::NonSensitive,
            _ => Self::Unrecognized(label.trim().to_string()),
        }
    }

    /// Sensitivity implied by the category, if the category is known
    pub fn implied_sensitivity(&self) -> Option<bool> {
        match self {
            Self::Identifier | Self::QuasiIdentifier | Self::Financial | Self::Demographic => {
                Some(true)
            }
            Self::NonSensitive => Some(false),
            Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::QuasiIdentifier => write!(f, "quasi_identifier"),
            Self::Financial => write!(f, "financial"),
            Self::Demographic => write!(f, "demographic"),
            Self::NonSensitive => write!(f, "non_sensitive"),
            Self::Unrecognized(label) => write!(f, "unrecognized({label})"),
        }
    }
}

pub(crate) fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}

/// How a verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictProvenance {
    /// Taken from the oracle as returned
    Oracle,
    /// Oracle answer whose sensitivity flag contradicted its category
    Normalized,
    /// Column had no values, oracle not consulted
    EmptySample,
    /// Oracle answered but the answer could not be parsed
    Unavailable,
    /// Oracle could not be reached, timed out, refused, or the call was cancelled
    Unclassified,
}

impl fmt::Display for VerdictProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Oracle => "oracle",
            Self::Normalized => "normalized",
            Self::EmptySample => "empty_sample",
            Self::Unavailable => "unavailable",
            Self::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

/// Outcome of classifying one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    /// Sensitivity category
    pub category: Category,
    /// Whether the column is sensitive, always consistent with `category`
    pub sensitive: bool,
    /// Free-text justification
    pub rationale: String,
    /// How the verdict was reached
    pub provenance: VerdictProvenance,
}

impl ClassificationVerdict {
    /// Build a verdict from an oracle answer, deriving the sensitivity flag from the category
    ///
    /// A claimed flag that contradicts the category is overridden and the verdict is
    /// marked [`VerdictProvenance::Normalized`]. For unrecognized categories the claimed
    /// flag is kept, defaulting to sensitive when absent.
    pub fn from_oracle(category: Category, claimed: Option<bool>, rationale: String) -> Self {
        let (sensitive, provenance) = match (category.implied_sensitivity(), claimed) {
            (Some(implied), Some(claimed)) if implied != claimed => {
                (implied, VerdictProvenance::Normalized)
            }
            (Some(implied), _) => (implied, VerdictProvenance::Oracle),
            (None, claimed) => (claimed.unwrap_or(true), VerdictProvenance::Oracle),
        };

        Self {
            category,
            sensitive,
            rationale,
            provenance,
        }
    }

    /// Verdict for a column with no non-null values
    pub fn empty_sample() -> Self {
        Self::degraded("column has no values", VerdictProvenance::EmptySample)
    }

    /// Verdict for an oracle answer that could not be parsed
    pub fn unavailable() -> Self {
        Self::degraded("classification unavailable", VerdictProvenance::Unavailable)
    }

    /// Verdict for a column the oracle never answered for
    pub fn unclassified(reason: impl fmt::Display) -> Self {
        Self::degraded(
            format!("unclassified: {reason}"),
            VerdictProvenance::Unclassified,
        )
    }

    fn degraded(rationale: impl Into<String>, provenance: VerdictProvenance) -> Self {
        Self {
            category: Category::NonSensitive,
            sensitive: false,
            rationale: rationale.into(),
            provenance,
        }
    }

    /// Whether the oracle failed to produce a usable answer for this column
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.provenance,
            VerdictProvenance::Unavailable | VerdictProvenance::Unclassified
        )
    }
}

/// Transformation applied to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    /// Drop the column
    Remove,
    /// Keep a short prefix of each value followed by a marker
    MaskText,
    /// Reset each date to the first day of its month
    MaskDate,
    /// Pass through now, add Laplace noise once a budget is supplied
    DeferForNoise,
    /// Pass through unchanged
    None,
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Remove => "remove",
            Self::MaskText => "mask_text",
            Self::MaskDate => "mask_date",
            Self::DeferForNoise => "defer_for_noise",
            Self::None => "none",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("identifier", Category::Identifier ; "english identifier")]
    #[test_case("identificador", Category::Identifier ; "portuguese identifier")]
    #[test_case("quase_identificador", Category::QuasiIdentifier ; "portuguese quasi")]
    #[test_case("quasi identifier", Category::QuasiIdentifier ; "spaced quasi")]
    #[test_case("FINANCEIRO", Category::Financial ; "uppercase financial")]
    #[test_case("demografico", Category::Demographic ; "portuguese demographic")]
    #[test_case("non-sensitive", Category::NonSensitive ; "hyphenated non sensitive")]
    #[test_case("texto", Category::NonSensitive ; "portuguese text")]
    fn test_category_parse(label: &str, expected: Category) {
        assert_eq!(Category::parse(label), expected);
    }

    #[test]
    fn test_unknown_category_preserved() {
        assert_eq!(
            Category::parse(" medical "),
            Category::Unrecognized("medical".to_string())
        );
    }

    #[test]
    fn test_inconsistent_flag_normalized() {
        let verdict =
            ClassificationVerdict::from_oracle(Category::Identifier, Some(false), "CPF".into());
        assert!(verdict.sensitive);
        assert_eq!(verdict.provenance, VerdictProvenance::Normalized);

        let verdict =
            ClassificationVerdict::from_oracle(Category::NonSensitive, Some(true), "id".into());
        assert!(!verdict.sensitive);
        assert_eq!(verdict.provenance, VerdictProvenance::Normalized);
    }

    #[test]
    fn test_missing_flag_derived() {
        let verdict = ClassificationVerdict::from_oracle(Category::Financial, None, "".into());
        assert!(verdict.sensitive);
        assert_eq!(verdict.provenance, VerdictProvenance::Oracle);
    }

    #[test]
    fn test_degraded_verdicts() {
        assert!(ClassificationVerdict::unavailable().is_degraded());
        assert!(ClassificationVerdict::unclassified("timeout").is_degraded());
        assert!(!ClassificationVerdict::empty_sample().is_degraded());
        assert_eq!(
            ClassificationVerdict::unavailable().rationale,
            "classification unavailable"
        );
        assert!(!ClassificationVerdict::unavailable().sensitive);
    }
}
