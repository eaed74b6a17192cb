//! Policy resolver
//!
//! Deterministic mapping from a verdict and the column's inferred kind to a
//! [`PolicyAction`]:
//!
//! | category                         | action            |
//! |----------------------------------|-------------------|
//! | identifier                       | `remove`          |
//! | quasi-identifier, kind=date      | `mask_date`       |
//! | quasi-identifier, any other kind | `mask_text`       |
//! | financial or demographic         | `defer_for_noise` |
//! | non-sensitive                    | `none`            |
//!
//! Degraded verdicts are resolved by the [`FallbackPolicy`] before the table
//! applies.

use crate::anonymization::models::{Category, ClassificationVerdict, PolicyAction};
use crate::config::{FallbackPolicy, PipelineConfig};
use crate::domain::ScalarKind;

/// Maps verdicts to actions
#[derive(Debug, Clone, Copy)]
pub struct PolicyResolver {
    fallback: FallbackPolicy,
    drop_non_numeric_deferred: bool,
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(FallbackPolicy::default())
    }
}

impl PolicyResolver {
    /// Create a resolver with the given fallback policy
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            fallback,
            drop_non_numeric_deferred: false,
        }
    }

    /// Create a resolver from the `[pipeline]` configuration section
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            fallback: config.fallback,
            drop_non_numeric_deferred: config.drop_non_numeric_deferred,
        }
    }

    /// Remove financial/demographic columns that are not numeric instead of deferring them
    pub fn with_drop_non_numeric_deferred(mut self, enabled: bool) -> Self {
        self.drop_non_numeric_deferred = enabled;
        self
    }

    /// Fallback policy in effect
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Whether a verdict is quarantined by the fallback policy rather than the category table
    pub fn is_quarantined(&self, verdict: &ClassificationVerdict) -> bool {
        self.fallback == FallbackPolicy::FailClosed && verdict.is_degraded()
    }

    /// Resolve the action for one column
    pub fn resolve(
        &self,
        column: &str,
        verdict: &ClassificationVerdict,
        kind: ScalarKind,
    ) -> PolicyAction {
        if self.is_quarantined(verdict) {
            return PolicyAction::Remove;
        }

        match &verdict.category {
            Category::Identifier => PolicyAction::Remove,
            Category::QuasiIdentifier => match kind {
                ScalarKind::Date => PolicyAction::MaskDate,
                ScalarKind::Text | ScalarKind::Numeric => PolicyAction::MaskText,
            },
            Category::Financial | Category::Demographic => {
                if self.drop_non_numeric_deferred && kind != ScalarKind::Numeric {
                    PolicyAction::Remove
                } else {
                    PolicyAction::DeferForNoise
                }
            }
            Category::NonSensitive => PolicyAction::None,
            Category::Unrecognized(label) => {
                tracing::warn!(
                    column = %column,
                    category = %label,
                    "Unmapped category, leaving column unchanged"
                );
                PolicyAction::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn verdict(category: Category) -> ClassificationVerdict {
        ClassificationVerdict::from_oracle(category, None, String::new())
    }

    #[test_case(Category::Identifier, ScalarKind::Text, PolicyAction::Remove ; "identifier")]
    #[test_case(Category::QuasiIdentifier, ScalarKind::Date, PolicyAction::MaskDate ; "quasi date")]
    #[test_case(Category::QuasiIdentifier, ScalarKind::Text, PolicyAction::MaskText ; "quasi text")]
    #[test_case(Category::QuasiIdentifier, ScalarKind::Numeric, PolicyAction::MaskText ; "quasi numeric")]
    #[test_case(Category::Financial, ScalarKind::Numeric, PolicyAction::DeferForNoise ; "financial")]
    #[test_case(Category::Demographic, ScalarKind::Numeric, PolicyAction::DeferForNoise ; "demographic")]
    #[test_case(Category::Financial, ScalarKind::Text, PolicyAction::DeferForNoise ; "financial text")]
    #[test_case(Category::NonSensitive, ScalarKind::Text, PolicyAction::None ; "non sensitive")]
    fn test_lookup_table(category: Category, kind: ScalarKind, expected: PolicyAction) {
        let resolver = PolicyResolver::default();
        assert_eq!(resolver.resolve("col", &verdict(category), kind), expected);
    }

    #[test]
    fn test_unrecognized_category_defaults_to_none() {
        let resolver = PolicyResolver::default();
        let action = resolver.resolve(
            "col",
            &verdict(Category::Unrecognized("medical".into())),
            ScalarKind::Text,
        );
        assert_eq!(action, PolicyAction::None);
    }

    #[test]
    fn test_fail_closed_quarantines_degraded() {
        let resolver = PolicyResolver::new(FallbackPolicy::FailClosed);
        let unavailable = ClassificationVerdict::unavailable();
        assert!(resolver.is_quarantined(&unavailable));
        assert_eq!(
            resolver.resolve("col", &unavailable, ScalarKind::Text),
            PolicyAction::Remove
        );

        // Empty columns carry nothing to leak
        let empty = ClassificationVerdict::empty_sample();
        assert_eq!(
            resolver.resolve("col", &empty, ScalarKind::Text),
            PolicyAction::None
        );
    }

    #[test]
    fn test_fail_open_keeps_degraded() {
        let resolver = PolicyResolver::new(FallbackPolicy::FailOpen);
        let unclassified = ClassificationVerdict::unclassified("timeout");
        assert!(!resolver.is_quarantined(&unclassified));
        assert_eq!(
            resolver.resolve("col", &unclassified, ScalarKind::Numeric),
            PolicyAction::None
        );
    }

    #[test]
    fn test_drop_non_numeric_deferred() {
        let resolver = PolicyResolver::default().with_drop_non_numeric_deferred(true);
        assert_eq!(
            resolver.resolve("col", &verdict(Category::Financial), ScalarKind::Text),
            PolicyAction::Remove
        );
        assert_eq!(
            resolver.resolve("col", &verdict(Category::Financial), ScalarKind::Numeric),
            PolicyAction::DeferForNoise
        );
    }
}
