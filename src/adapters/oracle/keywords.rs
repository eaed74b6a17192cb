//! Offline keyword oracle
//!
//! Classifies columns from a TOML rule library: header keywords first, then the
//! shape of sampled values (CPF, CNPJ, e-mail, phone, CEP). Needs no network and
//! is deterministic, which makes it the backend of choice for air-gapped runs.

use super::ClassificationOracle;
use crate::anonymization::models::verdict::fold_accent;
use crate::anonymization::models::{Category, ColumnProfile};
use crate::domain::OracleError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Rule definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct RuleDefinition {
    category: String,
    rationale: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct KeywordLibrary {
    rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    category: Category,
    rationale: String,
    names: Vec<Regex>,
    values: Vec<Regex>,
}

/// Rule-based oracle driven by a keyword library
#[derive(Debug, Clone)]
pub struct KeywordOracle {
    rules: Vec<CompiledRule>,
}

impl KeywordOracle {
    /// Load the keyword library embedded in the binary
    pub fn builtin() -> Result<Self> {
        let default_toml = include_str!("../../../patterns/column_keywords.toml");
        Self::from_toml(default_toml)
    }

    /// Load a keyword library from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read keyword library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Build an oracle from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: KeywordLibrary =
            toml::from_str(content).context("Failed to parse keyword library TOML")?;

        let mut rules = Vec::with_capacity(library.rules.len());
        for def in library.rules {
            let category = Category::parse(&def.category);
            if let Category::Unrecognized(ref label) = category {
                anyhow::bail!("Unknown category in keyword library: {label}");
            }

            let compile = |patterns: &[String]| -> Result<Vec<Regex>> {
                patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).with_context(|| {
                            format!("Invalid regex for category '{}': {p}", def.category)
                        })
                    })
                    .collect()
            };

            rules.push(CompiledRule {
                names: compile(&def.names)?,
                values: compile(&def.values)?,
                category,
                rationale: def.rationale,
            });
        }

        Ok(Self { rules })
    }

    /// Number of rules loaded
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn normalize_header(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .map(fold_accent)
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect()
    }

    /// Pick a category for the profile, returning it with a rationale
    fn evaluate(&self, profile: &ColumnProfile) -> (Category, String) {
        let header = Self::normalize_header(&profile.name);

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.names.iter().any(|re| re.is_match(&header)))
        {
            return (rule.category.clone(), rule.rationale.clone());
        }

        if !profile.sample.is_empty() {
            for rule in &self.rules {
                let matching = profile
                    .sample
                    .iter()
                    .filter(|v| rule.values.iter().any(|re| re.is_match(v.trim())))
                    .count();
                if matching * 2 > profile.sample.len() {
                    return (
                        rule.category.clone(),
                        format!("{matching} of {} sampled values match", profile.sample.len()),
                    );
                }
            }
        }

        (
            Category::NonSensitive,
            "No keyword or value pattern matched".to_string(),
        )
    }
}

#[async_trait]
impl ClassificationOracle for KeywordOracle {
    fn name(&self) -> &str {
        "keywords"
    }

    async fn classify(&self, profile: &ColumnProfile) -> std::result::Result<String, OracleError> {
        let (category, rationale) = self.evaluate(profile);
        let sensitive = category.implied_sensitivity().unwrap_or(true);

        serde_json::to_string(&serde_json::json!({
            "category": category.to_string(),
            "sensitive": sensitive,
            "rationale": rationale,
        }))
        .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }
}
