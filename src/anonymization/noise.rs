//! Laplace noise injection
//!
//! Adds independent Laplace(0, sensitivity / epsilon) draws to every numeric
//! value of the deferred columns. `sensitivity` is the assumed maximum
//! contribution of a single record and defaults to 1.0; it is not calibrated
//! per column.
//!
//! Output is not reproducible: two runs with the same epsilon on the same
//! intermediate table give different final tables. Pass a seed through
//! [`NoiseInjector::with_seed`] to make runs repeatable in tests.

use crate::anonymization::models::anomaly::AnomalyCollector;
use crate::anonymization::models::{AnomalyKind, ColumnAnomaly};
use crate::anonymization::redaction::unique_name;
use crate::config::NoiseConfig;
use crate::domain::{CellValue, Column, Result, SheetguardError, Table};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Laplace;

/// Validated privacy budget
///
/// ```
/// use sheetguard::anonymization::noise::PrivacyBudget;
///
/// assert!(PrivacyBudget::new(0.5).is_ok());
/// assert!(PrivacyBudget::new(0.0).is_err());
/// assert!(PrivacyBudget::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrivacyBudget {
    epsilon: f64,
}

impl PrivacyBudget {
    /// Create a budget
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::InvalidBudget`] unless `epsilon` is finite and
    /// strictly positive.
    pub fn new(epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SheetguardError::InvalidBudget(format!(
                "epsilon must be a finite number greater than 0, got {epsilon}"
            )));
        }
        Ok(Self { epsilon })
    }

    /// The epsilon value
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// Laplace distribution centred on zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplaceMechanism {
    scale: f64,
    distribution: Laplace,
}

impl LaplaceMechanism {
    /// Mechanism with scale `sensitivity / epsilon`
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::Configuration`] unless `sensitivity` is finite
    /// and strictly positive.
    pub fn new(sensitivity: f64, budget: &PrivacyBudget) -> Result<Self> {
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(SheetguardError::Configuration(format!(
                "noise sensitivity must be a finite number greater than 0, got {sensitivity}"
            )));
        }
        let scale = sensitivity / budget.epsilon();
        let distribution = Laplace::new(0.0, scale).map_err(|e| {
            SheetguardError::Configuration(format!("invalid Laplace scale {scale}: {e}"))
        })?;
        Ok(Self {
            scale,
            distribution,
        })
    }

    /// Scale parameter `b`; the variance is `2 * b^2`
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Draw one sample
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        Distribution::sample(&self.distribution, rng)
    }
}

/// What happened to one deferred column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoisedColumn {
    /// Name in the intermediate table
    pub source: String,
    /// Name in the final table
    pub output: String,
    /// Values that received noise
    pub noised: usize,
    /// Values passed through unchanged
    pub anomalies: Vec<ColumnAnomaly>,
}

/// Output of the noise stage
#[derive(Debug, Clone, PartialEq)]
pub struct NoisedTable {
    /// Final table
    pub table: Table,
    /// One entry per deferred column, in deferral order
    pub columns: Vec<NoisedColumn>,
}

/// Adds calibrated Laplace noise to deferred columns
pub struct NoiseInjector {
    sensitivity: f64,
    round_decimals: Option<u32>,
    preserve_zeros: bool,
    noised_suffix: String,
    rng: StdRng,
}

impl Default for NoiseInjector {
    fn default() -> Self {
        Self::from_config(&NoiseConfig::default())
    }
}

impl NoiseInjector {
    /// Create an injector from the `[noise]` configuration section
    ///
    /// Seeds from `config.seed` when present, otherwise from OS entropy.
    pub fn from_config(config: &NoiseConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            sensitivity: config.sensitivity,
            round_decimals: config.round_decimals,
            preserve_zeros: config.preserve_zeros,
            noised_suffix: config.noised_suffix.clone(),
            rng,
        }
    }

    /// Use a fixed seed so that draws are repeatable
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Round noised values to `decimals` places, or keep full precision with `None`
    pub fn with_rounding(mut self, decimals: Option<u32>) -> Self {
        self.round_decimals = decimals;
        self
    }

    /// Leave exact zeros untouched
    pub fn with_preserve_zeros(mut self, preserve: bool) -> Self {
        self.preserve_zeros = preserve;
        self
    }

    /// Override the assumed single-record sensitivity
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Sensitivity in use
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Noise every numeric value of the `deferred` columns of `table`
    ///
    /// Deferred columns are renamed with the noised suffix; every other column is
    /// copied unchanged. Everything is validated before the first draw, so an
    /// error never leaves a partially noised table behind.
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::Configuration`] for an invalid sensitivity and
    /// [`SheetguardError::Validation`] when a deferred column is missing.
    pub fn inject(
        &mut self,
        table: &Table,
        deferred: &[String],
        budget: &PrivacyBudget,
    ) -> Result<NoisedTable> {
        let mechanism = LaplaceMechanism::new(self.sensitivity, budget)?;

        if let Some(missing) = deferred.iter().find(|name| table.column(name).is_none()) {
            return Err(SheetguardError::Validation(format!(
                "Deferred column '{missing}' is not in the intermediate table"
            )));
        }

        let mut taken: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
        let mut output_columns = Vec::with_capacity(table.column_count());
        let mut columns = Vec::with_capacity(deferred.len());

        for column in table.columns() {
            if !deferred.contains(&column.name) {
                output_columns.push(column.clone());
                continue;
            }

            let (values, noised, anomalies) = self.noise_column(column, &mechanism);
            let output = unique_name(format!("{}{}", column.name, self.noised_suffix), &taken);
            taken.push(output.clone());

            tracing::info!(
                column = %column.name,
                output = %output,
                noised = noised,
                skipped = column.len() - noised,
                epsilon = budget.epsilon(),
                scale = mechanism.scale(),
                "Laplace noise applied"
            );

            output_columns.push(Column::new(output.clone(), values));
            columns.push(NoisedColumn {
                source: column.name.clone(),
                output,
                noised,
                anomalies,
            });
        }

        // Report in deferral order
        columns.sort_by_key(|c| deferred.iter().position(|d| *d == c.source));

        Ok(NoisedTable {
            table: Table::with_row_count(output_columns, table.row_count())?,
            columns,
        })
    }

    fn noise_column(
        &mut self,
        column: &Column,
        mechanism: &LaplaceMechanism,
    ) -> (Vec<CellValue>, usize, Vec<ColumnAnomaly>) {
        let mut anomalies = AnomalyCollector::default();
        let mut noised = 0;

        let values = column
            .values
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                CellValue::Number(n) if self.preserve_zeros && *n == 0.0 => value.clone(),
                CellValue::Number(n) => {
                    noised += 1;
                    let perturbed = n + mechanism.sample(&mut self.rng);
                    CellValue::Number(round_to(perturbed, self.round_decimals))
                }
                CellValue::Null => {
                    anomalies.flag(AnomalyKind::Null, row);
                    CellValue::Null
                }
                other => {
                    anomalies.flag(AnomalyKind::NotNumeric, row);
                    other.clone()
                }
            })
            .collect();

        (values, noised, anomalies.finish())
    }
}

fn round_to(value: f64, decimals: Option<u32>) -> f64 {
    match decimals {
        Some(d) => {
            let factor = 10f64.powi(d as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}
