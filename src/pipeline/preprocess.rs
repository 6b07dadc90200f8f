//! Final preprocessing: column selection, imputation, standardization.
//!
//! Takes the combined labeled table and produces the model-ready `(X, y)`
//! pair. Row count is preserved; the column set is the configured columns
//! that are actually present, minus those that are entirely NaN.

use ndarray::{Array1, Array2};
use tracing::warn;

use crate::config::PipelineConfig;
use crate::data::OptionChain;
use crate::{Error, Result};

/// Strategy for filling NaN cells before scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImputerStrategy {
    Mean,
    Median,
    /// Most frequent value; ties resolve to the smallest.
    MostFrequent,
    Constant(f64),
}

impl ImputerStrategy {
    /// Parse a configuration tag. Unknown tags are fatal configuration
    /// errors, like unknown stage tags.
    pub fn parse(tag: &str, fill_value: f64) -> Result<Self> {
        match tag {
            "mean" => Ok(ImputerStrategy::Mean),
            "median" => Ok(ImputerStrategy::Median),
            "most_frequent" => Ok(ImputerStrategy::MostFrequent),
            "constant" => Ok(ImputerStrategy::Constant(fill_value)),
            other => Err(Error::UnknownImputerStrategy(other.to_string())),
        }
    }

    /// Fill value for one column, computed over its non-NaN cells.
    fn fill_value(&self, values: &[f64]) -> f64 {
        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        match self {
            ImputerStrategy::Constant(value) => *value,
            ImputerStrategy::Mean => {
                present.iter().sum::<f64>() / present.len() as f64
            }
            ImputerStrategy::Median => {
                present.sort_by(|a, b| a.total_cmp(b));
                let mid = present.len() / 2;
                if present.len() % 2 == 1 {
                    present[mid]
                } else {
                    (present[mid - 1] + present[mid]) / 2.0
                }
            }
            ImputerStrategy::MostFrequent => {
                present.sort_by(|a, b| a.total_cmp(b));
                let mut best = present[0];
                let mut best_count = 0usize;
                let mut i = 0;
                while i < present.len() {
                    let mut j = i;
                    while j < present.len() && present[j] == present[i] {
                        j += 1;
                    }
                    if j - i > best_count {
                        best_count = j - i;
                        best = present[i];
                    }
                    i = j;
                }
                best
            }
        }
    }
}

/// Model-ready feature matrix and label vector.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// `[rows, columns]` standardized features
    pub x: Array2<f64>,
    /// Binary labels as 0.0 / 1.0
    pub y: Array1<f64>,
    /// Names of the columns of `x`, in order
    pub columns: Vec<String>,
}

/// Selects, imputes and standardizes the configured feature columns.
pub struct Preprocessor {
    columns: Vec<String>,
    strategy: ImputerStrategy,
}

impl Preprocessor {
    pub fn new(columns: Vec<String>, strategy: ImputerStrategy) -> Self {
        Self { columns, strategy }
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::new(
            config.features.feature_columns(),
            ImputerStrategy::parse(
                &config.preprocessing.imputer_strategy,
                config.preprocessing.fill_value,
            )?,
        ))
    }

    /// Produce the `(X, y)` dataset from a labeled table.
    ///
    /// Deterministic: transforming the same input twice yields numerically
    /// identical output.
    pub fn transform(&self, data: &OptionChain) -> Result<Dataset> {
        let rows = data.len();

        // Configured ∩ present; absent configured columns are logged, not fatal.
        let mut kept: Vec<String> = Vec::new();
        let mut matrix: Vec<Vec<f64>> = Vec::new();
        for name in &self.columns {
            match data.column(name) {
                Some(values) => {
                    kept.push(name.clone());
                    matrix.push(values.to_vec());
                }
                None => warn!(column = %name, "configured feature column not present; skipping"),
            }
        }

        // Drop columns that are entirely missing; nothing to impute from.
        let mut i = 0;
        while i < matrix.len() {
            if matrix[i].iter().all(|v| v.is_nan()) {
                warn!(column = %kept[i], "column is all NaN; dropping");
                matrix.remove(i);
                kept.remove(i);
            } else {
                i += 1;
            }
        }

        for column in &mut matrix {
            let fill = self.strategy.fill_value(column);
            for value in column.iter_mut() {
                if value.is_nan() {
                    *value = fill;
                }
            }
            standardize(column);
        }

        let target = data.target().ok_or_else(|| Error::MissingColumn {
            column: "target".to_string(),
            stage: "preprocessor",
        })?;

        let x = Array2::from_shape_fn((rows, matrix.len()), |(r, c)| matrix[c][r]);
        let y = Array1::from_iter(target.iter().map(|t| if *t { 1.0 } else { 0.0 }));

        Ok(Dataset { x, y, columns: kept })
    }
}

/// Z-score in place: zero mean, unit variance (population std).
///
/// Zero-variance columns are centered and left at zero instead of dividing
/// by zero.
fn standardize(values: &mut [f64]) {
    let n = values.len() as f64;
    if n == 0.0 {
        return;
    }
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    for value in values.iter_mut() {
        *value -= mean;
        if std > 0.0 {
            *value /= std;
        }
    }
}
