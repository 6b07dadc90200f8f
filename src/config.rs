//! Read-only pipeline configuration entities.
//!
//! Loading a configuration file is the caller's concern; this module only
//! defines the shape the pipeline consumes. Every struct derives
//! `serde::Deserialize` so the caller can feed it from YAML, JSON or TOML.

use chrono::NaiveDate;
use serde::Deserialize;

/// Full configuration surface of the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub data: DataConfig,
    pub features: FeaturesConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
}

/// Which instruments to process and over which history window.
///
/// The date range is consumed by the fetch collaborator, not by the pipeline
/// itself.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub tickers: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    /// End of the history window; `"auto"` (or absent) means today.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl DataConfig {
    /// Resolve the configured end date, expanding `"auto"` to today's date.
    pub fn resolved_end_date(&self) -> String {
        match self.end_date.as_deref() {
            None | Some("auto") => chrono::Utc::now().date_naive().to_string(),
            Some(date) => date.to_string(),
        }
    }
}

/// Feature stage selection and the column lists the preprocessor selects.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    /// Ordered list of stage tags, drawn from `{basic, technical, advanced}`.
    pub types: Vec<String>,
    #[serde(default)]
    pub basic: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub advanced: Vec<String>,
    #[serde(default)]
    pub fundamental: Vec<String>,
    /// Annualized risk-free rate used by the advanced stage.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Next earnings date; enables the `time_to_earnings` feature.
    #[serde(default)]
    pub next_earnings_date: Option<NaiveDate>,
}

impl FeaturesConfig {
    /// Union of the configured per-category column lists, in configuration
    /// order with duplicates removed.
    pub fn feature_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for name in self
            .basic
            .iter()
            .chain(&self.technical)
            .chain(&self.advanced)
            .chain(&self.fundamental)
        {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        columns
    }
}

fn default_risk_free_rate() -> f64 {
    0.05
}

/// Target stage selection.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// `"profit"` or `"delta_profit"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: TargetParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetParams {
    #[serde(default = "default_profit_threshold")]
    pub profit_threshold: f64,
    #[serde(default = "default_delta_threshold")]
    pub delta_threshold: f64,
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            profit_threshold: default_profit_threshold(),
            delta_threshold: default_delta_threshold(),
        }
    }
}

fn default_profit_threshold() -> f64 {
    0.005
}

fn default_delta_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreprocessingConfig {
    /// `"mean"`, `"median"`, `"most_frequent"` or `"constant"`.
    #[serde(default = "default_imputer_strategy")]
    pub imputer_strategy: String,
    /// Fill value for the `"constant"` strategy.
    #[serde(default)]
    pub fill_value: f64,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            imputer_strategy: default_imputer_strategy(),
            fill_value: 0.0,
        }
    }
}

fn default_imputer_strategy() -> String {
    "mean".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "data": { "tickers": ["AAPL", "MSFT"], "start_date": "2024-01-01", "end_date": "auto" },
            "features": { "types": ["basic", "advanced"], "basic": ["moneyness_ratio"] },
            "target": { "type": "profit" }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.data.tickers.len(), 2);
        assert_eq!(config.features.types, vec!["basic", "advanced"]);
        assert!((config.features.risk_free_rate - 0.05).abs() < 1e-12);
        assert!((config.target.params.profit_threshold - 0.005).abs() < 1e-12);
        assert!((config.target.params.delta_threshold - 0.5).abs() < 1e-12);
        assert_eq!(config.preprocessing.imputer_strategy, "mean");
    }

    #[test]
    fn test_auto_end_date_resolves_to_today() {
        let data = DataConfig {
            tickers: vec![],
            start_date: None,
            end_date: Some("auto".to_string()),
        };
        let today = chrono::Utc::now().date_naive().to_string();
        assert_eq!(data.resolved_end_date(), today);

        let fixed = DataConfig {
            tickers: vec![],
            start_date: None,
            end_date: Some("2024-06-30".to_string()),
        };
        assert_eq!(fixed.resolved_end_date(), "2024-06-30");
    }

    #[test]
    fn test_feature_columns_union_preserves_order_and_dedups() {
        let features = FeaturesConfig {
            types: vec![],
            basic: vec!["moneyness_ratio".into(), "time_to_expiry".into()],
            technical: vec!["rsi".into()],
            advanced: vec!["delta".into(), "time_to_expiry".into()],
            fundamental: vec![],
            risk_free_rate: 0.05,
            next_earnings_date: None,
        };
        assert_eq!(
            features.feature_columns(),
            vec!["moneyness_ratio", "time_to_expiry", "rsi", "delta"]
        );
    }
}
