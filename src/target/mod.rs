//! Labeling stages: turn the augmented chain into a binary target.
//!
//! Both variants label a contract positive when its immediate-exercise profit
//! percentage strictly exceeds the configured threshold; the delta variant
//! additionally gates on the Black-Scholes delta.

use tracing::debug;

use crate::data::{OptionChain, UnderlyingSeries};
use crate::{Error, Result};

/// A target engineering stage.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetStage {
    /// `target = profit_percentage > profit_threshold`
    Profit { profit_threshold: f64 },
    /// Profit rule AND `delta > delta_threshold`
    DeltaProfit {
        profit_threshold: f64,
        delta_threshold: f64,
    },
}

impl TargetStage {
    pub fn name(&self) -> &'static str {
        match self {
            TargetStage::Profit { .. } => "profit",
            TargetStage::DeltaProfit { .. } => "delta_profit",
        }
    }

    /// Whether labeling reads the `delta` column.
    ///
    /// The orchestrator injects an advanced stage run when this is true and
    /// no configured stage produced `delta`.
    pub fn requires_delta(&self) -> bool {
        matches!(self, TargetStage::DeltaProfit { .. })
    }

    /// Append `potential_profit`, `profit_percentage` and the boolean target.
    pub fn label(&self, chain: &mut OptionChain, underlying: &UnderlyingSeries) -> Result<()> {
        let spot = underlying.last_close().ok_or_else(|| {
            Error::DataUnavailable("underlying series has no observations".to_string())
        })?;

        let potential: Vec<f64> = chain
            .strike()
            .iter()
            .zip(chain.last_price())
            .map(|(k, p)| (spot - k).max(0.0) - p)
            .collect();
        let percentage: Vec<f64> = potential
            .iter()
            .zip(chain.last_price())
            .map(|(profit, p)| profit / p)
            .collect();

        // Strict inequalities: a contract exactly at a threshold labels
        // false, and NaN comparisons label false as well.
        let target: Vec<bool> = match self {
            TargetStage::Profit { profit_threshold } => {
                percentage.iter().map(|pct| pct > profit_threshold).collect()
            }
            TargetStage::DeltaProfit {
                profit_threshold,
                delta_threshold,
            } => {
                let delta = chain
                    .feature("delta")
                    .ok_or_else(|| Error::MissingColumn {
                        column: "delta".to_string(),
                        stage: "delta_profit target",
                    })?
                    .to_vec();
                percentage
                    .iter()
                    .zip(&delta)
                    .map(|(pct, d)| pct > profit_threshold && d > delta_threshold)
                    .collect()
            }
        };

        let positives = target.iter().filter(|t| **t).count();
        debug!(
            target = self.name(),
            rows = target.len(),
            positives,
            "labeled chain"
        );

        chain.set_feature("potential_profit", potential);
        chain.set_feature("profit_percentage", percentage);
        chain.set_target(target);
        Ok(())
    }
}
