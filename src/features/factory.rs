//! Maps configuration tags to stage instances.
//!
//! The single extension point: a new stage variant registers its tag here.
//! Unknown tags are configuration errors and classified fatal, so the batch
//! pipeline surfaces them instead of retrying per ticker.

use super::FeatureStage;
use crate::config::{FeaturesConfig, TargetConfig};
use crate::target::TargetStage;
use crate::{Error, Result};

/// Build a feature stage from its configuration tag.
pub fn feature_stage(tag: &str, features: &FeaturesConfig) -> Result<FeatureStage> {
    match tag {
        "basic" => Ok(FeatureStage::Basic),
        "technical" => Ok(FeatureStage::Technical),
        "advanced" => Ok(FeatureStage::Advanced {
            risk_free_rate: features.risk_free_rate,
            next_earnings_date: features.next_earnings_date,
        }),
        other => Err(Error::UnknownFeatureType(other.to_string())),
    }
}

/// Build the target stage from its configuration.
pub fn target_stage(config: &TargetConfig) -> Result<TargetStage> {
    match config.kind.as_str() {
        "profit" => Ok(TargetStage::Profit {
            profit_threshold: config.params.profit_threshold,
        }),
        "delta_profit" => Ok(TargetStage::DeltaProfit {
            profit_threshold: config.params.profit_threshold,
            delta_threshold: config.params.delta_threshold,
        }),
        other => Err(Error::UnknownTargetType(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetParams;

    fn features_config() -> FeaturesConfig {
        FeaturesConfig {
            types: vec![],
            basic: vec![],
            technical: vec![],
            advanced: vec![],
            fundamental: vec![],
            risk_free_rate: 0.03,
            next_earnings_date: None,
        }
    }

    #[test]
    fn test_known_feature_tags() {
        let config = features_config();
        assert_eq!(
            feature_stage("basic", &config).unwrap(),
            FeatureStage::Basic
        );
        assert_eq!(
            feature_stage("technical", &config).unwrap(),
            FeatureStage::Technical
        );
        match feature_stage("advanced", &config).unwrap() {
            FeatureStage::Advanced { risk_free_rate, .. } => {
                assert!((risk_free_rate - 0.03).abs() < 1e-12)
            }
            other => panic!("expected advanced, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_feature_tag_is_fatal() {
        let err = feature_stage("quantum", &features_config()).unwrap_err();
        assert!(matches!(err, Error::UnknownFeatureType(ref t) if t == "quantum"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_target_tags() {
        let profit = target_stage(&TargetConfig {
            kind: "profit".into(),
            params: TargetParams::default(),
        })
        .unwrap();
        assert!(matches!(profit, TargetStage::Profit { .. }));

        let delta = target_stage(&TargetConfig {
            kind: "delta_profit".into(),
            params: TargetParams::default(),
        })
        .unwrap();
        assert!(delta.requires_delta());

        let err = target_stage(&TargetConfig {
            kind: "sharpe".into(),
            params: TargetParams::default(),
        })
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
