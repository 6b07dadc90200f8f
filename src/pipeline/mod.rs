//! Per-ticker orchestration and the batch pipeline.
//!
//! Stages for one ticker run strictly sequentially on the same owned table:
//! each stage's precondition is the existence of columns an earlier stage
//! added. Tickers are independent failure domains; any ticker-local error is
//! logged and the ticker dropped, while configuration errors abort the batch
//! immediately.

pub mod preprocess;

pub use preprocess::{Dataset, ImputerStrategy, Preprocessor};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::data::{ChainSnapshot, ChainSource, OptionChain};
use crate::features::{factory, FeatureStage, StageContext};
use crate::target::TargetStage;
use crate::{Error, Result};

/// How one ticker fared in a batch run.
///
/// Kept in the batch report so callers can tell a data-quality drop from any
/// other skip without inspecting logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    Processed { rows: usize },
    Skipped { reason: String },
}

/// Result of a batch run: the combined table plus per-ticker outcomes.
#[derive(Debug)]
pub struct BatchReport {
    /// One row per surviving (ticker, contract) pair.
    pub data: OptionChain,
    pub outcomes: Vec<(String, TickerOutcome)>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, TickerOutcome::Processed { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

/// The configured feature/target pipeline.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    stages: Vec<FeatureStage>,
    target: TargetStage,
}

impl Pipeline {
    /// Build the pipeline from configuration.
    ///
    /// Stage and target construction plus stage-order validation happen here,
    /// before any ticker runs, so a misconfiguration fails the whole batch up
    /// front instead of once per ticker.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let stages = config
            .features
            .types
            .iter()
            .map(|tag| factory::feature_stage(tag, &config.features))
            .collect::<Result<Vec<_>>>()?;
        let target = factory::target_stage(&config.target)?;
        validate_stage_order(&stages)?;

        Ok(Self {
            config,
            stages,
            target,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the batch: every configured ticker, isolated failure domains.
    ///
    /// Returns the combined table of all surviving tickers, or
    /// [`Error::NoValidData`] when none survived.
    pub fn run(&self, source: &dyn ChainSource) -> Result<BatchReport> {
        let mut combined: Option<OptionChain> = None;
        let mut outcomes = Vec::with_capacity(self.config.data.tickers.len());

        for ticker in &self.config.data.tickers {
            info!(ticker = %ticker, "processing ticker");
            match self.process_ticker(source, ticker) {
                Ok(chain) => {
                    outcomes.push((
                        ticker.clone(),
                        TickerOutcome::Processed { rows: chain.len() },
                    ));
                    match combined.as_mut() {
                        Some(all) => all.append(chain),
                        None => combined = Some(chain),
                    }
                }
                Err(err) if err.is_configuration() => return Err(err),
                Err(err) => {
                    warn!(ticker = %ticker, error = %err, "skipping ticker");
                    outcomes.push((
                        ticker.clone(),
                        TickerOutcome::Skipped {
                            reason: err.to_string(),
                        },
                    ));
                }
            }
        }

        let data = combined.ok_or(Error::NoValidData)?;
        Ok(BatchReport { data, outcomes })
    }

    /// Process a single ticker end to end.
    ///
    /// Any error returned here is ticker-local; the batch loop decides
    /// whether to skip or abort.
    fn process_ticker(&self, source: &dyn ChainSource, ticker: &str) -> Result<OptionChain> {
        let ChainSnapshot {
            mut chain,
            underlying,
            expiration,
            as_of,
        } = source.fetch(ticker)?;

        if chain.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "empty option chain for {ticker}"
            )));
        }
        if underlying.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "empty underlying history for {ticker}"
            )));
        }

        let expiration = NaiveDate::parse_from_str(&expiration, "%Y-%m-%d")
            .map_err(|_| Error::InvalidExpiration(expiration.clone()))?;
        let ctx = StageContext {
            underlying: &underlying,
            expiration,
            as_of,
        };

        for stage in &self.stages {
            stage.augment(&mut chain, &ctx)?;
        }

        // Implicit dependency: a delta-gated target gets an advanced stage
        // run even when the configuration omitted it.
        if self.target.requires_delta() && !chain.has_column("delta") {
            let advanced = FeatureStage::Advanced {
                risk_free_rate: self.config.features.risk_free_rate,
                next_earnings_date: self.config.features.next_earnings_date,
            };
            advanced.augment(&mut chain, &ctx)?;
        }

        self.target.label(&mut chain, &underlying)?;

        if chain.is_empty() {
            return Err(Error::DataUnavailable(format!(
                "no rows survived labeling for {ticker}"
            )));
        }

        chain.tag_rows(ticker);
        Ok(chain)
    }
}

/// Check that every stage's required columns are produced by an earlier one.
///
/// Turns what would otherwise surface per ticker as a runtime missing-column
/// failure into an upfront configuration error.
fn validate_stage_order(stages: &[FeatureStage]) -> Result<()> {
    let mut available: Vec<&'static str> = Vec::new();
    for stage in stages {
        for &column in stage.requires() {
            if !available.contains(&column) {
                return Err(Error::InvalidStageOrder {
                    stage: stage.name(),
                    column,
                });
            }
        }
        available.extend_from_slice(stage.produces());
    }
    Ok(())
}
