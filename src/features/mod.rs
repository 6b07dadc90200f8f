//! Feature stages: pluggable column transformers over the option chain.
//!
//! Each stage consumes the chain table and appends derived columns; the set
//! of variants is closed and dispatched as a sum type rather than open-ended
//! trait objects, so pipelines can be validated exhaustively. Construction
//! from configuration tags goes through [`factory`].

mod advanced;
mod basic;
pub mod factory;
pub mod indicators;
mod technical;

use chrono::NaiveDate;

use crate::data::{OptionChain, UnderlyingSeries};
use crate::Result;

/// Trading days used to annualize volatility of daily returns.
pub(crate) const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days used to convert day counts into year fractions.
pub(crate) const DAYS_PER_YEAR: f64 = 365.0;

/// Shared inputs for every stage of one ticker's run.
///
/// The underlying series and the chain are a paired snapshot: the spot price
/// every stage uses is the last close of this series.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub underlying: &'a UnderlyingSeries,
    /// Expiration date of the chain.
    pub expiration: NaiveDate,
    /// Date the snapshot was taken; time-to-expiry counts from here.
    pub as_of: NaiveDate,
}

/// A feature engineering stage.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureStage {
    /// Moneyness ratio, time to expiry, historical volatility, volume/OI.
    Basic,
    /// RSI, MACD, Bollinger bands, long moving averages of the underlying.
    Technical,
    /// Implied volatility, Black-Scholes Greeks and derived ratios.
    Advanced {
        risk_free_rate: f64,
        next_earnings_date: Option<NaiveDate>,
    },
}

impl FeatureStage {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureStage::Basic => "basic",
            FeatureStage::Technical => "technical",
            FeatureStage::Advanced { .. } => "advanced",
        }
    }

    /// Columns this stage reads that must be produced by an earlier stage.
    pub fn requires(&self) -> &'static [&'static str] {
        match self {
            FeatureStage::Basic | FeatureStage::Technical => &[],
            FeatureStage::Advanced { .. } => &["time_to_expiry"],
        }
    }

    /// Columns this stage appends to the chain.
    pub fn produces(&self) -> &'static [&'static str] {
        match self {
            FeatureStage::Basic => &[
                "moneyness_ratio",
                "time_to_expiry",
                "historical_volatility_10d",
                "historical_volatility_30d",
                "historical_volatility_60d",
                "volume_oi_ratio",
            ],
            FeatureStage::Technical => &[
                "rsi",
                "macd",
                "macd_signal",
                "bollinger_high",
                "bollinger_low",
                "moving_average_50",
                "moving_average_200",
            ],
            FeatureStage::Advanced { .. } => &[
                "implied_volatility",
                "delta",
                "gamma",
                "theta",
                "vega",
                "price_to_strike",
                "price_to_underlying",
                "moneyness_log",
                "iv_to_hv_ratio",
                "oi_to_volume_ratio",
            ],
        }
    }

    /// Run the stage, appending its columns to the chain.
    pub fn augment(&self, chain: &mut OptionChain, ctx: &StageContext) -> Result<()> {
        match self {
            FeatureStage::Basic => basic::augment(chain, ctx),
            FeatureStage::Technical => technical::augment(chain, ctx),
            FeatureStage::Advanced {
                risk_free_rate,
                next_earnings_date,
            } => advanced::augment(chain, ctx, *risk_free_rate, *next_earnings_date),
        }
    }
}
