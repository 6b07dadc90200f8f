//! Advanced feature stage: the analytic pricing engine plus derived ratios.
//!
//! Reads `time_to_expiry` produced by the basic stage; running it first is a
//! hard precondition, checked up front so a misordered pipeline fails with a
//! missing-column error instead of a wrong numeric answer.

use chrono::NaiveDate;

use super::indicators::{latest, rolling_std};
use super::{StageContext, DAYS_PER_YEAR, TRADING_DAYS_PER_YEAR};
use crate::data::OptionChain;
use crate::pricing::{greeks, implied_volatility_approx};
use crate::{Error, Result};

/// Window (in observations) for the historical volatility the IV is
/// compared against.
const IV_HV_WINDOW: usize = 30;

pub(super) fn augment(
    chain: &mut OptionChain,
    ctx: &StageContext,
    risk_free_rate: f64,
    next_earnings_date: Option<NaiveDate>,
) -> Result<()> {
    let time_to_expiry: Vec<f64> = chain
        .feature("time_to_expiry")
        .ok_or_else(|| Error::MissingColumn {
            column: "time_to_expiry".to_string(),
            stage: "advanced feature stage",
        })?
        .to_vec();
    let spot = ctx.underlying.last_close().ok_or_else(|| {
        Error::DataUnavailable("underlying series has no observations".to_string())
    })?;

    let rows = chain.len();
    let strikes = chain.strike().to_vec();
    let last_prices = chain.last_price().to_vec();

    // Closed-form ATM approximation over days to expiry; degenerate rows
    // come back as NaN and flow into the Greeks below the same way.
    let iv: Vec<f64> = (0..rows)
        .map(|i| implied_volatility_approx(last_prices[i], strikes[i], time_to_expiry[i]))
        .collect();

    let mut delta = Vec::with_capacity(rows);
    let mut gamma = Vec::with_capacity(rows);
    let mut theta = Vec::with_capacity(rows);
    let mut vega = Vec::with_capacity(rows);
    for i in 0..rows {
        let g = greeks(
            spot,
            strikes[i],
            time_to_expiry[i] / DAYS_PER_YEAR,
            risk_free_rate,
            iv[i],
        );
        delta.push(g.delta);
        gamma.push(g.gamma);
        theta.push(g.theta);
        vega.push(g.vega);
    }

    chain.set_feature("implied_volatility", iv.clone());
    chain.set_feature("delta", delta);
    chain.set_feature("gamma", gamma);
    chain.set_feature("theta", theta);
    chain.set_feature("vega", vega);

    let price_to_strike: Vec<f64> = (0..rows).map(|i| last_prices[i] / strikes[i]).collect();
    chain.set_feature("price_to_strike", price_to_strike);
    let price_to_underlying: Vec<f64> = last_prices.iter().map(|p| p / spot).collect();
    chain.set_feature("price_to_underlying", price_to_underlying);

    // Log-scaled moneyness, kept as its own column next to the basic stage's
    // ratio definition.
    let moneyness_log: Vec<f64> = strikes.iter().map(|k| (spot / k).ln()).collect();
    chain.set_feature("moneyness_log", moneyness_log);

    let returns = ctx.underlying.returns();
    let hv = latest(&rolling_std(&returns, IV_HV_WINDOW, 1)) * TRADING_DAYS_PER_YEAR.sqrt();
    let iv_to_hv: Vec<f64> = iv.iter().map(|v| v / hv).collect();
    chain.set_feature("iv_to_hv_ratio", iv_to_hv);

    // Zero volume divides by 1, mirroring the basic stage's OI guard.
    let oi_to_volume: Vec<f64> = chain
        .open_interest()
        .iter()
        .zip(chain.volume())
        .map(|(oi, v)| oi / v.max(1.0))
        .collect();
    chain.set_feature("oi_to_volume_ratio", oi_to_volume);

    if let Some(earnings) = next_earnings_date {
        let days: Vec<f64> = chain
            .last_trade_date()
            .iter()
            .map(|d| (earnings - *d).num_days() as f64)
            .collect();
        chain.set_feature("time_to_earnings", days);
    }

    Ok(())
}
