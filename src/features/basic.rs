//! Basic feature stage: moneyness, time to expiry, historical volatility and
//! the volume / open-interest ratio.

use tracing::debug;

use super::indicators::{latest, rolling_std};
use super::{StageContext, TRADING_DAYS_PER_YEAR};
use crate::data::OptionChain;
use crate::{Error, Result};

/// Rolling windows (in observations) for historical volatility.
const HV_WINDOWS: [usize; 3] = [10, 30, 60];

pub(super) fn augment(chain: &mut OptionChain, ctx: &StageContext) -> Result<()> {
    let spot = ctx.underlying.last_close().ok_or_else(|| {
        Error::DataUnavailable("underlying series has no observations".to_string())
    })?;

    let moneyness: Vec<f64> = chain.strike().iter().map(|k| spot / k).collect();
    chain.set_feature("moneyness_ratio", moneyness);

    // Whole days; may be <= 0 for an already-past expiration and propagates
    // as-is into the advanced stage's degenerate-input handling.
    let days = (ctx.expiration - ctx.as_of).num_days() as f64;
    chain.set_feature("time_to_expiry", vec![days; chain.len()]);

    // The volatility series lives on the underlying's own time index; all
    // contracts in one snapshot share one underlying, so the latest rolling
    // value is broadcast as a scalar to every option row.
    let returns = ctx.underlying.returns();
    for window in HV_WINDOWS {
        let hv = latest(&rolling_std(&returns, window, 1)) * TRADING_DAYS_PER_YEAR.sqrt();
        debug!(window, hv, "historical volatility");
        chain.set_feature(
            &format!("historical_volatility_{window}d"),
            vec![hv; chain.len()],
        );
    }

    // Zero open interest is treated as a denominator of 1, not as missing.
    let ratio: Vec<f64> = chain
        .volume()
        .iter()
        .zip(chain.open_interest())
        .map(|(v, oi)| v / oi.max(1.0))
        .collect();
    chain.set_feature("volume_oi_ratio", ratio);

    Ok(())
}
