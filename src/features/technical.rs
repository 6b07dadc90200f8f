//! Technical feature stage: indicators of the underlying instrument.
//!
//! These describe the underlying, not the individual contract, so the latest
//! value of each indicator is broadcast as a scalar across every option row
//! of the snapshot.

use super::indicators::{bollinger_bands, latest, macd, rsi, sma};
use super::StageContext;
use crate::data::OptionChain;
use crate::Result;

const RSI_PERIOD: usize = 14;
const MACD_PARAMS: (usize, usize, usize) = (12, 26, 9);
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_STD: f64 = 2.0;

pub(super) fn augment(chain: &mut OptionChain, ctx: &StageContext) -> Result<()> {
    let closes = ctx.underlying.closes();
    let rows = chain.len();

    let mut broadcast =
        |name: &str, value: f64| chain.set_feature(name, vec![value; rows]);

    broadcast("rsi", latest(&rsi(closes, RSI_PERIOD)));

    let (macd_line, signal_line) = macd(closes, MACD_PARAMS.0, MACD_PARAMS.1, MACD_PARAMS.2);
    broadcast("macd", latest(&macd_line));
    broadcast("macd_signal", latest(&signal_line));

    let (upper, lower) = bollinger_bands(closes, BOLLINGER_PERIOD, BOLLINGER_STD);
    broadcast("bollinger_high", latest(&upper));
    broadcast("bollinger_low", latest(&lower));

    broadcast("moving_average_50", latest(&sma(closes, 50)));
    broadcast("moving_average_200", latest(&sma(closes, 200)));

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::{OptionContract, UnderlyingSeries};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn chain() -> OptionChain {
        OptionChain::from_contracts(&[
            OptionContract {
                strike: 100.0,
                last_price: 5.0,
                open_interest: 10,
                volume: 5,
                last_trade_date: date("2024-05-01"),
            },
            OptionContract {
                strike: 110.0,
                last_price: 2.0,
                open_interest: 10,
                volume: 5,
                last_trade_date: date("2024-05-01"),
            },
        ])
    }

    fn underlying(n: usize) -> UnderlyingSeries {
        let start = date("2023-06-01");
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 4.0 + i as f64 * 0.05)
            .collect();
        UnderlyingSeries::new(dates, closes)
    }

    #[test]
    fn test_indicators_broadcast_latest_value() {
        let series = underlying(220);
        let mut chain = chain();
        let ctx = StageContext {
            underlying: &series,
            expiration: date("2024-06-14"),
            as_of: date("2024-05-03"),
        };
        augment(&mut chain, &ctx).unwrap();

        for name in [
            "rsi",
            "macd",
            "macd_signal",
            "bollinger_high",
            "bollinger_low",
            "moving_average_50",
            "moving_average_200",
        ] {
            let col = chain.feature(name).unwrap();
            assert!(col[0].is_finite(), "{name} should be defined");
            assert_eq!(col[0], col[1], "{name} should be one broadcast scalar");
        }

        let rsi = chain.feature("rsi").unwrap()[0];
        assert!((0.0..=100.0).contains(&rsi));
        let high = chain.feature("bollinger_high").unwrap()[0];
        let low = chain.feature("bollinger_low").unwrap()[0];
        assert!(high > low);
    }

    #[test]
    fn test_short_history_broadcasts_nan() {
        let series = underlying(60); // not enough for the 200-period average
        let mut chain = chain();
        let ctx = StageContext {
            underlying: &series,
            expiration: date("2024-06-14"),
            as_of: date("2024-05-03"),
        };
        augment(&mut chain, &ctx).unwrap();

        assert!(chain.feature("moving_average_50").unwrap()[0].is_finite());
        assert!(chain.feature("moving_average_200").unwrap()[0].is_nan());
    }
}
