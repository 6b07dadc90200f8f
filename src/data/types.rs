//! Column-oriented tables for the option chain and the underlying history.
//!
//! The chain and the series form a *paired snapshot*: the current price used
//! throughout the pipeline is always the last close of the same series that
//! produced the chain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One option contract as delivered by the fetch collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Strike price (> 0)
    pub strike: f64,
    /// Last traded premium (>= 0)
    pub last_price: f64,
    /// Outstanding contracts (>= 0)
    pub open_interest: u64,
    /// Traded volume (>= 0)
    pub volume: u64,
    /// Date of the last trade
    pub last_trade_date: NaiveDate,
}

/// An option chain snapshot, stored column-wise.
///
/// Base columns come from the provider and are never overwritten. Feature
/// stages append named `f64` columns in insertion order; the target stage
/// attaches the boolean label; the orchestrator tags rows with the ticker.
/// The missing-value sentinel everywhere is `f64::NAN`, resolved later by the
/// preprocessor's imputation.
#[derive(Debug, Clone, Default)]
pub struct OptionChain {
    strike: Vec<f64>,
    last_price: Vec<f64>,
    open_interest: Vec<f64>,
    volume: Vec<f64>,
    last_trade_date: Vec<NaiveDate>,
    features: Vec<(String, Vec<f64>)>,
    target: Option<Vec<bool>>,
    tickers: Vec<String>,
}

/// Base column names that stages must not overwrite.
const BASE_COLUMNS: [&str; 4] = ["strike", "last_price", "open_interest", "volume"];

impl OptionChain {
    /// Build a chain from per-contract rows.
    pub fn from_contracts(contracts: &[OptionContract]) -> Self {
        Self {
            strike: contracts.iter().map(|c| c.strike).collect(),
            last_price: contracts.iter().map(|c| c.last_price).collect(),
            open_interest: contracts.iter().map(|c| c.open_interest as f64).collect(),
            volume: contracts.iter().map(|c| c.volume as f64).collect(),
            last_trade_date: contracts.iter().map(|c| c.last_trade_date).collect(),
            features: Vec::new(),
            target: None,
            tickers: Vec::new(),
        }
    }

    /// Number of contracts (rows).
    pub fn len(&self) -> usize {
        self.strike.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strike.is_empty()
    }

    pub fn strike(&self) -> &[f64] {
        &self.strike
    }

    pub fn last_price(&self) -> &[f64] {
        &self.last_price
    }

    pub fn open_interest(&self) -> &[f64] {
        &self.open_interest
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn last_trade_date(&self) -> &[NaiveDate] {
        &self.last_trade_date
    }

    /// Append (or replace) an engineered column.
    ///
    /// Base columns are protected; a stage trying to shadow one is a
    /// programming error. Replacing an engineered column of the same name is
    /// allowed so re-running a stage stays idempotent.
    pub fn set_feature(&mut self, name: &str, values: Vec<f64>) {
        assert!(
            !BASE_COLUMNS.contains(&name),
            "stage attempted to overwrite base column '{name}'"
        );
        assert_eq!(values.len(), self.len(), "column '{name}' length mismatch");

        if let Some(existing) = self.features.iter_mut().find(|(n, _)| n == name) {
            existing.1 = values;
        } else {
            self.features.push((name.to_string(), values));
        }
    }

    /// An engineered column by name.
    pub fn feature(&self, name: &str) -> Option<&[f64]> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Any numeric column by name: base columns first, then engineered ones.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        match name {
            "strike" => Some(&self.strike),
            "last_price" => Some(&self.last_price),
            "open_interest" => Some(&self.open_interest),
            "volume" => Some(&self.volume),
            _ => self.feature(name),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Engineered column names, in insertion order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(n, _)| n.as_str())
    }

    pub fn set_target(&mut self, target: Vec<bool>) {
        assert_eq!(target.len(), self.len(), "target length mismatch");
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<&[bool]> {
        self.target.as_deref()
    }

    /// Tag every row with the ticker identifier.
    pub fn tag_rows(&mut self, ticker: &str) {
        self.tickers = vec![ticker.to_string(); self.len()];
    }

    /// Per-row ticker tags; empty until [`tag_rows`](Self::tag_rows) runs.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Append another chain's rows, aligning engineered columns by name.
    ///
    /// Columns present on only one side are padded with NaN on the other, so
    /// tickers processed with different effective stages still concatenate.
    pub fn append(&mut self, other: OptionChain) {
        let old_len = self.len();
        let other_len = other.len();

        self.strike.extend(other.strike);
        self.last_price.extend(other.last_price);
        self.open_interest.extend(other.open_interest);
        self.volume.extend(other.volume);
        self.last_trade_date.extend(other.last_trade_date);

        for (name, values) in &mut self.features {
            match other.features.iter().find(|(n, _)| n == name) {
                Some((_, theirs)) => values.extend_from_slice(theirs),
                None => values.extend(std::iter::repeat(f64::NAN).take(other_len)),
            }
        }
        for (name, theirs) in other.features {
            if self.features.iter().any(|(n, _)| *n == name) {
                continue;
            }
            let mut values = vec![f64::NAN; old_len];
            values.extend(theirs);
            self.features.push((name, values));
        }

        self.target = match (self.target.take(), other.target) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            _ => None,
        };
        self.tickers.extend(other.tickers);
    }
}

/// Time-indexed history of the underlying instrument.
///
/// Requires at least one observation to provide a current spot; target
/// computation against a previous close needs at least two.
#[derive(Debug, Clone, Default)]
pub struct UnderlyingSeries {
    dates: Vec<NaiveDate>,
    close: Vec<f64>,
    volume: Option<Vec<f64>>,
}

impl UnderlyingSeries {
    pub fn new(dates: Vec<NaiveDate>, close: Vec<f64>) -> Self {
        assert_eq!(dates.len(), close.len(), "date/close length mismatch");
        Self {
            dates,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: Vec<f64>) -> Self {
        assert_eq!(volume.len(), self.close.len(), "volume length mismatch");
        self.volume = Some(volume);
        self
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> Option<&[f64]> {
        self.volume.as_deref()
    }

    /// Latest close, the snapshot's current spot price.
    pub fn last_close(&self) -> Option<f64> {
        self.close.last().copied()
    }

    /// Close before the latest one.
    pub fn previous_close(&self) -> Option<f64> {
        if self.close.len() < 2 {
            None
        } else {
            Some(self.close[self.close.len() - 2])
        }
    }

    /// Simple per-observation returns, aligned with the series.
    ///
    /// The first element is NaN, matching pandas `pct_change`.
    pub fn returns(&self) -> Vec<f64> {
        let mut returns = vec![f64::NAN; self.close.len()];
        for i in 1..self.close.len() {
            let prev = self.close[i - 1];
            if prev != 0.0 {
                returns[i] = (self.close[i] - prev) / prev;
            }
        }
        returns
    }
}
