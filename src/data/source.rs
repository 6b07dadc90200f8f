//! The fetch collaborator seam.
//!
//! Retrieving chains and price history from a market-data provider is out of
//! scope; the pipeline only consumes the [`ChainSource`] trait. A provider
//! implementation is expected to pick an expiration at least a configured
//! number of days in the future and to return the chain and the history as
//! one consistent snapshot.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::types::{OptionChain, UnderlyingSeries};
use crate::{Error, Result};

/// A paired (chain, underlying, expiration) snapshot for one ticker.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    pub chain: OptionChain,
    pub underlying: UnderlyingSeries,
    /// Expiration date of the chosen chain, `YYYY-MM-DD`.
    pub expiration: String,
    /// Date the snapshot was taken; time-to-expiry is measured from here.
    pub as_of: NaiveDate,
}

impl ChainSnapshot {
    pub fn new(
        chain: OptionChain,
        underlying: UnderlyingSeries,
        expiration: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            underlying,
            expiration: expiration.into(),
            as_of: chrono::Utc::now().date_naive(),
        }
    }

    /// Override the snapshot date (deterministic tests, replayed data).
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }
}

/// Source of per-ticker snapshots.
pub trait ChainSource {
    fn fetch(&self, ticker: &str) -> Result<ChainSnapshot>;
}

/// In-memory source backed by pre-built snapshots.
#[derive(Debug, Default)]
pub struct StaticSource {
    snapshots: HashMap<String, ChainSnapshot>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ticker: impl Into<String>, snapshot: ChainSnapshot) {
        self.snapshots.insert(ticker.into(), snapshot);
    }
}

impl ChainSource for StaticSource {
    fn fetch(&self, ticker: &str) -> Result<ChainSnapshot> {
        self.snapshots
            .get(ticker)
            .cloned()
            .ok_or_else(|| Error::DataUnavailable(format!("no snapshot for ticker {ticker}")))
    }
}
