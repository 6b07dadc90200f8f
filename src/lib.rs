//! # Options Screener
//!
//! Feature and target engineering pipeline for options screening: turns a raw
//! option chain plus the underlying instrument's price history into a labeled,
//! model-ready feature matrix for a binary classification task ("is this
//! contract likely profitable by expiration").
//!
//! ## Modules
//!
//! - `pricing` - Implied volatility approximation and Black-Scholes Greeks
//! - `features` - Pluggable feature stages (basic, technical, advanced)
//! - `target` - Labeling stages (profit, delta-profit)
//! - `pipeline` - Per-ticker orchestration, batch aggregation, preprocessing
//! - `data` - Option chain / underlying tables and the fetch seam
//! - `config` - Read-only pipeline configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use options_screener::{Pipeline, Preprocessor};
//!
//! let pipeline = Pipeline::new(config)?;
//! let report = pipeline.run(&source)?;
//! let dataset = Preprocessor::from_config(pipeline.config())?.transform(&report.data)?;
//! ```
//!
//! Fetching chains from a market-data provider and training models on the
//! resulting dataset are the caller's concern; the crate only consumes a
//! [`data::ChainSource`] and produces a [`pipeline::Dataset`].

pub mod config;
pub mod data;
pub mod features;
pub mod pipeline;
pub mod pricing;
pub mod target;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use data::{ChainSnapshot, ChainSource, OptionChain, StaticSource, UnderlyingSeries};
pub use features::FeatureStage;
pub use pipeline::{BatchReport, Dataset, Pipeline, Preprocessor, TickerOutcome};
pub use pricing::Greeks;
pub use target::TargetStage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of an operation with a possible pipeline error
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Empty or insufficient market data for one ticker (ticker-local).
    #[error("no usable data: {0}")]
    DataUnavailable(String),

    #[error("unknown feature type: {0}")]
    UnknownFeatureType(String),

    #[error("unknown target type: {0}")]
    UnknownTargetType(String),

    #[error("unknown imputer strategy: {0}")]
    UnknownImputerStrategy(String),

    /// The configured stage order leaves a stage without its input columns.
    #[error("stage '{stage}' requires column '{column}' which no earlier stage produces")]
    InvalidStageOrder {
        stage: &'static str,
        column: &'static str,
    },

    /// A stage precondition column is absent at runtime (ticker-local).
    #[error("column '{column}' required by {stage} is missing")]
    MissingColumn {
        column: String,
        stage: &'static str,
    },

    #[error("invalid expiration date '{0}': expected YYYY-MM-DD")]
    InvalidExpiration(String),

    /// Every configured ticker failed; no partial result is produced.
    #[error("no valid data available for any of the configured tickers")]
    NoValidData,
}

impl Error {
    /// Whether this error indicates a systemic misconfiguration.
    ///
    /// Configuration errors make every ticker fail identically, so the batch
    /// pipeline surfaces them immediately instead of swallowing them through
    /// per-ticker isolation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownFeatureType(_)
                | Error::UnknownTargetType(_)
                | Error::UnknownImputerStrategy(_)
                | Error::InvalidStageOrder { .. }
        )
    }
}
