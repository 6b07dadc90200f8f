//! Data structures for option chains and underlying price history

pub mod source;
pub mod types;

pub use source::{ChainSnapshot, ChainSource, StaticSource};
pub use types::{OptionChain, OptionContract, UnderlyingSeries};
