//! Analytic options pricing engine
//!
//! Closed-form implied volatility approximation and Black-Scholes Greeks
//! (Delta, Gamma, Theta, Vega) for call contracts.

mod black_scholes;

pub use black_scholes::{greeks, implied_volatility_approx};

use serde::{Deserialize, Serialize};

/// Sensitivities of a call option's theoretical price.
///
/// Theta is expressed per year (consistent with time in years); vega is per
/// unit of volatility. A degenerate input produces the all-NaN sentinel
/// rather than an error so one bad contract cannot abort a whole ticker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Greeks {
    /// Sensitivity to the underlying price, Φ(d1)
    pub delta: f64,
    /// Rate of change of delta
    pub gamma: f64,
    /// Time decay, per year
    pub theta: f64,
    /// Sensitivity to volatility
    pub vega: f64,
}

impl Greeks {
    /// The missing-value sentinel, resolved later by imputation.
    pub fn nan() -> Self {
        Self {
            delta: f64::NAN,
            gamma: f64::NAN,
            theta: f64::NAN,
            vega: f64::NAN,
        }
    }

    /// True if every component is NaN.
    pub fn is_nan(&self) -> bool {
        self.delta.is_nan() && self.gamma.is_nan() && self.theta.is_nan() && self.vega.is_nan()
    }
}

impl std::fmt::Display for Greeks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Greeks {{ Δ: {:.4}, Γ: {:.6}, Θ: {:.4}, ν: {:.4} }}",
            self.delta, self.gamma, self.theta, self.vega
        )
    }
}
