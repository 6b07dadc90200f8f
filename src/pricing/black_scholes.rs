//! # Black-Scholes Greeks and implied volatility approximation
//!
//! ## Formulas
//!
//! - d₁ = [ln(S/K) + (r + σ²/2)T] / (σ√T)
//! - d₂ = d₁ - σ√T
//! - Δ = Φ(d₁), Γ = φ(d₁) / (S·σ·√T), ν = S·φ(d₁)·√T
//! - Θ = -(S·φ(d₁)·σ) / (2√T) - r·K·e^(-rT)·Φ(d₂), per year
//!
//! Degenerate inputs (non-positive time, volatility, spot or strike) make the
//! formulas undefined; the engine emits the NaN sentinel for those rows
//! instead of raising, so a single bad contract never aborts its ticker.

use statrs::distribution::{ContinuousCDF, Normal};

use super::Greeks;

/// First-order at-the-money implied volatility approximation:
///
/// `iv = sqrt(2π / T) * (last_price / strike)`, with `T` in days.
///
/// Not a converged solver: the estimate degrades far from the money and near
/// expiry. Callers wanting solver-grade IV need iterative root-finding, which
/// is deliberately not implemented here.
pub fn implied_volatility_approx(last_price: f64, strike: f64, time_to_expiry_days: f64) -> f64 {
    if time_to_expiry_days <= 0.0 || strike <= 0.0 || last_price < 0.0 {
        return f64::NAN;
    }
    (2.0 * std::f64::consts::PI / time_to_expiry_days).sqrt() * (last_price / strike)
}

/// Black-Scholes Greeks for a European call.
///
/// # Arguments
///
/// * `spot` - Current underlying price
/// * `strike` - Strike price
/// * `time_to_expiry` - Time to expiration in years (30 days = 30/365)
/// * `rate` - Annualized risk-free rate (0.05 = 5%)
/// * `sigma` - Annualized volatility (0.3 = 30%)
pub fn greeks(spot: f64, strike: f64, time_to_expiry: f64, rate: f64, sigma: f64) -> Greeks {
    if time_to_expiry <= 0.0 || sigma <= 0.0 || spot <= 0.0 || strike <= 0.0 {
        return Greeks::nan();
    }

    // Standard normal; the parameters are constants, construction cannot fail.
    let normal = Normal::new(0.0, 1.0).unwrap();

    let sqrt_t = time_to_expiry.sqrt();
    let d1 = ((spot / strike).ln() + (rate + sigma * sigma / 2.0) * time_to_expiry)
        / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;

    let pdf_d1 = pdf(d1);
    let discount = (-rate * time_to_expiry).exp();

    Greeks {
        delta: normal.cdf(d1),
        gamma: pdf_d1 / (spot * sigma * sqrt_t),
        theta: -(spot * pdf_d1 * sigma) / (2.0 * sqrt_t) - rate * strike * discount * normal.cdf(d2),
        vega: spot * pdf_d1 * sqrt_t,
    }
}

/// φ(x), the standard normal density.
fn pdf(x: f64) -> f64 {
    (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt()
}
