//! Technical indicator kernels over the underlying's close prices.
//!
//! Every function returns a series aligned with its input: positions where a
//! full lookback window is not yet available hold NaN. The pipeline only
//! broadcasts the latest value of each series onto the option chain, but the
//! kernels stay full-series so they can be reused on history.

/// Simple moving average.
pub fn sma(prices: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period {
        return result;
    }
    for i in (period - 1)..prices.len() {
        let window = &prices[i + 1 - period..=i];
        result[i] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// Exponential moving average, seeded with the SMA of the first window.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    result[period - 1] = prices[..period].iter().sum::<f64>() / period as f64;
    for i in period..prices.len() {
        result[i] = (prices[i] - result[i - 1]) * alpha + result[i - 1];
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period + 1 {
        return result;
    }

    let mut gains = vec![0.0; prices.len()];
    let mut losses = vec![0.0; prices.len()];
    for i in 1..prices.len() {
        let change = prices[i] - prices[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else {
            losses[i] = -change;
        }
    }

    let mut avg_gain = gains[1..=period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..prices.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        result[i] = rsi_from_averages(avg_gain, avg_loss);
    }
    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD line and its signal line.
pub fn macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>) {
    let ema_fast = ema(prices, fast_period);
    let ema_slow = ema(prices, slow_period);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| if f.is_nan() || s.is_nan() { f64::NAN } else { f - s })
        .collect();

    // The signal EMA starts where the MACD line becomes defined.
    let defined_from = macd_line.iter().position(|v| !v.is_nan());
    let mut signal_line = vec![f64::NAN; macd_line.len()];
    if let Some(start) = defined_from {
        let tail_signal = ema(&macd_line[start..], signal_period);
        signal_line[start..].copy_from_slice(&tail_signal);
    }

    (macd_line, signal_line)
}

/// Bollinger bands: (upper, lower) at `num_std` population standard
/// deviations around the SMA.
pub fn bollinger_bands(prices: &[f64], period: usize, num_std: f64) -> (Vec<f64>, Vec<f64>) {
    let mid = sma(prices, period);
    let mut upper = vec![f64::NAN; prices.len()];
    let mut lower = vec![f64::NAN; prices.len()];
    if period == 0 || prices.len() < period {
        return (upper, lower);
    }

    for i in (period - 1)..prices.len() {
        let window = &prices[i + 1 - period..=i];
        let mean = mid[i];
        let variance = window.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();
        upper[i] = mean + num_std * std;
        lower[i] = mean - num_std * std;
    }
    (upper, lower)
}

/// Rolling standard deviation with `ddof` delta degrees of freedom.
///
/// `ddof = 1` reproduces pandas `rolling().std()`; any NaN inside a window
/// makes that window's result NaN, also matching pandas.
pub fn rolling_std(values: &[f64], period: usize, ddof: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period <= ddof || values.len() < period {
        return result;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - ddof) as f64;
        result[i] = variance.sqrt();
    }
    result
}

/// Latest value of an indicator series, NaN when the series is empty.
pub fn latest(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}
