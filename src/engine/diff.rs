//! Regular and seasonal differencing, and their inverses for forecasting.

/// Difference a series `d` times: `y[t] - y[t - 1]`.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Seasonally difference a series `d` times: `y[t] - y[t - period]`.
///
/// Returns an empty vector once the series is no longer than `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result[period..]
            .iter()
            .zip(&result)
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Undo `d` rounds of regular differencing for values following `history`.
///
/// `differenced` continues the d-times-differenced `history`; the result
/// continues `history` itself.
pub fn integrate(differenced: &[f64], history: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let mut level_value = difference(history, level).last().copied().unwrap_or(0.0);
        for value in result.iter_mut() {
            level_value += *value;
            *value = level_value;
        }
    }
    result
}

/// Undo `d` rounds of seasonal differencing for values following `history`.
pub fn seasonal_integrate(differenced: &[f64], history: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return differenced.to_vec();
    }
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let mut extended = seasonal_difference(history, level, period);
        let offset = extended.len();
        for &value in &result {
            let lagged = extended
                .len()
                .checked_sub(period)
                .map(|i| extended[i])
                .unwrap_or(0.0);
            extended.push(lagged + value);
        }
        result = extended.split_off(offset);
    }
    result
}
