//! Multiplicative seasonal decomposition.
//!
//! Splits a monthly series into trend, seasonal and residual components
//! related by `observed ≈ trend × seasonal × residual`. The trend is a
//! centered moving average (2×period for even periods), so it is undefined
//! for half a period at each end of the series; those positions carry
//! `None` in the trend and residual vectors.

use crate::data::MonthlySeries;
use crate::error::{ForecastError, Result};

/// Result of a multiplicative seasonal decomposition, aligned to the
/// months of the input series.
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// The cleaned input values
    pub observed: Vec<f64>,
    /// Centered moving-average trend; `None` at the series edges
    pub trend: Vec<Option<f64>>,
    /// Repeating seasonal factors, normalized to mean 1.0
    pub seasonal: Vec<f64>,
    /// Remainder after removing trend and seasonality; `None` where the
    /// trend is undefined
    pub residual: Vec<Option<f64>>,
    /// Seasonal period used
    pub period: usize,
}

impl Decomposition {
    /// The per-position seasonal factors, one per period slot
    pub fn seasonal_factors(&self) -> &[f64] {
        &self.seasonal[..self.period.min(self.seasonal.len())]
    }
}

/// Decompose a monthly series under a multiplicative model.
///
/// Requires at least two full seasonal cycles; fewer points is a fatal
/// [`ForecastError::InsufficientData`]. All values must be positive.
pub fn decompose_multiplicative(series: &MonthlySeries, period: usize) -> Result<Decomposition> {
    if period < 2 {
        return Err(ForecastError::InvalidParameter(
            "seasonal period must be at least 2".to_string(),
        ));
    }
    let values = series.values();
    if values.len() < 2 * period {
        return Err(ForecastError::InsufficientData {
            needed: 2 * period,
            got: values.len(),
        });
    }
    if values.iter().any(|v| *v <= 0.0) {
        return Err(ForecastError::InvalidParameter(
            "multiplicative decomposition requires positive values".to_string(),
        ));
    }

    let n = values.len();
    let half = period / 2;

    // Centered moving-average trend. For an even period the window spans
    // period + 1 points with half weight on the endpoints.
    let mut trend: Vec<Option<f64>> = vec![None; n];
    for t in half..n - half {
        let estimate = if period % 2 == 0 {
            let mut acc = 0.5 * values[t - half] + 0.5 * values[t + half];
            for j in (t - half + 1)..(t + half) {
                acc += values[j];
            }
            acc / period as f64
        } else {
            let mut acc = 0.0;
            for j in (t - half)..=(t + half) {
                acc += values[j];
            }
            acc / period as f64
        };
        trend[t] = Some(estimate);
    }

    // Average detrended ratio per seasonal position, then normalize the
    // factors to mean 1.0.
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for t in 0..n {
        if let Some(tr) = trend[t] {
            if tr > 0.0 {
                sums[t % period] += values[t] / tr;
                counts[t % period] += 1;
            }
        }
    }
    let mut factors: Vec<f64> = (0..period)
        .map(|i| if counts[i] > 0 { sums[i] / counts[i] as f64 } else { 1.0 })
        .collect();
    let mean = factors.iter().sum::<f64>() / period as f64;
    if mean > 0.0 {
        for factor in &mut factors {
            *factor /= mean;
        }
    }

    let seasonal: Vec<f64> = (0..n).map(|t| factors[t % period]).collect();
    let residual: Vec<Option<f64>> = (0..n)
        .map(|t| trend[t].map(|tr| values[t] / (tr * seasonal[t])))
        .collect();

    Ok(Decomposition {
        observed: values.to_vec(),
        trend,
        seasonal,
        residual,
        period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(values: Vec<f64>) -> MonthlySeries {
        MonthlySeries::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), values).unwrap()
    }

    #[test]
    fn rejects_short_series() {
        let result = decompose_multiplicative(&series(vec![100.0; 23]), 12);
        assert!(matches!(
            result,
            Err(ForecastError::InsufficientData { needed: 24, got: 23 })
        ));
    }

    #[test]
    fn rejects_non_positive_values() {
        let mut values = vec![100.0; 24];
        values[5] = 0.0;
        assert!(decompose_multiplicative(&series(values), 12).is_err());
    }

    #[test]
    fn trend_edges_are_undefined() {
        let decomposition = decompose_multiplicative(&series(vec![100.0; 36]), 12).unwrap();
        assert!(decomposition.trend[..6].iter().all(Option::is_none));
        assert!(decomposition.trend[30..].iter().all(Option::is_none));
        assert!(decomposition.trend[6..30].iter().all(Option::is_some));
    }
}
