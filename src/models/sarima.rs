//! Seasonal ARIMA estimation and forecasting.
//!
//! Fitting is conditional least squares: the series is differenced
//! (regular and seasonal), AR and MA coefficients are estimated by a
//! Hannan-Rissanen style regression (a long autoregression supplies
//! innovation estimates for the MA columns), and the innovation variance
//! and log-likelihood follow from the recursion residuals. Stationarity
//! and invertibility are not enforced; a model with explosive estimated
//! coefficients fits and forecasts rather than failing.
//!
//! Forecasts use the difference-equation form of the full model
//! polynomial, so point forecasts land on the original scale without a
//! separate integration pass. Confidence bounds come from the cumulative
//! psi-weight variance of the integrated representation.

use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, FittedForecastModel, SarimaOrders};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Write as _;

/// SARIMA model specification, bound to a set of orders
#[derive(Debug, Clone)]
pub struct Sarima {
    orders: SarimaOrders,
}

impl Sarima {
    /// Create a new SARIMA model for the given orders
    pub fn new(orders: SarimaOrders) -> Result<Self> {
        if orders.period == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        if (orders.sp > 0 || orders.sd > 0 || orders.sq > 0) && orders.period < 2 {
            return Err(ForecastError::InvalidParameter(
                "seasonal orders require a period of at least 2".to_string(),
            ));
        }
        Ok(Self { orders })
    }

    /// The model orders
    pub fn orders(&self) -> SarimaOrders {
        self.orders
    }
}

impl ForecastModel for Sarima {
    type Fitted = FittedSarima;

    fn fit(&self, values: &[f64]) -> Result<FittedSarima> {
        fit_sarima(self.orders, values)
    }

    fn name(&self) -> String {
        format!("SARIMA{}", self.orders)
    }
}

/// A fitted SARIMA model, immutable once fit
#[derive(Debug, Clone)]
pub struct FittedSarima {
    orders: SarimaOrders,
    ar: Vec<f64>,
    seasonal_ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ma: Vec<f64>,
    /// Training values on the original scale
    history: Vec<f64>,
    /// Recursion residuals on the differenced scale
    residuals: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
}

impl FittedSarima {
    /// The model orders
    pub fn orders(&self) -> SarimaOrders {
        self.orders
    }

    /// Non-seasonal AR coefficients
    pub fn ar(&self) -> &[f64] {
        &self.ar
    }

    /// Seasonal AR coefficients
    pub fn seasonal_ar(&self) -> &[f64] {
        &self.seasonal_ar
    }

    /// Non-seasonal MA coefficients
    pub fn ma(&self) -> &[f64] {
        &self.ma
    }

    /// Seasonal MA coefficients
    pub fn seasonal_ma(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Gaussian log-likelihood of the differenced series
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        let k = self.orders.param_count() as f64 + 1.0;
        -2.0 * self.log_likelihood + 2.0 * k
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> f64 {
        let k = self.orders.param_count() as f64 + 1.0;
        let n = self.residuals.len().max(1) as f64;
        -2.0 * self.log_likelihood + k * n.ln()
    }

    /// Textual model summary: order tuple, coefficient table and fit
    /// diagnostics
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "SARIMA{} Results", self.orders);
        let _ = writeln!(
            out,
            "Observations: {} (after differencing: {})",
            self.history.len(),
            self.residuals.len()
        );
        let _ = writeln!(out, "Log Likelihood: {:.3}", self.log_likelihood);
        let _ = writeln!(out, "AIC: {:.3}  BIC: {:.3}", self.aic(), self.bic());
        let _ = writeln!(out, "sigma2: {:.4}", self.sigma2);
        if self.orders.param_count() > 0 {
            let _ = writeln!(out, "Coefficients:");
            for (i, c) in self.ar.iter().enumerate() {
                let _ = writeln!(out, "  ar.L{:<4} {:>10.4}", i + 1, c);
            }
            for (i, c) in self.ma.iter().enumerate() {
                let _ = writeln!(out, "  ma.L{:<4} {:>10.4}", i + 1, c);
            }
            for (i, c) in self.seasonal_ar.iter().enumerate() {
                let _ = writeln!(out, "  ar.S.L{:<2} {:>10.4}", (i + 1) * self.orders.period, c);
            }
            for (i, c) in self.seasonal_ma.iter().enumerate() {
                let _ = writeln!(out, "  ma.S.L{:<2} {:>10.4}", (i + 1) * self.orders.period, c);
            }
        }
        out
    }

    /// Residual of the differenced series at an original-scale time index
    fn residual_at(&self, time: usize) -> Option<f64> {
        time.checked_sub(self.orders.diff_offset())
            .and_then(|i| self.residuals.get(i))
            .copied()
    }

    /// The full AR-side polynomial `phi(B) Phi(B^s) (1-B)^d (1-B^s)^D`
    fn full_ar_polynomial(&self) -> Vec<f64> {
        let ar = additive_polynomial(&self.ar, &self.seasonal_ar, self.orders.period, -1.0);
        let diff = polynomial_multiply(
            &difference_polynomial(1, self.orders.d),
            &difference_polynomial(self.orders.period, self.orders.sd),
        );
        polynomial_multiply(&ar, &diff)
    }

    /// The MA-side polynomial `1 + theta(B) + Theta(B^s)`
    fn ma_polynomial(&self) -> Vec<f64> {
        additive_polynomial(&self.ma, &self.seasonal_ma, self.orders.period, 1.0)
    }
}

impl FittedForecastModel for FittedSarima {
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<Forecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast horizon must be positive".to_string(),
            ));
        }
        if confidence_level <= 0.0 || confidence_level >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "confidence level must be between 0 and 1".to_string(),
            ));
        }

        let full_ar = self.full_ar_polynomial();
        let ma_poly = self.ma_polynomial();
        let n = self.history.len();

        // Point forecasts by the difference-equation recursion on the
        // original series; future innovations are zero.
        let mut extended = self.history.to_vec();
        for h in 1..=horizon {
            let t = n + h - 1;
            let mut value = 0.0;
            for (j, coefficient) in full_ar.iter().enumerate().skip(1) {
                if t >= j {
                    value -= coefficient * extended[t - j];
                }
            }
            for (k, coefficient) in ma_poly.iter().enumerate().skip(h) {
                if t >= k {
                    if let Some(e) = self.residual_at(t - k) {
                        value += coefficient * e;
                    }
                }
            }
            extended.push(value);
        }
        let means = extended[n..].to_vec();

        // Widening interval from the cumulative psi-weight variance.
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::Forecasting(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + confidence_level / 2.0);
        let psi = psi_weights(&full_ar, &ma_poly, horizon);
        let mut cumulative = 0.0;
        let mut intervals = Vec::with_capacity(horizon);
        for (h, mean) in means.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let margin = z * (self.sigma2 * cumulative).sqrt();
            intervals.push((mean - margin, mean + margin));
        }

        Forecast::new(means, intervals, confidence_level)
    }

    fn name(&self) -> String {
        format!("SARIMA{}", self.orders)
    }
}

/// Fit a SARIMA model to chronologically ordered values
fn fit_sarima(orders: SarimaOrders, values: &[f64]) -> Result<FittedSarima> {
    let offset = orders.diff_offset();
    if values.len() <= offset + 1 {
        return Err(ForecastError::Fit(format!(
            "series of length {} is too short for differencing orders d={} D={}",
            values.len(),
            orders.d,
            orders.sd
        )));
    }

    let regular = difference(values, 1, orders.d);
    let w = difference(&regular, orders.period, orders.sd);
    let n = w.len();

    let ar_lags = combined_lags(orders.p, orders.sp, orders.period);
    let ma_lags = combined_lags(orders.q, orders.sq, orders.period);
    let k = ar_lags.len() + ma_lags.len();
    let max_lag = ar_lags.iter().chain(ma_lags.iter()).max().copied().unwrap_or(0);
    if k > 0 && n < max_lag + k + 2 {
        return Err(ForecastError::Fit(format!(
            "{} differenced observations cannot identify {} coefficients up to lag {}",
            n, k, max_lag
        )));
    }

    let (ar_all, ma_all) = if k == 0 {
        (Vec::new(), Vec::new())
    } else {
        estimate_coefficients(&w, &ar_lags, &ma_lags)?
    };
    let (ar, seasonal_ar) = split_coefficients(&ar_all, orders.p);
    let (ma, seasonal_ma) = split_coefficients(&ma_all, orders.q);

    // Recursion residuals of the fitted ARMA form on the differenced
    // series, with zero initial conditions.
    let mut residuals = vec![0.0; n];
    for t in 0..n {
        let mut prediction = 0.0;
        for (coefficient, &lag) in ar_all.iter().zip(ar_lags.iter()) {
            if t >= lag {
                prediction += coefficient * w[t - lag];
            }
        }
        for (coefficient, &lag) in ma_all.iter().zip(ma_lags.iter()) {
            if t >= lag {
                prediction += coefficient * residuals[t - lag];
            }
        }
        residuals[t] = w[t] - prediction;
    }

    let mut sigma2 = residuals.iter().map(|e| e * e).sum::<f64>() / n.max(1) as f64;
    if !sigma2.is_finite() {
        return Err(ForecastError::Fit(
            "non-finite innovation variance".to_string(),
        ));
    }
    if sigma2 <= 0.0 {
        sigma2 = f64::EPSILON;
    }
    let log_likelihood = gaussian_log_likelihood(&residuals, sigma2);

    Ok(FittedSarima {
        orders,
        ar,
        seasonal_ar,
        ma,
        seasonal_ma,
        history: values.to_vec(),
        residuals,
        sigma2,
        log_likelihood,
    })
}

/// Difference a series `order` times at the given lag
fn difference(values: &[f64], lag: usize, order: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..order {
        if out.len() <= lag {
            return Vec::new();
        }
        out = (lag..out.len()).map(|i| out[i] - out[i - lag]).collect();
    }
    out
}

/// Lags of the non-seasonal terms followed by the seasonal ones
fn combined_lags(order: usize, seasonal_order: usize, period: usize) -> Vec<usize> {
    let mut lags: Vec<usize> = (1..=order).collect();
    lags.extend((1..=seasonal_order).map(|j| j * period));
    lags
}

fn split_coefficients(all: &[f64], non_seasonal: usize) -> (Vec<f64>, Vec<f64>) {
    (all[..non_seasonal].to_vec(), all[non_seasonal..].to_vec())
}

/// Hannan-Rissanen estimation: regress the differenced series on its own
/// lags and on lagged innovation estimates from a long autoregression.
/// Returns the AR-side and MA-side coefficient vectors in lag order.
fn estimate_coefficients(
    w: &[f64],
    ar_lags: &[usize],
    ma_lags: &[usize],
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = w.len();
    let innovations = if ma_lags.is_empty() {
        None
    } else {
        Some(long_ar_innovations(w, ma_lags)?)
    };

    let start = ar_lags
        .iter()
        .chain(ma_lags.iter())
        .max()
        .copied()
        .unwrap_or(0);
    let k = ar_lags.len() + ma_lags.len();
    let rows = n - start;
    if rows < k + 2 {
        return Err(ForecastError::Fit(format!(
            "only {} usable rows for {} regression coefficients",
            rows, k
        )));
    }

    let mut design = Vec::with_capacity(rows * k);
    let mut target = Vec::with_capacity(rows);
    for t in start..n {
        for &lag in ar_lags {
            design.push(w[t - lag]);
        }
        if let Some(e) = &innovations {
            for &lag in ma_lags {
                design.push(e[t - lag]);
            }
        }
        target.push(w[t]);
    }
    let x = DMatrix::from_row_slice(rows, k, &design);
    let y = DVector::from_row_slice(&target);

    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| ForecastError::Fit("singular regression design".to_string()))?;

    let coefficients: Vec<f64> = beta.iter().copied().collect();
    Ok((
        coefficients[..ar_lags.len()].to_vec(),
        coefficients[ar_lags.len()..].to_vec(),
    ))
}

/// Innovation estimates from a long autoregression fit with Levinson-Durbin
fn long_ar_innovations(w: &[f64], ma_lags: &[usize]) -> Result<Vec<f64>> {
    let n = w.len();
    let max_ma_lag = ma_lags.iter().max().copied().unwrap_or(1);
    let order = ((n as f64).sqrt().ceil() as usize)
        .max(max_ma_lag)
        .min(n.saturating_sub(2) / 2);
    if order == 0 {
        return Err(ForecastError::Fit(
            "series too short for the long autoregression".to_string(),
        ));
    }

    let acf = autocorrelations(w, order);
    let phi = levinson_durbin(&acf, order);

    let mut innovations = vec![0.0; n];
    for t in order..n {
        let mut prediction = 0.0;
        for (j, coefficient) in phi.iter().enumerate() {
            prediction += coefficient * w[t - j - 1];
        }
        innovations[t] = w[t] - prediction;
    }
    Ok(innovations)
}

/// Sample autocorrelations up to `max_lag` inclusive; `acf[0] == 1`
fn autocorrelations(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let variance = centered.iter().map(|v| v * v).sum::<f64>() / n as f64;
    if variance.abs() < 1e-12 {
        return vec![0.0; max_lag + 1];
    }

    let mut acf = Vec::with_capacity(max_lag + 1);
    for lag in 0..=max_lag {
        let covariance: f64 = centered
            .iter()
            .take(n - lag)
            .zip(centered.iter().skip(lag))
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        acf.push(covariance / variance);
    }
    acf
}

/// Solve the Yule-Walker equations via the Levinson-Durbin recursion
fn levinson_durbin(acf: &[f64], order: usize) -> Vec<f64> {
    if order == 0 || acf.len() <= order {
        return Vec::new();
    }

    let mut phi = vec![vec![0.0; order]; order];
    phi[0][0] = acf[1];

    for k in 1..order {
        let mut numerator = acf[k + 1];
        let mut denominator = 1.0;
        for j in 0..k {
            numerator -= phi[k - 1][j] * acf[k - j];
            denominator -= phi[k - 1][j] * acf[j + 1];
        }
        let reflection = if denominator.abs() < 1e-12 {
            0.0
        } else {
            numerator / denominator
        };
        phi[k][k] = reflection;
        for j in 0..k {
            phi[k][j] = phi[k - 1][j] - reflection * phi[k - 1][k - 1 - j];
        }
    }

    phi[order - 1].clone()
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    // Try progressively looser tolerances if the strict solve fails.
    for &tolerance in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tolerance) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

fn gaussian_log_likelihood(residuals: &[f64], variance: f64) -> f64 {
    let n = residuals.len() as f64;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = residuals.iter().map(|r| r * r).sum();
    -0.5 * n * (2.0 * std::f64::consts::PI).ln() - 0.5 * n * variance.ln()
        - sum_sq / (2.0 * variance)
}

/// `1 + sign * (c_1 B + ... )` with seasonal terms at multiples of `period`
fn additive_polynomial(
    non_seasonal: &[f64],
    seasonal: &[f64],
    period: usize,
    sign: f64,
) -> Vec<f64> {
    let degree = non_seasonal
        .len()
        .max(seasonal.len() * period.max(1));
    let mut poly = vec![0.0; degree + 1];
    poly[0] = 1.0;
    for (i, c) in non_seasonal.iter().enumerate() {
        poly[i + 1] += sign * c;
    }
    for (j, c) in seasonal.iter().enumerate() {
        poly[(j + 1) * period] += sign * c;
    }
    poly
}

/// `(1 - B^lag)^order`
fn difference_polynomial(lag: usize, order: usize) -> Vec<f64> {
    let mut base = vec![0.0; lag + 1];
    base[0] = 1.0;
    base[lag] = -1.0;
    let mut poly = vec![1.0];
    for _ in 0..order {
        poly = polynomial_multiply(&poly, &base);
    }
    poly
}

fn polynomial_multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, av) in a.iter().enumerate() {
        for (j, bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

/// Psi weights of the moving-average representation, `psi[0] == 1`
fn psi_weights(full_ar: &[f64], ma_poly: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    psi.push(1.0);
    for j in 1..count {
        let mut value = if j < ma_poly.len() { ma_poly[j] } else { 0.0 };
        for i in 1..full_ar.len().min(j + 1) {
            value -= full_ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FittedForecastModel;

    #[test]
    fn random_walk_forecast_is_flat() {
        let values = vec![10.0, 12.0, 11.0, 14.0, 13.0, 15.0, 16.0, 15.0, 17.0, 18.0];
        let model = Sarima::new(SarimaOrders::arima(0, 1, 0)).unwrap();
        let fitted = model.fit(&values).unwrap();
        let forecast = fitted.forecast(4, 0.95).unwrap();
        for value in forecast.values() {
            assert!((value - 18.0).abs() < 1e-9);
        }
    }

    #[test]
    fn seasonal_naive_repeats_last_cycle() {
        // Pure seasonal differencing repeats the final season exactly.
        let pattern = [1.0, 2.0, 3.0, 4.0];
        let values: Vec<f64> = (0..12).map(|i| pattern[i % 4]).collect();
        let orders = SarimaOrders::new(0, 0, 0, 0, 1, 0, 4);
        let fitted = Sarima::new(orders).unwrap().fit(&values).unwrap();
        let forecast = fitted.forecast(4, 0.95).unwrap();
        for (value, expected) in forecast.values().iter().zip(pattern.iter()) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn ar1_coefficient_is_recovered() {
        use rand::{rngs::StdRng, SeedableRng};
        use rand_distr::Distribution;

        // x_t = 0.7 x_{t-1} + e_t with seeded Gaussian noise.
        let mut rng = StdRng::seed_from_u64(42);
        let noise = rand_distr::Normal::new(0.0, 1.0).unwrap();
        let mut values = vec![0.0];
        for _ in 0..400 {
            let next = 0.7 * values.last().copied().unwrap_or(0.0) + noise.sample(&mut rng);
            values.push(next);
        }
        let fitted = Sarima::new(SarimaOrders::arima(1, 0, 0))
            .unwrap()
            .fit(&values)
            .unwrap();
        assert!((fitted.ar()[0] - 0.7).abs() < 0.15, "ar1 = {}", fitted.ar()[0]);
    }

    #[test]
    fn intervals_widen_with_horizon() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64 + (i % 5) as f64).collect();
        let fitted = Sarima::new(SarimaOrders::arima(1, 1, 1))
            .unwrap()
            .fit(&values)
            .unwrap();
        let forecast = fitted.forecast(10, 0.95).unwrap();
        let widths: Vec<f64> = forecast
            .intervals()
            .iter()
            .map(|(lo, hi)| hi - lo)
            .collect();
        assert!(widths[9] > widths[0]);
    }

    #[test]
    fn summary_reports_orders_and_diagnostics() {
        let values: Vec<f64> = (0..30).map(|i| 50.0 + (i % 7) as f64).collect();
        let fitted = Sarima::new(SarimaOrders::arima(1, 0, 1))
            .unwrap()
            .fit(&values)
            .unwrap();
        let summary = fitted.summary();
        assert!(summary.contains("SARIMA(1,0,1)(0,0,0)[1]"));
        assert!(summary.contains("AIC"));
        assert!(summary.contains("ar.L1"));
        assert!(summary.contains("ma.L1"));
        assert!(fitted.aic().is_finite());
    }

    #[test]
    fn too_short_series_fails_to_fit() {
        let values = vec![1.0, 2.0, 3.0];
        let orders = SarimaOrders::new(0, 1, 0, 0, 1, 0, 12);
        assert!(Sarima::new(orders).unwrap().fit(&values).is_err());
    }
}
