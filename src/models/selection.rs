//! Automatic model order selection.
//!
//! The search space is the seasonal ARIMA orders over the training data
//! only. [`StepwiseSearch`] is the default: an AIC-minimizing local search
//! in the pmdarima style that starts from a handful of well-known
//! specifications and walks single-step neighbors until no move improves
//! the criterion. It is a heuristic, not guaranteed globally optimal.
//! [`GridSearch`] exhaustively scores the bounded grid and is fully
//! deterministic, which makes it the right strategy for reproducible
//! tests.
//!
//! Candidate orders whose fit fails are skipped silently; the search only
//! errors when no candidate at all can be fitted.

use crate::error::{ForecastError, Result};
use crate::models::sarima::Sarima;
use crate::models::{ForecastModel, SarimaOrders};
use std::collections::HashSet;

/// Strategy for choosing model orders from training data
pub trait OrderSelection {
    /// Choose orders for a training series with the given seasonal period
    fn select(&self, values: &[f64], period: usize) -> Result<SarimaOrders>;
}

/// Shared search bounds
#[derive(Debug, Clone, Copy)]
pub struct SearchBounds {
    pub max_p: usize,
    pub max_q: usize,
    pub max_sp: usize,
    pub max_sq: usize,
    pub max_d: usize,
    pub max_sd: usize,
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_q: 3,
            max_sp: 2,
            max_sq: 2,
            max_d: 2,
            max_sd: 1,
        }
    }
}

/// Stepwise AIC-minimizing order search
#[derive(Debug, Clone, Copy, Default)]
pub struct StepwiseSearch {
    bounds: SearchBounds,
}

impl StepwiseSearch {
    /// Create a search with custom bounds
    pub fn with_bounds(bounds: SearchBounds) -> Self {
        Self { bounds }
    }
}

impl OrderSelection for StepwiseSearch {
    fn select(&self, values: &[f64], period: usize) -> Result<SarimaOrders> {
        let bounds = self.bounds;
        let d = estimate_d(values, bounds.max_d);
        let sd = if period > 1 {
            estimate_seasonal_d(values, period, bounds.max_sd)
        } else {
            0
        };

        let mut tried: HashSet<(usize, usize, usize, usize)> = HashSet::new();
        let mut best: Option<(f64, SarimaOrders)> = None;

        // pmdarima-style starting points, clipped to the bounds.
        let starts = [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)];
        for (p, q, sp, sq) in starts {
            consider(
                values, period, d, sd,
                p.min(bounds.max_p),
                q.min(bounds.max_q),
                sp.min(bounds.max_sp),
                sq.min(bounds.max_sq),
                &mut tried,
                &mut best,
            );
        }

        // Walk single-step neighbors of the incumbent until nothing
        // improves the criterion.
        loop {
            let Some((incumbent_aic, incumbent)) = best else { break };
            for (p, q, sp, sq) in neighbors(incumbent, bounds, period) {
                consider(values, period, d, sd, p, q, sp, sq, &mut tried, &mut best);
            }
            match best {
                Some((aic, _)) if aic < incumbent_aic - 1e-9 => continue,
                _ => break,
            }
        }

        best.map(|(_, orders)| orders).ok_or_else(|| {
            ForecastError::Fit("no candidate model could be fitted".to_string())
        })
    }
}

/// Exhaustive grid search over the bounded order space.
///
/// Deterministic: ties keep the first candidate in enumeration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridSearch {
    bounds: SearchBounds,
}

impl GridSearch {
    /// Create a search with custom bounds
    pub fn with_bounds(bounds: SearchBounds) -> Self {
        Self { bounds }
    }
}

impl OrderSelection for GridSearch {
    fn select(&self, values: &[f64], period: usize) -> Result<SarimaOrders> {
        let bounds = self.bounds;
        let d = estimate_d(values, bounds.max_d);
        let sd = if period > 1 {
            estimate_seasonal_d(values, period, bounds.max_sd)
        } else {
            0
        };
        let (max_sp, max_sq) = if period > 1 {
            (bounds.max_sp, bounds.max_sq)
        } else {
            (0, 0)
        };

        let mut best: Option<(f64, SarimaOrders)> = None;
        for p in 0..=bounds.max_p {
            for q in 0..=bounds.max_q {
                for sp in 0..=max_sp {
                    for sq in 0..=max_sq {
                        let orders = SarimaOrders::new(p, d, q, sp, sd, sq, period);
                        if let Some(aic) = score(values, orders) {
                            let better = match best {
                                Some((best_aic, _)) => aic < best_aic,
                                None => true,
                            };
                            if better {
                                best = Some((aic, orders));
                            }
                        }
                    }
                }
            }
        }

        best.map(|(_, orders)| orders).ok_or_else(|| {
            ForecastError::Fit("no candidate model could be fitted".to_string())
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn consider(
    values: &[f64],
    period: usize,
    d: usize,
    sd: usize,
    p: usize,
    q: usize,
    sp: usize,
    sq: usize,
    tried: &mut HashSet<(usize, usize, usize, usize)>,
    best: &mut Option<(f64, SarimaOrders)>,
) {
    let (sp, sq) = if period > 1 { (sp, sq) } else { (0, 0) };
    if !tried.insert((p, q, sp, sq)) {
        return;
    }
    let orders = SarimaOrders::new(p, d, q, sp, sd, sq, period);
    if let Some(aic) = score(values, orders) {
        log::debug!("candidate {orders}: AIC {aic:.3}");
        let better = match best {
            Some((best_aic, _)) => aic < *best_aic,
            None => true,
        };
        if better {
            *best = Some((aic, orders));
        }
    } else {
        log::debug!("candidate {orders}: fit failed, skipped");
    }
}

/// Single-step moves on each of p, q, P, Q within bounds
fn neighbors(
    orders: SarimaOrders,
    bounds: SearchBounds,
    period: usize,
) -> Vec<(usize, usize, usize, usize)> {
    let mut moves = Vec::new();
    let (p, q, sp, sq) = (orders.p, orders.q, orders.sp, orders.sq);
    if p > 0 {
        moves.push((p - 1, q, sp, sq));
    }
    if p < bounds.max_p {
        moves.push((p + 1, q, sp, sq));
    }
    if q > 0 {
        moves.push((p, q - 1, sp, sq));
    }
    if q < bounds.max_q {
        moves.push((p, q + 1, sp, sq));
    }
    if period > 1 {
        if sp > 0 {
            moves.push((p, q, sp - 1, sq));
        }
        if sp < bounds.max_sp {
            moves.push((p, q, sp + 1, sq));
        }
        if sq > 0 {
            moves.push((p, q, sp, sq - 1));
        }
        if sq < bounds.max_sq {
            moves.push((p, q, sp, sq + 1));
        }
    }
    moves
}

/// AIC of a candidate, or `None` when the fit fails
fn score(values: &[f64], orders: SarimaOrders) -> Option<f64> {
    let model = Sarima::new(orders).ok()?;
    let fitted = model.fit(values).ok()?;
    let aic = fitted.aic();
    aic.is_finite().then_some(aic)
}

/// Choose the regular differencing order by variance reduction
fn estimate_d(values: &[f64], max_d: usize) -> usize {
    let var0 = variance(values);
    if var0 < 1e-10 || max_d == 0 {
        return 0;
    }
    let diff1: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let var1 = variance(&diff1);
    if var1 < var0 * 0.9 {
        if max_d >= 2 && diff1.len() > 1 {
            let diff2: Vec<f64> = diff1.windows(2).map(|w| w[1] - w[0]).collect();
            if variance(&diff2) < var1 * 0.9 {
                return 2;
            }
        }
        return 1;
    }
    0
}

/// Choose the seasonal differencing order by variance reduction
fn estimate_seasonal_d(values: &[f64], period: usize, max_sd: usize) -> usize {
    if max_sd == 0 || values.len() <= period * 2 {
        return 0;
    }
    let var0 = variance(values);
    if var0 < 1e-10 {
        return 0;
    }
    let seasonal_diff: Vec<f64> = (period..values.len())
        .map(|i| values[i] - values[i - period])
        .collect();
    if variance(&seasonal_diff) < var0 * 0.8 {
        1
    } else {
        0
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                100.0
                    + i as f64 * 0.5
                    + 20.0 * (i as f64 * 2.0 * std::f64::consts::PI / 12.0).sin()
            })
            .collect()
    }

    #[test]
    fn stepwise_finds_orders_within_bounds() {
        let values = seasonal_series(72);
        let orders = StepwiseSearch::default().select(&values, 12).unwrap();
        let bounds = SearchBounds::default();
        assert!(orders.p <= bounds.max_p);
        assert!(orders.q <= bounds.max_q);
        assert!(orders.sp <= bounds.max_sp);
        assert!(orders.sq <= bounds.max_sq);
        assert_eq!(orders.period, 12);
    }

    #[test]
    fn grid_search_is_deterministic() {
        let values = seasonal_series(60);
        let grid = GridSearch::default();
        let first = grid.select(&values, 12).unwrap();
        let second = grid.select(&values, 12).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn trending_series_gets_differenced() {
        let values: Vec<f64> = (0..48).map(|i| 10.0 + 3.0 * i as f64).collect();
        assert_eq!(estimate_d(&values, 2), 1);
    }

    #[test]
    fn seasonal_series_gets_seasonal_differencing() {
        let values: Vec<f64> = (0..60)
            .map(|i| 100.0 + 40.0 * (i as f64 * 2.0 * std::f64::consts::PI / 12.0).sin())
            .collect();
        assert_eq!(estimate_seasonal_d(&values, 12, 1), 1);
    }
}
