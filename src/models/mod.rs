//! Seasonal forecasting models

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod sarima;
pub mod selection;

/// SARIMA model orders: non-seasonal `(p,d,q)` and seasonal `(P,D,Q)`
/// with a fixed seasonal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarimaOrders {
    /// Non-seasonal AR order
    pub p: usize,
    /// Non-seasonal differencing order
    pub d: usize,
    /// Non-seasonal MA order
    pub q: usize,
    /// Seasonal AR order
    pub sp: usize,
    /// Seasonal differencing order
    pub sd: usize,
    /// Seasonal MA order
    pub sq: usize,
    /// Seasonal period (12 for monthly data with yearly seasonality)
    pub period: usize,
}

impl SarimaOrders {
    /// Create a full seasonal order specification
    pub fn new(p: usize, d: usize, q: usize, sp: usize, sd: usize, sq: usize, period: usize) -> Self {
        Self { p, d, q, sp, sd, sq, period }
    }

    /// Create a non-seasonal specification
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 1)
    }

    /// Number of estimated coefficients (excluding the innovation variance)
    pub fn param_count(&self) -> usize {
        self.p + self.q + self.sp + self.sq
    }

    /// Total differencing offset in observations
    pub fn diff_offset(&self) -> usize {
        self.d + self.period * self.sd
    }
}

impl fmt::Display for SarimaOrders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})({},{},{})[{}]",
            self.p, self.d, self.q, self.sp, self.sd, self.sq, self.period
        )
    }
}

/// Forecast result: point forecasts with per-point confidence bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
    confidence_level: f64,
}

impl Forecast {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, intervals: Vec<(f64, f64)>, confidence_level: f64) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::Forecasting(format!(
                "values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }
        Ok(Self { values, intervals, confidence_level })
    }

    /// Point forecasts
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Lower/upper confidence bounds per point
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Confidence level of the bounds, e.g. 0.95
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Number of forecast steps
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the forecast is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forecast model that can be fit to a monthly series
pub trait ForecastModel: fmt::Debug {
    /// The type of fitted model produced
    type Fitted: FittedForecastModel;

    /// Fit the model to chronologically ordered values
    fn fit(&self, values: &[f64]) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> String;
}

/// Fitted forecast model, immutable once fit
pub trait FittedForecastModel: fmt::Debug {
    /// Generate a forecast with confidence bounds for future periods
    fn forecast(&self, horizon: usize, confidence_level: f64) -> Result<Forecast>;

    /// Name of the model
    fn name(&self) -> String;
}
