//! The five-stage forecasting pipeline and its report.
//!
//! One [`ForecastPipeline`] run owns its whole state: ingestion, cleaning,
//! decomposition, model selection and fit, forecast and evaluation run in
//! that order, each stage consuming the previous stage's output read-only.
//! Fatal errors abort the run with no partial report; non-fatal notices are
//! collected on the report and the pipeline continues.

use crate::cleaning::{clean, Notice};
use crate::data::{DataLoader, MonthlySeries, RawTable};
use crate::decompose::{decompose_multiplicative, Decomposition};
use crate::error::Result;
use crate::metrics;
use crate::models::sarima::Sarima;
use crate::models::selection::{OrderSelection, StepwiseSearch};
use crate::models::{Forecast, ForecastModel, FittedForecastModel, SarimaOrders};
use chrono::NaiveDate;
use std::fmt;
use std::path::Path;

/// Session-scoped forecasting pipeline.
///
/// Holds the run configuration; every call to [`ForecastPipeline::run`]
/// executes the full pipeline from scratch with no state shared between
/// runs.
pub struct ForecastPipeline {
    period: usize,
    horizon: usize,
    confidence_level: f64,
    selector: Box<dyn OrderSelection>,
}

impl Default for ForecastPipeline {
    fn default() -> Self {
        Self {
            period: 12,
            horizon: 12,
            confidence_level: 0.95,
            selector: Box::new(StepwiseSearch::default()),
        }
    }
}

impl ForecastPipeline {
    /// Pipeline with the default configuration: monthly period 12,
    /// 12-step horizon, 95% confidence, stepwise order search
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the order selection strategy
    pub fn with_selector(mut self, selector: Box<dyn OrderSelection>) -> Self {
        self.selector = selector;
        self
    }

    /// Run the full pipeline on a CSV file
    pub fn run_file<P: AsRef<Path>>(
        &self,
        path: P,
        date_col: &str,
        sales_col: &str,
    ) -> Result<ForecastReport> {
        let table = DataLoader::from_csv(path)?;
        self.run_table(&table, date_col, sales_col)
    }

    /// Run the full pipeline on uploaded bytes
    pub fn run(&self, bytes: &[u8], date_col: &str, sales_col: &str) -> Result<ForecastReport> {
        let table = DataLoader::from_bytes(bytes)?;
        self.run_table(&table, date_col, sales_col)
    }

    /// Run the cleaning through evaluation stages on a parsed table
    pub fn run_table(
        &self,
        table: &RawTable,
        date_col: &str,
        sales_col: &str,
    ) -> Result<ForecastReport> {
        let (series, notices) = clean(table, date_col, sales_col)?;
        log::debug!(
            "cleaned series covers {} months from {}",
            series.len(),
            series.start()
        );

        let decomposition = decompose_multiplicative(&series, self.period)?;

        let (train, test) = series.holdout(self.horizon)?;
        let orders = self.selector.select(train.values(), self.period)?;
        log::debug!("selected orders {orders}");

        let model = Sarima::new(orders)?.fit(train.values())?;
        let model_summary = model.summary();
        let forecast = model.forecast(self.horizon, self.confidence_level)?;
        let rmse = metrics::rmse(test.values(), forecast.values())?;

        Ok(ForecastReport {
            series,
            decomposition,
            train,
            test,
            orders,
            model_summary,
            forecast,
            rmse,
            notices,
        })
    }
}

impl fmt::Debug for ForecastPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastPipeline")
            .field("period", &self.period)
            .field("horizon", &self.horizon)
            .field("confidence_level", &self.confidence_level)
            .finish_non_exhaustive()
    }
}

/// Everything one pipeline run produces.
///
/// The aligned series (cleaned, train, test, forecast with bounds) are the
/// chart-ready data for a caller-side display; this crate renders only the
/// textual report via [`fmt::Display`].
#[derive(Debug)]
pub struct ForecastReport {
    /// The cleaned, gap-free monthly series
    pub series: MonthlySeries,
    /// Multiplicative decomposition of the full cleaned series
    pub decomposition: Decomposition,
    /// Training prefix (all but the last 12 months)
    pub train: MonthlySeries,
    /// Test suffix (exactly the last 12 months)
    pub test: MonthlySeries,
    /// Orders chosen by the selection strategy
    pub orders: SarimaOrders,
    /// Textual summary of the fitted model
    pub model_summary: String,
    /// 12-step forecast with confidence bounds, aligned to the test months
    pub forecast: Forecast,
    /// Out-of-sample root mean squared error
    pub rmse: f64,
    /// Non-fatal notices raised during cleaning
    pub notices: Vec<Notice>,
}

impl ForecastReport {
    /// Months the forecast points refer to (the test suffix months)
    pub fn forecast_months(&self) -> Vec<NaiveDate> {
        self.test.months()
    }
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for notice in &self.notices {
            writeln!(f, "Warning: {notice}")?;
        }
        writeln!(
            f,
            "Sales series: {} months from {} to {}",
            self.series.len(),
            self.series.start(),
            self.series.end()
        )?;
        writeln!(f, "Train data points: {} months", self.train.len())?;
        writeln!(f, "Test data points: {} months", self.test.len())?;
        writeln!(f)?;
        write!(f, "{}", self.model_summary)?;
        writeln!(f)?;
        writeln!(f, "Test RMSE: {:.2}", self.rmse)?;
        writeln!(f)?;
        writeln!(f, "Forecast ({:.0}% interval):", self.forecast.confidence_level() * 100.0)?;
        let months = self.forecast_months();
        for (i, value) in self.forecast.values().iter().enumerate() {
            let (lower, upper) = self.forecast.intervals()[i];
            writeln!(
                f,
                "  {}  {:>12.2}  [{:>12.2}, {:>12.2}]",
                months[i], value, lower, upper
            )?;
        }
        Ok(())
    }
}
