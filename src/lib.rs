//! # Sales Forecast
//!
//! A Rust library for monthly sales forecasting from raw transactional CSV data.
//!
//! ## Features
//!
//! - CSV ingestion with UTF-8 and Latin-1 decoding
//! - Order-sensitive cleaning into a gap-free monthly series
//! - Multiplicative seasonal decomposition (trend, seasonal, residual)
//! - Seasonal ARIMA modelling with automatic order selection
//! - 12-month forecasts with 95% confidence bounds and holdout RMSE
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sales_forecast::pipeline::ForecastPipeline;
//!
//! # fn main() -> sales_forecast::error::Result<()> {
//! // Run the full pipeline on a sales file
//! let report = ForecastPipeline::new().run_file("sales.csv", "date", "sales")?;
//!
//! // Out-of-sample accuracy on the last 12 months
//! println!("Test RMSE: {:.2}", report.rmse);
//!
//! // The 12-month forecast with confidence bounds
//! for (month, value) in report.forecast_months().iter().zip(report.forecast.values()) {
//!     println!("{month}: {value:.2}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The stages are also usable on their own: [`data::DataLoader`] parses
//! bytes into a [`data::RawTable`], [`cleaning::clean`] regularizes it into
//! a [`data::MonthlySeries`], [`decompose::decompose_multiplicative`]
//! splits it into components, and the [`models`] module fits and forecasts.

pub mod cleaning;
pub mod data;
pub mod decompose;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;

// Re-export commonly used types
pub use crate::data::{DataLoader, MonthlySeries, RawTable};
pub use crate::error::{ForecastError, Result};
pub use crate::models::{Forecast, ForecastModel, FittedForecastModel, SarimaOrders};
pub use crate::pipeline::{ForecastPipeline, ForecastReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
