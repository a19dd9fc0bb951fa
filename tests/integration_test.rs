use sales_forecast::error::ForecastError;
use sales_forecast::models::selection::GridSearch;
use sales_forecast::pipeline::ForecastPipeline;
use std::io::Write;
use tempfile::NamedTempFile;

// Four years of monthly sales with trend and a yearly cycle, written as
// mid-month dated rows the way a sales export would look.
fn sample_sales_file(months: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,sales").unwrap();
    for i in 0..months {
        let year = 2020 + (i / 12) as i32;
        let month = (i % 12) as u32 + 1;
        let value = 500.0
            + 4.0 * i as f64
            + 80.0 * ((month - 1) as f64 * 2.0 * std::f64::consts::PI / 12.0).sin();
        writeln!(file, "{year}-{month:02}-15,{value:.2}").unwrap();
    }
    file
}

#[test]
fn test_full_pipeline_on_synthetic_sales() {
    let file = sample_sales_file(48);
    let report = ForecastPipeline::new()
        .run_file(file.path(), "date", "sales")
        .unwrap();

    assert_eq!(report.series.len(), 48);
    assert_eq!(report.train.len(), 36);
    assert_eq!(report.test.len(), 12);
    assert_eq!(report.forecast.len(), 12);
    assert!(report.notices.is_empty());

    // Forecast months line up with the held-out year.
    assert_eq!(report.forecast_months(), report.test.months());

    // Decomposition is aligned to the cleaned series.
    assert_eq!(report.decomposition.observed.len(), 48);
    assert_eq!(report.decomposition.period, 12);

    assert!(report.rmse.is_finite());
    assert!(report.rmse >= 0.0);
    assert!(report.forecast.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_pipeline_report_display() {
    let file = sample_sales_file(48);
    let report = ForecastPipeline::new()
        .run_file(file.path(), "date", "sales")
        .unwrap();

    let text = report.to_string();
    assert!(text.contains("Test RMSE:"));
    assert!(text.contains("Train data points: 36 months"));
    assert!(text.contains("Test data points: 12 months"));
    assert!(text.contains("Forecast (95% interval):"));
    assert!(text.contains("SARIMA("));
}

#[test]
fn test_pipeline_with_grid_search_is_reproducible() {
    let file = sample_sales_file(48);
    let run = || {
        ForecastPipeline::new()
            .with_selector(Box::new(GridSearch::default()))
            .run_file(file.path(), "date", "sales")
            .unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.orders, second.orders);
    assert_eq!(first.forecast.values(), second.forecast.values());
    assert_eq!(first.rmse, second.rmse);
}

#[test]
fn test_short_series_fails_before_modelling() {
    let file = sample_sales_file(10);
    let result = ForecastPipeline::new().run_file(file.path(), "date", "sales");
    assert!(matches!(
        result,
        Err(ForecastError::InsufficientData { needed: 24, got: 10 })
    ));
}

#[test]
fn test_wrong_column_name_fails_before_cleaning_output() {
    let file = sample_sales_file(48);
    let result = ForecastPipeline::new().run_file(file.path(), "date", "amount");
    assert!(matches!(result, Err(ForecastError::MissingColumn(_))));
}
