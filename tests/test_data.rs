use sales_forecast::data::{DataLoader, MonthlySeries};
use sales_forecast::error::ForecastError;
use chrono::NaiveDate;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,sales").unwrap();
    writeln!(file, "2021-01-05,100").unwrap();
    writeln!(file, "2021-02-03,120").unwrap();
    writeln!(file, "2021-03-02,140").unwrap();

    let table = DataLoader::from_csv(file.path()).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.headers(), &["date".to_string(), "sales".to_string()]);
    assert_eq!(table.column_index("sales").unwrap(), 1);
}

#[test]
fn test_data_loader_latin1_fallback() {
    // 0xE9 is 'é' in Latin-1 but invalid on its own in UTF-8.
    let mut bytes = b"date,ventes \xE9t\xE9\n".to_vec();
    bytes.extend_from_slice(b"2021-01-05,100\n");

    let table = DataLoader::from_bytes(&bytes).unwrap();

    assert_eq!(table.headers()[1], "ventes \u{e9}t\u{e9}");
    assert_eq!(table.len(), 1);
}

#[test]
fn test_data_loader_missing_file() {
    let result = DataLoader::from_csv("nonexistent_file.csv");
    assert!(matches!(result, Err(ForecastError::Io(_))));
}

#[test]
fn test_column_lookup_reports_missing_name() {
    let table = DataLoader::from_bytes(b"date,sales\n2021-01-05,100\n").unwrap();
    let result = table.column_index("revenue");
    assert!(matches!(result, Err(ForecastError::MissingColumn(name)) if name == "revenue"));
}

#[test]
fn test_holdout_split_is_contiguous() {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let values: Vec<f64> = (0..36).map(|i| 100.0 + i as f64).collect();
    let series = MonthlySeries::new(start, values).unwrap();

    let (train, test) = series.holdout(12).unwrap();

    assert_eq!(train.len(), 24);
    assert_eq!(test.len(), 12);
    assert_eq!(train.start(), start);
    assert_eq!(test.start(), NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    assert_eq!(test.end(), series.end());
    assert_eq!(train.values().last(), Some(&123.0));
    assert_eq!(test.values().first(), Some(&124.0));
}
