//! Raw table ingestion and the regularized monthly series

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use std::fs;
use std::path::Path;

/// An unordered table of string cells, as parsed from the uploaded file.
///
/// No schema is assumed beyond a header row; the date and sales columns
/// are selected by name during cleaning.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Column names from the header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in original file order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name to its index
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
    }
}

/// Data loader for delimited sales tables
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a table from a CSV file on disk
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a table from raw bytes.
    ///
    /// The bytes are decoded as UTF-8 first; on a decode failure the same
    /// bytes are re-decoded as Latin-1. There is no further fallback.
    pub fn from_bytes(bytes: &[u8]) -> Result<RawTable> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::parse(text),
            Err(_) => {
                // Latin-1 maps every byte to the Unicode code point of the
                // same value, so this decode cannot fail.
                let text: String = bytes.iter().map(|&b| char::from(b)).collect();
                Self::parse(&text)
            }
        }
    }

    fn parse(text: &str) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ForecastError::Ingestion(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() {
            return Err(ForecastError::Ingestion("empty header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ForecastError::Ingestion(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable { headers, rows })
    }
}

/// A regularized monthly time series.
///
/// The index starts at `start` (always a first-of-month date) and advances
/// one calendar month per value, so the no-gaps invariant holds by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl MonthlySeries {
    /// Create a series anchored at the month containing `start`
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
        Ok(Self {
            start: month_start(start),
            values,
        })
    }

    /// First month of the series
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last month of the series
    pub fn end(&self) -> NaiveDate {
        self.month_at(self.values.len() - 1)
    }

    /// Monthly values in chronological order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of months covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Month of the i-th value
    pub fn month_at(&self, index: usize) -> NaiveDate {
        add_months(self.start, index)
    }

    /// All months of the index, in order
    pub fn months(&self) -> Vec<NaiveDate> {
        (0..self.values.len()).map(|i| self.month_at(i)).collect()
    }

    /// Value for a given calendar month, if covered
    pub fn get(&self, month: NaiveDate) -> Option<f64> {
        let month = month_start(month);
        if month < self.start {
            return None;
        }
        let index = months_between(self.start, month);
        self.values.get(index).copied()
    }

    /// Split into a training prefix and a test suffix of exactly
    /// `test_len` points.
    ///
    /// Requires at least `test_len + 1` points so the training prefix is
    /// never empty.
    pub fn holdout(&self, test_len: usize) -> Result<(MonthlySeries, MonthlySeries)> {
        if test_len == 0 {
            return Err(ForecastError::InvalidParameter(
                "holdout length must be positive".to_string(),
            ));
        }
        if self.values.len() < test_len + 1 {
            return Err(ForecastError::InsufficientData {
                needed: test_len + 1,
                got: self.values.len(),
            });
        }
        let split = self.values.len() - test_len;
        let train = MonthlySeries {
            start: self.start,
            values: self.values[..split].to_vec(),
        };
        let test = MonthlySeries {
            start: self.month_at(split),
            values: self.values[split..].to_vec(),
        };
        Ok((train, test))
    }
}

/// First day of the month containing `date`
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Advance a first-of-month date by `n` calendar months
pub(crate) fn add_months(date: NaiveDate, n: usize) -> NaiveDate {
    date.checked_add_months(Months::new(n as u32)).unwrap_or(date)
}

/// Whole months from `start` to `end`, both first-of-month, `end >= start`
pub(crate) fn months_between(start: NaiveDate, end: NaiveDate) -> usize {
    let years = end.year() - start.year();
    let months = years * 12 + end.month() as i32 - start.month() as i32;
    months.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_index_is_contiguous() {
        let series = MonthlySeries::new(date(2021, 11, 1), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            series.months(),
            vec![date(2021, 11, 1), date(2021, 12, 1), date(2022, 1, 1)]
        );
        assert_eq!(series.end(), date(2022, 1, 1));
    }

    #[test]
    fn start_is_normalized_to_month_start() {
        let series = MonthlySeries::new(date(2021, 3, 17), vec![5.0]).unwrap();
        assert_eq!(series.start(), date(2021, 3, 1));
    }

    #[test]
    fn get_by_month() {
        let series = MonthlySeries::new(date(2021, 1, 1), vec![10.0, 20.0]).unwrap();
        assert_eq!(series.get(date(2021, 2, 1)), Some(20.0));
        assert_eq!(series.get(date(2021, 3, 1)), None);
        assert_eq!(series.get(date(2020, 12, 1)), None);
    }

    #[test]
    fn holdout_requires_enough_points() {
        let series = MonthlySeries::new(date(2021, 1, 1), vec![1.0; 12]).unwrap();
        assert!(series.holdout(12).is_err());

        let series = MonthlySeries::new(date(2021, 1, 1), vec![1.0; 13]).unwrap();
        let (train, test) = series.holdout(12).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 12);
        assert_eq!(test.start(), date(2021, 2, 1));
    }
}
