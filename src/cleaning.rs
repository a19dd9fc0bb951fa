//! Order-sensitive cleaning and monthly regularization.
//!
//! The cleaning contract is a fixed sequence: parse dates, drop rows with
//! invalid dates, coerce sales to numbers, forward-fill missing sales in
//! original file order, aggregate duplicate dates, sort chronologically,
//! resample to a month-start cadence and forward-fill any remaining monthly
//! gaps. The result depends on this order, so the steps must not be
//! rearranged.

use crate::data::{add_months, month_start, months_between, MonthlySeries, RawTable};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Accepted date formats. Ambiguous numeric dates resolve month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a raw date cell. Returns `None` for unparseable values, which
/// causes the row to be dropped rather than reported as an error.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse a raw sales cell. Non-numeric values become missing, not errors.
fn parse_sales(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-fatal, user-visible notices produced while cleaning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Calendar months with no observed sales were filled with the
    /// previous month's value during resampling
    MissingMonthsFilled { count: usize },
    /// Leading months had no valid sales value to fill from and were
    /// dropped from the front of the series
    LeadingMonthsDropped { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MissingMonthsFilled { count } => {
                write!(f, "missing sales data for {count} month(s) found and forward-filled")
            }
            Notice::LeadingMonthsDropped { count } => {
                write!(f, "dropped {count} leading month(s) with no valid sales values")
            }
        }
    }
}

/// Clean a raw table into a gap-free monthly series.
///
/// `date_col` and `sales_col` select the columns by header name; a missing
/// name is a fatal error. Rows with unparseable dates are dropped silently.
/// Missing sales values are forward-filled in original file order, with
/// fills scoped to the calendar month of the row: a fill never crosses a
/// month boundary, so a month left without any value is filled from the
/// previous month at the resampling step and surfaced as a [`Notice`].
pub fn clean(
    table: &RawTable,
    date_col: &str,
    sales_col: &str,
) -> Result<(MonthlySeries, Vec<Notice>)> {
    let date_idx = table.column_index(date_col)?;
    let sales_idx = table.column_index(sales_col)?;

    // Steps 1-3: parse dates, drop invalid-date rows, coerce sales.
    let mut rows: Vec<(NaiveDate, Option<f64>)> = Vec::new();
    for row in table.rows() {
        let date = match row.get(date_idx).map(String::as_str).and_then(parse_date) {
            Some(date) => date,
            None => continue,
        };
        let sales = row.get(sales_idx).map(String::as_str).and_then(parse_sales);
        rows.push((date, sales));
    }
    if rows.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    // Step 4: forward-fill missing sales in original file order. Fills are
    // scoped to the row's calendar month so a month containing only
    // invalid values stays empty and is handled at the resampling step.
    let mut last_valid: HashMap<(i32, u32), f64> = HashMap::new();
    let mut filled: Vec<(NaiveDate, Option<f64>)> = Vec::with_capacity(rows.len());
    for (date, sales) in rows {
        let key = (date.year(), date.month());
        let value = match sales {
            Some(v) => {
                last_valid.insert(key, v);
                Some(v)
            }
            None => last_valid.get(&key).copied(),
        };
        filled.push((date, value));
    }

    // Steps 5-6: group duplicate dates, summing present values, in
    // chronological order.
    let mut grouped: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for (date, value) in filled {
        let slot = grouped.entry(date).or_insert(None);
        if let Some(v) = value {
            *slot = Some(slot.unwrap_or(0.0) + v);
        }
    }

    // Step 7: resample to a month-start cadence. Every month between the
    // first and last observed date appears exactly once; the monthly value
    // is the sum of the month's dated values, missing when none exist.
    let first = *grouped.keys().next().ok_or(ForecastError::InsufficientData {
        needed: 1,
        got: 0,
    })?;
    let last = *grouped.keys().next_back().ok_or(ForecastError::InsufficientData {
        needed: 1,
        got: 0,
    })?;
    let start = month_start(first);
    let n_months = months_between(start, month_start(last)) + 1;
    let mut monthly: Vec<Option<f64>> = vec![None; n_months];
    for (date, value) in &grouped {
        if let Some(v) = value {
            let index = months_between(start, month_start(*date));
            monthly[index] = Some(monthly[index].unwrap_or(0.0) + v);
        }
    }

    // Step 8: forward-fill remaining monthly gaps and surface a notice.
    let mut notices = Vec::new();
    let leading = monthly.iter().take_while(|slot| slot.is_none()).count();
    if leading > 0 {
        log::warn!("dropping {leading} leading month(s) with no valid sales values");
        notices.push(Notice::LeadingMonthsDropped { count: leading });
    }
    let mut values = Vec::with_capacity(n_months - leading);
    let mut gaps = 0usize;
    let mut previous = None;
    for slot in monthly.into_iter().skip(leading) {
        match slot {
            Some(v) => {
                previous = Some(v);
                values.push(v);
            }
            None => {
                // A gap after at least one observed month always has a
                // previous value to fill from.
                if let Some(v) = previous {
                    gaps += 1;
                    values.push(v);
                }
            }
        }
    }
    if gaps > 0 {
        log::warn!("missing sales data for {gaps} month(s) found and forward-filled");
        notices.push(Notice::MissingMonthsFilled { count: gaps });
    }
    if values.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    let series = MonthlySeries::new(add_months(start, leading), values)?;
    Ok((series, notices))
}
