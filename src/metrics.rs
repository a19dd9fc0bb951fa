//! Accuracy metrics for forecast evaluation.
//!
//! All metrics compare the full test suffix against the forecast mean; no
//! point may be skipped, and a non-finite value anywhere is a fatal
//! [`ForecastError::Evaluation`] rather than a partial result.

use crate::error::{ForecastError, Result};

fn validate(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::Evaluation(format!(
            "actual ({}) and predicted ({}) must have the same non-zero length",
            actual.len(),
            predicted.len()
        )));
    }
    if actual
        .iter()
        .chain(predicted.iter())
        .any(|v| !v.is_finite())
    {
        return Err(ForecastError::Evaluation(
            "non-numeric value in evaluation data".to_string(),
        ));
    }
    Ok(())
}

/// Mean squared error
pub fn mse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Root mean squared error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mse(actual, predicted)?.sqrt())
}

/// Mean absolute error
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Mean absolute percentage error.
///
/// Points with a zero actual value are excluded from both the sum and the
/// count; a series with no nonzero actuals is an [`ForecastError::Evaluation`].
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    validate(actual, predicted)?;
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, p) in actual.iter().zip(predicted.iter()) {
        if *a != 0.0 {
            sum += ((a - p) / a).abs() * 100.0;
            count += 1;
        }
    }
    if count == 0 {
        return Err(ForecastError::Evaluation(
            "all actual values are zero".to_string(),
        ));
    }
    Ok(sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn rmse_of_identical_series_is_zero() {
        let values = vec![10.0, 20.0, 30.0];
        assert_eq!(rmse(&values, &values).unwrap(), 0.0);
    }

    #[test]
    fn rmse_matches_hand_computation() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];
        assert_approx_eq!(rmse(&actual, &predicted).unwrap(), 10.0f64.sqrt(), 1e-9);
        assert_approx_eq!(mae(&actual, &predicted).unwrap(), 2.8, 1e-9);
    }

    #[test]
    fn mape_averages_over_nonzero_actuals_only() {
        // The zero-actual point drops out of both the sum and the count.
        let actual = vec![100.0, 0.0, 50.0];
        let predicted = vec![110.0, 5.0, 45.0];
        assert_approx_eq!(mape(&actual, &predicted).unwrap(), 10.0, 1e-9);

        assert!(matches!(
            mape(&[0.0, 0.0], &[1.0, 2.0]),
            Err(ForecastError::Evaluation(_))
        ));
    }

    #[test]
    fn non_finite_values_are_fatal() {
        let actual = vec![1.0, f64::NAN, 3.0];
        let predicted = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            rmse(&actual, &predicted),
            Err(ForecastError::Evaluation(_))
        ));
        assert!(matches!(
            rmse(&predicted, &[1.0, f64::INFINITY, 3.0]),
            Err(ForecastError::Evaluation(_))
        ));
    }

    #[test]
    fn length_mismatch_is_fatal() {
        assert!(rmse(&[1.0, 2.0], &[1.0]).is_err());
        assert!(rmse(&[], &[]).is_err());
    }
}
