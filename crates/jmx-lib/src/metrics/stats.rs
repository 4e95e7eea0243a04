//! Small descriptive statistics shared by the scoring code.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Median of `values`, averaging the two middle elements for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Scale that makes the MAD a consistent estimator of the standard deviation
/// for normally distributed data.
pub const NORMAL_MAD_SCALE: f64 = 1.4826;

/// Median absolute deviation around the median, multiplied by `scale`.
///
/// A scale of 1.0 gives the raw statistic.
pub fn median_abs_deviation(values: &[f64], scale: f64) -> Option<f64> {
    let center = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations).map(|mad| mad * scale)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// One-sided one-sample t-test of `mean(values) > mu`, returning the p-value.
///
/// `None` with fewer than two values or zero sample variance.
pub fn t_test_greater(values: &[f64], mu: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    if var <= 0.0 {
        return None;
    }
    let t = (m - mu) / (var / n).sqrt();
    let dist = StudentsT::new(0.0, 1.0, n - 1.0).ok()?;
    Some((1.0 - dist.cdf(t)).clamp(0.0, 1.0))
}
