//! Statistical utility functions shared by the preparation and modeling
//! crates.
//!
//! This module provides the empirical quantile used by the outlier
//! thresholds and the segmenter, and the Pearson correlation used by the
//! frequency/monetary independence diagnostic.

/// Minimum threshold for a denominator to be treated as non-zero.
pub const MIN_DENOM_THRESHOLD: f64 = 1e-10;

/// Empirical quantile with linear interpolation between order statistics.
///
/// Evaluates `sorted[(n-1)q]` with linear interpolation between the
/// bracketing order statistics. Non-finite values are excluded before the
/// quantile is taken.
///
/// # Arguments
///
/// * `values` - The sample
/// * `q` - Quantile in `[0, 1]`
///
/// # Returns
///
/// `None` if the sample has no finite values or `q` is out of range.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::quantile;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile(&values, 0.5), Some(2.5));
/// assert_eq!(quantile(&values, 0.0), Some(1.0));
/// assert_eq!(quantile(&values, 1.0), Some(4.0));
/// ```
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }

    let mut sorted: Vec<f64> = values.iter().filter(|x| x.is_finite()).copied().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }

    let weight = pos - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Pearson correlation coefficient between two equal-length samples.
///
/// Used as a qualitative diagnostic for the Gamma-Gamma independence
/// assumption between purchase frequency and average monetary value.
///
/// # Returns
///
/// `None` if the samples differ in length, have fewer than two
/// observations, or either side has (near-)zero variance.
///
/// # Examples
///
/// ```
/// use ronda_traits::stats::pearson;
///
/// let x = vec![1.0, 2.0, 3.0, 4.0];
/// let y = vec![2.0, 4.0, 6.0, 8.0];
/// let r = pearson(&x, &y).unwrap();
/// assert!((r - 1.0).abs() < 1e-12);
/// ```
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom < MIN_DENOM_THRESHOLD {
        return None;
    }

    Some(cov / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_interpolates() {
        let values = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        assert_relative_eq!(quantile(&values, 0.25).unwrap(), 20.0);
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 30.0);
        // 0.1 * 4 = 0.4 -> between 10 and 20
        assert_relative_eq!(quantile(&values, 0.1).unwrap(), 14.0);
    }

    #[test]
    fn test_quantile_unsorted_input() {
        let values = vec![50.0, 10.0, 40.0, 20.0, 30.0];
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 30.0);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_eq!(quantile(&[7.0], 0.99), Some(7.0));
    }

    #[test]
    fn test_quantile_empty_and_out_of_range() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[1.0, 2.0], 1.5), None);
        assert_eq!(quantile(&[1.0, 2.0], -0.1), None);
    }

    #[test]
    fn test_quantile_skips_non_finite() {
        let values = vec![1.0, f64::NAN, 2.0, f64::INFINITY, 3.0];
        assert_relative_eq!(quantile(&values, 0.5).unwrap(), 2.0);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![3.0, 2.0, 1.0];
        assert_relative_eq!(pearson(&x, &y).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_uncorrelated() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![1.0, -1.0, 1.0, -1.0];
        let r = pearson(&x, &y).unwrap();
        assert!(r.abs() < 0.5);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), None);
    }
}
