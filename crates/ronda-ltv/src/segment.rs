//! Quantile-based customer segmentation.

use ronda_traits::stats::quantile;
use ronda_traits::{Result, RondaError};

/// Default value tiers, lowest quartile first.
pub const DEFAULT_SEGMENT_LABELS: [&str; 4] = ["D", "C", "B", "A"];

/// Partition `values` into ordered quantile tiers, one label per value.
///
/// The number of tiers equals `labels.len()`; edges sit at the
/// `i / n_tiers` quantiles with linear interpolation, so each tier holds
/// as close as possible to an equal share of the population. Bins are
/// right-closed: a value exactly on an edge belongs to the lower tier,
/// which keeps the assignment deterministic for a given input ordering.
///
/// # Errors
///
/// - [`RondaError::InsufficientData`] for an empty input or fewer values
///   than tiers.
/// - [`RondaError::InvalidData`] for fewer than two labels, non-finite
///   values, or a degenerate distribution with duplicate quantile edges.
///
/// # Example
///
/// ```
/// use ronda_ltv::{segment, DEFAULT_SEGMENT_LABELS};
///
/// let cltv = vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
/// let tiers = segment(&cltv, &DEFAULT_SEGMENT_LABELS).unwrap();
/// assert_eq!(tiers[0], "D");
/// assert_eq!(tiers[7], "A");
/// ```
pub fn segment(values: &[f64], labels: &[&str]) -> Result<Vec<String>> {
    if labels.len() < 2 {
        return Err(RondaError::InvalidData(
            "segmentation needs at least two tiers".to_string(),
        ));
    }
    if values.len() < labels.len() {
        return Err(RondaError::InsufficientData(format!(
            "cannot cut {} values into {} tiers",
            values.len(),
            labels.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RondaError::InvalidData(
            "segmentation input contains non-finite values".to_string(),
        ));
    }

    let n_tiers = labels.len();
    let mut edges = Vec::with_capacity(n_tiers - 1);
    for i in 1..n_tiers {
        let q = i as f64 / n_tiers as f64;
        let edge = quantile(values, q).ok_or_else(|| {
            RondaError::InsufficientData("empty segmentation input".to_string())
        })?;
        edges.push(edge);
    }

    // The edges together with the data extremes must be strictly
    // increasing, otherwise some tier would be empty. Including the
    // extremes also catches a degenerate two-tier cut, where there is
    // only one edge and no adjacent pair to compare.
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut boundaries = Vec::with_capacity(n_tiers + 1);
    boundaries.push(lo);
    boundaries.extend_from_slice(&edges);
    boundaries.push(hi);
    for pair in boundaries.windows(2) {
        if pair[1] <= pair[0] {
            return Err(RondaError::InvalidData(
                "duplicate quantile edges; distribution too concentrated to cut into tiers"
                    .to_string(),
            ));
        }
    }

    let assigned = values
        .iter()
        .map(|&v| {
            let tier = edges.iter().take_while(|&&edge| v > edge).count();
            labels[tier].to_string()
        })
        .collect();
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_are_ordered_tiers() {
        let values: Vec<f64> = (1..=8).map(f64::from).collect();
        let tiers = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap();
        assert_eq!(tiers, vec!["D", "D", "C", "C", "B", "B", "A", "A"]);
    }

    #[test]
    fn test_segments_contiguous_and_monotone() {
        let values = vec![5.0, 80.0, 12.0, 33.0, 150.0, 7.0, 61.0, 24.0, 90.0, 41.0];
        let tiers = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap();

        // Every "A" value must exceed every "B" value, and so on down.
        let rank = |label: &str| DEFAULT_SEGMENT_LABELS
            .iter()
            .position(|l| *l == label)
            .unwrap();
        for (i, a) in values.iter().enumerate() {
            for (j, b) in values.iter().enumerate() {
                if rank(&tiers[i]) > rank(&tiers[j]) {
                    assert!(a > b, "value {a} in {} vs {b} in {}", tiers[i], tiers[j]);
                }
            }
        }
    }

    #[test]
    fn test_segment_counts_balanced() {
        // 10 values: tiers may differ by at most ceil(10 / 4) in size.
        let values: Vec<f64> = (0..10).map(|i| f64::from(i) * 3.5 + 1.0).collect();
        let tiers = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap();

        let counts: Vec<usize> = DEFAULT_SEGMENT_LABELS
            .iter()
            .map(|label| tiers.iter().filter(|t| t.as_str() == *label).count())
            .collect();
        let max = counts.iter().max().unwrap();
        let min = counts.iter().min().unwrap();
        assert!(max - min <= values.len().div_ceil(4));
        assert_eq!(counts.iter().sum::<usize>(), values.len());
    }

    #[test]
    fn test_edge_value_goes_to_lower_tier() {
        // Median of [1, 2, 2, 4] is exactly 2; the tied values sit on the
        // edge and land in the lower tier (right-closed bins).
        let values = vec![1.0, 2.0, 2.0, 4.0];
        let tiers = segment(&values, &["low", "high"]).unwrap();
        assert_eq!(tiers, vec!["low", "low", "low", "high"]);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let values = vec![9.0, 1.0, 5.0, 7.0, 3.0, 8.0, 2.0, 6.0];
        let t1 = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap();
        let t2 = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn test_degenerate_distribution_rejected() {
        let values = vec![5.0; 12];
        let err = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_two_tier_degenerate_distribution_rejected() {
        // With only two tiers there is a single edge and no edge pair to
        // compare; the data extremes must still expose the flat input.
        let values = vec![3.0; 6];
        let err = segment(&values, &["low", "high"]).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_too_few_values_rejected() {
        let err = segment(&[1.0, 2.0], &DEFAULT_SEGMENT_LABELS).unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        let values = vec![1.0, 2.0, f64::NAN, 4.0, 5.0];
        let err = segment(&values, &DEFAULT_SEGMENT_LABELS).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }
}
