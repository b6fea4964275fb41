//! Special-function helpers for the model likelihoods.

pub(crate) use statrs::function::beta::ln_beta;
pub(crate) use statrs::function::gamma::ln_gamma;

/// Maximum number of series terms for the hypergeometric expansion.
const HYP2F1_MAX_TERMS: usize = 10_000;

/// Relative tolerance at which the hypergeometric series is truncated.
const HYP2F1_TOL: f64 = 1e-12;

/// Numerically stable `ln(exp(a) + exp(b))`.
pub(crate) fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}

/// Gaussian hypergeometric function `2F1(a, b; c; z)` for `0 <= z < 1`.
///
/// Direct power-series evaluation; the arguments arising from the BG/NBD
/// conditional expectation keep `z` comfortably inside the radius of
/// convergence.
pub(crate) fn hyp2f1(a: f64, b: f64, c: f64, z: f64) -> f64 {
    debug_assert!((0.0..1.0).contains(&z), "hyp2f1 argument out of range");

    let mut term = 1.0;
    let mut sum = 1.0;
    for j in 0..HYP2F1_MAX_TERMS {
        let jf = j as f64;
        term *= (a + jf) * (b + jf) / ((c + jf) * (jf + 1.0)) * z;
        sum += term;
        if term.abs() < HYP2F1_TOL * sum.abs() {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_sum_exp_matches_direct() {
        let direct = (2.0f64.exp() + 3.0f64.exp()).ln();
        assert_relative_eq!(log_sum_exp(2.0, 3.0), direct, epsilon = 1e-12);
    }

    #[test]
    fn test_log_sum_exp_extreme_magnitudes() {
        // Direct evaluation would overflow exp(800).
        let v = log_sum_exp(800.0, 0.0);
        assert_relative_eq!(v, 800.0, epsilon = 1e-12);
        assert_eq!(log_sum_exp(f64::NEG_INFINITY, 1.5), 1.5);
    }

    #[test]
    fn test_hyp2f1_at_zero_is_one() {
        assert_relative_eq!(hyp2f1(1.7, 2.3, 3.1, 0.0), 1.0);
    }

    #[test]
    fn test_hyp2f1_geometric_series() {
        // 2F1(1, b; b; z) = 1 / (1 - z)
        let z = 0.4;
        assert_relative_eq!(hyp2f1(1.0, 5.0, 5.0, z), 1.0 / (1.0 - z), epsilon = 1e-10);
    }

    #[test]
    fn test_hyp2f1_log_identity() {
        // 2F1(1, 1; 2; z) = -ln(1 - z) / z
        let z = 0.6;
        assert_relative_eq!(
            hyp2f1(1.0, 1.0, 2.0, z),
            -(1.0 - z).ln() / z,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_ln_gamma_known_values() {
        // Gamma(5) = 24
        assert_relative_eq!(ln_gamma(5.0), 24.0f64.ln(), epsilon = 1e-10);
    }
}
