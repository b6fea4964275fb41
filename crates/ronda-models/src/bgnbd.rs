//! BG/NBD purchase-frequency model.
//!
//! Beta-Geometric/Negative-Binomial-Distribution model of repeat purchase
//! timing (Fader, Hardie & Lee 2005). Purchasing while alive is Poisson
//! with a Gamma-distributed rate across customers; after each purchase a
//! customer drops out with a Beta-distributed probability. The four
//! parameters `(r, alpha, a, b)` are estimated by penalized maximum
//! likelihood on the (frequency, recency, tenure) columns of the RFM
//! table.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use ronda_traits::{Result, RondaError};

use crate::math::{hyp2f1, ln_beta, ln_gamma, log_sum_exp};
use crate::optim::NelderMead;

/// Configuration for the BG/NBD fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaGeoConfig {
    /// Regularization strength added to the mean negative log-likelihood
    /// as `penalizer * sum(params^2)` (default: 0.001). Stabilizes the fit
    /// on sparse tables with many single-purchase customers.
    pub penalizer: f64,

    /// Simplex optimizer settings.
    pub optimizer: NelderMead,
}

impl Default for BetaGeoConfig {
    fn default() -> Self {
        Self {
            penalizer: 0.001,
            optimizer: NelderMead::default(),
        }
    }
}

/// A fitted BG/NBD model.
///
/// # Example
///
/// ```ignore
/// use ronda_models::{BetaGeoConfig, BetaGeoModel};
///
/// let model = BetaGeoModel::fit(&frequency, &recency, &tenure, &BetaGeoConfig::default())?;
/// let expected = model.expected_purchases(12.0, 3.0, 20.0, 40.0);
/// ```
#[derive(Debug, Clone)]
pub struct BetaGeoModel {
    /// Shape of the Gamma-distributed purchase rate.
    pub r: f64,
    /// Scale of the Gamma-distributed purchase rate.
    pub alpha: f64,
    /// First shape of the Beta-distributed dropout probability.
    pub a: f64,
    /// Second shape of the Beta-distributed dropout probability.
    pub b: f64,
    /// Unpenalized log-likelihood at the fitted parameters.
    pub log_likelihood: f64,
    /// Simplex iterations the fit consumed.
    pub iterations: usize,
}

impl BetaGeoModel {
    /// Fit the model on the RFM columns.
    ///
    /// All three slices must have the same length: per customer, the
    /// repeat-purchase count `frequency`, the weeks from first to last
    /// purchase `recency`, and the weeks from first purchase to the
    /// analysis cutoff `tenure`.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidData`] for mismatched lengths, non-finite
    ///   values, negative recency, or `tenure < recency`.
    /// - [`RondaError::InsufficientData`] for empty input.
    /// - [`RondaError::ModelFit`] when the optimizer exhausts its budget
    ///   or lands on a non-finite likelihood.
    pub fn fit(
        frequency: &[f64],
        recency: &[f64],
        tenure: &[f64],
        config: &BetaGeoConfig,
    ) -> Result<Self> {
        validate_rfm_inputs(frequency, recency, tenure)?;

        let n = frequency.len() as f64;
        let penalizer = config.penalizer;
        let objective = |log_params: &[f64]| {
            let params: Vec<f64> = log_params.iter().map(|p| p.exp()).collect();
            let ll = log_likelihood_sum(&params, frequency, recency, tenure);
            let penalty: f64 = penalizer * params.iter().map(|p| p * p).sum::<f64>();
            -ll / n + penalty
        };

        // Log-parameterization keeps (r, alpha, a, b) positive by
        // construction.
        let minimum = config.optimizer.minimize(objective, &[0.0; 4]);
        if !minimum.converged {
            return Err(RondaError::ModelFit(format!(
                "BG/NBD likelihood did not converge within {} iterations",
                minimum.iterations
            )));
        }

        let params: Vec<f64> = minimum.x.iter().map(|p| p.exp()).collect();
        let log_likelihood = log_likelihood_sum(&params, frequency, recency, tenure);
        if !log_likelihood.is_finite() {
            return Err(RondaError::ModelFit(
                "BG/NBD likelihood is non-finite at the optimum".to_string(),
            ));
        }

        Ok(Self {
            r: params[0],
            alpha: params[1],
            a: params[2],
            b: params[3],
            log_likelihood,
            iterations: minimum.iterations,
        })
    }

    /// Conditional expected number of purchases over the next
    /// `horizon` weeks for a customer with history `(x, t_x, big_t)`.
    ///
    /// Exactly zero at `horizon <= 0`; non-negative for all valid inputs.
    pub fn expected_purchases(&self, horizon: f64, x: f64, t_x: f64, big_t: f64) -> f64 {
        if horizon <= 0.0 {
            return 0.0;
        }

        let (r, alpha, a, b) = (self.r, self.alpha, self.a, self.b);
        let z = horizon / (alpha + big_t + horizon);
        let hyp = hyp2f1(r + x, b + x, a + b + x - 1.0, z);
        let discounted = ((alpha + big_t) / (alpha + big_t + horizon)).powf(r + x);
        let numerator = (a + b + x - 1.0) / (a - 1.0) * (1.0 - discounted * hyp);
        let denominator = 1.0 + alive_odds(r, alpha, a, b, x, t_x, big_t);

        (numerator / denominator).max(0.0)
    }

    /// Vectorized [`expected_purchases`](Self::expected_purchases) over a
    /// whole RFM table at a single horizon.
    pub fn expected_purchases_batch(
        &self,
        horizon: f64,
        frequency: &[f64],
        recency: &[f64],
        tenure: &[f64],
    ) -> Array1<f64> {
        let values: Vec<f64> = frequency
            .iter()
            .zip(recency.iter())
            .zip(tenure.iter())
            .map(|((&x, &t_x), &big_t)| self.expected_purchases(horizon, x, t_x, big_t))
            .collect();
        Array1::from_vec(values)
    }

    /// Probability the customer is still alive given history
    /// `(x, t_x, big_t)`.
    pub fn probability_alive(&self, x: f64, t_x: f64, big_t: f64) -> f64 {
        1.0 / (1.0 + alive_odds(self.r, self.alpha, self.a, self.b, x, t_x, big_t))
    }

    /// Probability a freshly acquired customer makes exactly `n` repeat
    /// purchases in the first `t` weeks.
    ///
    /// Drives the period-transactions fit diagnostic.
    pub fn probability_of_purchases(&self, t: f64, n: u64) -> f64 {
        if t <= 0.0 {
            return if n == 0 { 1.0 } else { 0.0 };
        }

        let (r, alpha, a, b) = (self.r, self.alpha, self.a, self.b);
        let nf = n as f64;
        let ln_survival_frac = (alpha / (alpha + t)).ln();
        let ln_t_frac = (t / (alpha + t)).ln();

        let ln_first = ln_beta(a, b + nf) - ln_beta(a, b)
            + ln_gamma(r + nf)
            - ln_gamma(r)
            - ln_gamma(nf + 1.0)
            + r * ln_survival_frac
            + nf * ln_t_frac;
        let mut probability = ln_first.exp();

        if n > 0 {
            let mut partial_sum = 0.0;
            for j in 0..n {
                let jf = j as f64;
                partial_sum +=
                    (ln_gamma(r + jf) - ln_gamma(r) - ln_gamma(jf + 1.0) + jf * ln_t_frac).exp();
            }
            let dropout_weight = (ln_beta(a + 1.0, b + nf - 1.0) - ln_beta(a, b)).exp();
            probability += dropout_weight * (1.0 - (r * ln_survival_frac).exp() * partial_sum);
        }

        probability.max(0.0)
    }
}

/// Odds that the customer has dropped out, relative to being alive.
fn alive_odds(r: f64, alpha: f64, a: f64, b: f64, x: f64, t_x: f64, big_t: f64) -> f64 {
    if x > 0.0 {
        a / (b + x - 1.0) * ((alpha + big_t) / (alpha + t_x)).powf(r + x)
    } else {
        0.0
    }
}

/// Sum of per-customer BG/NBD log-likelihoods for `(r, alpha, a, b)`.
fn log_likelihood_sum(params: &[f64], frequency: &[f64], recency: &[f64], tenure: &[f64]) -> f64 {
    let (r, alpha, a, b) = (params[0], params[1], params[2], params[3]);

    let mut total = 0.0;
    for i in 0..frequency.len() {
        let (x, t_x, big_t) = (frequency[i], recency[i], tenure[i]);

        let a1 = ln_gamma(r + x) - ln_gamma(r) + r * alpha.ln();
        let a2 = ln_gamma(a + b) + ln_gamma(b + x) - ln_gamma(b) - ln_gamma(a + b + x);
        let a3 = -(r + x) * (alpha + big_t).ln();
        let a4 = if x > 0.0 {
            a.ln() - (b + x - 1.0).ln() - (r + x) * (alpha + t_x).ln()
        } else {
            f64::NEG_INFINITY
        };

        total += a1 + a2 + log_sum_exp(a3, a4);
    }
    total
}

fn validate_rfm_inputs(frequency: &[f64], recency: &[f64], tenure: &[f64]) -> Result<()> {
    if frequency.is_empty() {
        return Err(RondaError::InsufficientData(
            "cannot fit a frequency model on an empty table".to_string(),
        ));
    }
    if frequency.len() != recency.len() || frequency.len() != tenure.len() {
        return Err(RondaError::InvalidData(format!(
            "mismatched input lengths: frequency {}, recency {}, tenure {}",
            frequency.len(),
            recency.len(),
            tenure.len()
        )));
    }
    for i in 0..frequency.len() {
        let (x, t_x, big_t) = (frequency[i], recency[i], tenure[i]);
        if !x.is_finite() || !t_x.is_finite() || !big_t.is_finite() {
            return Err(RondaError::InvalidData(format!(
                "non-finite value at row {i}"
            )));
        }
        if x < 0.0 || t_x < 0.0 || big_t < t_x {
            return Err(RondaError::InvalidData(format!(
                "row {i} violates frequency >= 0, tenure >= recency >= 0"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_table() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let frequency = vec![1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 6.0];
        let recency = vec![5.0, 10.0, 15.0, 20.0, 25.0, 2.0, 18.0, 28.0];
        let tenure = vec![30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0];
        (frequency, recency, tenure)
    }

    fn fitted() -> BetaGeoModel {
        let (f, r, t) = sample_table();
        BetaGeoModel::fit(&f, &r, &t, &BetaGeoConfig::default()).unwrap()
    }

    #[test]
    fn test_fit_produces_positive_parameters() {
        let model = fitted();
        assert!(model.r > 0.0);
        assert!(model.alpha > 0.0);
        assert!(model.a > 0.0);
        assert!(model.b > 0.0);
        assert!(model.log_likelihood.is_finite());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (f, r, t) = sample_table();
        let m1 = BetaGeoModel::fit(&f, &r, &t, &BetaGeoConfig::default()).unwrap();
        let m2 = BetaGeoModel::fit(&f, &r, &t, &BetaGeoConfig::default()).unwrap();
        assert_eq!(m1.r, m2.r);
        assert_eq!(m1.alpha, m2.alpha);
        assert_eq!(m1.a, m2.a);
        assert_eq!(m1.b, m2.b);
    }

    #[test]
    fn test_expected_purchases_zero_horizon() {
        let model = fitted();
        assert_eq!(model.expected_purchases(0.0, 3.0, 15.0, 30.0), 0.0);
        assert_eq!(model.expected_purchases(-1.0, 3.0, 15.0, 30.0), 0.0);
    }

    #[test]
    fn test_expected_purchases_non_negative_and_monotone_in_horizon() {
        let model = fitted();
        let mut previous = 0.0;
        for weeks in [1.0, 4.0, 12.0, 24.0, 52.0] {
            let expected = model.expected_purchases(weeks, 3.0, 15.0, 30.0);
            assert!(expected >= previous);
            previous = expected;
        }
    }

    #[test]
    fn test_expected_purchases_batch_matches_scalar() {
        let model = fitted();
        let (f, r, t) = sample_table();
        let batch = model.expected_purchases_batch(12.0, &f, &r, &t);
        assert_eq!(batch.len(), f.len());
        for i in 0..f.len() {
            assert_relative_eq!(batch[i], model.expected_purchases(12.0, f[i], r[i], t[i]));
        }
    }

    #[test]
    fn test_probability_alive_bounds_and_recency_effect() {
        let model = fitted();
        let stale = model.probability_alive(3.0, 5.0, 30.0);
        let fresh = model.probability_alive(3.0, 29.0, 30.0);
        assert!((0.0..=1.0).contains(&stale));
        assert!((0.0..=1.0).contains(&fresh));
        // A customer seen recently is more likely still alive.
        assert!(fresh > stale);
    }

    #[test]
    fn test_purchase_count_distribution_sums_to_one() {
        let model = fitted();
        let total: f64 = (0..200)
            .map(|n| model.probability_of_purchases(20.0, n))
            .sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_probability_of_purchases_at_zero_time() {
        let model = fitted();
        assert_eq!(model.probability_of_purchases(0.0, 0), 1.0);
        assert_eq!(model.probability_of_purchases(0.0, 3), 0.0);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let err = BetaGeoModel::fit(&[], &[], &[], &BetaGeoConfig::default()).unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    #[test]
    fn test_fit_rejects_mismatched_lengths() {
        let err = BetaGeoModel::fit(&[1.0, 2.0], &[1.0], &[5.0, 5.0], &BetaGeoConfig::default())
            .unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_fit_rejects_recency_above_tenure() {
        let err = BetaGeoModel::fit(&[1.0], &[10.0], &[5.0], &BetaGeoConfig::default())
            .unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_fit_failure_is_distinct_error() {
        let (f, r, t) = sample_table();
        let config = BetaGeoConfig {
            optimizer: NelderMead {
                max_iters: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = BetaGeoModel::fit(&f, &r, &t, &config).unwrap_err();
        assert!(matches!(err, RondaError::ModelFit(_)));
    }
}
