//! Gamma-Gamma monetary-value model.
//!
//! Models the average transaction value per customer (Fader & Hardie
//! 2013): transaction values are Gamma-distributed with a customer-level
//! mean that itself varies across the population. The conditional
//! expectation shrinks a customer's observed average toward the
//! population mean, with less shrinkage the more purchases they have —
//! correcting for the noisier averages of low-frequency customers.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use ronda_traits::{Result, RondaError};

use crate::math::ln_gamma;
use crate::optim::NelderMead;

/// Configuration for the Gamma-Gamma fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GammaGammaConfig {
    /// Regularization strength added to the mean negative log-likelihood
    /// as `penalizer * sum(params^2)` (default: 0.01).
    pub penalizer: f64,

    /// Simplex optimizer settings.
    pub optimizer: NelderMead,
}

impl Default for GammaGammaConfig {
    fn default() -> Self {
        Self {
            penalizer: 0.01,
            optimizer: NelderMead::default(),
        }
    }
}

/// A fitted Gamma-Gamma model with parameters `(p, q, v)`.
///
/// The model assumes average transaction value is independent of purchase
/// frequency; check that assumption with
/// `ronda_ltv::diagnostics::frequency_monetary_correlation` before
/// trusting the estimates.
#[derive(Debug, Clone)]
pub struct GammaGammaModel {
    /// Shape of the per-transaction value distribution.
    pub p: f64,
    /// Shape of the population heterogeneity distribution.
    pub q: f64,
    /// Scale of the population heterogeneity distribution.
    pub v: f64,
    /// Unpenalized log-likelihood at the fitted parameters.
    pub log_likelihood: f64,
    /// Simplex iterations the fit consumed.
    pub iterations: usize,
}

impl GammaGammaModel {
    /// Fit the model on (frequency, average monetary value) pairs.
    ///
    /// The fit constrains `q > 1`: the conditional expectation and the
    /// population mean both divide by `q - 1`, so any optimum at or below
    /// one would turn the shrinkage blend into an extrapolation.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InvalidData`] for mismatched lengths, frequencies
    ///   below one, or non-positive monetary values (the likelihood takes
    ///   `ln m`).
    /// - [`RondaError::InsufficientData`] for empty input.
    /// - [`RondaError::ModelFit`] when the optimizer exhausts its budget
    ///   or lands on a non-finite likelihood.
    pub fn fit(frequency: &[f64], monetary_avg: &[f64], config: &GammaGammaConfig) -> Result<Self> {
        validate_inputs(frequency, monetary_avg)?;

        let n = frequency.len() as f64;
        let penalizer = config.penalizer;
        let objective = |raw: &[f64]| {
            let params = constrain(raw);
            let ll = log_likelihood_sum(&params, frequency, monetary_avg);
            let penalty: f64 = penalizer * params.iter().map(|p| p * p).sum::<f64>();
            -ll / n + penalty
        };

        let minimum = config.optimizer.minimize(objective, &[0.0; 3]);
        if !minimum.converged {
            return Err(RondaError::ModelFit(format!(
                "Gamma-Gamma likelihood did not converge within {} iterations",
                minimum.iterations
            )));
        }

        let params = constrain(&minimum.x);
        let log_likelihood = log_likelihood_sum(&params, frequency, monetary_avg);
        if !log_likelihood.is_finite() {
            return Err(RondaError::ModelFit(
                "Gamma-Gamma likelihood is non-finite at the optimum".to_string(),
            ));
        }

        Ok(Self {
            p: params[0],
            q: params[1],
            v: params[2],
            log_likelihood,
            iterations: minimum.iterations,
        })
    }

    /// Expected average transaction value for a customer with `x`
    /// purchases averaging `m` per purchase.
    ///
    /// Weighted blend of the population mean and the customer's own
    /// average; the customer's weight grows with purchase count.
    pub fn expected_average_profit(&self, x: f64, m: f64) -> f64 {
        let weight = self.p * x / (self.p * x + self.q - 1.0);
        (1.0 - weight) * self.population_mean() + weight * m
    }

    /// Vectorized [`expected_average_profit`](Self::expected_average_profit).
    pub fn expected_average_profit_batch(
        &self,
        frequency: &[f64],
        monetary_avg: &[f64],
    ) -> Array1<f64> {
        let values: Vec<f64> = frequency
            .iter()
            .zip(monetary_avg.iter())
            .map(|(&x, &m)| self.expected_average_profit(x, m))
            .collect();
        Array1::from_vec(values)
    }

    /// Population mean transaction value `p * v / (q - 1)`.
    pub fn population_mean(&self) -> f64 {
        self.p * self.v / (self.q - 1.0)
    }
}

/// Map unconstrained optimizer coordinates to `(p, q, v)` with
/// `p > 0`, `q > 1`, `v > 0`, keeping the conditional expectation well
/// defined at every vertex the simplex visits.
fn constrain(raw: &[f64]) -> [f64; 3] {
    [raw[0].exp(), 1.0 + raw[1].exp(), raw[2].exp()]
}

/// Sum of per-customer Gamma-Gamma log-likelihoods for `(p, q, v)`.
fn log_likelihood_sum(params: &[f64], frequency: &[f64], monetary_avg: &[f64]) -> f64 {
    let (p, q, v) = (params[0], params[1], params[2]);

    let mut total = 0.0;
    for (&x, &m) in frequency.iter().zip(monetary_avg.iter()) {
        total += ln_gamma(p * x + q) - ln_gamma(p * x) - ln_gamma(q)
            + q * v.ln()
            + (p * x - 1.0) * m.ln()
            + p * x * x.ln()
            - (p * x + q) * (v + m * x).ln();
    }
    total
}

fn validate_inputs(frequency: &[f64], monetary_avg: &[f64]) -> Result<()> {
    if frequency.is_empty() {
        return Err(RondaError::InsufficientData(
            "cannot fit a monetary model on an empty table".to_string(),
        ));
    }
    if frequency.len() != monetary_avg.len() {
        return Err(RondaError::InvalidData(format!(
            "mismatched input lengths: frequency {}, monetary {}",
            frequency.len(),
            monetary_avg.len()
        )));
    }
    for i in 0..frequency.len() {
        let (x, m) = (frequency[i], monetary_avg[i]);
        if !x.is_finite() || !m.is_finite() {
            return Err(RondaError::InvalidData(format!(
                "non-finite value at row {i}"
            )));
        }
        if x < 1.0 {
            return Err(RondaError::InvalidData(format!(
                "row {i} has frequency below one; zero-purchase customers must be filtered upstream"
            )));
        }
        if m <= 0.0 {
            return Err(RondaError::InvalidData(format!(
                "row {i} has non-positive monetary value"
            )));
        }
    }
    Ok(())
}
