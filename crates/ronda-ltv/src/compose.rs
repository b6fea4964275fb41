//! Present-value CLTV composition.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use ronda_models::{BetaGeoModel, GammaGammaModel};
use ronda_traits::{Result, RondaError};

/// Average weeks per calendar month used to step the weekly-unit
/// frequency model through monthly discount periods.
pub const WEEKS_PER_MONTH: f64 = 4.345;

/// Configuration for the lifetime-value composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtvConfig {
    /// Forecast horizon in months (default: 6)
    pub horizon_months: u32,

    /// Per-month discount rate applied geometrically (default: 0.01)
    pub discount_rate: f64,
}

impl Default for LtvConfig {
    fn default() -> Self {
        Self {
            horizon_months: 6,
            discount_rate: 0.01,
        }
    }
}

/// Combine the frequency and monetary models into a discounted
/// present-value lifetime estimate per customer.
///
/// For each month `k` in the horizon, the incremental expected purchase
/// count over that month (frequency model, weekly units) is valued at the
/// customer's shrinkage-corrected expected average transaction value
/// (monetary model) and discounted by `(1 + discount_rate)^k`.
///
/// # Errors
///
/// Returns [`RondaError::InvalidData`] if the per-customer slices differ
/// in length.
///
/// # Example
///
/// ```ignore
/// use ronda_ltv::{customer_lifetime_value, LtvConfig};
///
/// let cltv = customer_lifetime_value(
///     &freq_model, &value_model,
///     &frequency, &recency, &tenure, &monetary_avg,
///     &LtvConfig::default(),
/// )?;
/// ```
pub fn customer_lifetime_value(
    freq_model: &BetaGeoModel,
    value_model: &GammaGammaModel,
    frequency: &[f64],
    recency: &[f64],
    tenure: &[f64],
    monetary_avg: &[f64],
    config: &LtvConfig,
) -> Result<Array1<f64>> {
    let n = frequency.len();
    if recency.len() != n || tenure.len() != n || monetary_avg.len() != n {
        return Err(RondaError::InvalidData(format!(
            "mismatched input lengths: frequency {}, recency {}, tenure {}, monetary {}",
            n,
            recency.len(),
            tenure.len(),
            monetary_avg.len()
        )));
    }

    let mut cltv = Array1::zeros(n);
    for i in 0..n {
        let (x, t_x, big_t, m) = (frequency[i], recency[i], tenure[i], monetary_avg[i]);
        let expected_value = value_model.expected_average_profit(x, m);

        let mut present_value = 0.0;
        for month in 1..=config.horizon_months {
            let weeks_hi = f64::from(month) * WEEKS_PER_MONTH;
            let weeks_lo = f64::from(month - 1) * WEEKS_PER_MONTH;
            let incremental = freq_model.expected_purchases(weeks_hi, x, t_x, big_t)
                - freq_model.expected_purchases(weeks_lo, x, t_x, big_t);
            present_value += expected_value * incremental
                / (1.0 + config.discount_rate).powi(month as i32);
        }
        cltv[i] = present_value;
    }
    Ok(cltv)
}
