//! Quantile-based outlier suppression.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use ronda_traits::stats::quantile;
use ronda_traits::{Result, RondaError};

/// Configuration for outlier suppression.
///
/// Thresholds are derived from the empirical distribution of a single
/// column: `up = q_hi + mult * (q_hi - q_lo)` and
/// `low = q_lo - mult * (q_hi - q_lo)`, both rounded to the nearest
/// integer. Rounding keeps the downstream frequency values integral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    /// Lower quantile used for the threshold rule (default: 0.01)
    pub lower_quantile: f64,

    /// Upper quantile used for the threshold rule (default: 0.99)
    pub upper_quantile: f64,

    /// Multiplier on the inter-quantile range (default: 1.5)
    pub iqr_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            lower_quantile: 0.01,
            upper_quantile: 0.99,
            iqr_multiplier: 1.5,
        }
    }
}

/// Caps extreme values in numeric columns using a quantile threshold rule.
///
/// Each column is treated independently; the suppressor is a pure,
/// deterministic function of the column's empirical distribution.
///
/// # Example
///
/// ```ignore
/// use ronda_prep::{OutlierConfig, OutlierSuppressor};
///
/// let suppressor = OutlierSuppressor::default();
/// suppressor.suppress(&mut df, "customer_value_total_ever_online")?;
/// ```
#[derive(Debug, Clone)]
pub struct OutlierSuppressor {
    config: OutlierConfig,
}

impl OutlierSuppressor {
    /// Create a new suppressor with the given configuration.
    #[must_use]
    pub const fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Compute the `(low, up)` clamp thresholds for a column.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MissingColumn`] if the column does not exist,
    /// [`RondaError::InvalidData`] if it contains nulls, and
    /// [`RondaError::InsufficientData`] if it has no finite values.
    pub fn thresholds(&self, df: &DataFrame, column: &str) -> Result<(f64, f64)> {
        let values = numeric_column(df, column)?;

        let q_lo = quantile(&values, self.config.lower_quantile);
        let q_hi = quantile(&values, self.config.upper_quantile);
        let (Some(q_lo), Some(q_hi)) = (q_lo, q_hi) else {
            return Err(RondaError::InsufficientData(format!(
                "column '{column}' has no finite values to derive thresholds from"
            )));
        };

        let range = q_hi - q_lo;
        let up = (q_hi + self.config.iqr_multiplier * range).round();
        let low = (q_lo - self.config.iqr_multiplier * range).round();
        Ok((low, up))
    }

    /// Clamp every value of `column` into the `[low, up]` threshold range,
    /// in place. Values already inside the range are untouched.
    pub fn suppress(&self, df: &mut DataFrame, column: &str) -> Result<()> {
        let (low, up) = self.thresholds(df, column)?;
        let clamped: Vec<f64> = numeric_column(df, column)?
            .into_iter()
            .map(|v| v.clamp(low, up))
            .collect();

        df.replace(column, Series::new(column.into(), clamped))?;
        Ok(())
    }

    /// Apply [`suppress`](Self::suppress) to each column independently.
    pub fn suppress_all(&self, df: &mut DataFrame, columns: &[&str]) -> Result<()> {
        for column in columns {
            self.suppress(df, column)?;
        }
        Ok(())
    }
}

impl Default for OutlierSuppressor {
    fn default() -> Self {
        Self::new(OutlierConfig::default())
    }
}

/// Extract a column as `Vec<f64>`, casting integer columns as needed.
fn numeric_column(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df
        .column(column)
        .map_err(|_| RondaError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let ca = series.f64()?;
    if ca.null_count() > 0 {
        return Err(RondaError::InvalidData(format!(
            "column '{column}' contains null values"
        )));
    }
    Ok(ca.into_no_null_iter().collect())
}
