//! RFM table construction.
//!
//! Collapses the cleaned snapshot into one row per customer with the four
//! quantities the probabilistic models consume: purchase frequency,
//! weekly recency, weekly tenure, and average monetary value per purchase.

use chrono::Duration;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use ronda_traits::{columns, Date, Result, RondaError};

use crate::aggregate::{date_to_epoch_days, epoch_days_to_date};

/// Days in a week, used to express recency and tenure in weekly units.
const DAYS_PER_WEEK: f64 = 7.0;

/// Configuration for RFM construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfmConfig {
    /// Days added to the latest observed purchase date to form the
    /// analysis cutoff (default: 2). Covers the settlement delay at the
    /// snapshot edge; the right lag depends on how the snapshot is
    /// exported.
    pub cutoff_lag_days: i64,
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self { cutoff_lag_days: 2 }
    }
}

/// Builds the RFM table from a cleaned customer snapshot.
///
/// The builder groups by customer identifier (resilient to duplicate rows:
/// totals are summed, dates take the earliest first / latest last order)
/// and emits one row per customer with:
///
/// - `frequency` — integer purchase count, customers with zero purchases
///   are dropped (they cannot be modeled; this is a business rule, not a
///   data defect)
/// - `monetary` — total spend
/// - `recency_cltv_weekly` — weeks between first and last purchase
/// - `T_weekly` — weeks between first purchase and the analysis cutoff
/// - `monetary_cltv_avg` — `monetary / frequency`
///
/// Output is sorted by customer identifier so reruns on the same snapshot
/// are bit-identical.
#[derive(Debug, Clone)]
pub struct RfmBuilder {
    config: RfmConfig,
}

impl RfmBuilder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub const fn new(config: RfmConfig) -> Self {
        Self { config }
    }

    /// Compute the analysis cutoff date: the latest `last_order_date` in
    /// the snapshot plus the configured lag.
    ///
    /// Computed once per run and passed explicitly to [`build`](Self::build)
    /// rather than re-derived per stage.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InsufficientData`] if the snapshot holds no
    /// order dates.
    pub fn analysis_cutoff(&self, df: &DataFrame) -> Result<Date> {
        let max_day = df
            .column(columns::LAST_ORDER_DATE)
            .map_err(|_| RondaError::MissingColumn(columns::LAST_ORDER_DATE.to_string()))?
            .as_materialized_series()
            .date()?
            .into_iter()
            .flatten()
            .max()
            .ok_or_else(|| {
                RondaError::InsufficientData("no order dates in snapshot".to_string())
            })?;

        Ok(epoch_days_to_date(max_day) + Duration::days(self.config.cutoff_lag_days))
    }

    /// Build the RFM table from the cleaned snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if any customer's last order
    /// predates their first, or the cutoff predates a first order — both
    /// would violate the `T_weekly >= recency_cltv_weekly >= 0` invariant.
    pub fn build(&self, df: &DataFrame, cutoff: Date) -> Result<DataFrame> {
        let grouped = df
            .clone()
            .lazy()
            .group_by([col(columns::CUSTOMER_ID)])
            .agg([
                col(columns::FIRST_ORDER_DATE).min(),
                col(columns::LAST_ORDER_DATE).max(),
                col(columns::ORDER_NUM_TOTAL).sum(),
                col(columns::CUSTOMER_VALUE_TOTAL).sum(),
            ])
            .collect()?
            .sort([columns::CUSTOMER_ID], SortMultipleOptions::default())?;

        let ids: Vec<String> = grouped
            .column(columns::CUSTOMER_ID)?
            .as_materialized_series()
            .str()?
            .into_no_null_iter()
            .map(str::to_string)
            .collect();
        let first_days: Vec<i32> = date_column(&grouped, columns::FIRST_ORDER_DATE)?;
        let last_days: Vec<i32> = date_column(&grouped, columns::LAST_ORDER_DATE)?;
        let frequencies: Vec<i64> = grouped
            .column(columns::ORDER_NUM_TOTAL)?
            .as_materialized_series()
            .i64()?
            .into_no_null_iter()
            .collect();
        let monetary: Vec<f64> = grouped
            .column(columns::CUSTOMER_VALUE_TOTAL)?
            .as_materialized_series()
            .f64()?
            .into_no_null_iter()
            .collect();

        let cutoff_day = date_to_epoch_days(cutoff);

        let mut out_ids = Vec::with_capacity(ids.len());
        let mut out_freq: Vec<i64> = Vec::with_capacity(ids.len());
        let mut out_monetary = Vec::with_capacity(ids.len());
        let mut out_recency = Vec::with_capacity(ids.len());
        let mut out_tenure = Vec::with_capacity(ids.len());
        let mut out_avg = Vec::with_capacity(ids.len());

        for i in 0..ids.len() {
            let (first, last) = (first_days[i], last_days[i]);
            if last < first {
                return Err(RondaError::InvalidData(format!(
                    "customer '{}' has last order before first order",
                    ids[i]
                )));
            }
            if cutoff_day < first {
                return Err(RondaError::InvalidData(format!(
                    "analysis cutoff {} predates first order of customer '{}'",
                    cutoff, ids[i]
                )));
            }

            // Zero-purchase customers cannot be modeled; drop silently.
            if frequencies[i] <= 0 {
                continue;
            }

            out_ids.push(ids[i].clone());
            out_freq.push(frequencies[i]);
            out_monetary.push(monetary[i]);
            out_recency.push(f64::from(last - first) / DAYS_PER_WEEK);
            out_tenure.push(f64::from(cutoff_day - first) / DAYS_PER_WEEK);
            out_avg.push(monetary[i] / frequencies[i] as f64);
        }

        if out_ids.is_empty() {
            return Err(RondaError::InsufficientData(
                "no customers with at least one purchase".to_string(),
            ));
        }

        Ok(df! {
            columns::CUSTOMER_ID => out_ids,
            "frequency" => out_freq,
            "monetary" => out_monetary,
            "recency_cltv_weekly" => out_recency,
            "T_weekly" => out_tenure,
            "monetary_cltv_avg" => out_avg,
        }?)
    }
}

impl Default for RfmBuilder {
    fn default() -> Self {
        Self::new(RfmConfig::default())
    }
}

fn date_column(df: &DataFrame, column: &str) -> Result<Vec<i32>> {
    df.column(column)?
        .as_materialized_series()
        .date()?
        .into_iter()
        .map(|d: Option<i32>| {
            d.ok_or_else(|| RondaError::InvalidData(format!("null date in column '{column}'")))
        })
        .collect()
}
