//! Omni-channel feature aggregation and date retyping.
//!
//! Omni-channel customers shop both online and offline; the models only
//! care about the combined totals. This stage derives those totals and
//! turns every date-like column into a proper temporal type. Unparseable
//! dates are fatal: they break the data-integrity precondition of the
//! recency/tenure computation.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use ronda_traits::{columns, Result, RondaError};

/// Days between 0001-01-01 (CE) and the 1970-01-01 epoch polars dates use.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Expected string format of date columns in the raw snapshot.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Convert a calendar date to polars epoch days.
pub(crate) fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert polars epoch days back to a calendar date.
pub(crate) fn epoch_days_to_date(days: i32) -> NaiveDate {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
        .expect("epoch day offset within calendar range")
}

/// Derive `order_num_total` and `customer_value_total` from the
/// per-channel columns.
///
/// `order_num_total` is cast to an integer column; the outlier thresholds
/// are already rounded, so truncation only normalizes the dtype.
///
/// # Errors
///
/// Returns [`RondaError::MissingColumn`] if a per-channel column is
/// absent.
pub fn derive_totals(df: &mut DataFrame) -> Result<()> {
    let online_orders = numeric(df, columns::ORDER_NUM_ONLINE)?;
    let offline_orders = numeric(df, columns::ORDER_NUM_OFFLINE)?;
    let online_value = numeric(df, columns::VALUE_ONLINE)?;
    let offline_value = numeric(df, columns::VALUE_OFFLINE)?;

    let order_totals: Vec<i64> = online_orders
        .iter()
        .zip(offline_orders.iter())
        .map(|(a, b)| (a + b) as i64)
        .collect();
    let value_totals: Vec<f64> = online_value
        .iter()
        .zip(offline_value.iter())
        .map(|(a, b)| a + b)
        .collect();

    df.with_column(Column::new(columns::ORDER_NUM_TOTAL.into(), order_totals))?;
    df.with_column(Column::new(
        columns::CUSTOMER_VALUE_TOTAL.into(),
        value_totals,
    ))?;
    Ok(())
}

/// Retype every column whose name signals a date semantic into the polars
/// `Date` type.
///
/// Columns already typed as `Date` are left alone. String columns are
/// parsed as `%Y-%m-%d`.
///
/// # Errors
///
/// Returns [`RondaError::DateParse`] on the first null or unparseable
/// value. This is fatal by design, not a recoverable condition.
pub fn retype_dates(df: &mut DataFrame) -> Result<()> {
    let date_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| name.contains("date"))
        .map(|name| name.to_string())
        .collect();

    for name in date_columns {
        let dtype = df.column(&name)?.dtype().clone();
        match dtype {
            DataType::Date => continue,
            DataType::String => {}
            other => {
                return Err(RondaError::InvalidData(format!(
                    "date column '{name}' has unexpected type {other}"
                )));
            }
        }

        let parsed: Vec<i32> = {
            let ca = df.column(&name)?.as_materialized_series().str()?.clone();
            let mut days = Vec::with_capacity(ca.len());
            for value in ca.into_iter() {
                let raw = value.ok_or_else(|| RondaError::DateParse {
                    column: name.clone(),
                    value: "null".to_string(),
                })?;
                let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                    RondaError::DateParse {
                        column: name.clone(),
                        value: raw.to_string(),
                    }
                })?;
                days.push(date_to_epoch_days(date));
            }
            days
        };

        let series = Int32Chunked::from_vec(name.as_str().into(), parsed)
            .into_date()
            .into_series();
        df.replace(&name, series)?;
    }
    Ok(())
}

fn numeric(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df
        .column(column)
        .map_err(|_| RondaError::MissingColumn(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_no_null_iter().collect())
}
