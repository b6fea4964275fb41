//! Common types used throughout the ronda framework.
//!
//! This module defines the customer-table wrapper and the column-name
//! contract the preparation stages depend on.

use polars::prelude::*;

use crate::error::{Result, RondaError};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Column-name contract for the raw customer snapshot.
///
/// The Feature Aggregator and RFM Builder address columns by these names;
/// a snapshot missing any of [`REQUIRED`](columns::REQUIRED) is rejected
/// before any work is done.
pub mod columns {
    /// Unique customer identifier.
    pub const CUSTOMER_ID: &str = "master_id";
    /// Date of the customer's first purchase.
    pub const FIRST_ORDER_DATE: &str = "first_order_date";
    /// Date of the customer's most recent purchase.
    pub const LAST_ORDER_DATE: &str = "last_order_date";
    /// Total number of purchases made online.
    pub const ORDER_NUM_ONLINE: &str = "order_num_total_ever_online";
    /// Total number of purchases made offline.
    pub const ORDER_NUM_OFFLINE: &str = "order_num_total_ever_offline";
    /// Total spend online.
    pub const VALUE_ONLINE: &str = "customer_value_total_ever_online";
    /// Total spend offline.
    pub const VALUE_OFFLINE: &str = "customer_value_total_ever_offline";

    /// Derived omni-channel purchase count.
    pub const ORDER_NUM_TOTAL: &str = "order_num_total";
    /// Derived omni-channel spend.
    pub const CUSTOMER_VALUE_TOTAL: &str = "customer_value_total";

    /// Columns the pipeline cannot run without.
    pub const REQUIRED: [&str; 7] = [
        CUSTOMER_ID,
        FIRST_ORDER_DATE,
        LAST_ORDER_DATE,
        ORDER_NUM_ONLINE,
        ORDER_NUM_OFFLINE,
        VALUE_ONLINE,
        VALUE_OFFLINE,
    ];

    /// The count/spend columns subject to outlier suppression.
    pub const SUPPRESSED: [&str; 4] = [
        ORDER_NUM_ONLINE,
        ORDER_NUM_OFFLINE,
        VALUE_ONLINE,
        VALUE_OFFLINE,
    ];
}

/// Container for the per-customer purchase snapshot.
///
/// `CustomerData` wraps a Polars DataFrame holding one row per customer.
/// It is the hand-off type between the external data source and the
/// pipeline, and carries the column-contract validation.
///
/// # Example
///
/// ```no_run
/// use ronda_traits::CustomerData;
/// use polars::prelude::*;
///
/// let df = df! {
///     "master_id" => &["c1", "c2"],
///     "order_num_total_ever_online" => &[3.0, 5.0],
/// }.unwrap();
///
/// let data = CustomerData::new(df);
/// assert!(data.has_column("master_id"));
/// ```
#[derive(Debug, Clone)]
pub struct CustomerData {
    /// The underlying DataFrame, one row per customer.
    data: DataFrame,
}

impl CustomerData {
    /// Creates a new `CustomerData` instance from a DataFrame.
    pub const fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Returns a mutable reference to the underlying DataFrame.
    pub const fn data_mut(&mut self) -> &mut DataFrame {
        &mut self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of customers (rows).
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Checks if a column exists in the snapshot.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Validates that every required column is present.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::MissingColumn`] naming the first missing
    /// column.
    pub fn validate_columns(&self, required: &[&str]) -> Result<()> {
        for col in required {
            if !self.has_column(col) {
                return Err(RondaError::MissingColumn((*col).to_string()));
            }
        }
        Ok(())
    }
}

impl From<DataFrame> for CustomerData {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for CustomerData {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_data_new() {
        let df = DataFrame::default();
        let data = CustomerData::new(df);
        assert!(data.is_empty());
    }

    #[test]
    fn test_customer_data_from_dataframe() {
        let df = df! {
            "master_id" => &["c1", "c2"],
            "customer_value_total_ever_online" => &[100.0, 250.0],
        }
        .unwrap();

        let data = CustomerData::from(df);
        assert_eq!(data.len(), 2);
        assert!(data.has_column("master_id"));
        assert!(!data.has_column("cltv"));
    }

    #[test]
    fn test_validate_columns_ok() {
        let df = df! {
            "master_id" => &["c1"],
            "first_order_date" => &["2020-01-01"],
        }
        .unwrap();

        let data = CustomerData::new(df);
        assert!(data
            .validate_columns(&["master_id", "first_order_date"])
            .is_ok());
    }

    #[test]
    fn test_validate_columns_missing() {
        let df = df! {
            "master_id" => &["c1"],
        }
        .unwrap();

        let data = CustomerData::new(df);
        let err = data.validate_columns(&columns::REQUIRED).unwrap_err();
        match err {
            RondaError::MissingColumn(name) => assert_eq!(name, "first_order_date"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_inner() {
        let df = df! {
            "cltv" => &[12.5],
        }
        .unwrap();

        let data = CustomerData::new(df);
        let inner = data.into_inner();
        assert_eq!(inner.height(), 1);
    }
}
