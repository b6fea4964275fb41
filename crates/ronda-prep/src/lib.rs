//! Feature preparation for the ronda CLTV pipeline.
//!
//! Three stages, applied in order to the raw customer snapshot:
//!
//! 1. [`OutlierSuppressor`] caps extreme values in the count/spend columns.
//! 2. [`aggregate`] derives omni-channel totals and retypes date columns.
//! 3. [`RfmBuilder`] collapses the cleaned snapshot into the RFM table the
//!    models consume.

pub mod aggregate;
pub mod outlier;
pub mod rfm;

pub use aggregate::{derive_totals, retype_dates};
pub use outlier::{OutlierConfig, OutlierSuppressor};
pub use rfm::{RfmBuilder, RfmConfig};
