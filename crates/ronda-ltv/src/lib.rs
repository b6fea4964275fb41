//! CLTV composition, segmentation, and fit diagnostics.
//!
//! The last stages of the ronda pipeline: [`compose`] folds the two fitted
//! models into a discounted present-value estimate per customer,
//! [`segment`] partitions the population into ordered value tiers, and
//! [`diagnostics`] provides the period-transactions fit check and the
//! frequency/monetary correlation probe.

pub mod compose;
pub mod diagnostics;
pub mod segment;

pub use compose::{customer_lifetime_value, LtvConfig, WEEKS_PER_MONTH};
pub use segment::{segment, DEFAULT_SEGMENT_LABELS};
