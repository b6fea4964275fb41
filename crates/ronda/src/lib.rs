#![forbid(unsafe_code)]

//! # ronda
//!
//! Customer lifetime value estimation for retail customer bases.
//!
//! ronda is an umbrella crate that re-exports all ronda sub-crates for
//! convenience and hosts the end-to-end [`Pipeline`]. The pipeline
//! ingests a per-customer purchase snapshot, cleans it, fits a BG/NBD
//! purchase-frequency model and a Gamma-Gamma monetary model, composes a
//! discounted lifetime-value estimate per customer, and cuts the
//! population into ordered value tiers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ronda::pipeline::{Pipeline, PipelineConfig};
//!
//! let snapshot: polars::prelude::DataFrame = load_snapshot()?;
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let cltv_table = pipeline.run(snapshot)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Core types, the column contract, and error definitions
//! - [`prep`] - Outlier suppression, omni-channel totals, RFM table
//! - [`models`] - BG/NBD and Gamma-Gamma maximum-likelihood fits
//! - [`ltv`] - CLTV composition, segmentation, fit diagnostics
//! - [`pipeline`] - The end-to-end orchestrator
//!
//! ## Architecture
//!
//! Data flows strictly forward through the stages:
//!
//! 1. **Outlier Suppressor** caps extreme count/spend values
//! 2. **Feature Aggregator** derives omni-channel totals, retypes dates
//! 3. **RFM Builder** collapses history to (frequency, recency, tenure,
//!    monetary) per customer
//! 4. **Frequency + Monetary models** are fit once on the RFM table
//! 5. **CLTV Composer** folds both into a discounted present value
//! 6. **Segmenter** cuts the population into quantile tiers
//!
//! The whole run is a deterministic, single-threaded batch computation:
//! the same snapshot always yields a bit-identical output table.

/// Version information for the ronda crate.
///
/// This constant contains the current version of ronda as specified in
/// Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod pipeline;

/// Core types, column contract, and error definitions.
pub mod traits {
    pub use ronda_traits::*;
}

/// Feature preparation stages.
pub mod prep {
    pub use ronda_prep::*;
}

/// Probabilistic purchase models.
pub mod models {
    pub use ronda_models::*;
}

/// CLTV composition, segmentation, and diagnostics.
pub mod ltv {
    pub use ronda_ltv::*;
}

// Re-export the common working set at the top level.
pub use pipeline::{Pipeline, PipelineConfig};
pub use ronda_ltv::{customer_lifetime_value, segment, LtvConfig};
pub use ronda_models::{BetaGeoConfig, BetaGeoModel, GammaGammaConfig, GammaGammaModel};
pub use ronda_prep::{OutlierSuppressor, RfmBuilder};
pub use ronda_traits::{columns, CustomerData, Date, Result, RondaError};
