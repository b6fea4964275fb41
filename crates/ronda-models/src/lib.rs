//! Probabilistic purchase models for the ronda CLTV pipeline.
//!
//! Two maximum-likelihood models, fit once per run on the RFM table:
//!
//! - [`BetaGeoModel`] (BG/NBD) forecasts expected future purchase counts
//!   from each customer's (frequency, recency, tenure) history.
//! - [`GammaGammaModel`] estimates expected average spend per transaction,
//!   shrinking noisy small-sample averages toward the population mean.
//!
//! Both fits are penalized to stay stable on sparse tables dominated by
//! single-purchase customers, and both are deterministic: the same input
//! always produces the same parameters.

pub mod bgnbd;
pub mod gamma_gamma;
mod math;
pub mod optim;

pub use bgnbd::{BetaGeoConfig, BetaGeoModel};
pub use gamma_gamma::{GammaGammaConfig, GammaGammaModel};
pub use optim::{Minimum, NelderMead};
