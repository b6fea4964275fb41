//! Core types for the ronda CLTV framework.
//!
//! This crate defines the shared vocabulary of the ronda ecosystem: the
//! [`CustomerData`] table wrapper, the input column contract, the
//! [`RondaError`] error type, and small statistical helpers used by the
//! preparation and modeling crates.

pub mod error;
pub mod stats;
pub mod types;

pub use error::{Result, RondaError};
pub use types::{columns, CustomerData, Date};
