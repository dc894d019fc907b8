//! Core algorithm implementation for rejection-free event selection.
//!
//! This module contains the cumulative-rate tree and the selector that
//! drives it, plus the supporting pieces: the error surface, the random
//! facade, and chi-squared helpers for the statistical tests.
//!
//! The pieces compose bottom-up: [`EventRateTree`] is a pure indexed
//! aggregate of per-event rates; [`RejectionFreeSelector`] owns one tree
//! and orchestrates the KMC step (deferred refresh, time draw, event
//! draw) against caller-supplied [`RateCalculator`] and [`ImpactOracle`]
//! capabilities.

pub mod error;
pub mod random;
pub mod selector;
pub mod stats;
pub mod tree;

pub use error::SelectorError;
pub use random::{RandomSource, SharedRandomSource};
pub use selector::{ImpactOracle, ImpactTable, RateCalculator, RejectionFreeSelector};
pub use stats::{chi_squared_from_counts, chi_squared_sf, ChiSquaredResult};
pub use tree::EventRateTree;

/// Check that a rate is usable: finite and non-negative. Zero is a valid
/// rate (the event exists but is currently inactive).
///
/// # Errors
///
/// [`SelectorError::InvalidRate`] for NaN, infinite, or negative values.
pub fn validate_rate(rate: f64) -> Result<(), SelectorError> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(SelectorError::InvalidRate { rate });
    }
    Ok(())
}
