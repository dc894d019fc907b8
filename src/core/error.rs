//! Error surface for the event-rate tree and selector.
//!
//! Every failure here is a programmer or model-configuration error, not a
//! transient fault: callers get the error immediately, nothing is retried
//! internally, and the failing operation leaves the selector state
//! untouched.

use thiserror::Error;

/// Errors returned by [`EventRateTree`](crate::core::EventRateTree) and
/// [`RejectionFreeSelector`](crate::core::RejectionFreeSelector).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SelectorError {
    /// The event ID list supplied at construction was empty.
    #[error("event ID list must not be empty")]
    EmptyEventSet,

    /// The event ID list supplied at construction contained a repeated ID.
    #[error("duplicate event ID at leaf slot {position}")]
    DuplicateEvent {
        /// Leaf slot of the second occurrence.
        position: usize,
    },

    /// A rate was negative, NaN, or infinite.
    #[error("event rate {rate} must be finite and non-negative")]
    InvalidRate {
        /// The offending rate value.
        rate: f64,
    },

    /// An event ID was not part of the fixed set given at construction.
    #[error("event ID is not in the event set")]
    UnknownEvent,

    /// The total event rate is not positive, so no event can fire.
    #[error("total event rate is not positive; the system has no live events")]
    ExhaustedRates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SelectorError::DuplicateEvent { position: 3 }.to_string(),
            "duplicate event ID at leaf slot 3"
        );
        assert_eq!(
            SelectorError::InvalidRate { rate: -1.5 }.to_string(),
            "event rate -1.5 must be finite and non-negative"
        );
    }

    #[test]
    fn test_errors_are_comparable() {
        assert_eq!(SelectorError::EmptyEventSet, SelectorError::EmptyEventSet);
        assert_ne!(SelectorError::EmptyEventSet, SelectorError::ExhaustedRates);
    }
}
