//! Error types for valuation arithmetic.

use thiserror::Error;

/// Errors from the pure valuation helpers.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValuationError {
    /// Perpetual growth is undefined unless the discount rate exceeds the
    /// growth rate.
    #[error("discount rate {wacc} must exceed terminal growth rate {growth}")]
    DiscountRateNotAboveGrowth {
        /// Discount rate.
        wacc: f64,
        /// Terminal growth rate.
        growth: f64,
    },

    /// Discount factors are undefined at or below -100%.
    #[error("discount rate {0} must be greater than -100%")]
    InvalidDiscountRate(f64),
}
