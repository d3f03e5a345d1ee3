//! Validation errors collected while processing raw inputs.

use crate::schema::{FieldType, SchemaGroup};
use thiserror::Error;

/// A single problem found while validating raw inputs.
///
/// Validation errors are never fatal on their own: the processor collects
/// all of them and hands the list back with the processed inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was not supplied and has no default.
    #[error("Missing required {group} input: {field}")]
    MissingField {
        /// Schema group the field belongs to
        group: SchemaGroup,
        /// Field name
        field: String,
    },

    /// A supplied value has the wrong JSON type.
    #[error("Invalid type for {group} {field}. Expected {expected}, got {actual}.")]
    TypeMismatch {
        /// Schema group the field belongs to
        group: SchemaGroup,
        /// Field name
        field: String,
        /// Type declared by the schema
        expected: FieldType,
        /// JSON type actually supplied
        actual: String,
    },

    /// An element of a projection series is not a number.
    #[error("Invalid element at {field}[{index}]. Expected number, got {actual}.")]
    InvalidElement {
        /// Field name
        field: String,
        /// Position of the offending element
        index: usize,
        /// JSON type actually supplied
        actual: String,
    },

    /// A text field holds a value outside its allowed set.
    #[error("Invalid value '{value}' for {field}. Expected one of: {allowed}.")]
    NotAllowed {
        /// Field name
        field: String,
        /// Value supplied
        value: String,
        /// Comma-separated allowed values
        allowed: String,
    },

    /// A projection series is empty and cannot be extended to the horizon.
    #[error("Empty projection series for {field}; cannot extend to {horizon} years.")]
    EmptySeries {
        /// Field name
        field: String,
        /// Projection horizon
        horizon: usize,
    },

    /// Historical data could not be interpreted.
    #[error("Invalid historical data: {0}")]
    InvalidHistoricalData(String),
}

impl ValidationError {
    /// Name of the field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::InvalidElement { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::EmptySeries { field, .. } => Some(field),
            Self::InvalidHistoricalData(_) => None,
        }
    }
}
