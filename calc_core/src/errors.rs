//! # Error Types
//!
//! Structured error types for calc_core. Every failure aborts the request it
//! belongs to; the engine never hands back a partial result. The variants carry
//! enough context (field path, offending value) for a form layer to point the
//! user at the exact input that needs fixing.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_distance(slope_distance: f64) -> CalcResult<()> {
//!     if slope_distance <= 0.0 {
//!         return Err(CalcError::degenerate_geometry(
//!             "Slope distance must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_distance(0.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for calculation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A sexagesimal angle is malformed (minutes or seconds of 60 or more)
    #[error("Format error in '{field}': {value} - {reason}")]
    Format {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is not a valid, finite number
    #[error("Numeric error in '{field}': '{value}' is not a valid number")]
    Numeric { field: String, value: String },

    /// The observation geometry cannot produce a station
    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    /// An input value is structurally invalid (wrong count, unknown reference)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A value required by the chosen variant is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create a Format error
    pub fn format(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Format {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Numeric error
    pub fn numeric(field: impl Into<String>, value: impl Into<String>) -> Self {
        CalcError::Numeric {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a DegenerateGeometry error
    pub fn degenerate_geometry(reason: impl Into<String>) -> Self {
        CalcError::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// True for errors caused by the request content rather than the engine
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            CalcError::SerializationError { .. } | CalcError::Internal { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Format { .. } => "FORMAT_ERROR",
            CalcError::Numeric { .. } => "NUMERIC_ERROR",
            CalcError::DegenerateGeometry { .. } => "DEGENERATE_GEOMETRY",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::serialization(err.to_string())
    }
}

/// Reject NaN and infinities before they can reach the arithmetic.
pub(crate) fn ensure_finite(field: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::numeric(field, value.to_string()))
    }
}
