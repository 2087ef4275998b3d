//! Error types for Strider.

use thiserror::Error;

/// Invalid tunable values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Value outside its accepted range
    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
        /// Lower bound (inclusive)
        min: f32,
        /// Upper bound (inclusive)
        max: f32,
    },

    /// A min/max pair is inverted
    #[error("{min_field} ({min}) must not exceed {max_field} ({max})")]
    InvertedRange {
        /// Name of the lower bound field
        min_field: &'static str,
        /// Lower bound value
        min: f32,
        /// Name of the upper bound field
        max_field: &'static str,
        /// Upper bound value
        max: f32,
    },

    /// Value must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Field name
        field: &'static str,
        /// Offending value
        value: f32,
    },
}

impl ConfigError {
    /// Checks `value` is within `[min, max]`.
    pub fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Checks `value` is strictly positive.
    pub fn check_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value > 0.0 {
            Ok(())
        } else {
            Err(Self::NotPositive { field, value })
        }
    }

    /// Checks a min/max pair is ordered.
    pub fn check_ordered(
        min_field: &'static str,
        min: f32,
        max_field: &'static str,
        max: f32,
    ) -> Result<(), Self> {
        if min <= max {
            Ok(())
        } else {
            Err(Self::InvertedRange {
                min_field,
                min,
                max_field,
                max,
            })
        }
    }
}
