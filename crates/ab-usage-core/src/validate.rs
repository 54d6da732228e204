//! Pre-submission validation of usage events.
//!
//! Validation runs once, synchronously, immediately before an event is
//! handed to the transport. Rules are independent: all violations are
//! accumulated in one pass and the event is never mutated.
//!
//! The string-to-string shape of dimensions and tags is enforced by the
//! type system and needs no rule here. Meter quantities of any sign are
//! accepted; only non-finite values are rejected.

use chrono::{DateTime, Utc};

use crate::event::UsageEvent;

/// One violated validation rule.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required string field is empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Wire name of the field.
        field: &'static str,
    },

    /// The usage window is inverted.
    #[error("usageStart {start} is after usageEnd {end}")]
    InvertedWindow {
        /// Window start.
        start: DateTime<Utc>,
        /// Window end.
        end: DateTime<Utc>,
    },

    /// The event carries no meters.
    #[error("at least one meter is required")]
    NoMeters,

    /// A meter has an empty required field.
    #[error("meter #{index}: {field} must not be empty")]
    EmptyMeterField {
        /// Zero-based meter index.
        index: usize,
        /// Wire name of the field.
        field: &'static str,
    },

    /// A meter quantity is NaN or infinite.
    #[error("meter #{index}: quantity must be a finite number")]
    NonFiniteQuantity {
        /// Zero-based meter index.
        index: usize,
    },
}

/// Check an event against all submission rules.
///
/// Returns every violated rule; an empty list means the event may be
/// transmitted.
#[must_use]
pub fn validate(event: &UsageEvent) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let data = &event.data;

    for (field, value) in [
        ("data.id", &data.id),
        ("service", &data.service),
        ("operation", &data.operation),
        ("resourceId", &data.resource_id),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyField { field });
        }
    }

    if data.usage_start > data.usage_end {
        errors.push(ValidationError::InvertedWindow {
            start: data.usage_start,
            end: data.usage_end,
        });
    }

    if data.meters.is_empty() {
        errors.push(ValidationError::NoMeters);
    }
    for (index, meter) in data.meters.iter().enumerate() {
        if meter.meter_id.trim().is_empty() {
            errors.push(ValidationError::EmptyMeterField {
                index,
                field: "meterId",
            });
        }
        if meter.unit.trim().is_empty() {
            errors.push(ValidationError::EmptyMeterField {
                index,
                field: "unit",
            });
        }
        if !meter.quantity.is_finite() {
            errors.push(ValidationError::NonFiniteQuantity { index });
        }
    }

    errors
}
