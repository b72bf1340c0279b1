//! Store configuration.
//!
//! Both stores accept a plain configuration struct. Defaults are usable
//! as-is; `validate` rejects values that would make the derived state
//! meaningless (thresholds outside [0, 1], zero capacity).

use crate::error::{LedgerError, ValidationError};

/// Configuration for a [`TemporalStore`](crate::TemporalStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalConfig {
    /// Soft upper bound on stored assertions. Only expired and retracted
    /// records are evicted to honor it.
    pub max_assertions: usize,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            max_assertions: 100_000,
        }
    }
}

impl TemporalConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ZeroCapacity` if `max_assertions` is zero.
    pub fn validate(self) -> Result<Self, LedgerError> {
        if self.max_assertions == 0 {
            return Err(ValidationError::ZeroCapacity.into());
        }
        Ok(self)
    }
}

/// Configuration for an [`UncertaintyLedger`](crate::UncertaintyLedger).
#[derive(Debug, Clone, PartialEq)]
pub struct UncertaintyConfig {
    /// Point confidence for beliefs asserted without explicit confidence or evidence.
    pub default_confidence: f64,
    /// Confidence points lost per hour by `decay_all`.
    pub default_decay_rate: f64,
    /// Opposing-weight ratio at which a belief becomes contested.
    pub contested_threshold: f64,
    /// Opposing-weight ratio at which a belief becomes refuted.
    pub refuted_threshold: f64,
    /// Minimum point confidence for `is_actionable`.
    pub min_confidence_for_action: f64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            default_confidence: 0.7,
            default_decay_rate: 0.01,
            contested_threshold: 0.3,
            refuted_threshold: 0.7,
            min_confidence_for_action: 0.3,
        }
    }
}

impl UncertaintyConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if any threshold lies outside [0, 1], the
    /// contested threshold exceeds the refuted threshold, or the decay rate
    /// is negative or not finite.
    pub fn validate(self) -> Result<Self, LedgerError> {
        let unit_fields = [
            ("default_confidence", self.default_confidence),
            ("contested_threshold", self.contested_threshold),
            ("refuted_threshold", self.refuted_threshold),
            ("min_confidence_for_action", self.min_confidence_for_action),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ThresholdOutOfRange { field, value }.into());
            }
        }

        if self.contested_threshold > self.refuted_threshold {
            return Err(ValidationError::ThresholdOrder {
                contested: self.contested_threshold,
                refuted: self.refuted_threshold,
            }
            .into());
        }

        if !self.default_decay_rate.is_finite() || self.default_decay_rate < 0.0 {
            return Err(ValidationError::InvalidDecayRate {
                value: self.default_decay_rate,
            }
            .into());
        }

        Ok(self)
    }
}
