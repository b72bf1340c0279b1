//! Error types for the ledger.
//!
//! All errors are strongly typed using thiserror. Not-found lookups are
//! not errors: store operations return `Ok(None)` for unknown ids and the
//! caller branches locally.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Validation errors raised when checking caller input or configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A bounded range whose start is not before its end.
    #[error("Invalid time range: from ({from}) must be before to ({to})")]
    InvalidTimeRange {
        /// Requested start.
        from: DateTime<Utc>,
        /// Requested end.
        to: DateTime<Utc>,
    },

    /// A ratio or confidence setting outside [0, 1].
    #[error("Threshold '{field}' value {value} is out of range [0.0, 1.0]")]
    ThresholdOutOfRange {
        /// Config field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Contested threshold above the refuted threshold.
    #[error("Contested threshold ({contested}) must not exceed refuted threshold ({refuted})")]
    ThresholdOrder {
        /// Configured contested threshold.
        contested: f64,
        /// Configured refuted threshold.
        refuted: f64,
    },

    /// Negative or non-finite decay rate.
    #[error("Decay rate {value} must be finite and non-negative")]
    InvalidDecayRate {
        /// Offending rate.
        value: f64,
    },

    /// `max_assertions` set to zero.
    #[error("Capacity must be greater than zero")]
    ZeroCapacity,
}

/// Top-level error type for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid configuration or caller input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A snapshot carries a format version this crate cannot read.
    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Supported version.
        expected: u32,
        /// Version found in the snapshot.
        found: u64,
    },

    /// Snapshot JSON could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying serde error text.
        message: String,
    },

    /// A writer panicked while holding a store lock.
    #[error("Poisoned lock: {context}")]
    LockPoisoned {
        /// Operation that hit the poisoned lock.
        context: &'static str,
    },
}

impl LedgerError {
    pub(crate) const fn poisoned(context: &'static str) -> Self {
        Self::LockPoisoned { context }
    }

    /// Returns true if a snapshot was rejected for carrying the wrong version.
    #[must_use]
    pub const fn is_version_mismatch(&self) -> bool {
        matches!(self, Self::VersionMismatch { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
