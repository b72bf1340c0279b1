//! Temporal types for bitemporal assertions.
//!
//! Assertions carry two independent time axes:
//! - **Valid time**: when is this claim true in reality?
//! - **Record time**: when did the ledger learn (or retract) it?

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A range of valid time (half-open interval: [from, to)).
///
/// This is the caller-supplied part of a [`ValidityWindow`].
///
/// # Examples
///
/// ```
/// use epistemic_ledger::TimeRange;
/// use chrono::Utc;
///
/// let range = TimeRange::from_now();
/// assert!(range.is_open_ended());
/// assert!(range.contains(Utc::now()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range (inclusive).
    pub from: DateTime<Utc>,

    /// End of the range (exclusive). None means open-ended.
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a bounded time range.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTimeRange` if `from >= to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        if from >= to {
            return Err(ValidationError::InvalidTimeRange { from, to });
        }
        Ok(Self { from, to: Some(to) })
    }

    /// Creates an open-ended time range starting at the given time.
    #[must_use]
    pub const fn starting_at(from: DateTime<Utc>) -> Self {
        Self { from, to: None }
    }

    /// Creates an open-ended time range starting now.
    #[must_use]
    pub fn from_now() -> Self {
        Self::starting_at(Utc::now())
    }

    /// True if the range has no end.
    pub const fn is_open_ended(&self) -> bool {
        self.to.is_none()
    }

    /// Check if a timestamp falls within this range [from, to).
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.from && self.to.map_or(true, |to| time < to)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to {
            Some(to) => write!(f, "[{} → {})", self.from, to),
            None => write!(f, "[{} → ∞)", self.from),
        }
    }
}

/// Full bitemporal window of an assertion.
///
/// `retracted_at`, once set, is never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    /// Start of valid time (inclusive).
    pub valid_from: DateTime<Utc>,

    /// End of valid time (exclusive). None means open-ended.
    pub valid_until: Option<DateTime<Utc>>,

    /// When the record was written.
    pub asserted_at: DateTime<Utc>,

    /// When the record was retracted, if ever.
    pub retracted_at: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Opens a window for `range`, recorded at `asserted_at`.
    #[must_use]
    pub const fn new(range: TimeRange, asserted_at: DateTime<Utc>) -> Self {
        Self {
            valid_from: range.from,
            valid_until: range.to,
            asserted_at,
            retracted_at: None,
        }
    }

    /// The valid-time part of the window.
    #[must_use]
    pub const fn range(&self) -> TimeRange {
        TimeRange {
            from: self.valid_from,
            to: self.valid_until,
        }
    }

    /// True if `time` falls in `[valid_from, valid_until)`.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.range().contains(time)
    }

    /// True if valid time has no end.
    pub const fn is_open_ended(&self) -> bool {
        self.valid_until.is_none()
    }

    /// True once a retraction has been recorded.
    pub const fn is_retracted(&self) -> bool {
        self.retracted_at.is_some()
    }

    /// Records a retraction. An earlier retraction time is kept.
    pub fn retract_at(&mut self, at: DateTime<Utc>) {
        if self.retracted_at.is_none() {
            self.retracted_at = Some(at);
        }
    }
}
