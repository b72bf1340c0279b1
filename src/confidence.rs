//! Confidence intervals.
//!
//! A belief's confidence is a point estimate with lower and upper bounds.
//! Every constructor and mutator keeps `0 <= lower <= point <= upper <= 1`;
//! out-of-range input is clamped, never rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Clamps to [0, 1], mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Formalized uncertainty around a point estimate.
///
/// # Examples
///
/// ```
/// use epistemic_ledger::ConfidenceInterval;
///
/// let c = ConfidenceInterval::new(0.9, 0.5, 1.4);
/// assert_eq!(c.point, 0.5);
/// assert_eq!(c.lower, 0.5); // lowered to the point
/// assert_eq!(c.upper, 1.0); // clamped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound.
    pub lower: f64,
    /// Best estimate.
    pub point: f64,
    /// Upper bound.
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Minimum spread produced by evidence recomputation.
    pub const MIN_SPREAD: f64 = 0.02;

    /// Creates an interval, clamping each bound and restoring the ordering
    /// around `point`.
    #[must_use]
    pub fn new(lower: f64, point: f64, upper: f64) -> Self {
        let mut interval = Self {
            lower: clamp_unit(lower),
            point: clamp_unit(point),
            upper: clamp_unit(upper),
        };
        interval.normalize();
        interval
    }

    /// Symmetric interval `point ± spread`, clamped to [0, 1].
    #[must_use]
    pub fn around(point: f64, spread: f64) -> Self {
        let point = clamp_unit(point);
        Self::new(point - spread, point, point + spread)
    }

    /// Spread for an evidence set of size `count`: `max(0.02, 0.3 / √count)`.
    #[must_use]
    pub fn spread_for(count: usize) -> f64 {
        if count == 0 {
            return 0.3;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        (0.3 / n.sqrt()).max(Self::MIN_SPREAD)
    }

    /// Re-establishes `lower <= point <= upper` by moving the bounds.
    pub fn normalize(&mut self) {
        self.lower = self.lower.min(self.point);
        self.upper = self.upper.max(self.point);
    }

    /// `upper - lower`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// True if all three values are in [0, 1] and ordered.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.lower)
            && (0.0..=1.0).contains(&self.upper)
            && self.lower <= self.point
            && self.point <= self.upper
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} [{:.3}, {:.3}]", self.point, self.lower, self.upper)
    }
}
