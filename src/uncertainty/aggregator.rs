//! Read-only multi-belief queries over an [`UncertaintyLedger`].

use crate::error::LedgerResult;
use crate::uncertainty::belief::{Belief, BeliefId, BeliefStatus};
use crate::uncertainty::ledger::UncertaintyLedger;

/// Per-term floor that keeps `ln` finite for zero-confidence beliefs.
const LOG_FLOOR: f64 = 1e-10;

/// Combines the confidence of several beliefs.
///
/// Ids that do not resolve to a belief are ignored by every method except
/// [`all_confirmed`](Self::all_confirmed).
#[derive(Debug, Clone, Copy)]
pub struct UncertaintyAggregator<'a> {
    ledger: &'a UncertaintyLedger,
}

impl<'a> UncertaintyAggregator<'a> {
    /// Wraps a ledger for read-only aggregation.
    #[must_use]
    pub const fn new(ledger: &'a UncertaintyLedger) -> Self {
        Self { ledger }
    }

    fn resolve(&self, ids: &[BeliefId]) -> LedgerResult<Vec<Belief>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(belief) = self.ledger.get(*id)? {
                found.push(belief);
            }
        }
        Ok(found)
    }

    fn points(&self, ids: &[BeliefId]) -> LedgerResult<Vec<f64>> {
        Ok(self
            .resolve(ids)?
            .iter()
            .map(|b| b.confidence.point)
            .collect())
    }

    /// Geometric mean of point confidences, computed in log space.
    /// 0 when no id resolves.
    pub fn aggregate(&self, ids: &[BeliefId]) -> LedgerResult<f64> {
        let points = self.points(ids)?;
        if points.is_empty() {
            return Ok(0.0);
        }
        let log_sum: f64 = points.iter().map(|p| p.max(LOG_FLOOR).ln()).sum();
        #[allow(clippy::cast_precision_loss)]
        let n = points.len() as f64;
        Ok((log_sum / n).exp())
    }

    /// Lowest point confidence; 0 when no id resolves.
    pub fn worst_case(&self, ids: &[BeliefId]) -> LedgerResult<f64> {
        let points = self.points(ids)?;
        Ok(points.into_iter().reduce(f64::min).unwrap_or(0.0))
    }

    /// Highest point confidence; 0 when no id resolves.
    pub fn best_case(&self, ids: &[BeliefId]) -> LedgerResult<f64> {
        let points = self.points(ids)?;
        Ok(points.into_iter().reduce(f64::max).unwrap_or(0.0))
    }

    /// True if any resolved id is contested.
    pub fn any_contested(&self, ids: &[BeliefId]) -> LedgerResult<bool> {
        Ok(self
            .resolve(ids)?
            .iter()
            .any(|b| b.status == BeliefStatus::Contested))
    }

    /// True only if `ids` is non-empty and every id resolves to a confirmed belief.
    pub fn all_confirmed(&self, ids: &[BeliefId]) -> LedgerResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        for id in ids {
            match self.ledger.get(*id)? {
                Some(b) if b.status == BeliefStatus::Confirmed => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }
}
