//! In-memory belief ledger.
//!
//! Confidence is recomputed from evidence weights on every evidence change,
//! narrowed by inference from parent beliefs, and eroded over time by
//! `decay_all`. Status is derived from the evidence balance unless a manual
//! resolution pins it.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::UncertaintyConfig;
use crate::confidence::{clamp_unit, ConfidenceInterval};
use crate::error::{LedgerError, LedgerResult};
use crate::snapshot::{self, BeliefSnapshot};
use crate::uncertainty::belief::{sanitize_decay_rate, Belief, BeliefId, BeliefStatus, Resolution};
use crate::uncertainty::evidence::{EvidencePointer, EvidenceSourceType};

/// Point confidence at or above which an uncontested belief is `probable`.
pub const PROBABLE_THRESHOLD: f64 = 0.8;

/// Spread applied around the default point when no confidence is supplied.
const DEFAULT_SPREAD: f64 = 0.1;

/// `source_id` of the evidence pointer appended by `resolve`.
pub const RESOLUTION_SOURCE_ID: &str = "manual-resolution";

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Filters for [`UncertaintyLedger::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BeliefFilter {
    /// Keep only beliefs in this namespace.
    pub namespace: Option<String>,
    /// Keep only beliefs with this status.
    pub status: Option<BeliefStatus>,
    /// Keep only beliefs whose point confidence is at least this value.
    pub min_confidence: Option<f64>,
    /// Keep only beliefs carrying every listed tag.
    pub tags: Vec<String>,
}

impl BeliefFilter {
    fn matches(&self, belief: &Belief) -> bool {
        self.namespace.as_ref().map_or(true, |ns| &belief.namespace == ns)
            && self.status.map_or(true, |s| belief.status == s)
            && self
                .min_confidence
                .map_or(true, |min| belief.confidence.point >= min)
            && self.tags.iter().all(|t| belief.tags.contains(t))
    }
}

/// One step of an inference chain.
#[derive(Debug, Clone)]
pub struct ChainLink {
    /// The belief at this step.
    pub belief: Belief,
    /// 0 for the queried belief, increasing toward the roots.
    pub depth: usize,
}

/// Derives status from evidence balance.
///
/// Both the `[0.5, 0.8)` and `[0, 0.5)` point bands map to `uncertain`.
#[must_use]
pub fn derive_status(belief: &Belief, config: &UncertaintyConfig) -> BeliefStatus {
    if !belief.has_evidence() {
        return BeliefStatus::Unknown;
    }
    if let Some(pinned) = belief.pinned_status() {
        return pinned;
    }

    let opposing = belief.opposing_weight();
    let total = belief.supporting_weight() + opposing;
    let opposing_ratio = if total > 0.0 { opposing / total } else { 0.0 };

    if opposing_ratio >= config.refuted_threshold {
        BeliefStatus::Refuted
    } else if opposing_ratio >= config.contested_threshold {
        BeliefStatus::Contested
    } else if belief.confidence.point >= PROBABLE_THRESHOLD {
        BeliefStatus::Probable
    } else {
        BeliefStatus::Uncertain
    }
}

fn sort_oldest_first(beliefs: &mut [Belief]) {
    beliefs.sort_by(|a, b| a.first_asserted.cmp(&b.first_asserted));
}

/// Thread-safe in-memory belief ledger.
///
/// # Examples
///
/// ```
/// use epistemic_ledger::{BeliefStatus, EvidencePointer, EvidenceSourceType, UncertaintyLedger};
///
/// let ledger = UncertaintyLedger::new();
/// let belief = ledger
///     .assert(
///         "deploy succeeded",
///         "ops",
///         vec![EvidencePointer::supporting("ci-run-7", EvidenceSourceType::ToolOutput, 0.9)],
///         None,
///     )
///     .unwrap();
/// assert_eq!(belief.status, BeliefStatus::Probable);
/// ```
#[derive(Debug, Default)]
pub struct UncertaintyLedger {
    config: UncertaintyConfig,
    beliefs: RwLock<HashMap<BeliefId, Belief>>,
}

impl UncertaintyLedger {
    /// Create a new empty ledger with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty ledger with the given configuration.
    #[must_use]
    pub fn with_config(config: UncertaintyConfig) -> Self {
        Self {
            config,
            beliefs: RwLock::default(),
        }
    }

    /// The configuration this ledger was built with.
    pub const fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    fn read(
        &self,
        context: &'static str,
    ) -> LedgerResult<RwLockReadGuard<'_, HashMap<BeliefId, Belief>>> {
        self.beliefs.read().map_err(|_| LedgerError::poisoned(context))
    }

    fn write(
        &self,
        context: &'static str,
    ) -> LedgerResult<RwLockWriteGuard<'_, HashMap<BeliefId, Belief>>> {
        self.beliefs.write().map_err(|_| LedgerError::poisoned(context))
    }

    /// Records a new belief.
    ///
    /// An explicit `confidence` is kept as given (clamped and ordered).
    /// Otherwise the belief starts at the configured default point ± 0.1 and
    /// is then recomputed from `evidence`, if any.
    pub fn assert(
        &self,
        claim: impl Into<String>,
        namespace: impl Into<String>,
        evidence: Vec<EvidencePointer>,
        confidence: Option<ConfidenceInterval>,
    ) -> LedgerResult<Belief> {
        let now = Utc::now();
        let initial = confidence.map_or_else(
            || ConfidenceInterval::around(self.config.default_confidence, DEFAULT_SPREAD),
            |c| ConfidenceInterval::new(c.lower, c.point, c.upper),
        );

        let mut belief = Belief::new(
            claim.into(),
            namespace.into(),
            initial,
            self.config.default_decay_rate,
            now,
        );
        for pointer in evidence {
            belief.attach(pointer);
        }
        if confidence.is_none() {
            belief.recompute_confidence();
        }
        belief.status = derive_status(&belief, &self.config);

        debug!(
            id = %belief.id,
            namespace = %belief.namespace,
            status = %belief.status,
            confidence = %belief.confidence,
            "belief asserted"
        );
        self.write("uncertainty.assert")?
            .insert(belief.id, belief.clone());
        Ok(belief)
    }

    /// Looks up a belief.
    pub fn get(&self, id: BeliefId) -> LedgerResult<Option<Belief>> {
        Ok(self.read("uncertainty.get")?.get(&id).cloned())
    }

    /// Attaches evidence, then recomputes confidence and status.
    pub fn add_evidence(
        &self,
        id: BeliefId,
        evidence: EvidencePointer,
    ) -> LedgerResult<Option<Belief>> {
        let mut beliefs = self.write("uncertainty.add_evidence")?;
        let Some(belief) = beliefs.get_mut(&id) else {
            return Ok(None);
        };
        belief.attach(evidence);
        belief.recompute_confidence();
        belief.status = derive_status(belief, &self.config);
        belief.last_updated = Utc::now();
        debug!(%id, status = %belief.status, confidence = %belief.confidence, "evidence added");
        Ok(Some(belief.clone()))
    }

    /// Recomputes a belief's interval from its evidence and returns it.
    pub fn compute_confidence(&self, id: BeliefId) -> LedgerResult<Option<ConfidenceInterval>> {
        let mut beliefs = self.write("uncertainty.compute_confidence")?;
        Ok(beliefs.get_mut(&id).map(|belief| {
            belief.recompute_confidence();
            belief.status = derive_status(belief, &self.config);
            belief.confidence
        }))
    }

    /// Narrows `child` so no bound exceeds the matching `parent` bound
    /// scaled by `weight`, and records the inference link.
    ///
    /// Never raises a child bound. Returns `None` if either id is unknown.
    pub fn propagate_uncertainty(
        &self,
        parent_id: BeliefId,
        child_id: BeliefId,
        weight: f64,
    ) -> LedgerResult<Option<Belief>> {
        let mut beliefs = self.write("uncertainty.propagate")?;
        let Some(parent) = beliefs.get(&parent_id).map(|p| p.confidence) else {
            return Ok(None);
        };
        let Some(child) = beliefs.get_mut(&child_id) else {
            return Ok(None);
        };

        let weight = clamp_unit(weight);
        if !child.inferred_from.contains(&parent_id) {
            child.inferred_from.push(parent_id);
        }

        let c = &mut child.confidence;
        c.lower = c.lower.min(parent.lower * weight);
        c.point = c.point.min(parent.point * weight);
        c.upper = c.upper.min(parent.upper * weight);
        c.normalize();

        child.status = derive_status(child, &self.config);
        child.last_updated = Utc::now();
        debug!(parent = %parent_id, child = %child_id, weight, confidence = %child.confidence, "uncertainty propagated");
        Ok(Some(child.clone()))
    }

    /// Erodes every belief's confidence by `decay_rate` points per hour
    /// since its last update, as of `at` (default now).
    ///
    /// Returns the number of beliefs that decayed.
    pub fn decay_all(&self, at: Option<DateTime<Utc>>) -> LedgerResult<usize> {
        let at = at.unwrap_or_else(Utc::now);
        let mut beliefs = self.write("uncertainty.decay_all")?;
        let mut decayed = 0usize;

        for belief in beliefs.values_mut() {
            let elapsed_ms = (at - belief.last_updated).num_milliseconds();
            if elapsed_ms <= 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let elapsed_hours = elapsed_ms as f64 / MS_PER_HOUR;
            let decay = belief.decay_rate * elapsed_hours;
            if !(decay > 0.0) {
                continue;
            }

            let c = &mut belief.confidence;
            c.point = clamp_unit(c.point - decay);
            c.lower = (c.lower - decay).clamp(0.0, c.point);
            c.upper = (c.upper - decay * 0.5).clamp(c.point, 1.0);

            belief.status = derive_status(belief, &self.config);
            belief.last_updated = at;
            decayed += 1;
        }

        if decayed > 0 {
            debug!(decayed, %at, "beliefs decayed");
        }
        Ok(decayed)
    }

    /// Manually sets a belief's status.
    ///
    /// `confirmed` and `refuted` also force the interval toward 1 or 0 and
    /// pin the status against later re-derivation; other statuses clear any
    /// existing pin. A full-weight human-input pointer records the decision.
    pub fn resolve(
        &self,
        id: BeliefId,
        status: BeliefStatus,
        reason: impl Into<String>,
    ) -> LedgerResult<Option<Belief>> {
        let mut beliefs = self.write("uncertainty.resolve")?;
        let Some(belief) = beliefs.get_mut(&id) else {
            return Ok(None);
        };
        let reason = reason.into();
        let now = Utc::now();

        let c = &mut belief.confidence;
        match status {
            BeliefStatus::Confirmed => {
                c.point = c.point.max(0.95);
                c.upper = 1.0;
                c.lower = c.lower.max(0.9);
            }
            BeliefStatus::Refuted => {
                c.point = c.point.min(0.05);
                c.lower = 0.0;
                c.upper = c.upper.min(0.1);
            }
            _ => {}
        }
        c.normalize();

        belief.attach(
            EvidencePointer::new(
                RESOLUTION_SOURCE_ID,
                EvidenceSourceType::HumanInput,
                status != BeliefStatus::Refuted,
                1.0,
            )
            .at(now),
        );
        belief.resolution = status.is_pinnable().then(|| Resolution {
            status,
            reason: reason.clone(),
            resolved_at: now,
        });
        belief.status = status;
        belief.last_updated = now;

        info!(%id, %status, reason = %reason, "belief resolved");
        Ok(Some(belief.clone()))
    }

    /// True if the belief's point confidence meets `min_confidence_for_action`.
    /// Unknown ids are not actionable.
    pub fn is_actionable(&self, id: BeliefId) -> LedgerResult<bool> {
        Ok(self
            .read("uncertainty.is_actionable")?
            .get(&id)
            .is_some_and(|b| b.confidence.point >= self.config.min_confidence_for_action))
    }

    /// The belief and its inference ancestors, shallowest first.
    ///
    /// Depth-first over `inferred_from`; each belief appears once, at the
    /// depth it was first reached.
    pub fn get_confidence_chain(&self, id: BeliefId) -> LedgerResult<Vec<ChainLink>> {
        let beliefs = self.read("uncertainty.get_confidence_chain")?;
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(id, 0usize)];

        while let Some((current, depth)) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(belief) = beliefs.get(&current) else {
                continue;
            };
            for parent in belief.inferred_from.iter().rev() {
                if !visited.contains(parent) {
                    stack.push((*parent, depth + 1));
                }
            }
            chain.push(ChainLink {
                belief: belief.clone(),
                depth,
            });
        }

        chain.sort_by_key(|link| link.depth);
        Ok(chain)
    }

    /// Beliefs matching every filter set, oldest first.
    pub fn query(&self, filter: &BeliefFilter) -> LedgerResult<Vec<Belief>> {
        let beliefs = self.read("uncertainty.query")?;
        let mut matches: Vec<_> = beliefs.values().filter(|b| filter.matches(b)).cloned().collect();
        sort_oldest_first(&mut matches);
        Ok(matches)
    }

    /// Beliefs currently contested, oldest first.
    pub fn get_contested(&self) -> LedgerResult<Vec<Belief>> {
        self.query(&BeliefFilter {
            status: Some(BeliefStatus::Contested),
            ..BeliefFilter::default()
        })
    }

    /// Beliefs whose point confidence is below `threshold`, least confident first.
    pub fn get_uncertain(&self, threshold: f64) -> LedgerResult<Vec<Belief>> {
        let beliefs = self.read("uncertainty.get_uncertain")?;
        let mut matches: Vec<_> = beliefs
            .values()
            .filter(|b| b.confidence.point < threshold)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.confidence.point.total_cmp(&b.confidence.point));
        Ok(matches)
    }

    /// Adds a tag to a belief.
    pub fn tag(&self, id: BeliefId, tag: impl Into<String>) -> LedgerResult<Option<Belief>> {
        let mut beliefs = self.write("uncertainty.tag")?;
        Ok(beliefs.get_mut(&id).map(|b| {
            b.tags.insert(tag.into());
            b.clone()
        }))
    }

    /// Overrides a belief's decay rate (negative rates are treated as zero).
    pub fn set_decay_rate(&self, id: BeliefId, rate: f64) -> LedgerResult<Option<Belief>> {
        let mut beliefs = self.write("uncertainty.set_decay_rate")?;
        Ok(beliefs.get_mut(&id).map(|b| {
            b.decay_rate = sanitize_decay_rate(rate);
            b.clone()
        }))
    }

    /// Deletes a belief and returns it.
    pub fn remove(&self, id: BeliefId) -> LedgerResult<Option<Belief>> {
        let removed = self.write("uncertainty.remove")?.remove(&id);
        if removed.is_some() {
            debug!(%id, "belief removed");
        }
        Ok(removed)
    }

    /// Snapshot of every belief, oldest first.
    pub fn export_beliefs(&self) -> LedgerResult<BeliefSnapshot> {
        let mut beliefs: Vec<_> = self.read("uncertainty.export")?.values().cloned().collect();
        sort_oldest_first(&mut beliefs);
        debug!(count = beliefs.len(), "exported beliefs");
        Ok(BeliefSnapshot::new(beliefs))
    }

    /// Replaces the ledger contents with `snapshot`.
    ///
    /// Numeric fields are clamped on the way in, as on every other write.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::VersionMismatch` without touching the ledger if
    /// the snapshot version is not supported.
    pub fn import_beliefs(&self, snapshot: BeliefSnapshot) -> LedgerResult<usize> {
        snapshot::check_version(u64::from(snapshot.version))?;

        let mut beliefs = self.write("uncertainty.import")?;
        beliefs.clear();
        for mut belief in snapshot.beliefs {
            belief.clamp_numeric();
            beliefs.insert(belief.id, belief);
        }
        let count = beliefs.len();
        info!(count, "imported beliefs");
        Ok(count)
    }

    /// `export_beliefs` rendered as JSON.
    pub fn export_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string(&self.export_beliefs()?)?)
    }

    /// `import_beliefs` from JSON. The version is checked before any
    /// record is decoded.
    pub fn import_json(&self, json: &str) -> LedgerResult<usize> {
        self.import_beliefs(snapshot::decode_json(json)?)
    }

    /// Number of beliefs.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read("uncertainty.len")?.len())
    }

    /// True if the ledger holds no beliefs.
    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every belief.
    pub fn clear(&self) -> LedgerResult<()> {
        self.write("uncertainty.clear")?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn support(id: &str, weight: f64) -> EvidencePointer {
        EvidencePointer::supporting(id, EvidenceSourceType::ToolOutput, weight)
    }

    fn oppose(id: &str, weight: f64) -> EvidencePointer {
        EvidencePointer::opposing(id, EvidenceSourceType::ToolOutput, weight)
    }

    #[test]
    fn test_assert_without_evidence_uses_default() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![], None).unwrap();

        assert!((b.confidence.point - 0.7).abs() < 1e-12);
        assert!((b.confidence.lower - 0.6).abs() < 1e-12);
        assert!((b.confidence.upper - 0.8).abs() < 1e-12);
        assert_eq!(b.status, BeliefStatus::Unknown);
        assert!((b.decay_rate - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_assert_with_explicit_confidence_is_kept() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert(
                "x",
                "ns",
                vec![support("a", 1.0)],
                Some(ConfidenceInterval::new(0.2, 0.3, 0.4)),
            )
            .unwrap();

        assert_eq!(b.confidence, ConfidenceInterval::new(0.2, 0.3, 0.4));
        assert_eq!(b.status, BeliefStatus::Uncertain);
    }

    #[test]
    fn test_assert_partitions_evidence() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert("x", "ns", vec![support("a", 0.5), oppose("b", 0.5), support("c", 0.5)], None)
            .unwrap();
        assert_eq!(b.evidence.len(), 2);
        assert_eq!(b.opposing_evidence.len(), 1);
    }

    #[test]
    fn test_add_evidence_recomputes() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![], None).unwrap();
        for (i, w) in [0.9, 0.8, 0.7].into_iter().enumerate() {
            ledger.add_evidence(b.id, support(&format!("s{i}"), w)).unwrap();
        }
        let b = ledger.add_evidence(b.id, oppose("o", 0.5)).unwrap().unwrap();

        assert!((b.confidence.point - 2.4 / 2.9).abs() < 1e-12);
        assert!((b.confidence.point - 0.8).abs() < 0.05);
        assert_eq!(b.status, BeliefStatus::Probable);
        assert!(b.last_updated >= b.first_asserted);

        assert!(ledger.add_evidence(BeliefId::new(), support("z", 1.0)).unwrap().is_none());
    }

    #[test]
    fn test_status_thresholds() {
        let ledger = UncertaintyLedger::new();

        let contested = ledger
            .assert("x", "ns", vec![support("a", 0.6), oppose("b", 0.4)], None)
            .unwrap();
        assert_eq!(contested.status, BeliefStatus::Contested);

        let refuted = ledger
            .assert("x", "ns", vec![support("a", 0.2), oppose("b", 0.8)], None)
            .unwrap();
        assert_eq!(refuted.status, BeliefStatus::Refuted);

        let middling = ledger
            .assert("x", "ns", vec![support("a", 0.75), oppose("b", 0.25)], None)
            .unwrap();
        assert_eq!(middling.status, BeliefStatus::Uncertain);
    }

    #[test]
    fn test_low_and_middle_bands_are_both_uncertain() {
        let config = UncertaintyConfig::default();
        let ledger = UncertaintyLedger::new();
        let mut b = ledger.assert("x", "ns", vec![support("a", 1.0)], None).unwrap();

        b.confidence = ConfidenceInterval::new(0.5, 0.6, 0.7);
        assert_eq!(derive_status(&b, &config), BeliefStatus::Uncertain);
        b.confidence = ConfidenceInterval::new(0.1, 0.2, 0.3);
        assert_eq!(derive_status(&b, &config), BeliefStatus::Uncertain);
    }

    #[test]
    fn test_propagate_never_raises() {
        let ledger = UncertaintyLedger::new();
        let parent = ledger
            .assert("p", "ns", vec![], Some(ConfidenceInterval::new(0.4, 0.5, 0.6)))
            .unwrap();
        let child = ledger
            .assert("c", "ns", vec![], Some(ConfidenceInterval::new(0.1, 0.9, 0.95)))
            .unwrap();

        let updated = ledger
            .propagate_uncertainty(parent.id, child.id, 0.8)
            .unwrap()
            .unwrap();
        let c = updated.confidence;
        assert!((c.point - 0.4).abs() < 1e-12);
        assert!((c.upper - 0.48).abs() < 1e-12);
        assert!((c.lower - 0.1).abs() < 1e-12);
        assert!(c.lower <= child.confidence.lower);
        assert!(c.point <= child.confidence.point);
        assert!(c.upper <= child.confidence.upper);
        assert_eq!(updated.inferred_from, vec![parent.id]);

        let again = ledger
            .propagate_uncertainty(parent.id, child.id, 0.8)
            .unwrap()
            .unwrap();
        assert_eq!(again.inferred_from.len(), 1);

        assert!(ledger
            .propagate_uncertainty(BeliefId::new(), child.id, 1.0)
            .unwrap()
            .is_none());
        assert!(ledger
            .propagate_uncertainty(parent.id, BeliefId::new(), 1.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decay_after_48_hours() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert("x", "ns", vec![], Some(ConfidenceInterval::new(0.7, 0.9, 1.0)))
            .unwrap();

        let later = b.last_updated + Duration::hours(48);
        assert_eq!(ledger.decay_all(Some(later)).unwrap(), 1);

        let d = ledger.get(b.id).unwrap().unwrap();
        assert!((d.confidence.point - 0.42).abs() < 1e-9);
        assert!((d.confidence.lower - 0.22).abs() < 1e-9);
        assert!((d.confidence.upper - 0.76).abs() < 1e-9);
        assert_eq!(d.last_updated, later);

        // Nothing elapsed since the last decay.
        assert_eq!(ledger.decay_all(Some(later)).unwrap(), 0);
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert("x", "ns", vec![], Some(ConfidenceInterval::new(0.1, 0.3, 0.5)))
            .unwrap();
        ledger
            .decay_all(Some(b.last_updated + Duration::hours(100)))
            .unwrap();

        let d = ledger.get(b.id).unwrap().unwrap();
        assert_eq!(d.confidence.point, 0.0);
        assert_eq!(d.confidence.lower, 0.0);
        assert!(d.confidence.is_well_formed());
    }

    #[test]
    fn test_decay_skips_past_reference() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![], None).unwrap();
        assert_eq!(
            ledger
                .decay_all(Some(b.last_updated - Duration::hours(1)))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_resolve_confirmed_is_sticky() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert("x", "ns", vec![support("a", 0.5), oppose("b", 0.5)], None)
            .unwrap();
        assert_eq!(b.status, BeliefStatus::Contested);

        let r = ledger
            .resolve(b.id, BeliefStatus::Confirmed, "verified by on-call")
            .unwrap()
            .unwrap();
        assert_eq!(r.status, BeliefStatus::Confirmed);
        assert!(r.confidence.point >= 0.95);
        assert!(r.confidence.lower >= 0.9);
        assert_eq!(r.confidence.upper, 1.0);
        assert!(r
            .evidence
            .iter()
            .any(|e| e.source_id == RESOLUTION_SOURCE_ID && e.is_resolution()));
        assert_eq!(r.resolution.as_ref().unwrap().reason, "verified by on-call");

        let after = ledger.add_evidence(b.id, oppose("c", 0.9)).unwrap().unwrap();
        assert_eq!(after.status, BeliefStatus::Confirmed);
    }

    #[test]
    fn test_resolve_refuted() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![support("a", 0.9)], None).unwrap();
        let r = ledger
            .resolve(b.id, BeliefStatus::Refuted, "disproved")
            .unwrap()
            .unwrap();

        assert_eq!(r.status, BeliefStatus::Refuted);
        assert!(r.confidence.point <= 0.05);
        assert_eq!(r.confidence.lower, 0.0);
        assert!(r.confidence.upper <= 0.1);
        assert_eq!(r.opposing_evidence.len(), 1);
        assert!(ledger.resolve(BeliefId::new(), BeliefStatus::Refuted, "x").unwrap().is_none());
    }

    #[test]
    fn test_resolve_unpinnable_status_clears_pin() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![support("a", 0.9)], None).unwrap();
        ledger.resolve(b.id, BeliefStatus::Confirmed, "ok").unwrap();
        let r = ledger
            .resolve(b.id, BeliefStatus::Uncertain, "reopened")
            .unwrap()
            .unwrap();
        assert!(r.resolution.is_none());
        assert_eq!(r.status, BeliefStatus::Uncertain);

        // Re-derived on the next change.
        let next = ledger.add_evidence(b.id, support("b", 0.9)).unwrap().unwrap();
        assert_ne!(next.status, BeliefStatus::Confirmed);
    }

    #[test]
    fn test_is_actionable() {
        let ledger = UncertaintyLedger::new();
        let high = ledger
            .assert("x", "ns", vec![], Some(ConfidenceInterval::new(0.5, 0.6, 0.7)))
            .unwrap();
        let low = ledger
            .assert("y", "ns", vec![], Some(ConfidenceInterval::new(0.0, 0.1, 0.2)))
            .unwrap();

        assert!(ledger.is_actionable(high.id).unwrap());
        assert!(!ledger.is_actionable(low.id).unwrap());
        assert!(!ledger.is_actionable(BeliefId::new()).unwrap());
    }

    #[test]
    fn test_confidence_chain_depths() {
        let ledger = UncertaintyLedger::new();
        let root = ledger.assert("root", "ns", vec![], None).unwrap();
        let mid = ledger.assert("mid", "ns", vec![], None).unwrap();
        let leaf = ledger.assert("leaf", "ns", vec![], None).unwrap();
        ledger.propagate_uncertainty(root.id, mid.id, 1.0).unwrap();
        ledger.propagate_uncertainty(mid.id, leaf.id, 1.0).unwrap();

        let chain = ledger.get_confidence_chain(leaf.id).unwrap();
        let got: Vec<_> = chain.iter().map(|l| (l.belief.id, l.depth)).collect();
        assert_eq!(got, vec![(leaf.id, 0), (mid.id, 1), (root.id, 2)]);
        assert!(ledger.get_confidence_chain(BeliefId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_confidence_chain_terminates_on_cycle() {
        let ledger = UncertaintyLedger::new();
        let a = ledger.assert("a", "ns", vec![], None).unwrap();
        let b = ledger.assert("b", "ns", vec![], None).unwrap();
        ledger.propagate_uncertainty(a.id, b.id, 1.0).unwrap();
        ledger.propagate_uncertainty(b.id, a.id, 1.0).unwrap();

        let chain = ledger.get_confidence_chain(a.id).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].belief.id, a.id);
        assert_eq!(chain[1].depth, 1);
    }

    #[test]
    fn test_query_and_helpers() {
        let ledger = UncertaintyLedger::new();
        let a = ledger
            .assert("a", "ops", vec![support("x", 0.5), oppose("y", 0.5)], None)
            .unwrap();
        let b = ledger
            .assert("b", "ops", vec![], Some(ConfidenceInterval::new(0.1, 0.2, 0.3)))
            .unwrap();
        ledger.assert("c", "dev", vec![support("x", 1.0)], None).unwrap();
        ledger.tag(b.id, "flaky").unwrap();

        let ops = ledger
            .query(&BeliefFilter {
                namespace: Some("ops".to_string()),
                ..BeliefFilter::default()
            })
            .unwrap();
        assert_eq!(ops.len(), 2);

        let flaky = ledger
            .query(&BeliefFilter {
                tags: vec!["flaky".to_string()],
                ..BeliefFilter::default()
            })
            .unwrap();
        assert_eq!(flaky, vec![b.clone()]);

        let confident = ledger
            .query(&BeliefFilter {
                min_confidence: Some(0.9),
                ..BeliefFilter::default()
            })
            .unwrap();
        assert_eq!(confident.len(), 1);

        let contested = ledger.get_contested().unwrap();
        assert_eq!(contested.len(), 1);
        assert_eq!(contested[0].id, a.id);

        let uncertain = ledger.get_uncertain(0.6).unwrap();
        assert_eq!(uncertain[0].id, b.id);
        assert_eq!(uncertain.len(), 2);
    }

    #[test]
    fn test_set_decay_rate_and_remove() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("x", "ns", vec![], None).unwrap();
        let updated = ledger.set_decay_rate(b.id, -3.0).unwrap().unwrap();
        assert_eq!(updated.decay_rate, 0.0);
        assert_eq!(
            ledger
                .decay_all(Some(b.last_updated + Duration::hours(10)))
                .unwrap(),
            0
        );

        assert!(ledger.remove(b.id).unwrap().is_some());
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let ledger = UncertaintyLedger::new();
        let parent = ledger.assert("p", "ns", vec![support("a", 0.9)], None).unwrap();
        let child = ledger.assert("c", "ns", vec![support("b", 0.6)], None).unwrap();
        ledger.propagate_uncertainty(parent.id, child.id, 0.9).unwrap();
        ledger.resolve(parent.id, BeliefStatus::Confirmed, "ok").unwrap();

        let json = ledger.export_json().unwrap();
        assert!(json.contains("\"beliefs\""));
        let restored = UncertaintyLedger::new();
        assert_eq!(restored.import_json(&json).unwrap(), 2);

        let rc = restored.get(child.id).unwrap().unwrap();
        assert_eq!(rc.inferred_from, vec![parent.id]);
        let rp = restored.get(parent.id).unwrap().unwrap();
        assert_eq!(rp.status, BeliefStatus::Confirmed);
        assert!(rp.resolution.is_some());
    }

    #[test]
    fn test_import_clamps_out_of_range_numbers() {
        let source = UncertaintyLedger::new();
        let b = source
            .assert(
                "replica in sync",
                "db",
                vec![support("lag-check", 0.9), oppose("alert", 0.6), oppose("pager", 0.4)],
                None,
            )
            .unwrap();

        let mut doc: serde_json::Value =
            serde_json::from_str(&source.export_json().unwrap()).unwrap();
        let record = &mut doc["beliefs"][0];
        record["evidence"][0]["weight"] = serde_json::json!(3.0);
        record["opposingEvidence"][1]["weight"] = serde_json::json!(-0.4);
        record["decayRate"] = serde_json::json!(-2.0);
        record["confidence"] = serde_json::json!({"lower": 0.9, "point": 1.7, "upper": -1.0});

        let ledger = UncertaintyLedger::new();
        ledger.import_json(&doc.to_string()).unwrap();
        let imported = ledger.get(b.id).unwrap().unwrap();

        assert_eq!(imported.evidence[0].weight, 1.0);
        assert_eq!(imported.opposing_evidence[1].weight, 0.0);
        assert_eq!(imported.decay_rate, 0.0);
        assert!(imported.confidence.is_well_formed());

        // 1.0 supporting vs 0.6 opposing: still contested after recompute.
        let after = ledger
            .add_evidence(b.id, support("noop", 0.0))
            .unwrap()
            .unwrap();
        assert!((after.confidence.point - 0.625).abs() < 1e-12);
        assert_eq!(after.status, BeliefStatus::Contested);
    }

    #[test]
    fn test_compute_confidence_recomputes_and_rederives() {
        let ledger = UncertaintyLedger::new();
        let b = ledger
            .assert("x", "ns", vec![], Some(ConfidenceInterval::new(0.1, 0.2, 0.3)))
            .unwrap();
        assert_eq!(b.status, BeliefStatus::Unknown);

        ledger.add_evidence(b.id, support("a", 0.9)).unwrap();
        ledger.add_evidence(b.id, oppose("b", 0.1)).unwrap();
        {
            // Knock the stored state off its evidence-derived values.
            let mut beliefs = ledger.beliefs.write().unwrap();
            let stored = beliefs.get_mut(&b.id).unwrap();
            stored.confidence = ConfidenceInterval::new(0.1, 0.2, 0.3);
            stored.status = BeliefStatus::Unknown;
        }

        let c = ledger.compute_confidence(b.id).unwrap().unwrap();
        let spread = 0.3 / 2f64.sqrt();
        assert!((c.point - 0.9).abs() < 1e-12);
        assert!((c.lower - (0.9 - spread)).abs() < 1e-12);
        assert_eq!(c.upper, 1.0);

        let stored = ledger.get(b.id).unwrap().unwrap();
        assert_eq!(stored.confidence, c);
        assert_eq!(stored.status, BeliefStatus::Probable);

        assert!(ledger.compute_confidence(BeliefId::new()).unwrap().is_none());
    }

    #[test]
    fn test_import_wrong_version_leaves_ledger_untouched() {
        let ledger = UncertaintyLedger::new();
        let b = ledger.assert("keep", "ns", vec![], None).unwrap();

        let mut snapshot = UncertaintyLedger::new().export_beliefs().unwrap();
        snapshot.version = 0;
        assert!(ledger.import_beliefs(snapshot).unwrap_err().is_version_mismatch());
        assert!(ledger.get(b.id).unwrap().is_some());
    }
}
