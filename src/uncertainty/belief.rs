//! Beliefs: claims with evidence-weighted confidence.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::{clamp_unit, ConfidenceInterval};
use crate::uncertainty::evidence::EvidencePointer;

/// Unique identifier for a belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeliefId(uuid::Uuid);

impl BeliefId {
    /// Creates a new random belief ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for BeliefId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BeliefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Epistemic status of a belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeliefStatus {
    /// Manually confirmed.
    Confirmed,
    /// Uncontested with point confidence of at least 0.8.
    Probable,
    /// Uncontested but below the probable threshold.
    Uncertain,
    /// Opposing weight ratio at or above the contested threshold.
    Contested,
    /// Opposing weight ratio at or above the refuted threshold, or manually refuted.
    Refuted,
    /// No evidence yet.
    Unknown,
}

impl BeliefStatus {
    /// Statuses that a manual resolution pins against re-derivation.
    #[must_use]
    pub const fn is_pinnable(self) -> bool {
        matches!(self, Self::Confirmed | Self::Refuted)
    }
}

impl Default for BeliefStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for BeliefStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Probable => write!(f, "probable"),
            Self::Uncertain => write!(f, "uncertain"),
            Self::Contested => write!(f, "contested"),
            Self::Refuted => write!(f, "refuted"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A manual status override.
///
/// While present (and its backing human-input evidence is still attached),
/// status derivation returns `status` instead of recomputing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Pinned status.
    pub status: BeliefStatus,
    /// Why the status was set.
    pub reason: String,
    /// When the resolution was recorded.
    pub resolved_at: DateTime<Utc>,
}

/// A claim whose confidence is tracked from weighted evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Belief {
    /// Unique id.
    pub id: BeliefId,
    /// The believed statement.
    pub claim: String,
    /// Grouping key for queries.
    pub namespace: String,
    /// Current confidence interval.
    pub confidence: ConfidenceInterval,
    /// Derived from evidence unless pinned by `resolution`.
    pub status: BeliefStatus,

    /// Supporting evidence, in arrival order.
    #[serde(default)]
    pub evidence: Vec<EvidencePointer>,

    /// Opposing evidence, in arrival order.
    #[serde(default)]
    pub opposing_evidence: Vec<EvidencePointer>,

    /// Parent beliefs this one was inferred from.
    #[serde(default)]
    pub inferred_from: Vec<BeliefId>,

    /// When the belief was first recorded.
    pub first_asserted: DateTime<Utc>,
    /// Last evidence, inference, resolution or decay update.
    pub last_updated: DateTime<Utc>,

    /// Confidence points lost per hour.
    pub decay_rate: f64,

    /// Free-form labels.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Manual status override, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl Belief {
    pub(crate) fn new(
        claim: String,
        namespace: String,
        confidence: ConfidenceInterval,
        decay_rate: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BeliefId::new(),
            claim,
            namespace,
            confidence,
            status: BeliefStatus::Unknown,
            evidence: Vec::new(),
            opposing_evidence: Vec::new(),
            inferred_from: Vec::new(),
            first_asserted: now,
            last_updated: now,
            decay_rate,
            tags: BTreeSet::new(),
            resolution: None,
        }
    }

    /// Appends a pointer to the supporting or opposing list.
    pub(crate) fn attach(&mut self, pointer: EvidencePointer) {
        if pointer.supports {
            self.evidence.push(pointer);
        } else {
            self.opposing_evidence.push(pointer);
        }
    }

    /// Supporting plus opposing pointers.
    #[must_use]
    pub fn evidence_count(&self) -> usize {
        self.evidence.len() + self.opposing_evidence.len()
    }

    /// True if any evidence, supporting or opposing, is attached.
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        self.evidence_count() > 0
    }

    /// Sum of supporting weights.
    #[must_use]
    pub fn supporting_weight(&self) -> f64 {
        self.evidence.iter().map(|e| e.weight).sum()
    }

    /// Sum of opposing weights.
    #[must_use]
    pub fn opposing_weight(&self) -> f64 {
        self.opposing_evidence.iter().map(|e| e.weight).sum()
    }

    /// The pinned status, if a resolution is present and still backed by
    /// its human-input evidence.
    #[must_use]
    pub fn pinned_status(&self) -> Option<BeliefStatus> {
        let resolution = self.resolution.as_ref()?;
        let backed = self
            .evidence
            .iter()
            .chain(&self.opposing_evidence)
            .any(EvidencePointer::is_resolution);
        (backed && resolution.status.is_pinnable()).then_some(resolution.status)
    }

    /// Brings numeric fields of a record from outside the ledger back into
    /// range: interval clamped and ordered, weights clamped to [0, 1],
    /// decay rate non-negative.
    pub(crate) fn clamp_numeric(&mut self) {
        let c = self.confidence;
        self.confidence = ConfidenceInterval::new(c.lower, c.point, c.upper);
        for pointer in self.evidence.iter_mut().chain(&mut self.opposing_evidence) {
            pointer.weight = clamp_unit(pointer.weight);
        }
        self.decay_rate = sanitize_decay_rate(self.decay_rate);
    }

    /// Recomputes the interval from evidence weights.
    ///
    /// Leaves the interval unchanged when there is no evidence or the total
    /// weight is zero.
    pub(crate) fn recompute_confidence(&mut self) {
        if !self.has_evidence() {
            return;
        }
        let support = self.supporting_weight();
        let total = support + self.opposing_weight();
        if total <= 0.0 {
            return;
        }
        let spread = ConfidenceInterval::spread_for(self.evidence_count());
        self.confidence = ConfidenceInterval::around(support / total, spread);
    }
}

/// Negative or non-finite decay rates become 0.
pub(crate) fn sanitize_decay_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.max(0.0)
    } else {
        0.0
    }
}

impl PartialEq for Belief {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Belief {}
