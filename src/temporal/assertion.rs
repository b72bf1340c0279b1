//! Bitemporal assertion records and lifecycle status derivation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::clamp_unit;
use crate::time::{TimeRange, ValidityWindow};

/// Unique identifier for a temporal assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssertionId(uuid::Uuid);

impl AssertionId {
    /// Creates a new random assertion ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AssertionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an assertion relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemporalStatus {
    /// `valid_from` is still ahead.
    Future,
    /// Inside the validity window.
    Active,
    /// `valid_until` has passed.
    Expired,
    /// Replaced by a newer assertion.
    Superseded,
    /// Withdrawn; outranks every other status.
    Retracted,
}

impl fmt::Display for TemporalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Future => write!(f, "future"),
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Superseded => write!(f, "superseded"),
            Self::Retracted => write!(f, "retracted"),
        }
    }
}

/// A claim with bitemporal validity.
///
/// `status` is a cache of [`compute_status`] at the last time the owning
/// store touched the record; it is never set by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalAssertion {
    /// Unique id.
    pub id: AssertionId,
    /// The asserted statement.
    pub claim: String,
    /// Grouping key for queries and conflict detection.
    pub namespace: String,
    /// Valid time and record time.
    pub window: ValidityWindow,
    /// Cached status; see [`compute_status`].
    pub status: TemporalStatus,

    /// Newer assertion that replaced this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<AssertionId>,

    /// Older assertion this one replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<AssertionId>,

    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Free-form provenance label.
    pub source: String,

    /// Free-form labels.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Open key-value annotations.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TemporalAssertion {
    pub(crate) fn new(
        claim: String,
        namespace: String,
        range: TimeRange,
        options: AssertOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let mut assertion = Self {
            id: AssertionId::new(),
            claim,
            namespace,
            window: ValidityWindow::new(range, now),
            status: TemporalStatus::Future,
            superseded_by: None,
            supersedes: None,
            confidence: clamp_unit(options.confidence),
            source: options.source,
            tags: options.tags,
            metadata: options.metadata,
        };
        assertion.refresh_status(now);
        assertion
    }

    /// Status of this record at `at`.
    #[must_use]
    pub fn status_at(&self, at: DateTime<Utc>) -> TemporalStatus {
        compute_status(self, at)
    }

    /// True if the record is active at `at`.
    #[must_use]
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.status_at(at) == TemporalStatus::Active
    }

    pub(crate) fn refresh_status(&mut self, now: DateTime<Utc>) {
        self.status = compute_status(self, now);
    }

    pub(crate) fn has_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|tag| self.tags.contains(tag))
    }
}

/// Derives the lifecycle status of `assertion` at `at`.
///
/// Priority: retracted, superseded, expired, active, future. Retraction
/// wins regardless of where `at` falls in the validity window.
#[must_use]
pub fn compute_status(assertion: &TemporalAssertion, at: DateTime<Utc>) -> TemporalStatus {
    let window = &assertion.window;
    if window.retracted_at.is_some() {
        return TemporalStatus::Retracted;
    }
    if assertion.superseded_by.is_some() {
        return TemporalStatus::Superseded;
    }
    if window.valid_until.is_some_and(|until| at >= until) {
        return TemporalStatus::Expired;
    }
    if at >= window.valid_from {
        return TemporalStatus::Active;
    }
    TemporalStatus::Future
}

/// Optional attributes for a new assertion.
///
/// # Examples
///
/// ```
/// use epistemic_ledger::AssertOptions;
///
/// let opts = AssertOptions::new()
///     .confidence(0.9)
///     .source("release-notes")
///     .tag("api");
/// ```
#[derive(Debug, Clone)]
pub struct AssertOptions {
    confidence: f64,
    source: String,
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for AssertOptions {
    fn default() -> Self {
        Self {
            confidence: 1.0,
            source: "unknown".to_string(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }
}

impl AssertOptions {
    /// Options with confidence 1.0 and source `"unknown"`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence (clamped to [0, 1] on assert).
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the provenance label (default `"unknown"`).
    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds one tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Adds several tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Sets one metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Supersession chain around one assertion.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// The record the timeline was requested for.
    pub assertion: TemporalAssertion,
    /// Records this one replaced, oldest first.
    pub predecessors: Vec<TemporalAssertion>,
    /// Records that replaced this one, newest last.
    pub successors: Vec<TemporalAssertion>,
}
