//! In-memory bitemporal assertion store.
//!
//! All records live in one map behind a single `RwLock`. Stored status is
//! a cache: read paths that hand records back recompute it first, so they
//! take the write lock.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::TemporalConfig;
use crate::confidence::clamp_unit;
use crate::error::{LedgerError, LedgerResult};
use crate::snapshot::{self, TemporalSnapshot};
use crate::temporal::assertion::{
    compute_status, AssertOptions, AssertionId, TemporalAssertion, TemporalStatus, Timeline,
};
use crate::time::TimeRange;

/// Metadata key under which `retract` stores its reason.
pub const RETRACTION_REASON_KEY: &str = "retractionReason";

/// Filters for [`TemporalStore::query`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AssertionQuery {
    /// Keep only records in this namespace.
    pub namespace: Option<String>,
    /// Keep only records active at this instant.
    pub point_in_time: Option<DateTime<Utc>>,
    /// Keep only records whose current status matches.
    pub status: Option<TemporalStatus>,
    /// Keep only records with this provenance label.
    pub source: Option<String>,
    /// Keep only records carrying every listed tag.
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct TemporalState {
    by_id: HashMap<AssertionId, TemporalAssertion>,
}

impl TemporalState {
    fn in_namespace<'a>(
        &'a self,
        namespace: Option<&'a str>,
    ) -> impl Iterator<Item = &'a TemporalAssertion> + 'a {
        self.by_id
            .values()
            .filter(move |a| namespace.map_or(true, |ns| a.namespace == ns))
    }

    fn insert_new(
        &mut self,
        claim: String,
        namespace: String,
        range: TimeRange,
        options: AssertOptions,
        supersedes: Option<AssertionId>,
        now: DateTime<Utc>,
    ) -> TemporalAssertion {
        let mut assertion = TemporalAssertion::new(claim, namespace, range, options, now);
        assertion.supersedes = supersedes;
        debug!(
            id = %assertion.id,
            namespace = %assertion.namespace,
            status = %assertion.status,
            "assertion recorded"
        );
        self.by_id.insert(assertion.id, assertion.clone());
        assertion
    }

    /// Evicts expired, then retracted, records until within `max`.
    fn enforce_capacity(&mut self, max: usize, now: DateTime<Utc>) {
        if self.by_id.len() <= max {
            return;
        }

        let mut expired: Vec<(DateTime<Utc>, AssertionId)> = self
            .by_id
            .values()
            .filter(|a| compute_status(a, now) == TemporalStatus::Expired)
            .filter_map(|a| a.window.valid_until.map(|until| (until, a.id)))
            .collect();
        expired.sort();

        let mut retracted: Vec<(DateTime<Utc>, AssertionId)> = self
            .by_id
            .values()
            .filter_map(|a| a.window.retracted_at.map(|at| (at, a.id)))
            .collect();
        retracted.sort();

        let mut evicted = 0usize;
        for (_, id) in expired.into_iter().chain(retracted) {
            if self.by_id.len() <= max {
                break;
            }
            if self.by_id.remove(&id).is_some() {
                evicted += 1;
            }
        }

        if self.by_id.len() > max {
            warn!(
                len = self.by_id.len(),
                max, "assertion store over capacity with nothing left to evict"
            );
        }
        if evicted > 0 {
            info!(evicted, max, "evicted assertions to honor capacity");
        }
    }
}

fn fresh(assertion: &TemporalAssertion, now: DateTime<Utc>) -> TemporalAssertion {
    let mut copy = assertion.clone();
    copy.refresh_status(now);
    copy
}

fn sort_newest_first(assertions: &mut [TemporalAssertion]) {
    assertions.sort_by(|a, b| b.window.asserted_at.cmp(&a.window.asserted_at));
}

fn sort_oldest_first(assertions: &mut [TemporalAssertion]) {
    assertions.sort_by(|a, b| a.window.asserted_at.cmp(&b.window.asserted_at));
}

/// Thread-safe in-memory store of bitemporal assertions.
///
/// # Examples
///
/// ```
/// use epistemic_ledger::{AssertOptions, TemporalStatus, TemporalStore, TimeRange};
///
/// let store = TemporalStore::new();
/// let a = store
///     .assert("v2 API stable", "api", TimeRange::from_now(), AssertOptions::new())
///     .unwrap();
/// assert_eq!(a.status, TemporalStatus::Active);
/// ```
#[derive(Debug, Default)]
pub struct TemporalStore {
    config: TemporalConfig,
    state: RwLock<TemporalState>,
}

impl TemporalStore {
    /// Create a new empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: TemporalConfig) -> Self {
        Self {
            config,
            state: RwLock::default(),
        }
    }

    /// The configuration this store was built with.
    pub const fn config(&self) -> &TemporalConfig {
        &self.config
    }

    fn read(&self, context: &'static str) -> LedgerResult<RwLockReadGuard<'_, TemporalState>> {
        self.state.read().map_err(|_| LedgerError::poisoned(context))
    }

    fn write(&self, context: &'static str) -> LedgerResult<RwLockWriteGuard<'_, TemporalState>> {
        self.state.write().map_err(|_| LedgerError::poisoned(context))
    }

    /// Records a new assertion valid over `range`, asserted now.
    ///
    /// Capacity is enforced afterwards; the new record is never the one evicted
    /// unless it is already expired.
    pub fn assert(
        &self,
        claim: impl Into<String>,
        namespace: impl Into<String>,
        range: TimeRange,
        options: AssertOptions,
    ) -> LedgerResult<TemporalAssertion> {
        let mut state = self.write("temporal.assert")?;
        let now = Utc::now();
        let created = state.insert_new(claim.into(), namespace.into(), range, options, None, now);
        state.enforce_capacity(self.config.max_assertions, now);
        Ok(created)
    }

    /// Looks up an assertion, refreshing its stored status first.
    pub fn get(&self, id: AssertionId) -> LedgerResult<Option<TemporalAssertion>> {
        let mut state = self.write("temporal.get")?;
        let now = Utc::now();
        Ok(state.by_id.get_mut(&id).map(|a| {
            a.refresh_status(now);
            a.clone()
        }))
    }

    /// Assertions active at `at`, newest-asserted first.
    ///
    /// The instant classification uses `at`; every scanned record also has
    /// its stored status refreshed against the current time.
    pub fn get_active_at(
        &self,
        at: DateTime<Utc>,
        namespace: Option<&str>,
    ) -> LedgerResult<Vec<TemporalAssertion>> {
        let mut state = self.write("temporal.get_active_at")?;
        let now = Utc::now();
        let mut active = Vec::new();
        for assertion in state.by_id.values_mut() {
            if namespace.is_some_and(|ns| assertion.namespace != ns) {
                continue;
            }
            assertion.refresh_status(now);
            if compute_status(assertion, at) == TemporalStatus::Active {
                active.push(assertion.clone());
            }
        }
        sort_newest_first(&mut active);
        Ok(active)
    }

    /// Assertions active right now.
    pub fn get_current_truth(&self, namespace: Option<&str>) -> LedgerResult<Vec<TemporalAssertion>> {
        self.get_active_at(Utc::now(), namespace)
    }

    /// Every record for `claim` in `namespace`, whatever its status, oldest first.
    pub fn get_history(&self, claim: &str, namespace: &str) -> LedgerResult<Vec<TemporalAssertion>> {
        let state = self.read("temporal.get_history")?;
        let now = Utc::now();
        let mut history: Vec<_> = state
            .in_namespace(Some(namespace))
            .filter(|a| a.claim == claim)
            .map(|a| fresh(a, now))
            .collect();
        sort_oldest_first(&mut history);
        Ok(history)
    }

    /// Records matching every filter set in `query`, newest-asserted first.
    pub fn query(&self, query: &AssertionQuery) -> LedgerResult<Vec<TemporalAssertion>> {
        let state = self.read("temporal.query")?;
        let now = Utc::now();
        let mut matches: Vec<_> = state
            .in_namespace(query.namespace.as_deref())
            .filter(|a| query.point_in_time.map_or(true, |t| a.is_active_at(t)))
            .filter(|a| query.status.map_or(true, |s| compute_status(a, now) == s))
            .filter(|a| query.source.as_ref().map_or(true, |s| &a.source == s))
            .filter(|a| a.has_tags(&query.tags))
            .map(|a| fresh(a, now))
            .collect();
        sort_newest_first(&mut matches);
        Ok(matches)
    }

    /// Replaces `old_id` with a new assertion and links the pair both ways.
    ///
    /// Returns `None` (and creates nothing) if `old_id` is unknown.
    pub fn supersede(
        &self,
        old_id: AssertionId,
        new_claim: impl Into<String>,
        new_range: TimeRange,
        options: AssertOptions,
    ) -> LedgerResult<Option<TemporalAssertion>> {
        let mut state = self.write("temporal.supersede")?;
        let Some(namespace) = state.by_id.get(&old_id).map(|a| a.namespace.clone()) else {
            return Ok(None);
        };

        let now = Utc::now();
        let created =
            state.insert_new(new_claim.into(), namespace, new_range, options, Some(old_id), now);
        if let Some(old) = state.by_id.get_mut(&old_id) {
            old.superseded_by = Some(created.id);
            old.refresh_status(now);
        }
        debug!(old = %old_id, new = %created.id, "assertion superseded");

        state.enforce_capacity(self.config.max_assertions, now);
        Ok(Some(created))
    }

    /// Retracts an assertion. Retraction is permanent and outranks every
    /// other status.
    pub fn retract(
        &self,
        id: AssertionId,
        reason: Option<&str>,
    ) -> LedgerResult<Option<TemporalAssertion>> {
        let mut state = self.write("temporal.retract")?;
        let now = Utc::now();
        Ok(state.by_id.get_mut(&id).map(|a| {
            a.window.retract_at(now);
            if let Some(reason) = reason {
                a.metadata.insert(
                    RETRACTION_REASON_KEY.to_string(),
                    serde_json::Value::String(reason.to_string()),
                );
            }
            a.refresh_status(now);
            debug!(%id, reason = reason.unwrap_or(""), "assertion retracted");
            a.clone()
        }))
    }

    /// Supersession chain around `id`.
    ///
    /// Links are plain ids, so traversal tracks visited records and stops
    /// at the first repeat.
    pub fn get_timeline(&self, id: AssertionId) -> LedgerResult<Option<Timeline>> {
        let state = self.read("temporal.get_timeline")?;
        let now = Utc::now();
        let Some(root) = state.by_id.get(&id) else {
            return Ok(None);
        };

        let mut visited = HashSet::from([id]);

        let mut predecessors = Vec::new();
        let mut cursor = root.supersedes;
        while let Some(prev_id) = cursor {
            if !visited.insert(prev_id) {
                warn!(%id, at = %prev_id, "cycle in supersession chain");
                break;
            }
            let Some(prev) = state.by_id.get(&prev_id) else {
                break;
            };
            predecessors.push(fresh(prev, now));
            cursor = prev.supersedes;
        }
        predecessors.reverse();

        let mut successors = Vec::new();
        let mut cursor = root.superseded_by;
        while let Some(next_id) = cursor {
            if !visited.insert(next_id) {
                warn!(%id, at = %next_id, "cycle in supersession chain");
                break;
            }
            let Some(next) = state.by_id.get(&next_id) else {
                break;
            };
            successors.push(fresh(next, now));
            cursor = next.superseded_by;
        }

        Ok(Some(Timeline {
            assertion: fresh(root, now),
            predecessors,
            successors,
        }))
    }

    /// Conflicting assertions in `namespace`: the whole active set at `at`
    /// (default now) when two or more records are active, otherwise empty.
    pub fn reconcile(
        &self,
        namespace: &str,
        at: Option<DateTime<Utc>>,
    ) -> LedgerResult<Vec<TemporalAssertion>> {
        let active = self.get_active_at(at.unwrap_or_else(Utc::now), Some(namespace))?;
        if active.len() < 2 {
            return Ok(Vec::new());
        }
        Ok(active)
    }

    /// Deletes expired records whose `valid_until` precedes `before`.
    ///
    /// Retracted and superseded records are kept for traceability.
    pub fn prune_expired(&self, before: DateTime<Utc>) -> LedgerResult<usize> {
        let mut state = self.write("temporal.prune_expired")?;
        let now = Utc::now();
        let start = state.by_id.len();
        state.by_id.retain(|_, a| {
            let prunable = compute_status(a, now) == TemporalStatus::Expired
                && a.window.valid_until.is_some_and(|until| until < before);
            !prunable
        });
        let pruned = start - state.by_id.len();
        if pruned > 0 {
            info!(pruned, %before, "pruned expired assertions");
        }
        Ok(pruned)
    }

    /// Snapshot of every record, oldest first.
    pub fn export_assertions(&self) -> LedgerResult<TemporalSnapshot> {
        let assertions = self.all(None)?;
        debug!(count = assertions.len(), "exported assertions");
        Ok(TemporalSnapshot::new(assertions))
    }

    /// Replaces the store contents with `snapshot`. Confidence is clamped
    /// to [0, 1] on the way in.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::VersionMismatch` without touching the store if
    /// the snapshot version is not supported.
    pub fn import_assertions(&self, snapshot: TemporalSnapshot) -> LedgerResult<usize> {
        snapshot::check_version(u64::from(snapshot.version))?;

        let mut state = self.write("temporal.import")?;
        let now = Utc::now();
        state.by_id.clear();
        for mut assertion in snapshot.assertions {
            assertion.confidence = clamp_unit(assertion.confidence);
            assertion.refresh_status(now);
            state.by_id.insert(assertion.id, assertion);
        }
        let count = state.by_id.len();
        info!(count, "imported assertions");
        Ok(count)
    }

    /// `export_assertions` rendered as JSON.
    pub fn export_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string(&self.export_assertions()?)?)
    }

    /// `import_assertions` from JSON. The version is checked before any
    /// record is decoded.
    pub fn import_json(&self, json: &str) -> LedgerResult<usize> {
        self.import_assertions(snapshot::decode_json(json)?)
    }

    /// All records (optionally one namespace), oldest first.
    pub fn all(&self, namespace: Option<&str>) -> LedgerResult<Vec<TemporalAssertion>> {
        let state = self.read("temporal.all")?;
        let now = Utc::now();
        let mut all: Vec<_> = state.in_namespace(namespace).map(|a| fresh(a, now)).collect();
        sort_oldest_first(&mut all);
        Ok(all)
    }

    /// Number of stored records, whatever their status.
    pub fn len(&self) -> LedgerResult<usize> {
        Ok(self.read("temporal.len")?.by_id.len())
    }

    /// True if the store holds no records.
    pub fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every record.
    pub fn clear(&self) -> LedgerResult<()> {
        self.write("temporal.clear")?.by_id.clear();
        Ok(())
    }

    /// Stored status of `id` as last cached, without refreshing it.
    #[cfg(test)]
    pub(crate) fn cached_status(&self, id: AssertionId) -> Option<TemporalStatus> {
        self.read("temporal.cached_status")
            .ok()
            .and_then(|state| state.by_id.get(&id).map(|a| a.status))
    }
}
