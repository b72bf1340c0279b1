//! Read-only semantic queries over a [`TemporalStore`].

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::temporal::assertion::{AssertionId, TemporalAssertion, TemporalStatus};
use crate::temporal::store::TemporalStore;

/// Kind of lifecycle event detected by [`TemporalReasoner::has_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Recorded after the reference instant.
    Asserted,
    /// Retracted after the reference instant.
    Retracted,
    /// A successor was recorded.
    Superseded,
    /// `valid_until` passed.
    Expired,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asserted => write!(f, "asserted"),
            Self::Retracted => write!(f, "retracted"),
            Self::Superseded => write!(f, "superseded"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// One lifecycle event of one assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    /// Record the change belongs to.
    pub assertion_id: AssertionId,
    /// Claim of that record.
    pub claim: String,
    /// What happened.
    pub kind: ChangeKind,
    /// When the change happened.
    pub at: DateTime<Utc>,
}

impl Change {
    fn of(assertion: &TemporalAssertion, kind: ChangeKind, at: DateTime<Utc>) -> Self {
        Self {
            assertion_id: assertion.id,
            claim: assertion.claim.clone(),
            kind,
            at,
        }
    }
}

/// Answers "what was / is / will be true" over a borrowed store.
#[derive(Debug, Clone, Copy)]
pub struct TemporalReasoner<'a> {
    store: &'a TemporalStore,
}

impl<'a> TemporalReasoner<'a> {
    /// Wraps a store for read-only queries.
    #[must_use]
    pub const fn new(store: &'a TemporalStore) -> Self {
        Self { store }
    }

    /// Assertions active at a past instant.
    pub fn what_was_true(
        &self,
        namespace: &str,
        at: DateTime<Utc>,
    ) -> LedgerResult<Vec<TemporalAssertion>> {
        self.store.get_active_at(at, Some(namespace))
    }

    /// Assertions active now.
    pub fn what_is_true(&self, namespace: &str) -> LedgerResult<Vec<TemporalAssertion>> {
        self.store.get_current_truth(Some(namespace))
    }

    /// Assertions active at a future instant, as currently recorded.
    pub fn what_will_be_true(
        &self,
        namespace: &str,
        at: DateTime<Utc>,
    ) -> LedgerResult<Vec<TemporalAssertion>> {
        self.store.get_active_at(at, Some(namespace))
    }

    /// Lifecycle events in `namespace` after `since`, oldest first.
    ///
    /// Supersession time is the successor's `asserted_at`. Expiry is only
    /// reported for records that were never retracted or superseded, and
    /// only once `valid_until` has passed.
    pub fn has_changed(&self, namespace: &str, since: DateTime<Utc>) -> LedgerResult<Vec<Change>> {
        let records = self.store.all(Some(namespace))?;
        let by_id: HashMap<AssertionId, &TemporalAssertion> =
            records.iter().map(|a| (a.id, a)).collect();
        let now = Utc::now();
        let mut changes = Vec::new();

        for record in &records {
            let window = &record.window;
            if window.asserted_at > since {
                changes.push(Change::of(record, ChangeKind::Asserted, window.asserted_at));
            }
            if let Some(retracted_at) = window.retracted_at.filter(|at| *at > since) {
                changes.push(Change::of(record, ChangeKind::Retracted, retracted_at));
            }
            // Successors share the predecessor's namespace.
            if let Some(successor) = record.superseded_by.and_then(|id| by_id.get(&id)) {
                if successor.window.asserted_at > since {
                    changes.push(Change::of(
                        record,
                        ChangeKind::Superseded,
                        successor.window.asserted_at,
                    ));
                }
            }
            if window.retracted_at.is_none() && record.superseded_by.is_none() {
                if let Some(until) = window.valid_until.filter(|u| *u > since && *u <= now) {
                    changes.push(Change::of(record, ChangeKind::Expired, until));
                }
            }
        }

        changes.sort_by(|a, b| a.at.cmp(&b.at));
        Ok(changes)
    }

    /// Conflicting active assertions at `at` (default now); see
    /// [`TemporalStore::reconcile`].
    pub fn conflicts_at(
        &self,
        namespace: &str,
        at: Option<DateTime<Utc>>,
    ) -> LedgerResult<Vec<TemporalAssertion>> {
        self.store.reconcile(namespace, at)
    }

    /// True if the assertion, as currently recorded, will be active at `future`.
    /// Unknown ids project to false.
    pub fn project_forward(&self, id: AssertionId, future: DateTime<Utc>) -> LedgerResult<bool> {
        Ok(self
            .store
            .get(id)?
            .is_some_and(|a| a.status_at(future) == TemporalStatus::Active))
    }
}
