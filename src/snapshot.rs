//! Versioned snapshots for both ledgers.
//!
//! Callers own the storage medium; the ledgers only produce and consume
//! these envelopes (or their JSON text). Import validates the version
//! before any existing record is touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};
use crate::temporal::TemporalAssertion;
use crate::uncertainty::Belief;

/// Snapshot format version understood by this crate.
pub const SERIALIZATION_VERSION: u32 = 1;

/// Full export of a [`TemporalStore`](crate::TemporalStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalSnapshot {
    /// Format version; see [`SERIALIZATION_VERSION`].
    pub version: u32,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Every record, oldest first.
    pub assertions: Vec<TemporalAssertion>,
}

impl TemporalSnapshot {
    pub(crate) fn new(assertions: Vec<TemporalAssertion>) -> Self {
        Self {
            version: SERIALIZATION_VERSION,
            created_at: Utc::now(),
            assertions,
        }
    }
}

/// Full export of an [`UncertaintyLedger`](crate::UncertaintyLedger).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeliefSnapshot {
    /// Format version; see [`SERIALIZATION_VERSION`].
    pub version: u32,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Every belief, oldest first.
    pub beliefs: Vec<Belief>,
}

impl BeliefSnapshot {
    pub(crate) fn new(beliefs: Vec<Belief>) -> Self {
        Self {
            version: SERIALIZATION_VERSION,
            created_at: Utc::now(),
            beliefs,
        }
    }
}

/// Fails with `VersionMismatch` unless `found` is the supported version.
pub(crate) fn check_version(found: u64) -> LedgerResult<()> {
    if found == u64::from(SERIALIZATION_VERSION) {
        return Ok(());
    }
    warn!(
        expected = SERIALIZATION_VERSION,
        found, "rejecting snapshot with incompatible version"
    );
    Err(LedgerError::VersionMismatch {
        expected: SERIALIZATION_VERSION,
        found,
    })
}

/// Parses snapshot JSON, checking the version before decoding any record.
pub(crate) fn decode_json<T>(json: &str) -> LedgerResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let raw: serde_json::Value = serde_json::from_str(json)?;
    let found = raw
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| LedgerError::Serialization {
            message: "snapshot has no numeric 'version' field".to_string(),
        })?;
    check_version(found)?;
    Ok(serde_json::from_value(raw)?)
}
