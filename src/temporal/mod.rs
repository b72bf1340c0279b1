//! Bitemporal assertions.
//!
//! This module groups the assertion record, its store and the read-only
//! reasoner layered over the store.

pub mod assertion;
pub mod reasoner;
pub mod store;

pub use assertion::{
    compute_status, AssertOptions, AssertionId, TemporalAssertion, TemporalStatus, Timeline,
};
pub use reasoner::{Change, ChangeKind, TemporalReasoner};
pub use store::{AssertionQuery, TemporalStore, RETRACTION_REASON_KEY};
