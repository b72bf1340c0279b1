//! Evidence-weighted beliefs.
//!
//! This module groups the belief record, its evidence pointers, the ledger
//! that owns beliefs and the read-only aggregator over the ledger.

pub mod aggregator;
pub mod belief;
pub mod evidence;
pub mod ledger;

pub use aggregator::UncertaintyAggregator;
pub use belief::{Belief, BeliefId, BeliefStatus, Resolution};
pub use evidence::{EvidencePointer, EvidenceSourceType};
pub use ledger::{
    derive_status, BeliefFilter, ChainLink, UncertaintyLedger, PROBABLE_THRESHOLD,
    RESOLUTION_SOURCE_ID,
};
