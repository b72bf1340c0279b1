//! # Epistemic Ledger - temporal and uncertainty bookkeeping for agents
//!
//! Two independent in-memory record stores that let a reasoning system
//! track *when* a claim holds and *how sure* it is about it.
//!
//! ## Core Concepts
//!
//! - **TemporalAssertion**: a claim with a bitemporal validity window
//!   (valid time vs. record time), supersession links and a derived status
//! - **TemporalReasoner**: "what was / is / will be true" queries over a store
//! - **Belief**: a claim whose confidence interval is computed from weighted,
//!   possibly conflicting evidence, with inference links and time decay
//! - **UncertaintyAggregator**: combined confidence over several beliefs
//!
//! ## Usage
//!
//! ```rust
//! use epistemic_ledger::{
//!     AssertOptions, EvidencePointer, EvidenceSourceType, TemporalReasoner, TemporalStore,
//!     TimeRange, UncertaintyLedger,
//! };
//!
//! let store = TemporalStore::new();
//! store
//!     .assert("v2 API stable", "api", TimeRange::from_now(), AssertOptions::new())
//!     .unwrap();
//! let reasoner = TemporalReasoner::new(&store);
//! assert_eq!(reasoner.what_is_true("api").unwrap().len(), 1);
//!
//! let ledger = UncertaintyLedger::new();
//! let belief = ledger
//!     .assert(
//!         "v2 API stable",
//!         "api",
//!         vec![EvidencePointer::supporting("contract-tests", EvidenceSourceType::ToolOutput, 0.9)],
//!         None,
//!     )
//!     .unwrap();
//! assert!(ledger.is_actionable(belief.id).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod confidence;
pub mod error;
pub mod snapshot;
pub mod temporal;
pub mod time;
pub mod uncertainty;

// Re-export primary types at crate root for convenience
pub use config::{TemporalConfig, UncertaintyConfig};
pub use confidence::ConfidenceInterval;
pub use error::{LedgerError, LedgerResult, ValidationError};
pub use snapshot::{BeliefSnapshot, TemporalSnapshot, SERIALIZATION_VERSION};
pub use temporal::{
    compute_status, AssertOptions, AssertionId, AssertionQuery, Change, ChangeKind,
    TemporalAssertion, TemporalReasoner, TemporalStatus, TemporalStore, Timeline,
};
pub use time::{TimeRange, ValidityWindow};
pub use uncertainty::{
    Belief, BeliefFilter, BeliefId, BeliefStatus, ChainLink, EvidencePointer,
    EvidenceSourceType, Resolution, UncertaintyAggregator, UncertaintyLedger,
};
