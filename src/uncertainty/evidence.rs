//! Evidence pointers backing a belief.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::clamp_unit;

/// Provenance kind of a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceSourceType {
    /// Output of a tool run.
    ToolOutput,
    /// Read back from stored memory.
    MemoryRead,
    /// Stated by another agent.
    AgentAssertion,
    /// A human decision. Weight-1.0 pointers of this kind back manual resolutions.
    HumanInput,
    /// Derived by reasoning.
    Inference,
    /// Any other outside source.
    External,
}

impl fmt::Display for EvidenceSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolOutput => write!(f, "tool-output"),
            Self::MemoryRead => write!(f, "memory-read"),
            Self::AgentAssertion => write!(f, "agent-assertion"),
            Self::HumanInput => write!(f, "human-input"),
            Self::Inference => write!(f, "inference"),
            Self::External => write!(f, "external"),
        }
    }
}

/// A weighted, signed reference to a provenance source.
///
/// Pointers are immutable once attached to a belief; beliefs only ever
/// append to their evidence lists.
///
/// # Examples
///
/// ```
/// use epistemic_ledger::{EvidencePointer, EvidenceSourceType};
///
/// let e = EvidencePointer::supporting("run-42", EvidenceSourceType::ToolOutput, 0.9);
/// assert!(e.supports);
/// assert_eq!(e.weight, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePointer {
    /// Identifier of the source within its kind.
    pub source_id: String,
    /// Kind of source.
    pub source_type: EvidenceSourceType,
    /// True for supporting, false for opposing evidence.
    pub supports: bool,
    /// Weight in [0, 1].
    pub weight: f64,
    /// When the evidence was observed.
    pub timestamp: DateTime<Utc>,
}

impl EvidencePointer {
    /// Creates a pointer stamped now. `weight` is clamped to [0, 1].
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        source_type: EvidenceSourceType,
        supports: bool,
        weight: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_type,
            supports,
            weight: clamp_unit(weight),
            timestamp: Utc::now(),
        }
    }

    /// Supporting pointer stamped now.
    #[must_use]
    pub fn supporting(
        source_id: impl Into<String>,
        source_type: EvidenceSourceType,
        weight: f64,
    ) -> Self {
        Self::new(source_id, source_type, true, weight)
    }

    /// Opposing pointer stamped now.
    #[must_use]
    pub fn opposing(
        source_id: impl Into<String>,
        source_type: EvidenceSourceType,
        weight: f64,
    ) -> Self {
        Self::new(source_id, source_type, false, weight)
    }

    /// Overrides the timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True for the full-weight human pointer that records a manual resolution.
    #[must_use]
    pub fn is_resolution(&self) -> bool {
        self.source_type == EvidenceSourceType::HumanInput && self.weight >= 1.0
    }
}
