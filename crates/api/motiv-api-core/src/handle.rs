//! Opaque handles linking the graph to host-owned targets.
//!
//! A [`TargetHandle`] is a lookup key into the host's own registry. The host
//! creates, recycles, and destroys targets on its own schedule and may retire
//! a handle without notifying the graph; the graph only ever resolves and
//! writes through it, never holds the target alive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-assigned identifier for a live target (a view-like object).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(pub u64);

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Descriptor for the kind of target a handle refers to.
///
/// Hosts key their writer tables and default-value tables by kind, so the
/// same property name can default differently across target kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKind(pub String);

impl TargetKind {
    pub fn new(name: impl Into<String>) -> Self {
        TargetKind(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
