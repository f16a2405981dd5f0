//! Identifiers and shared configuration enums for the animation graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a node in the animation graph.
///
/// Assigned by [`AnimGraph`](crate::graph::AnimGraph) at creation, stable for
/// the node's lifetime, and never reused: retired ids stay retired even after
/// the node's arena slot is recycled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Behaviour of an interpolation table outside its input domain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolate {
    /// Pin to the edge breakpoint's output.
    #[default]
    Clamp,
    /// Continue the edge segment's slope.
    Extend,
}

/// Arithmetic operator folded across operand node outputs, left to right.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}
