//! Records of property writes issued by the graph.
//!
//! PropWrite serializes to JSON as:
//!   { "target": 12, "property": "opacity", "value": 0.5 }
//!
//! WriteBatch is a simple Vec<PropWrite> with helpers. Hosts that journal or
//! replay writes can emit one batch per tick.

use crate::handle::TargetHandle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One property write against one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropWrite {
    pub target: TargetHandle,
    pub property: String,
    pub value: f32,
}

impl PropWrite {
    pub fn new(target: TargetHandle, property: impl Into<String>, value: f32) -> Self {
        Self {
            target,
            property: property.into(),
            value,
        }
    }
}

impl fmt::Display for PropWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ target: {}, property: {}, value: {} }}",
            self.target, self.property, self.value
        )
    }
}

/// A batch of property writes, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch(pub Vec<PropWrite>);

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch(Vec::new())
    }

    pub fn push(&mut self, op: PropWrite) {
        self.0.push(op);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = PropWrite>) {
        self.0.extend(other);
    }

    pub fn into_vec(self) -> Vec<PropWrite> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropWrite> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge another batch in-place (append).
    pub fn append(&mut self, mut other: WriteBatch) {
        self.0.append(&mut other.0)
    }
}
