//! Sizing configuration for the graph registry.

use serde::{Deserialize, Serialize};

/// Capacity hints for [`AnimGraph`](crate::graph::AnimGraph).
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial slot capacity of the node arena.
    pub node_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { node_capacity: 64 }
    }
}
