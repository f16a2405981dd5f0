//! Motiv graph core (host-agnostic)
//!
//! A directed acyclic graph of animation nodes: value nodes compute scalars
//! (literals, interpolation, arithmetic, tracking), style nodes aggregate
//! them under property names, and props binding nodes push the aggregate into
//! host-owned targets once per tick. Targets live behind the
//! [`PropertyHost`] seam; the graph never owns them.
//!
//! - [`graph`] holds the node arena and edge bookkeeping (acyclicity is
//!   enforced when edges are added, never during a tick).
//! - [`interp`] fixes the numeric policy used by value nodes.
//! - Binding lifecycle (`connect_to_target` et al.) and the per-tick driver
//!   (`tick`) are methods on [`AnimGraph`].

pub mod config;
pub mod graph;
pub mod interp;
pub mod types;

mod binding;
mod eval;

pub use config::Config;
pub use graph::{
    AnimGraph, Connection, GraphError, Node, NodeKind, PropsState, StyleState, ValueSource,
    ValueState,
};
pub use types::{Extrapolate, NodeId, Operator};

// Re-exports for hosts and tests.
pub use motiv_api_core::{
    PropWrite, PropertyHost, TargetHandle, TargetKind, WriteBatch, WriteStatus, WriterCap,
};
