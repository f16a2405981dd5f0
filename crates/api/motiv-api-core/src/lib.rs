//! motiv-api-core: shared host-facing types for the Motiv animation graph.
//!
//! The graph engine never owns the UI elements it animates. This crate
//! defines the seam between the two: opaque handles, the [`PropertyHost`]
//! operations a host UI manager must provide, and the write records the
//! engine produces.

pub mod handle;
pub mod host;
pub mod write_log;

pub use handle::{TargetHandle, TargetKind};
pub use host::{PropertyHost, WriteStatus, WriterCap};
pub use write_log::{PropWrite, WriteBatch};
