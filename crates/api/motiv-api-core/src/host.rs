//! The interface a host UI manager exposes to the binding stage.

use crate::handle::{TargetHandle, TargetKind};

/// Capability to write properties of one resolved target.
///
/// Returned by [`PropertyHost::resolve`] and opaque outside the host that
/// issued it. Holding a capability does not keep the target alive; the host
/// answers `Unsupported` for writes against a target it has since destroyed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WriterCap(pub u64);

/// Outcome of a single property write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    /// The host applied the value.
    Written,
    /// The host does not drive this property on this target, or the target
    /// vanished. Non-fatal and scoped to the one write.
    Unsupported,
}

/// Operations the host exposes to the animation graph.
///
/// All calls are synchronous and best-effort. A vanished target resolves to
/// `None` and its writes are skipped, never faulted: host lifecycle races
/// must not become animation-graph errors.
pub trait PropertyHost {
    /// Resolve `handle` to a writer capability, or `None` if the host no
    /// longer knows the target (or knows it under a different kind).
    fn resolve(&mut self, handle: TargetHandle, kind: &TargetKind) -> Option<WriterCap>;

    /// Write one property on a previously resolved target.
    fn write_property(&mut self, cap: WriterCap, property: &str, value: f32) -> WriteStatus;

    /// Default value for `property` on targets of `kind`. `None` means
    /// "leave the property untouched", not a sentinel to be written.
    fn default_value(&self, kind: &TargetKind, property: &str) -> Option<f32>;
}
