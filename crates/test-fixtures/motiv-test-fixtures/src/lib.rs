//! Scripted [`PropertyHost`] used by tests across the workspace.
//!
//! `MockHost` keeps a registry of live targets, per-kind default tables, and
//! a journal of accepted writes, so tests can assert exactly which properties
//! reached which target and in what order. Destroying a target mid-test
//! exercises the host-lifecycle races the engine must swallow.

use hashbrown::{HashMap, HashSet};
use motiv_api_core::{
    PropWrite, PropertyHost, TargetHandle, TargetKind, WriteBatch, WriteStatus, WriterCap,
};

#[derive(Default)]
pub struct MockHost {
    next_cap: u64,
    live: HashMap<TargetHandle, TargetKind>,
    caps: HashMap<WriterCap, TargetHandle>,
    defaults: HashMap<(TargetKind, String), f32>,
    unsupported: HashSet<(TargetKind, String)>,
    journal: WriteBatch,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live target the host can resolve.
    pub fn register_target(&mut self, handle: TargetHandle, kind: TargetKind) {
        self.live.insert(handle, kind);
    }

    /// Drop a target, as if the host recycled or destroyed it. Outstanding
    /// writer capabilities for it start reporting `Unsupported`.
    pub fn destroy_target(&mut self, handle: TargetHandle) {
        self.live.remove(&handle);
    }

    /// Declare the default value for `property` on targets of `kind`.
    pub fn set_default(&mut self, kind: &TargetKind, property: &str, value: f32) {
        self.defaults
            .insert((kind.clone(), property.to_string()), value);
    }

    /// Mark a property as unanimatable for a target kind.
    pub fn mark_unsupported(&mut self, kind: &TargetKind, property: &str) {
        self.unsupported
            .insert((kind.clone(), property.to_string()));
    }

    /// Every accepted write so far, oldest first.
    pub fn writes(&self) -> &[PropWrite] {
        &self.journal.0
    }

    /// Accepted writes against one target, oldest first.
    pub fn writes_to(&self, handle: TargetHandle) -> Vec<&PropWrite> {
        self.journal.iter().filter(|w| w.target == handle).collect()
    }

    /// Drain the journal, leaving it empty.
    pub fn take_writes(&mut self) -> WriteBatch {
        std::mem::take(&mut self.journal)
    }
}

impl PropertyHost for MockHost {
    fn resolve(&mut self, handle: TargetHandle, kind: &TargetKind) -> Option<WriterCap> {
        match self.live.get(&handle) {
            Some(live_kind) if live_kind == kind => {
                self.next_cap += 1;
                let cap = WriterCap(self.next_cap);
                self.caps.insert(cap, handle);
                Some(cap)
            }
            _ => None,
        }
    }

    fn write_property(&mut self, cap: WriterCap, property: &str, value: f32) -> WriteStatus {
        let Some(&handle) = self.caps.get(&cap) else {
            return WriteStatus::Unsupported;
        };
        let Some(kind) = self.live.get(&handle) else {
            // The target vanished after the capability was issued.
            return WriteStatus::Unsupported;
        };
        if self
            .unsupported
            .contains(&(kind.clone(), property.to_string()))
        {
            return WriteStatus::Unsupported;
        }
        self.journal.push(PropWrite::new(handle, property, value));
        WriteStatus::Written
    }

    fn default_value(&self, kind: &TargetKind, property: &str) -> Option<f32> {
        self.defaults
            .get(&(kind.clone(), property.to_string()))
            .copied()
    }
}
