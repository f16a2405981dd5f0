//! Connect/disconnect lifecycle between props binding nodes and host targets.
//!
//! A binding never owns its target: the host creates, recycles, and destroys
//! targets on its own schedule. Connect caches a writer capability once;
//! disconnect restores the host's default value for every property the
//! binding wrote, so a recycled target does not inherit stale animated state
//! from its previous logical owner. The same node may connect, disconnect,
//! and reconnect to different targets repeatedly across its lifetime.

use hashbrown::{HashMap, HashSet};
use motiv_api_core::{PropertyHost, TargetHandle, TargetKind};

use crate::graph::{AnimGraph, Connection, GraphError, NodeKind, PropsState};
use crate::types::NodeId;

impl AnimGraph {
    /// Attach `node` to a live target.
    ///
    /// Errors with [`GraphError::AlreadyConnected`] when a different target
    /// is attached without an intervening disconnect; reconnecting the
    /// currently attached handle is a no-op. A handle the host cannot
    /// resolve still connects: its writes are skipped until disconnect
    /// (logged, never an error).
    pub fn connect_to_target(
        &mut self,
        node: NodeId,
        handle: TargetHandle,
        kind: TargetKind,
        host: &mut dyn PropertyHost,
    ) -> Result<(), GraphError> {
        if let Some(conn) = &self.props_state(node)?.connection {
            if conn.handle == handle {
                return Ok(());
            }
            return Err(GraphError::AlreadyConnected {
                node,
                current: conn.handle,
            });
        }

        let cap = host.resolve(handle, &kind);
        if cap.is_none() {
            log::warn!("could not resolve {handle} ({kind}); writes will be skipped");
        }
        self.props_state_mut(node)?.connection = Some(Connection {
            handle,
            kind,
            cap,
            written: HashSet::new(),
            last: HashMap::new(),
        });
        // Dirty so the next tick pushes current values to the new target.
        self.mark_dirty(node);
        Ok(())
    }

    /// Detach `node` from `handle`.
    ///
    /// A handle the node is not connected to is silently ignored: disconnect
    /// may race with host-side destruction. On success, every property
    /// written during this connection is restored to the host's default for
    /// the target kind; properties without a declared default are left
    /// untouched.
    pub fn disconnect_from_target(
        &mut self,
        node: NodeId,
        handle: TargetHandle,
        host: &mut dyn PropertyHost,
    ) -> Result<(), GraphError> {
        let state = self.props_state_mut(node)?;
        let connected_here = state
            .connection
            .as_ref()
            .map(|conn| conn.handle == handle)
            .unwrap_or(false);
        if !connected_here {
            return Ok(());
        }
        let Some(conn) = state.connection.take() else { return Ok(()) };
        let Some(cap) = conn.cap else { return Ok(()) };

        for property in &conn.written {
            match host.default_value(&conn.kind, property) {
                Some(value) => {
                    // Best-effort: a target destroyed mid-race reports
                    // Unsupported and the restore is dropped with it.
                    host.write_property(cap, property, value);
                }
                None => {
                    log::debug!("no default for {property:?} on kind {}; leaving as written", conn.kind);
                }
            }
        }
        Ok(())
    }

    /// Re-apply host defaults for every bound property without severing the
    /// connection. Used when an animation resets but the binding stays live.
    ///
    /// The last-written cache is cleared, so the next tick re-applies current
    /// values deterministically.
    pub fn restore_default_values(
        &mut self,
        node: NodeId,
        host: &mut dyn PropertyHost,
    ) -> Result<(), GraphError> {
        let style = self.props_style(node)?;
        let state = self.props_state_mut(node)?;
        let Some(conn) = state.connection.as_mut() else { return Ok(()) };
        let Some(cap) = conn.cap else { return Ok(()) };

        for property in style.keys() {
            match host.default_value(&conn.kind, property) {
                Some(value) => {
                    host.write_property(cap, property, value);
                }
                None => {
                    log::debug!("no default for {property:?} on kind {}; skipping restore", conn.kind);
                }
            }
        }
        conn.last.clear();
        conn.written.clear();
        self.mark_dirty(node);
        Ok(())
    }

    /// The handle `node` is currently connected to, if any.
    pub fn connected_target(&self, node: NodeId) -> Result<Option<TargetHandle>, GraphError> {
        Ok(self.props_state(node)?.connection.as_ref().map(|conn| conn.handle))
    }

    fn props_state(&self, node: NodeId) -> Result<&PropsState, GraphError> {
        match &self.node(node)?.kind {
            NodeKind::Props(state) => Ok(state),
            _ => Err(GraphError::NotAPropsNode(node)),
        }
    }

    fn props_state_mut(&mut self, node: NodeId) -> Result<&mut PropsState, GraphError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Props(state) => Ok(state),
            _ => Err(GraphError::NotAPropsNode(node)),
        }
    }
}
