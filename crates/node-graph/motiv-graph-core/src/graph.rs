//! Node registry and graph bookkeeping.
//!
//! All nodes live in one arena owned by [`AnimGraph`]; there is no ambient
//! registry. Edges point from a node to its dependents (`children`), with the
//! inverse (`parents`) maintained alongside for in-degree counts and cycle
//! checks. Acyclicity is enforced when an edge is added, never during a tick,
//! so evaluation can assume a DAG.
//!
//! Edge mutation cannot interleave with an evaluation pass:
//! [`AnimGraph::tick`] borrows the graph mutably for the whole pass, which is
//! the single critical section the concurrency contract asks for.

use hashbrown::{HashMap, HashSet};
use motiv_api_core::{TargetHandle, TargetKind, WriterCap};
use thiserror::Error;

use crate::config::Config;
use crate::types::{Extrapolate, NodeId, Operator};

/// Errors surfaced by graph and binding operations. All recoverable; a failed
/// call leaves the graph unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown {0}")]
    UnknownNode(NodeId),
    #[error("edge {parent} -> {child} would close a cycle")]
    CycleRejected { parent: NodeId, child: NodeId },
    #[error("{0} is still referenced by graph edges")]
    NodeInUse(NodeId),
    #[error("{node} is already connected to {current}")]
    AlreadyConnected { node: NodeId, current: TargetHandle },
    #[error("{0} is a sink and cannot be depended on")]
    SinkNode(NodeId),
    #[error("{0} is not a value node")]
    NotAValueNode(NodeId),
    #[error("{0} is not a style node")]
    NotAStyleNode(NodeId),
    #[error("{0} is not a props binding node")]
    NotAPropsNode(NodeId),
}

/// How a value node computes its output each tick.
#[derive(Clone, Debug)]
pub enum ValueSource {
    /// Raw literal driven externally via [`AnimGraph::set_value`].
    Constant,
    /// Piecewise-linear mapping of another node's output through a
    /// breakpoint table.
    Interpolate {
        input: NodeId,
        input_range: Vec<f32>,
        output_range: Vec<f32>,
        extrapolate: Extrapolate,
    },
    /// Arithmetic fold across operand outputs, left to right.
    Operator { op: Operator, operands: Vec<NodeId> },
    /// Exponential decay toward another node's output; `rate` is the
    /// fraction of the remaining distance covered per tick.
    Track { input: NodeId, rate: f32 },
}

impl ValueSource {
    /// Node ids this source reads from, in operand order.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            ValueSource::Constant => Vec::new(),
            ValueSource::Interpolate { input, .. } | ValueSource::Track { input, .. } => {
                vec![*input]
            }
            ValueSource::Operator { operands, .. } => operands.clone(),
        }
    }
}

/// State of a value node: its source and last-computed output.
#[derive(Clone, Debug)]
pub struct ValueState {
    pub source: ValueSource,
    pub current: f32,
}

/// State of a style node: named child bindings, aggregated on demand.
#[derive(Clone, Debug, Default)]
pub struct StyleState {
    pub props: HashMap<String, NodeId>,
}

/// Live association between a props binding node and one host target.
#[derive(Clone, Debug)]
pub struct Connection {
    pub handle: TargetHandle,
    pub kind: TargetKind,
    /// Writer capability cached at connect time; `None` when the host could
    /// not resolve the target, in which case writes are skipped.
    pub cap: Option<WriterCap>,
    /// Properties written to this target during the current connection.
    /// Disconnect restores exactly these.
    pub written: HashSet<String>,
    /// Last value pushed per property; suppresses redundant writes.
    pub last: HashMap<String, f32>,
}

/// State of a props binding node: property bindings plus at most one
/// connected target.
#[derive(Clone, Debug, Default)]
pub struct PropsState {
    pub props: HashMap<String, NodeId>,
    pub connection: Option<Connection>,
}

/// Closed set of node kinds in the value graph.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Value(ValueState),
    Style(StyleState),
    Props(PropsState),
}

/// One node: identity, kind-specific state, and graph edges.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Nodes that depend on this one.
    pub(crate) children: HashSet<NodeId>,
    /// Inverse of `children`.
    pub(crate) parents: HashSet<NodeId>,
    pub(crate) needs_update: bool,
}

/// Arena of animation nodes plus the edge bookkeeping between them.
#[derive(Debug, Default)]
pub struct AnimGraph {
    slots: Vec<Option<Node>>,
    index: HashMap<NodeId, usize>,
    free: Vec<usize>,
    next_id: u64,
}

impl AnimGraph {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        AnimGraph {
            slots: Vec::with_capacity(config.node_capacity),
            index: HashMap::with_capacity(config.node_capacity),
            free: Vec::new(),
            next_id: 0,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.index
            .get(&id)
            .and_then(|&slot| self.slots[slot].as_ref())
            .ok_or(GraphError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        match self.index.get(&id) {
            Some(&slot) => self.slots[slot].as_mut().ok_or(GraphError::UnknownNode(id)),
            None => Err(GraphError::UnknownNode(id)),
        }
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().flatten().map(|node| node.id)
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        let node = Node {
            id,
            kind,
            children: HashSet::new(),
            parents: HashSet::new(),
            needs_update: true,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        id
    }

    /// Register a value node.
    ///
    /// Edges from every input the source references are wired in the same
    /// call; a freshly created node has no dependents yet, so the wiring
    /// cannot close a cycle. Inputs are validated before anything mutates.
    pub fn create_value(&mut self, source: ValueSource) -> Result<NodeId, GraphError> {
        let inputs = source.inputs();
        for input in &inputs {
            if matches!(&self.node(*input)?.kind, NodeKind::Props(_)) {
                return Err(GraphError::SinkNode(*input));
            }
        }
        let id = self.insert(NodeKind::Value(ValueState {
            source,
            current: 0.0,
        }));
        for input in inputs {
            self.link(input, id);
        }
        Ok(id)
    }

    /// Register an empty style node.
    pub fn create_style(&mut self) -> NodeId {
        self.insert(NodeKind::Style(StyleState::default()))
    }

    /// Register an unconnected props binding node.
    pub fn create_props(&mut self) -> NodeId {
        self.insert(NodeKind::Props(PropsState::default()))
    }

    /// Make `child` depend on `parent`.
    ///
    /// Rejected with [`GraphError::CycleRejected`] when the edge would close
    /// a cycle (including self-edges), leaving the graph unchanged. Adding an
    /// edge that already exists is a no-op. Props binding nodes are sinks and
    /// cannot be the parent side of an edge.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.node(child)?;
        if matches!(&self.node(parent)?.kind, NodeKind::Props(_)) {
            return Err(GraphError::SinkNode(parent));
        }
        if self.node(parent)?.children.contains(&child) {
            return Ok(());
        }
        if parent == child || self.reaches(child, parent) {
            return Err(GraphError::CycleRejected { parent, child });
        }
        self.link(parent, child);
        self.mark_dirty(child);
        Ok(())
    }

    /// Remove the dependency edge from `parent` to `child`, if present.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), GraphError> {
        self.node(parent)?;
        self.node(child)?;
        self.unlink(parent, child);
        Ok(())
    }

    /// Retire a node. Fails with [`GraphError::NodeInUse`] while any edge
    /// still references it; the id is never handed out again.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.node(id)?;
        if !node.children.is_empty() || !node.parents.is_empty() {
            return Err(GraphError::NodeInUse(id));
        }
        if let NodeKind::Props(state) = &node.kind {
            if state.connection.is_some() {
                log::debug!("{id} destroyed while still connected; dropping the binding");
            }
        }
        if let Some(slot) = self.index.remove(&id) {
            self.slots[slot] = None;
            self.free.push(slot);
        }
        Ok(())
    }

    /// Drive a value node from the outside (raw animation input).
    ///
    /// Derived sources recompute over the stored value on the next tick, so
    /// this is only meaningful for [`ValueSource::Constant`] nodes (and for
    /// seeding a [`ValueSource::Track`] node's starting point).
    pub fn set_value(&mut self, id: NodeId, value: f32) -> Result<(), GraphError> {
        let node = self.node_mut(id)?;
        match &mut node.kind {
            NodeKind::Value(state) => {
                state.current = value;
                node.needs_update = true;
                Ok(())
            }
            _ => Err(GraphError::NotAValueNode(id)),
        }
    }

    /// Last-computed output of a value node; style and props nodes report 0.0.
    pub fn value_of(&self, id: NodeId) -> Result<f32, GraphError> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Value(state) => state.current,
            _ => 0.0,
        })
    }

    pub(crate) fn value_or_zero(&self, id: NodeId) -> f32 {
        self.value_of(id).unwrap_or(0.0)
    }

    /// Bind `name` on a style node to `source`'s output.
    ///
    /// The map entry and the graph edge mutate atomically: a rejected edge
    /// leaves the binding map untouched, and unbinding removes the edge when
    /// no other name still references the source.
    pub fn bind_style_property(
        &mut self,
        style: NodeId,
        name: impl Into<String>,
        source: NodeId,
    ) -> Result<(), GraphError> {
        let name = name.into();
        self.node(source)?;
        if !matches!(&self.node(style)?.kind, NodeKind::Style(_)) {
            return Err(GraphError::NotAStyleNode(style));
        }
        // Edge first: cycle rejection must leave the map untouched.
        self.add_child(source, style)?;
        let stale = match &mut self.node_mut(style)?.kind {
            NodeKind::Style(state) => state.props.insert(name, source),
            _ => None,
        };
        if let Some(stale) = stale {
            self.drop_stale_edge(style, stale, Some(source));
        }
        self.mark_dirty(style);
        Ok(())
    }

    /// Remove a named binding from a style node; no-op for unknown names.
    pub fn unbind_style_property(&mut self, style: NodeId, name: &str) -> Result<(), GraphError> {
        let removed = match &mut self.node_mut(style)?.kind {
            NodeKind::Style(state) => state.props.remove(name),
            _ => return Err(GraphError::NotAStyleNode(style)),
        };
        if let Some(source) = removed {
            self.drop_stale_edge(style, source, None);
            self.mark_dirty(style);
        }
        Ok(())
    }

    /// Bind `name` on a props binding node to `source`'s output.
    ///
    /// A bound value node contributes under `name`; a bound style node merges
    /// its whole style map during evaluation. Same atomicity contract as
    /// [`bind_style_property`](Self::bind_style_property).
    pub fn bind_property(
        &mut self,
        props: NodeId,
        name: impl Into<String>,
        source: NodeId,
    ) -> Result<(), GraphError> {
        let name = name.into();
        self.node(source)?;
        if !matches!(&self.node(props)?.kind, NodeKind::Props(_)) {
            return Err(GraphError::NotAPropsNode(props));
        }
        self.add_child(source, props)?;
        let stale = match &mut self.node_mut(props)?.kind {
            NodeKind::Props(state) => state.props.insert(name, source),
            _ => None,
        };
        if let Some(stale) = stale {
            self.drop_stale_edge(props, stale, Some(source));
        }
        self.mark_dirty(props);
        Ok(())
    }

    /// Remove a named binding from a props binding node; no-op for unknown
    /// names.
    pub fn unbind_property(&mut self, props: NodeId, name: &str) -> Result<(), GraphError> {
        let removed = match &mut self.node_mut(props)?.kind {
            NodeKind::Props(state) => state.props.remove(name),
            _ => return Err(GraphError::NotAPropsNode(props)),
        };
        if let Some(source) = removed {
            self.drop_stale_edge(props, source, None);
            self.mark_dirty(props);
        }
        Ok(())
    }

    /// Aggregate a style node's bound child outputs, on demand.
    pub fn style_of(&self, id: NodeId) -> Result<HashMap<String, f32>, GraphError> {
        match &self.node(id)?.kind {
            NodeKind::Style(state) => {
                let mut style = HashMap::with_capacity(state.props.len());
                for (name, &source) in &state.props {
                    style.insert(name.clone(), self.value_or_zero(source));
                }
                Ok(style)
            }
            _ => Err(GraphError::NotAStyleNode(id)),
        }
    }

    /// The property map a props binding node would apply: bound value nodes
    /// contribute under their bound name, bound style nodes merge their whole
    /// style map.
    pub fn props_style(&self, id: NodeId) -> Result<HashMap<String, f32>, GraphError> {
        let state = match &self.node(id)?.kind {
            NodeKind::Props(state) => state,
            _ => return Err(GraphError::NotAPropsNode(id)),
        };
        let mut style = HashMap::with_capacity(state.props.len());
        for (name, &source) in &state.props {
            match &self.node(source)?.kind {
                NodeKind::Style(_) => {
                    for (prop, value) in self.style_of(source)? {
                        style.insert(prop, value);
                    }
                }
                _ => {
                    style.insert(name.clone(), self.value_or_zero(source));
                }
            }
        }
        Ok(style)
    }

    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        if let Ok(node) = self.node_mut(id) {
            node.needs_update = true;
        }
    }

    /// True if `to` is reachable from `from` along child edges.
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen: HashSet<NodeId> = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Ok(node) = self.node(id) {
                stack.extend(node.children.iter().copied());
            }
        }
        false
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Ok(node) = self.node_mut(parent) {
            node.children.insert(child);
        }
        if let Ok(node) = self.node_mut(child) {
            node.parents.insert(parent);
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Ok(node) = self.node_mut(parent) {
            node.children.remove(&child);
        }
        if let Ok(node) = self.node_mut(child) {
            node.parents.remove(&parent);
        }
    }

    /// After a rebind replaced `stale` with `kept` under some name (or an
    /// unbind dropped it, `kept` = None), remove the stale source's edge
    /// unless another name on `owner` still uses it.
    fn drop_stale_edge(&mut self, owner: NodeId, stale: NodeId, kept: Option<NodeId>) {
        if kept == Some(stale) {
            return;
        }
        let still_bound = match self.node(owner).map(|node| &node.kind) {
            Ok(NodeKind::Style(state)) => state.props.values().any(|&n| n == stale),
            Ok(NodeKind::Props(state)) => state.props.values().any(|&n| n == stale),
            _ => false,
        };
        if !still_bound {
            self.unlink(stale, owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(graph: &mut AnimGraph) -> NodeId {
        graph.create_value(ValueSource::Constant).expect("no inputs to validate")
    }

    fn has_edge(graph: &AnimGraph, parent: NodeId, child: NodeId) -> bool {
        graph
            .node(parent)
            .map(|node| node.children.contains(&child))
            .unwrap_or(false)
    }

    // --- Identity ------------------------------------------------------

    #[test]
    fn it_should_never_reuse_ids() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        let b = constant(&mut graph);
        graph.destroy(a).unwrap();
        let c = constant(&mut graph);
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(!graph.contains(a));
        assert!(graph.contains(c));
    }

    // --- Edges ---------------------------------------------------------

    #[test]
    fn it_should_reject_cycle_closing_edges() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        let b = constant(&mut graph);
        let c = constant(&mut graph);
        graph.add_child(a, b).unwrap();
        graph.add_child(b, c).unwrap();

        let err = graph.add_child(c, a).unwrap_err();
        assert_eq!(err, GraphError::CycleRejected { parent: c, child: a });
        assert!(!has_edge(&graph, c, a));
        assert!(graph.node(a).unwrap().parents.is_empty());
    }

    #[test]
    fn it_should_reject_self_edges() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        assert!(matches!(
            graph.add_child(a, a),
            Err(GraphError::CycleRejected { .. })
        ));
    }

    #[test]
    fn it_should_treat_duplicate_edges_as_noops() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        let b = constant(&mut graph);
        graph.add_child(a, b).unwrap();
        graph.add_child(a, b).unwrap();
        assert_eq!(graph.node(b).unwrap().parents.len(), 1);
    }

    #[test]
    fn it_should_surface_unknown_nodes() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        graph.destroy(a).unwrap();
        let b = constant(&mut graph);
        assert_eq!(graph.add_child(a, b), Err(GraphError::UnknownNode(a)));
        assert_eq!(graph.value_of(a), Err(GraphError::UnknownNode(a)));
    }

    #[test]
    fn it_should_refuse_to_destroy_referenced_nodes() {
        let mut graph = AnimGraph::new();
        let a = constant(&mut graph);
        let b = constant(&mut graph);
        graph.add_child(a, b).unwrap();

        assert_eq!(graph.destroy(a), Err(GraphError::NodeInUse(a)));
        graph.remove_child(a, b).unwrap();
        graph.destroy(a).unwrap();
        assert!(!graph.contains(a));
    }

    // --- Style and props bindings -------------------------------------

    #[test]
    fn it_should_leave_bindings_untouched_when_edge_is_rejected() {
        let mut graph = AnimGraph::new();
        let style = graph.create_style();
        // The interpolation reads the style node, so binding the style to it
        // would close a cycle.
        let derived = graph
            .create_value(ValueSource::Interpolate {
                input: style,
                input_range: vec![0.0, 1.0],
                output_range: vec![0.0, 1.0],
                extrapolate: Extrapolate::Clamp,
            })
            .unwrap();

        let err = graph.bind_style_property(style, "opacity", derived).unwrap_err();
        assert!(matches!(err, GraphError::CycleRejected { .. }));
        assert!(graph.style_of(style).unwrap().is_empty());
        assert!(!has_edge(&graph, derived, style));
    }

    #[test]
    fn it_should_drop_stale_edges_on_rebind() {
        let mut graph = AnimGraph::new();
        let style = graph.create_style();
        let v1 = constant(&mut graph);
        let v2 = constant(&mut graph);

        graph.bind_style_property(style, "opacity", v1).unwrap();
        graph.bind_style_property(style, "opacity", v2).unwrap();
        assert!(!has_edge(&graph, v1, style));
        assert!(has_edge(&graph, v2, style));
    }

    #[test]
    fn it_should_keep_shared_edges_until_the_last_unbind() {
        let mut graph = AnimGraph::new();
        let style = graph.create_style();
        let v = constant(&mut graph);

        graph.bind_style_property(style, "scaleX", v).unwrap();
        graph.bind_style_property(style, "scaleY", v).unwrap();
        graph.unbind_style_property(style, "scaleX").unwrap();
        assert!(has_edge(&graph, v, style));
        graph.unbind_style_property(style, "scaleY").unwrap();
        assert!(!has_edge(&graph, v, style));
    }

    #[test]
    fn it_should_aggregate_style_values_on_demand() {
        let mut graph = AnimGraph::new();
        let style = graph.create_style();
        let v = constant(&mut graph);
        graph.set_value(v, 0.5).unwrap();
        graph.bind_style_property(style, "opacity", v).unwrap();

        let aggregated = graph.style_of(style).unwrap();
        assert_eq!(aggregated.get("opacity"), Some(&0.5));
    }

    #[test]
    fn it_should_merge_style_children_into_props_styles() {
        let mut graph = AnimGraph::new();
        let opacity = constant(&mut graph);
        graph.set_value(opacity, 0.25).unwrap();
        let shift = constant(&mut graph);
        graph.set_value(shift, 40.0).unwrap();

        let style = graph.create_style();
        graph.bind_style_property(style, "opacity", opacity).unwrap();
        let props = graph.create_props();
        graph.bind_property(props, "style", style).unwrap();
        graph.bind_property(props, "translateX", shift).unwrap();

        let aggregated = graph.props_style(props).unwrap();
        assert_eq!(aggregated.get("opacity"), Some(&0.25));
        assert_eq!(aggregated.get("translateX"), Some(&40.0));
        assert!(!aggregated.contains_key("style"));
    }

    #[test]
    fn it_should_reject_dependents_of_props_nodes() {
        let mut graph = AnimGraph::new();
        let props = graph.create_props();
        let v = constant(&mut graph);

        assert_eq!(graph.add_child(props, v), Err(GraphError::SinkNode(props)));
        assert!(graph.node(v).unwrap().parents.is_empty());
        assert_eq!(
            graph.create_value(ValueSource::Track {
                input: props,
                rate: 0.5,
            }),
            Err(GraphError::SinkNode(props))
        );
    }

    #[test]
    fn it_should_enforce_node_kinds() {
        let mut graph = AnimGraph::new();
        let style = graph.create_style();
        let props = graph.create_props();
        let v = constant(&mut graph);

        assert_eq!(graph.set_value(style, 1.0), Err(GraphError::NotAValueNode(style)));
        assert_eq!(
            graph.bind_style_property(props, "opacity", v),
            Err(GraphError::NotAStyleNode(props))
        );
        assert_eq!(
            graph.bind_property(style, "opacity", v),
            Err(GraphError::NotAPropsNode(style))
        );
    }
}
