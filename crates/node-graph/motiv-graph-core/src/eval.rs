//! Per-tick evaluation: dirty-root collection, topological ordering, and
//! kind dispatch.
//!
//! The driver walks only nodes reachable from "needs update" roots, evaluates
//! each exactly once in dependency order, and lets the props binding stage
//! push changed values to the connected target. Cycle detection is not
//! performed here; edges were validated when they were added.

use hashbrown::{HashMap, HashSet};
use motiv_api_core::{PropertyHost, WriteStatus};
use std::collections::VecDeque;

use crate::graph::{AnimGraph, NodeKind, ValueSource};
use crate::interp;
use crate::types::{NodeId, Operator};

enum Step {
    Store(f32),
    PushProps,
    Skip,
}

impl AnimGraph {
    /// Run one evaluation pass.
    ///
    /// Idempotent when nothing is dirty: a pass with no roots performs zero
    /// writes. Holding `&mut self` for the whole pass is what serializes
    /// evaluation against edge mutation and connect/disconnect.
    pub fn tick(&mut self, host: &mut dyn PropertyHost) {
        let roots = self.dirty_roots();
        if roots.is_empty() {
            return;
        }
        for id in self.evaluation_order(&roots) {
            self.evaluate(id, host);
            // A tracking node short of its target stays dirty: decay must
            // progress every tick, so it is its own root next pass.
            let keep_dirty = self.still_tracking(id);
            if let Ok(node) = self.node_mut(id) {
                node.needs_update = keep_dirty;
            }
        }
    }

    /// True when `id` is a tracking node that another decay step would still
    /// move. Comparing against the next step (rather than the raw target)
    /// also settles trackers whose remaining distance underflows.
    fn still_tracking(&self, id: NodeId) -> bool {
        let Ok(node) = self.node(id) else { return false };
        let NodeKind::Value(state) = &node.kind else { return false };
        let ValueSource::Track { input, rate } = &state.source else {
            return false;
        };
        let target = self.value_or_zero(*input);
        interp::track_toward(state.current, target, *rate) != state.current
    }

    fn dirty_roots(&self) -> Vec<NodeId> {
        self.ids()
            .filter(|&id| {
                self.node(id)
                    .map(|node| node.needs_update)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Topological order over nodes reachable from `roots` along child edges.
    /// In-degrees only count parents inside the reachable set; a clean parent
    /// outside it already holds its current value.
    fn evaluation_order(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut reachable: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Ok(node) = self.node(id) {
                stack.extend(node.children.iter().copied());
            }
        }

        let mut indeg: HashMap<NodeId, usize> = HashMap::with_capacity(reachable.len());
        for &id in &reachable {
            if let Ok(node) = self.node(id) {
                let deg = node
                    .parents
                    .iter()
                    .filter(|parent| reachable.contains(*parent))
                    .count();
                indeg.insert(id, deg);
            }
        }

        let mut queue: VecDeque<NodeId> = indeg
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(reachable.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            if let Ok(node) = self.node(id) {
                for &child in &node.children {
                    if let Some(deg) = indeg.get_mut(&child) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(child);
                        }
                    }
                }
            }
        }
        order
    }

    fn evaluate(&mut self, id: NodeId, host: &mut dyn PropertyHost) {
        let step = {
            let Ok(node) = self.node(id) else { return };
            match &node.kind {
                NodeKind::Value(state) => match &state.source {
                    // Raw literals are driven externally; nothing to compute.
                    ValueSource::Constant => Step::Skip,
                    ValueSource::Interpolate {
                        input,
                        input_range,
                        output_range,
                        extrapolate,
                    } => Step::Store(interp::interpolate(
                        self.value_or_zero(*input),
                        input_range,
                        output_range,
                        *extrapolate,
                    )),
                    ValueSource::Operator { op, operands } => {
                        Step::Store(self.fold_operands(*op, operands))
                    }
                    ValueSource::Track { input, rate } => Step::Store(interp::track_toward(
                        state.current,
                        self.value_or_zero(*input),
                        *rate,
                    )),
                },
                // Style nodes aggregate on demand; evaluation is pure
                // dependency propagation.
                NodeKind::Style(_) => Step::Skip,
                NodeKind::Props(_) => Step::PushProps,
            }
        };
        match step {
            Step::Store(next) => {
                if let Ok(node) = self.node_mut(id) {
                    if let NodeKind::Value(state) = &mut node.kind {
                        state.current = next;
                    }
                }
            }
            Step::PushProps => self.push_props(id, host),
            Step::Skip => {}
        }
    }

    fn fold_operands(&self, op: Operator, operands: &[NodeId]) -> f32 {
        let mut values = operands.iter().map(|&id| self.value_or_zero(id));
        let Some(first) = values.next() else { return 0.0 };
        values.fold(first, |acc, v| match op {
            Operator::Add => acc + v,
            Operator::Subtract => acc - v,
            Operator::Multiply => acc * v,
            Operator::Divide => acc / v,
        })
    }

    /// Aggregate the props node's bound values and push every property whose
    /// value differs from the last write. A dangling binding (no connection)
    /// or an unresolved target computes but writes nothing.
    fn push_props(&mut self, id: NodeId, host: &mut dyn PropertyHost) {
        let style = match self.props_style(id) {
            Ok(style) => style,
            Err(_) => return,
        };
        let Ok(node) = self.node_mut(id) else { return };
        let NodeKind::Props(state) = &mut node.kind else { return };
        let Some(conn) = state.connection.as_mut() else { return };
        let Some(cap) = conn.cap else { return };

        for (name, value) in &style {
            if conn.last.get(name) == Some(value) {
                continue;
            }
            match host.write_property(cap, name, *value) {
                WriteStatus::Written => {
                    conn.written.insert(name.clone());
                    conn.last.insert(name.clone(), *value);
                }
                WriteStatus::Unsupported => {
                    log::debug!("{} does not support property {name:?}", conn.handle);
                }
            }
        }
    }
}
