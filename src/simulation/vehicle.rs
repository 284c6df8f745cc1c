//! Vehicle entity

use std::collections::VecDeque;

use petgraph::graph::EdgeIndex;

use super::types::{NodeId, VehicleId};

/// A vehicle travelling through the road graph
///
/// The vehicle does not own the edge it drives on; `edge` is a handle into the
/// graph's edge table and is rebound whenever the vehicle changes edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    /// Remaining targets, front is the next one
    pub path: VecDeque<NodeId>,
    /// Cells per tick on cellular edges, meters per tick on fluid edges
    pub speed: f64,
    pub edge: Option<EdgeIndex>,
}

impl Vehicle {
    pub fn new(id: VehicleId, path: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id,
            path: path.into_iter().collect(),
            speed: 0.0,
            edge: None,
        }
    }

    pub fn next_target(&self) -> Option<&NodeId> {
        self.path.front()
    }

    pub fn pop_next_target(&mut self) -> Option<NodeId> {
        self.path.pop_front()
    }

    /// Put a consumed target back at the front of the path
    pub fn restore_target(&mut self, target: NodeId) {
        self.path.push_front(target);
    }

    /// Consume the next target after reaching `node`.
    ///
    /// Leading entries equal to `node` are dropped first, so the path may or
    /// may not list the destination of the edge the vehicle is leaving.
    pub fn advance_past(&mut self, node: &NodeId) -> Option<NodeId> {
        while self.path.front() == Some(node) {
            self.path.pop_front();
        }
        self.path.pop_front()
    }
}
