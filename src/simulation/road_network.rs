//! Road network graph with congestion-aware routing
//!
//! Nodes are positioned intersections, edges are [`EdgeModel`] instances.
//! At most one edge exists per directed (src, dst) pair.

use log::warn;
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::edge::EdgeModel;
use super::error::{NetworkError, NetworkResult};
use super::intersection::Intersection;
use super::types::{Node, NodeId, Position};

/// Directed road graph owning nodes, edge models and intersection controllers
#[derive(Debug, Default)]
pub struct RoadGraph {
    /// The underlying petgraph directed graph (one-way roads)
    graph: DiGraph<Node, EdgeModel>,

    /// Maps node ids to their indices in the graph
    node_indices: HashMap<NodeId, NodeIndex>,

    /// Controllers keyed by the node they are attached to
    intersections: HashMap<NodeId, Intersection>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node at (x, y). Re-adding an existing id keeps the original node.
    pub fn add_node(&mut self, id: impl Into<NodeId>, x: f64, y: f64) {
        let id = id.into();
        if self.node_indices.contains_key(&id) {
            warn!("Node {} already exists, keeping its original position", id);
            return;
        }

        let index = self.graph.add_node(Node {
            id: id.clone(),
            position: Position::new(x, y),
        });
        self.node_indices.insert(id, index);
    }

    fn index_of(&self, id: &NodeId) -> NetworkResult<NodeIndex> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| NetworkError::UnknownNode(id.clone()))
    }

    /// Adds a directed edge between two existing nodes
    pub fn add_edge(
        &mut self,
        src: impl Into<NodeId>,
        dst: impl Into<NodeId>,
        edge: impl Into<EdgeModel>,
    ) -> NetworkResult<EdgeIndex> {
        let (src, dst) = (src.into(), dst.into());
        let src_index = self.index_of(&src)?;
        let dst_index = self.index_of(&dst)?;

        if self.graph.find_edge(src_index, dst_index).is_some() {
            return Err(NetworkError::DuplicateEdge { src, dst });
        }

        Ok(self.graph.add_edge(src_index, dst_index, edge.into()))
    }

    /// Adds `a -> b` and `b -> a`, each with its own edge model built by `make_edge`
    pub fn add_two_way_edge<E: Into<EdgeModel>>(
        &mut self,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        make_edge: impl Fn() -> E,
    ) -> NetworkResult<(EdgeIndex, EdgeIndex)> {
        let (a, b) = (a.into(), b.into());
        let forward = self.add_edge(a.clone(), b.clone(), make_edge())?;
        let backward = self.add_edge(b, a, make_edge())?;
        Ok((forward, backward))
    }

    /// Index of the edge `src -> dst`
    pub fn edge_index(&self, src: &NodeId, dst: &NodeId) -> NetworkResult<EdgeIndex> {
        let no_edge = || NetworkError::NoSuchEdge {
            src: src.clone(),
            dst: dst.clone(),
        };
        let src_index = self.node_indices.get(src).ok_or_else(no_edge)?;
        let dst_index = self.node_indices.get(dst).ok_or_else(no_edge)?;
        self.graph
            .find_edge(*src_index, *dst_index)
            .ok_or_else(no_edge)
    }

    pub fn get_edge(&self, src: &NodeId, dst: &NodeId) -> NetworkResult<&EdgeModel> {
        let index = self.edge_index(src, dst)?;
        Ok(&self.graph[index])
    }

    pub fn get_edge_mut(&mut self, src: &NodeId, dst: &NodeId) -> NetworkResult<&mut EdgeModel> {
        let index = self.edge_index(src, dst)?;
        Ok(&mut self.graph[index])
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&EdgeModel> {
        self.graph.edge_weight(index)
    }

    pub fn edge_mut(&mut self, index: EdgeIndex) -> Option<&mut EdgeModel> {
        self.graph.edge_weight_mut(index)
    }

    /// Source and destination node ids of an edge
    pub fn edge_endpoints(&self, index: EdgeIndex) -> Option<(&NodeId, &NodeId)> {
        let (src, dst) = self.graph.edge_endpoints(index)?;
        Some((&self.graph[src].id, &self.graph[dst].id))
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// All edges as (src, dst, model)
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId, &EdgeModel)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()].id,
                &self.graph[edge.target()].id,
                edge.weight(),
            )
        })
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_indices.get(id).map(|index| &self.graph[*index])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_weights().map(|node| node.id.clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes with an edge leading into `id`
    pub fn incoming_nodes(&self, id: &NodeId) -> NetworkResult<Vec<NodeId>> {
        let index = self.index_of(id)?;
        let mut incoming: Vec<NodeId> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .map(|n| self.graph[n].id.clone())
            .collect();
        // petgraph yields neighbours newest first
        incoming.reverse();
        Ok(incoming)
    }

    /// A* search from `src` to `dst`.
    ///
    /// `cost_fn(src, dst, edge)` prices each edge and may read its current
    /// occupancy. The heuristic is the straight-line distance between node
    /// positions, so it stays admissible only when `cost_fn` never drops
    /// below that distance. The returned path includes both endpoints.
    pub fn find_path<F>(&self, src: &NodeId, dst: &NodeId, cost_fn: F) -> NetworkResult<Vec<NodeId>>
    where
        F: Fn(&NodeId, &NodeId, &EdgeModel) -> f64,
    {
        let start = self.index_of(src)?;
        let goal = self.index_of(dst)?;
        let goal_position = self.graph[goal].position;

        let (_, node_path) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| {
                cost_fn(
                    &self.graph[edge.source()].id,
                    &self.graph[edge.target()].id,
                    edge.weight(),
                )
            },
            |node| self.graph[node].position.distance(&goal_position),
        )
        .ok_or_else(|| NetworkError::NoPathFound {
            src: src.clone(),
            dst: dst.clone(),
        })?;

        Ok(node_path
            .into_iter()
            .map(|index| self.graph[index].id.clone())
            .collect())
    }

    /// Attaches a controller to a node, replacing any previous one
    pub fn add_intersection(&mut self, node: &NodeId, intersection: Intersection) -> NetworkResult<()> {
        self.index_of(node)?;
        self.intersections.insert(node.clone(), intersection);
        Ok(())
    }

    /// Attaches a round-robin light cycling over all current predecessors of `node`
    pub fn add_traffic_light(&mut self, node: &NodeId, duration: u32) -> NetworkResult<()> {
        let incoming = self.incoming_nodes(node)?;
        self.add_intersection(node, Intersection::traffic_light(incoming, duration))
    }

    pub fn get_intersection(&self, node: &NodeId) -> Option<&Intersection> {
        self.intersections.get(node)
    }

    pub fn intersections(&self) -> impl Iterator<Item = (&NodeId, &Intersection)> + '_ {
        self.intersections.iter()
    }

    /// Whether traffic on `src -> dst` may cross `dst`; nodes without a controller are open
    pub fn can_pass(&self, src: &NodeId, dst: &NodeId) -> bool {
        match self.intersections.get(dst) {
            Some(intersection) => intersection.can_pass(src),
            None => true,
        }
    }

    /// Advance every controller by one tick
    pub fn update_intersections(&mut self) {
        for intersection in self.intersections.values_mut() {
            intersection.update();
        }
    }
}
