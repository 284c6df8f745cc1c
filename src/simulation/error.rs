//! Error types for graph construction, lookup and routing

use super::types::{NodeId, VehicleId};

/// Errors raised by the road graph and the simulation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("edge {src} -> {dst} already exists")]
    DuplicateEdge { src: NodeId, dst: NodeId },
    #[error("no edge from {src} to {dst}")]
    NoSuchEdge { src: NodeId, dst: NodeId },
    #[error("no path found between {src} and {dst}")]
    NoPathFound { src: NodeId, dst: NodeId },
    #[error("edge {src} -> {dst} is full")]
    EdgeFull { src: NodeId, dst: NodeId },
    #[error("vehicle {vehicle} routed over missing connection {from} -> {to}")]
    InvalidRoute {
        vehicle: VehicleId,
        from: NodeId,
        to: NodeId,
    },
}

pub type NetworkResult<T> = Result<T, NetworkError>;
