//! Core types for the traffic simulation
//!
//! Identifiers, positions and the shared model constants.

use std::fmt;

/// Identifier of a node (intersection) in the road graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A 2D position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// A positioned intersection of the road graph. Immutable once added.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
}

/// Signal shown to one incoming road of an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Green,
    Red,
}

impl SignalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Green => "GREEN",
            SignalState::Red => "RED",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default maximum speed of a cellular edge, in cells per tick
pub const DEFAULT_CELLULAR_VMAX: u32 = 5;

/// Default probability of random braking on a cellular edge
pub const DEFAULT_PROB_SLOW: f64 = 0.1;

/// Default jam density of a fluid edge, in vehicles per meter (one car every 5 m)
pub const DEFAULT_DENSITY_MAX: f64 = 0.2;

/// Default green phase of a traffic light, in ticks
pub const DEFAULT_LIGHT_DURATION: u32 = 50;

/// Default per-tick spawn probability of a spawner
pub const DEFAULT_SPAWN_RATIO: f64 = 0.05;

/// Minimum distance in meters kept between two vehicles on a fluid edge
pub const FLUID_SAFETY_GAP: f64 = 0.5;
