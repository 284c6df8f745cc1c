//! Intersection controllers
//!
//! A controller decides, for each incoming road of a node, whether vehicles
//! may currently cross.

use super::types::{NodeId, SignalState};

/// Round-robin traffic light giving green to one incoming road at a time
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRobinLight {
    /// Incoming nodes in the order they receive green
    incoming: Vec<NodeId>,
    /// Ticks each incoming road stays green
    duration: u32,
    /// Index into `incoming` currently green
    permitted_index: usize,
    /// Ticks since the current phase started
    elapsed_ticks: u32,
}

impl RoundRobinLight {
    pub fn new(incoming: Vec<NodeId>, duration: u32) -> Self {
        Self {
            incoming,
            duration: duration.max(1),
            permitted_index: 0,
            elapsed_ticks: 0,
        }
    }

    pub fn incoming(&self) -> &[NodeId] {
        &self.incoming
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// The incoming node that currently has green, if any are configured
    pub fn permitted(&self) -> Option<&NodeId> {
        self.incoming.get(self.permitted_index)
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    fn update(&mut self) {
        if self.incoming.is_empty() {
            return;
        }

        self.elapsed_ticks += 1;
        if self.elapsed_ticks >= self.duration {
            self.elapsed_ticks = 0;
            self.permitted_index = (self.permitted_index + 1) % self.incoming.len();
        }
    }

    fn can_pass(&self, src: &NodeId) -> bool {
        match self.permitted() {
            Some(active) => active == src,
            // Nothing configured: behaves as an unsignalized junction
            None => true,
        }
    }
}

/// Controller attached to a single node
#[derive(Debug, Clone, PartialEq)]
pub enum Intersection {
    /// Every incoming road may always pass
    Uncontrolled,
    RoundRobin(RoundRobinLight),
}

impl Intersection {
    pub fn traffic_light(incoming: Vec<NodeId>, duration: u32) -> Self {
        Intersection::RoundRobin(RoundRobinLight::new(incoming, duration))
    }

    /// Advance internal timers by one tick
    pub fn update(&mut self) {
        if let Intersection::RoundRobin(light) = self {
            light.update();
        }
    }

    /// Whether a vehicle arriving from `src` may cross right now
    pub fn can_pass(&self, src: &NodeId) -> bool {
        match self {
            Intersection::Uncontrolled => true,
            Intersection::RoundRobin(light) => light.can_pass(src),
        }
    }

    pub fn get_state(&self, src: &NodeId) -> SignalState {
        if self.can_pass(src) {
            SignalState::Green
        } else {
            SignalState::Red
        }
    }
}
