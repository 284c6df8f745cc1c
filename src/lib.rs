//! Traffic Flow Simulation Library
//!
//! Simulates vehicles on a road network with interchangeable cellular
//! automaton and density-flow road models.

pub mod simulation;
