//! Labor Frontier - agent-based labor market simulation under advancing AI

pub mod channel;
pub mod core;
pub mod entity;
pub mod simulation;

pub use crate::core::{Result, ScenarioConfig, SimError};
pub use crate::simulation::{Simulation, SimulationResult};
