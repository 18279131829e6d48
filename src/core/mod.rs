pub mod config;
pub mod error;
pub mod types;

pub use config::{AdoptionCurve, AutomationPace, DynamicsConfig, Intervention, ScenarioConfig, ScenarioUpdate};
pub use error::{Result, SimError};
