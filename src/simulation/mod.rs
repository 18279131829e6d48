pub mod context;
pub mod diffusion;
pub mod factory;
pub mod firm_decision;
pub mod frontier;
pub mod interventions;
pub mod matcher;
pub mod orchestrator;
pub mod output;
pub mod retraining;
pub mod tick;
pub mod wages;
pub mod worker_decision;

pub use context::{EmploymentCounts, PolicyLevers, SimulationContext, TickReport};
pub use factory::build_context;
pub use frontier::{AiCapabilityFrontier, CAPABILITY_CEILING};
pub use orchestrator::{InitInfo, Progress, RunObserver, Silent, Simulation, YIELD_INTERVAL};
pub use output::{MonthlySnapshot, PolicyAggregate, PolicyFeasibility, SimulationResult, Summary};
pub use tick::run_tick;
