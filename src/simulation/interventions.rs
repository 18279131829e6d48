//! Applies active policy interventions to agent state
//!
//! Levers read by other systems (the wage subsidy coverage) are derived by
//! `set_levers` at the start of every tick, before any system reads them, so
//! toggling an intervention takes effect in the same tick. Direct effects on
//! agents are applied later in the tick by `apply_interventions`.

use crate::core::config::{DynamicsConfig, Intervention};
use crate::core::types::clamp01;
use crate::entity::{InterventionType, LifeEvent, TrainingProgramAgent, WorkerAgent};
use crate::simulation::context::{PolicyLevers, SimulationContext};

/// Share of candidate layoffs retained when no `coverage` is given
pub const DEFAULT_SUBSIDY_COVERAGE: f64 = 0.5;

/// Derive this tick's levers from the active interventions
pub fn set_levers(ctx: &mut SimulationContext) {
    let mut levers = PolicyLevers::default();
    for intervention in ctx.scenario.interventions.iter().filter(|i| i.active) {
        if intervention.intervention_type == InterventionType::WageSubsidy {
            levers.wage_subsidy_coverage = intervention.param("coverage", DEFAULT_SUBSIDY_COVERAGE).clamp(0.0, 1.0);
        }
    }
    ctx.levers = levers;
}

/// Apply the direct effects of active interventions to agents
pub fn apply_interventions(ctx: &mut SimulationContext) {
    let SimulationContext {
        scenario,
        workers,
        programs,
        ..
    } = ctx;
    let d = &scenario.dynamics;

    for intervention in scenario.interventions.iter().filter(|i| i.active) {
        match intervention.intervention_type {
            InterventionType::Ubi => pay_ubi(intervention, workers, d),
            InterventionType::Retraining => expand_training(programs, d),
            // Read by layoffs through the levers
            InterventionType::WageSubsidy => {}
            InterventionType::AiRegulation => {
                tracing::debug!("ai_regulation has no direct effect; tracked in opinion only");
            }
        }
    }
}

/// Pay the unemployed. `amount` is in months of savings, scaled by
/// `ubi_savings_boost`.
fn pay_ubi(intervention: &Intervention, workers: &mut [WorkerAgent], d: &DynamicsConfig) {
    let amount = intervention.param("amount", 1.0) as f32 * d.ubi_savings_boost;
    for worker in workers.iter_mut().filter(|w| w.is_unemployed()) {
        worker.savings += amount;
        worker.policy_support.add(InterventionType::Ubi, d.ubi_support_boost);
        worker.economic_anxiety = clamp01(worker.economic_anxiety - d.ubi_anxiety_relief);
        worker.record(LifeEvent::UbiReceived);
    }
}

/// Raise subsidy levels and grow capacity, bounded by the capacity multiple
fn expand_training(programs: &mut [TrainingProgramAgent], d: &DynamicsConfig) {
    for program in programs.iter_mut() {
        program.subsidy_level = clamp01(program.subsidy_level + d.subsidy_step);
        let cap = (program.base_capacity as f32 * d.max_capacity_multiple).floor() as u32;
        let grown = (program.capacity as f32 * d.capacity_growth).ceil() as u32;
        program.capacity = grown.min(cap).max(program.capacity);
    }
}
