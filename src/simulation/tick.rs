//! Tick system - orchestrates one simulated month
//!
//! Systems run strictly in order and never concurrently; each one sees the
//! state left by the previous one.

use crate::simulation::context::{SimulationContext, TickReport};
use crate::simulation::diffusion::diffuse;
use crate::simulation::firm_decision::update_firms;
use crate::simulation::interventions::{apply_interventions, set_levers};
use crate::simulation::matcher::match_market;
use crate::simulation::retraining::process_training;
use crate::simulation::wages::adjust_wages;
use crate::simulation::worker_decision::update_workers;

/// Run a single simulation tick
///
/// This is the main entry point that orchestrates all simulation systems:
/// 1. Advance the AI capability frontier and derive policy levers
/// 2. Firm decisions (adoption funnel, postings, layoffs)
/// 3. Worker decisions (state machine, opinion update)
/// 4. Training programs (graduation, dropout, admission, progress)
/// 5. Labor market matching
/// 6. Wage drift
/// 7. Policy interventions
/// 8. Information diffusion
///
/// Returns the activity counters for the month.
pub fn run_tick(ctx: &mut SimulationContext) -> TickReport {
    ctx.month += 1;
    ctx.report = TickReport::default();

    let level = ctx.frontier.advance(ctx.month);
    set_levers(ctx);
    update_firms(ctx);
    update_workers(ctx);
    process_training(ctx);
    match_market(ctx);
    adjust_wages(ctx);
    apply_interventions(ctx);
    diffuse(ctx);

    let report = ctx.report;
    tracing::debug!(
        month = ctx.month,
        ai_level = level,
        hires = report.hires,
        layoffs = report.layoffs,
        admissions = report.admissions,
        graduations = report.graduations,
        adoptions = report.adoptions,
        faults = report.faults,
        "tick complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Intervention, ScenarioConfig};
    use crate::core::types::{FirmId, IndustryId, RegionId, WorkerId};
    use crate::entity::{AdoptionStatus, EmploymentStatus, FirmAgent, InterventionType, SizeClass, WorkerAgent};
    use crate::simulation::factory::build_context;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small() -> ScenarioConfig {
        let mut s = ScenarioConfig::default().with_seed(21);
        s.num_workers = 300;
        s.num_firms = 30;
        s.num_training_programs = 4;
        s.num_regions = 3;
        s
    }

    #[test]
    fn test_tick_advances_month_and_frontier() {
        let mut ctx = build_context(small()).unwrap();
        let level = ctx.frontier.level;
        run_tick(&mut ctx);
        assert_eq!(ctx.month, 1);
        assert!(ctx.frontier.level > level);
    }

    #[test]
    fn test_ticks_preserve_invariants() {
        let mut ctx = build_context(small()).unwrap();
        for _ in 0..24 {
            let report = run_tick(&mut ctx);
            assert_eq!(report.faults, 0);
            assert_eq!(ctx.employment_counts().total(), 300);
            ctx.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = build_context(small()).unwrap();
        let mut b = build_context(small()).unwrap();
        for _ in 0..12 {
            assert_eq!(run_tick(&mut a), run_tick(&mut b));
        }
        assert_eq!(a.employment_counts(), b.employment_counts());
        let wages_a: Vec<f64> = a.workers.iter().map(|w| w.wage).collect();
        let wages_b: Vec<f64> = b.workers.iter().map(|w| w.wage).collect();
        assert_eq!(wages_a, wages_b);
    }

    /// One mature firm at automation 0.5 with 100 staff against a target of 100
    fn overstaffed(interventions: Vec<Intervention>) -> SimulationContext {
        let mut scenario = ScenarioConfig::default();
        scenario.interventions = interventions;
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Large);
        firm.target_headcount = 100;
        firm.adoption_status = AdoptionStatus::Mature;
        firm.automation_level = 0.5;
        let workers: Vec<WorkerAgent> = (0..100)
            .map(|i| {
                let mut w = WorkerAgent::new(WorkerId(i), RegionId(0), IndustryId(0));
                w.status = EmploymentStatus::Employed;
                w.employer = Some(firm.id);
                w.wage = 3800.0;
                firm.employees.insert(w.id);
                w
            })
            .collect();
        SimulationContext::new(scenario, workers, vec![firm], Vec::new(), ChaCha8Rng::seed_from_u64(5), 5)
    }

    #[test]
    fn test_wage_subsidy_applies_in_first_tick() {
        let subsidy = Intervention::new(InterventionType::WageSubsidy).with_param("coverage", 1.0);
        let mut ctx = overstaffed(vec![subsidy]);
        let report = run_tick(&mut ctx);
        assert_eq!(report.layoffs, 0);
        assert_eq!(ctx.firms[0].total_layoffs, 0);
    }

    #[test]
    fn test_removing_subsidy_applies_in_same_tick() {
        let subsidy = Intervention::new(InterventionType::WageSubsidy).with_param("coverage", 1.0);
        let mut ctx = overstaffed(vec![subsidy]);
        run_tick(&mut ctx);
        assert_eq!(ctx.firms[0].total_layoffs, 0);

        ctx.scenario.interventions.clear();
        let report = run_tick(&mut ctx);
        assert_eq!(report.layoffs, 3);
        assert_eq!(ctx.levers.wage_subsidy_coverage, 0.0);
    }
}
