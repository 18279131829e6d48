//! Firm AI-adoption funnel and workforce sizing
//!
//! Adoption decisions read a snapshot of every firm's status taken at the
//! start of the tick, so a firm advancing this tick does not change its
//! competitors' pressure until the next one.

use rand::Rng;

use crate::core::config::DynamicsConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::WorkerId;
use crate::entity::{AdoptionStatus, FirmAgent, JobPosting, LifeEvent};
use crate::simulation::context::{process_chunked, SimulationContext};

const ROI_BASE: f64 = 0.1;
const ROI_SIZE_BONUS: f64 = 0.2;
const ROI_CAPABILITY_WEIGHT: f64 = 0.5;
const ROI_PRESSURE_WEIGHT: f64 = 0.3;

const THRESHOLD_BASE: f64 = 0.6;
const THRESHOLD_INNOVATION_WEIGHT: f64 = 0.3;

/// Spread of posted wages around the industry base
const WAGE_BAND: std::ops::Range<f64> = 0.85..1.15;

/// Expected return on adopting AI for this firm right now
pub fn ai_roi(firm: &FirmAgent, ai_level: f64, competitive_pressure: f64) -> f64 {
    let size_bonus = if firm.size_class.is_large() { ROI_SIZE_BONUS } else { 0.0 };
    ROI_BASE + size_bonus + ROI_CAPABILITY_WEIGHT * ai_level + ROI_PRESSURE_WEIGHT * competitive_pressure
}

/// ROI a firm needs before it considers the next adoption stage
pub fn adoption_threshold(firm: &FirmAgent) -> f64 {
    THRESHOLD_BASE - THRESHOLD_INNOVATION_WEIGHT * firm.innovativeness as f64 + firm.labor_strategy.adoption_bias()
}

/// Share of a firm's competitors already at Piloting or beyond
fn competitive_pressure(ctx: &SimulationContext, firm: &FirmAgent, statuses: &[AdoptionStatus]) -> f64 {
    if firm.competitors.is_empty() {
        return 0.0;
    }
    let adopters = firm
        .competitors
        .iter()
        .filter_map(|&id| ctx.firm_idx(id))
        .filter(|&i| statuses[i].is_adopter())
        .count();
    adopters as f64 / firm.competitors.len() as f64
}

/// Run the firm decision engine for one tick
pub fn update_firms(ctx: &mut SimulationContext) {
    update_adoption(ctx);
    post_openings(ctx);

    let faults = process_chunked("firm_decision", ctx.firms.len(), |i| lay_off_surplus(ctx, i));
    ctx.report.faults += faults;
}

fn update_adoption(ctx: &mut SimulationContext) {
    let ai_level = ctx.frontier.level;
    let statuses: Vec<AdoptionStatus> = ctx.firms.iter().map(|f| f.adoption_status).collect();
    let pressures: Vec<f64> = ctx
        .firms
        .iter()
        .map(|f| competitive_pressure(ctx, f, &statuses))
        .collect();

    let SimulationContext {
        firms,
        rng,
        scenario,
        report,
        ..
    } = ctx;
    let d = &scenario.dynamics;

    for (firm, pressure) in firms.iter_mut().zip(pressures) {
        if ai_roi(firm, ai_level, pressure) <= adoption_threshold(firm) {
            continue;
        }
        if rng.gen_bool(d.adoption_step_probability) && firm.advance_adoption(d.automation_step, d.max_automation) {
            report.adoptions += 1;
            tracing::trace!(firm = firm.id.0, status = ?firm.adoption_status, "adoption advanced");
        }
    }
}

/// Openings needed to bring headcount up to the effective target
pub fn openings_needed(firm: &FirmAgent, d: &DynamicsConfig) -> usize {
    let target = firm.effective_target(d.automation_headcount_factor).ceil().max(0.0) as usize;
    target.saturating_sub(firm.headcount()).min(d.max_postings_per_tick)
}

/// Layoffs this firm makes before any subsidy retention
pub fn layoffs_needed(firm: &FirmAgent, d: &DynamicsConfig) -> usize {
    let target = firm.effective_target(d.automation_headcount_factor);
    if (firm.headcount() as f32) <= target * d.layoff_tolerance {
        return 0;
    }
    let target = target.ceil().max(0.0) as usize;
    firm.headcount().saturating_sub(target).min(d.max_layoffs_per_tick)
}

/// Retire last tick's unfilled postings and open new ones
fn post_openings(ctx: &mut SimulationContext) {
    for i in 0..ctx.firms.len() {
        ctx.firms[i].open_positions.clear();
        let needed = openings_needed(&ctx.firms[i], ctx.dynamics());
        if needed == 0 {
            continue;
        }

        let (firm_id, region, industry, strategy) = {
            let f = &ctx.firms[i];
            (f.id, f.region, f.industry, f.labor_strategy)
        };
        let base = industry.info().base_wage * strategy.wage_factor();
        for _ in 0..needed {
            let id = ctx.next_posting_id();
            let wage = base * ctx.rng.gen_range(WAGE_BAND);
            ctx.firms[i].open_positions.push(JobPosting {
                id,
                firm: firm_id,
                wage,
                region,
                industry,
            });
        }
    }
}

/// Shed surplus employees. With a wage subsidy active each candidate is
/// retained with probability equal to the subsidy coverage.
fn lay_off_surplus(ctx: &mut SimulationContext, firm_idx: usize) -> Result<()> {
    let count = layoffs_needed(&ctx.firms[firm_idx], ctx.dynamics());
    if count == 0 {
        return Ok(());
    }

    let candidates: Vec<WorkerId> = ctx.firms[firm_idx].employees.iter().rev().take(count).copied().collect();
    let coverage = ctx.levers.wage_subsidy_coverage.clamp(0.0, 1.0);

    for worker_id in candidates {
        if coverage > 0.0 && ctx.rng.gen_bool(coverage) {
            continue;
        }
        let firm_id = ctx.firms[firm_idx].id;
        let worker_idx = ctx
            .worker_idx(worker_id)
            .ok_or_else(|| SimError::firm_fault(firm_id.0, format!("roster lists unknown worker {:?}", worker_id)))?;

        let firm = &mut ctx.firms[firm_idx];
        firm.employees.remove(&worker_id);
        firm.total_layoffs += 1;

        let worker = &mut ctx.workers[worker_idx];
        worker.begin_unemployment();
        worker.record(LifeEvent::JobLoss);
        ctx.report.layoffs += 1;
        tracing::trace!(firm = firm_id.0, worker = worker_id.0, "layoff");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScenarioConfig;
    use crate::core::types::{FirmId, IndustryId, RegionId};
    use crate::entity::{EmploymentStatus, SizeClass, WorkerAgent};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn context_with_staffed_firm(staff: u32, target: u32) -> SimulationContext {
        let mut workers: Vec<WorkerAgent> = (0..staff)
            .map(|i| WorkerAgent::new(WorkerId(i), RegionId(0), IndustryId(0)))
            .collect();
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Large);
        firm.target_headcount = target;
        for w in workers.iter_mut() {
            w.status = EmploymentStatus::Employed;
            w.employer = Some(firm.id);
            w.wage = 3800.0;
            firm.employees.insert(w.id);
        }
        SimulationContext::new(
            ScenarioConfig::default(),
            workers,
            vec![firm],
            Vec::new(),
            ChaCha8Rng::seed_from_u64(3),
            3,
        )
    }

    #[test]
    fn test_roi_components() {
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Small);
        assert!((ai_roi(&firm, 0.0, 0.0) - 0.1).abs() < 1e-12);
        firm.size_class = SizeClass::Enterprise;
        assert!((ai_roi(&firm, 0.2, 0.5) - (0.1 + 0.2 + 0.1 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_innovative_firms_have_lower_threshold() {
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Small);
        firm.innovativeness = 0.1;
        let cautious = adoption_threshold(&firm);
        firm.innovativeness = 0.9;
        assert!(adoption_threshold(&firm) < cautious);
    }

    #[test]
    fn test_openings_capped_per_tick() {
        let d = DynamicsConfig::default();
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Large);
        firm.target_headcount = 50;
        assert_eq!(openings_needed(&firm, &d), 5);
        for i in 0..48 {
            firm.employees.insert(WorkerId(i));
        }
        assert_eq!(openings_needed(&firm, &d), 2);
    }

    #[test]
    fn test_layoffs_wait_for_tolerance() {
        let d = DynamicsConfig::default();
        let mut firm = FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Large);
        firm.target_headcount = 100;
        for i in 0..105 {
            firm.employees.insert(WorkerId(i));
        }
        assert_eq!(layoffs_needed(&firm, &d), 0);

        firm.automation_level = 0.5; // effective target 85, tolerance 93.5
        assert_eq!(layoffs_needed(&firm, &d), 3);
    }

    #[test]
    fn test_postings_use_industry_wage_band() {
        let mut ctx = context_with_staffed_firm(10, 20);
        post_openings(&mut ctx);
        let postings = &ctx.firms[0].open_positions;
        assert_eq!(postings.len(), 5);
        for p in postings {
            assert!(p.wage >= 3800.0 * 0.85 && p.wage < 3800.0 * 1.15);
            assert_eq!(p.firm, FirmId(0));
        }

        // Unfilled postings are retired on the next pass
        ctx.firms[0].target_headcount = 10;
        post_openings(&mut ctx);
        assert!(ctx.firms[0].open_positions.is_empty());
    }

    #[test]
    fn test_layoff_keeps_links_consistent() {
        let mut ctx = context_with_staffed_firm(100, 100);
        ctx.firms[0].automation_level = 0.5;
        update_firms(&mut ctx);

        assert_eq!(ctx.firms[0].headcount(), 97);
        assert_eq!(ctx.report.layoffs, 3);
        assert_eq!(ctx.firms[0].total_layoffs, 3);
        let laid_off: Vec<_> = ctx.workers.iter().filter(|w| w.is_unemployed()).collect();
        assert_eq!(laid_off.len(), 3);
        for w in laid_off {
            assert!(w.employer.is_none());
            assert_eq!(w.unemployment_spells, 1);
            assert_eq!(w.pending_events, vec![LifeEvent::JobLoss]);
        }
        assert!(ctx.check_invariants().is_ok());
    }

    #[test]
    fn test_full_subsidy_blocks_layoffs() {
        let mut ctx = context_with_staffed_firm(100, 100);
        ctx.firms[0].automation_level = 0.5;
        ctx.levers.wage_subsidy_coverage = 1.0;
        update_firms(&mut ctx);
        assert_eq!(ctx.firms[0].headcount(), 100);
        assert_eq!(ctx.report.layoffs, 0);
    }

    #[test]
    fn test_unknown_roster_entry_is_a_fault() {
        let mut ctx = context_with_staffed_firm(100, 100);
        ctx.firms[0].automation_level = 0.5;
        ctx.firms[0].employees.insert(WorkerId(9999));
        update_firms(&mut ctx);
        assert_eq!(ctx.report.faults, 1);
    }

    #[test]
    fn test_adoption_never_regresses() {
        let mut ctx = context_with_staffed_firm(10, 10);
        ctx.frontier.level = 0.9;
        ctx.firms[0].innovativeness = 1.0;
        let mut prev = ctx.firms[0].adoption_status;
        for _ in 0..100 {
            update_adoption(&mut ctx);
            assert!(ctx.firms[0].adoption_status >= prev);
            prev = ctx.firms[0].adoption_status;
        }
        assert_eq!(prev, AdoptionStatus::Mature);
        // Four steps of 0.1 from None
        assert!((ctx.firms[0].automation_level - 0.4).abs() < 1e-6);
    }
}
