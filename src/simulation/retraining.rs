//! Training program processing: graduation, dropout, admission, progress
//!
//! Each program is handled in the order:
//! 1. Graduate enrolled workers whose progress reached 1
//! 2. Drop out a random share of the rest
//! 3. Admit same-region workers who asked for retraining, in random order,
//!    up to capacity
//! 4. Advance everyone still enrolled by `1 / duration`

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::error::{Result, SimError};
use crate::core::types::{clamp01, RegionId, WorkerId};
use crate::entity::{EmploymentStatus, LifeEvent, TrainingProgramAgent};
use crate::simulation::context::{process_chunked, SimulationContext};

/// Tolerance for accumulated float progress
const COMPLETION_EPSILON: f32 = 1e-4;

/// Skill-vector gain at graduation, as a share of the augmentation gain
const GENERAL_SKILL_SHARE: f32 = 0.25;

/// Run the training program processor for one tick
pub fn process_training(ctx: &mut SimulationContext) {
    let faults = process_chunked("training", ctx.programs.len(), |p| step_program(ctx, p));
    ctx.report.faults += faults;
}

fn step_program(ctx: &mut SimulationContext, program_idx: usize) -> Result<()> {
    graduate_and_drop(ctx, program_idx)?;
    admit(ctx, program_idx)?;

    let program = &ctx.programs[program_idx];
    let step = program.monthly_progress();
    for &worker_id in &program.enrolled {
        let idx = lookup(ctx, program, worker_id)?;
        let worker = &mut ctx.workers[idx];
        worker.training_progress = (worker.training_progress + step).min(1.0);
    }
    Ok(())
}

fn lookup(ctx: &SimulationContext, program: &TrainingProgramAgent, worker: WorkerId) -> Result<usize> {
    ctx.worker_idx(worker)
        .ok_or_else(|| SimError::worker_fault(worker.0, format!("enrolled in {:?} but unknown", program.id)))
}

fn graduate_and_drop(ctx: &mut SimulationContext, program_idx: usize) -> Result<()> {
    let enrolled = ctx.programs[program_idx].enrolled.clone();
    let dropout_p = ctx.programs[program_idx].dropout_probability().clamp(0.0, 1.0);
    let boost = ctx.dynamics().graduation_skill_boost
        * ctx.programs[program_idx].program_type.skill_multiplier()
        * (0.5 + 0.5 * ctx.programs[program_idx].placement_rate);

    for worker_id in enrolled {
        let idx = lookup(ctx, &ctx.programs[program_idx], worker_id)?;

        if ctx.workers[idx].training_progress >= 1.0 - COMPLETION_EPSILON {
            let worker = &mut ctx.workers[idx];
            leave_program(worker);
            worker.ai_augmentation_skill = clamp01(worker.ai_augmentation_skill + boost);
            for s in worker.skills.iter_mut() {
                *s = clamp01(*s + boost * GENERAL_SKILL_SHARE);
            }
            worker.record(LifeEvent::RetrainingSuccess);

            let program = &mut ctx.programs[program_idx];
            program.withdraw(worker_id);
            program.graduates += 1;
            ctx.report.graduations += 1;
        } else if ctx.rng.gen_bool(dropout_p) {
            let worker = &mut ctx.workers[idx];
            leave_program(worker);
            worker.record(LifeEvent::RetrainingFailure);

            let program = &mut ctx.programs[program_idx];
            program.withdraw(worker_id);
            program.dropouts += 1;
            ctx.report.dropouts += 1;
        }
    }
    Ok(())
}

/// Back to job search with fresh unemployment bookkeeping; not a new spell
fn leave_program(worker: &mut crate::entity::WorkerAgent) {
    worker.status = EmploymentStatus::Unemployed;
    worker.enrolled_program = None;
    worker.training_progress = 0.0;
    worker.unemployment_duration = 0;
    worker.actively_searching = true;
    worker.wants_retraining = false;
}

fn eligible(ctx: &SimulationContext, idx: usize, region: RegionId) -> bool {
    let w = &ctx.workers[idx];
    w.wants_retraining
        && w.region == region
        && w.enrolled_program.is_none()
        && matches!(w.status, EmploymentStatus::Employed | EmploymentStatus::Unemployed)
}

fn admit(ctx: &mut SimulationContext, program_idx: usize) -> Result<()> {
    let region = ctx.programs[program_idx].region;
    let limit = ctx.dynamics().max_admissions_per_tick;
    let mut candidates: Vec<usize> = (0..ctx.workers.len()).filter(|&i| eligible(ctx, i, region)).collect();
    candidates.shuffle(&mut ctx.rng);
    let mut admitted = 0;

    for idx in candidates {
        if admitted >= limit || !ctx.programs[program_idx].has_capacity() {
            break;
        }

        ctx.detach_from_employer(idx)?;
        let program = &mut ctx.programs[program_idx];
        let worker = &mut ctx.workers[idx];
        if !program.enroll(worker.id) {
            break;
        }
        worker.status = EmploymentStatus::Retraining;
        worker.enrolled_program = Some(program.id);
        worker.training_progress = 0.0;
        worker.tenure_months = 0;
        worker.actively_searching = false;
        worker.wants_retraining = false;

        admitted += 1;
        ctx.report.admissions += 1;
        tracing::trace!(worker = worker.id.0, program = program.id.0, "admitted to training");
    }
    Ok(())
}
