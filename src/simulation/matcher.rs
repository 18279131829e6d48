//! Labor market matching: open positions + job seekers -> hires
//!
//! A single linear pass over shuffled seekers. Each seeker filters the
//! remaining pool to postings it can take and, with a fixed probability,
//! accepts one at random. Filled postings leave both the pool and the
//! firm's queue; a posting that cannot be filled only leaves the pool.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::config::DynamicsConfig;
use crate::core::error::{Result, SimError};
use crate::entity::{JobPosting, WorkerAgent};
use crate::simulation::context::{process_chunked, SimulationContext};

/// Whether `worker` would accept `posting`
pub fn qualifies(worker: &WorkerAgent, posting: &JobPosting, d: &DynamicsConfig) -> bool {
    let reachable = posting.region == worker.region || worker.mobility_willingness > d.mobility_threshold;
    reachable && posting.wage >= d.reservation_wage_floor * worker.reservation_wage
}

/// Run the matcher for one tick
pub fn match_market(ctx: &mut SimulationContext) {
    let mut pool: Vec<JobPosting> = ctx
        .firms
        .iter()
        .flat_map(|f| f.open_positions.iter().cloned())
        .collect();

    let mut seekers: Vec<usize> = ctx
        .workers
        .iter()
        .enumerate()
        .filter(|(_, w)| w.is_job_seeker())
        .map(|(i, _)| i)
        .collect();
    seekers.shuffle(&mut ctx.rng);

    let mut hires = 0;
    let faults = process_chunked("matcher", seekers.len(), |n| {
        if pool.is_empty() {
            return Ok(());
        }
        if try_hire(ctx, seekers[n], &mut pool)? {
            hires += 1;
        }
        Ok(())
    });

    ctx.report.hires += hires;
    ctx.report.faults += faults;
}

fn try_hire(ctx: &mut SimulationContext, worker_idx: usize, pool: &mut Vec<JobPosting>) -> Result<bool> {
    let options: Vec<usize> = {
        let worker = &ctx.workers[worker_idx];
        let d = ctx.dynamics();
        pool.iter()
            .enumerate()
            .filter(|(_, p)| qualifies(worker, p, d))
            .map(|(i, _)| i)
            .collect()
    };
    if options.is_empty() {
        return Ok(false);
    }

    let hire_probability = ctx.dynamics().hire_probability;
    if !ctx.rng.gen_bool(hire_probability) {
        return Ok(false);
    }
    let Some(&choice) = options.choose(&mut ctx.rng) else {
        return Ok(false);
    };
    let posting = pool.swap_remove(choice);
    let Some(firm_idx) = ctx.firm_idx(posting.firm) else {
        // Unfillable this tick; the firm's queue keeps it
        return Err(SimError::firm_fault(posting.firm.0, format!("posting {:?} from unknown firm", posting.id)));
    };

    ctx.hire(worker_idx, &posting)?;
    ctx.firms[firm_idx].remove_posting(posting.id);

    tracing::trace!(
        worker = ctx.workers[worker_idx].id.0,
        firm = posting.firm.0,
        wage = posting.wage,
        "hire"
    );
    Ok(true)
}
