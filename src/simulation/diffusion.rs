//! Information and anxiety diffusion across the social network

use crate::core::error::{Result, SimError};
use crate::core::types::clamp01;
use crate::simulation::context::{process_chunked, SimulationContext};

/// Nudge each worker's information level and anxiety toward the average of
/// their contacts. Reads a snapshot taken before any worker is updated.
pub fn diffuse(ctx: &mut SimulationContext) {
    let snapshot: Vec<(f32, f32)> = ctx
        .workers
        .iter()
        .map(|w| (w.information_level, w.economic_anxiety))
        .collect();
    let info_rate = ctx.dynamics().information_rate;
    let anxiety_rate = ctx.dynamics().anxiety_diffusion_rate;

    let faults = process_chunked("diffusion", ctx.workers.len(), |i| {
        if ctx.workers[i].network.is_empty() {
            return Ok(());
        }
        let (info, anxiety) = contact_means(ctx, i, &snapshot)?;
        let worker = &mut ctx.workers[i];
        worker.information_level = clamp01(worker.information_level + (info - worker.information_level) * info_rate);
        worker.economic_anxiety = clamp01(worker.economic_anxiety + (anxiety - worker.economic_anxiety) * anxiety_rate);
        Ok(())
    });
    ctx.report.faults += faults;
}

fn contact_means(ctx: &SimulationContext, idx: usize, snapshot: &[(f32, f32)]) -> Result<(f32, f32)> {
    let worker = &ctx.workers[idx];
    let mut info = 0.0;
    let mut anxiety = 0.0;
    for contact in &worker.network {
        let j = ctx
            .worker_idx(contact.worker)
            .ok_or_else(|| SimError::worker_fault(worker.id.0, format!("unknown contact {:?}", contact.worker)))?;
        info += snapshot[j].0;
        anxiety += snapshot[j].1;
    }
    let n = worker.network.len() as f32;
    Ok((info / n, anxiety / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScenarioConfig;
    use crate::core::types::{IndustryId, RegionId, WorkerId};
    use crate::entity::{NetworkContact, WorkerAgent};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pair() -> SimulationContext {
        let mut a = WorkerAgent::new(WorkerId(0), RegionId(0), IndustryId(0));
        a.information_level = 0.0;
        a.economic_anxiety = 0.0;
        a.network.push(NetworkContact { worker: WorkerId(1), closeness: 0.5 });
        let mut b = WorkerAgent::new(WorkerId(1), RegionId(0), IndustryId(0));
        b.information_level = 1.0;
        b.economic_anxiety = 1.0;
        SimulationContext::new(
            ScenarioConfig::default(),
            vec![a, b],
            Vec::new(),
            Vec::new(),
            ChaCha8Rng::seed_from_u64(0),
            0,
        )
    }

    #[test]
    fn test_moves_toward_contacts() {
        let mut ctx = pair();
        diffuse(&mut ctx);
        assert!((ctx.workers[0].information_level - 0.05).abs() < 1e-6);
        assert!((ctx.workers[0].economic_anxiety - 0.03).abs() < 1e-6);
        // No network, no change
        assert_eq!(ctx.workers[1].information_level, 1.0);
    }

    #[test]
    fn test_unknown_contact_counts_fault() {
        let mut ctx = pair();
        ctx.workers[1].network.push(NetworkContact { worker: WorkerId(42), closeness: 1.0 });
        diffuse(&mut ctx);
        assert_eq!(ctx.report.faults, 1);
        assert!((ctx.workers[0].information_level - 0.05).abs() < 1e-6);
    }
}
