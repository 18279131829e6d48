//! Per-worker state transitions and policy-opinion updates
//!
//! Each tick every worker:
//! 1. Steps its employment state machine (displacement risk, unemployment
//!    spell bookkeeping, retraining requests, labor-force exit)
//! 2. Folds pending life events into opinions as fixed shocks
//! 3. Drifts toward its contacts' policy support (echo chamber)
//! 4. Applies ideological floors and ceilings
//! 5. Applies trust modulation
//! 6. Clamps every [0, 1] field

use ahash::AHashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::DynamicsConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{clamp01, Month, WorkerId};
use crate::entity::{EmploymentStatus, InterventionType, LifeEvent, PolicySupport, WorkerAgent};
use crate::simulation::context::{process_chunked, SimulationContext};

/// Monthly UBI-support drift for a worker with no savings left
const BROKE_UBI_DRIFT: f32 = 0.01;

/// Reservation wage never decays below this share of its initial value
const RESERVATION_FLOOR: f64 = 0.5;

/// Displacement risk multiplier for industries with high AI exposure
const HIGH_EXPOSURE_RISK: f32 = 1.5;
const LOW_EXPOSURE_RISK: f32 = 0.75;

/// Probability-proxy that a worker's job is automated this month
pub fn displacement_risk(ai_level: f64, worker: &WorkerAgent) -> f32 {
    let exposure = if worker.industry.info().high_ai_exposure {
        HIGH_EXPOSURE_RISK
    } else {
        LOW_EXPOSURE_RISK
    };
    clamp01(ai_level as f32 * (1.0 - worker.ai_augmentation_skill) * exposure)
}

/// Run the worker decision engine for one tick
pub fn update_workers(ctx: &mut SimulationContext) {
    let ai_level = ctx.frontier.level;
    let month = ctx.month;
    let supports: Vec<PolicySupport> = ctx.workers.iter().map(|w| w.policy_support).collect();

    let SimulationContext {
        workers,
        worker_index,
        rng,
        scenario,
        report,
        ..
    } = ctx;
    let dynamics = &scenario.dynamics;
    let mut exits = 0;

    let faults = process_chunked("worker_decision", workers.len(), |i| {
        let worker = &mut workers[i];
        if step_state(worker, ai_level, month, dynamics, rng) {
            exits += 1;
        }
        update_opinions(worker, &supports, worker_index, dynamics)
    });

    report.exits += exits;
    report.faults += faults;
}

/// Employment state machine. Returns true when the worker left the labor force.
pub fn step_state(
    worker: &mut WorkerAgent,
    ai_level: f64,
    month: Month,
    d: &DynamicsConfig,
    rng: &mut ChaCha8Rng,
) -> bool {
    match worker.status {
        EmploymentStatus::Employed => {
            let risk = displacement_risk(ai_level, worker);
            worker.last_displacement_risk = risk;
            worker.actively_searching = risk > worker.risk_tolerance * d.risk_tolerance_factor;
            if worker.actively_searching && !worker.wants_retraining {
                let p = d.employed_retraining_probability * (0.5 + worker.adaptability as f64);
                worker.wants_retraining = rng.gen_bool(p.min(1.0));
            }
            worker.tenure_months += 1;
            false
        }
        EmploymentStatus::Unemployed => {
            worker.unemployment_duration += 1;
            worker.actively_searching = true;
            worker.economic_anxiety += d.anxiety_increment;

            if worker.savings > 0.0 {
                worker.savings = (worker.savings - 1.0).max(0.0);
                if worker.savings == 0.0 {
                    worker.record(LifeEvent::SavingsDepleted);
                }
            } else {
                worker.policy_support.add(InterventionType::Ubi, BROKE_UBI_DRIFT);
            }

            worker.reservation_wage =
                (worker.reservation_wage * d.reservation_decay).max(worker.initial_reservation_wage * RESERVATION_FLOOR);

            if worker.unemployment_duration >= d.retraining_wait_months
                && worker.age < d.retraining_age_limit
                && !worker.wants_retraining
            {
                worker.wants_retraining = rng.gen_bool(d.unemployed_retraining_probability);
            }

            if worker.unemployment_duration >= d.exit_wait_months
                && worker.age > d.retraining_age_limit
                && rng.gen_bool(d.exit_probability)
            {
                worker.status = EmploymentStatus::OutOfLaborForce;
                worker.actively_searching = false;
                worker.wants_retraining = false;
                worker.exited_at = Some(month);
                return true;
            }
            false
        }
        // Progress is driven by the training processor
        EmploymentStatus::Retraining => false,
        // No re-entry
        EmploymentStatus::OutOfLaborForce => false,
    }
}

/// Fold pending events, network contagion, ideology and trust into the
/// worker's opinions. Fails when a contact points at an unknown worker.
pub fn update_opinions(
    worker: &mut WorkerAgent,
    supports: &[PolicySupport],
    index: &AHashMap<WorkerId, usize>,
    d: &DynamicsConfig,
) -> Result<()> {
    apply_shocks(worker);
    apply_contagion(worker, supports, index, d)?;
    apply_ideology(worker);
    apply_trust(worker, d);
    worker.clamp_scalars();
    Ok(())
}

fn apply_shocks(worker: &mut WorkerAgent) {
    use InterventionType::*;

    for event in std::mem::take(&mut worker.pending_events) {
        let support = &mut worker.policy_support;
        match event {
            LifeEvent::JobLoss => {
                worker.economic_anxiety += 0.15;
                worker.trust_in_government -= 0.03;
                support.add(Ubi, 0.08);
                support.add(Retraining, 0.03);
                support.add(WageSubsidy, 0.04);
                support.add(AiRegulation, 0.05);
            }
            LifeEvent::RetrainingSuccess => {
                worker.economic_anxiety -= 0.05;
                worker.trust_in_government += 0.04;
                support.add(Retraining, 0.08);
            }
            LifeEvent::RetrainingFailure => {
                worker.economic_anxiety += 0.05;
                worker.trust_in_government -= 0.04;
                support.add(Retraining, -0.08);
                support.add(Ubi, 0.03);
            }
            LifeEvent::UbiReceived => {
                worker.trust_in_government += 0.01;
                support.add(Ubi, 0.03);
            }
            LifeEvent::WageChange { ratio } => {
                if ratio < 1.0 {
                    worker.economic_anxiety += (1.0 - ratio) * 0.5;
                    support.add(WageSubsidy, 0.02);
                } else {
                    worker.economic_anxiety -= (ratio - 1.0).min(0.2) * 0.5;
                }
            }
            LifeEvent::SavingsDepleted => {
                worker.economic_anxiety += 0.1;
                support.add(Ubi, 0.05);
            }
        }
    }
}

fn apply_contagion(
    worker: &mut WorkerAgent,
    supports: &[PolicySupport],
    index: &AHashMap<WorkerId, usize>,
    d: &DynamicsConfig,
) -> Result<()> {
    for contact in &worker.network {
        let idx = index
            .get(&contact.worker)
            .copied()
            .ok_or_else(|| SimError::worker_fault(worker.id.0, format!("unknown contact {:?}", contact.worker)))?;
        let theirs = &supports[idx];
        let weight = contact.closeness * d.network_political_influence * d.contagion_rate;
        for kind in InterventionType::ALL {
            let own = worker.policy_support.get(kind);
            worker.policy_support.set(kind, own + (theirs.get(kind) - own) * weight);
        }
    }
    Ok(())
}

/// Left-leaning workers get floors on UBI, retraining and regulation
/// support; right-leaning workers get ceilings on UBI and regulation.
/// High anxiety halves ideology's grip on the right.
fn apply_ideology(worker: &mut WorkerAgent) {
    use InterventionType::*;

    let prior = worker.ideological_prior;
    let support = &mut worker.policy_support;
    if prior < 0.0 {
        let floor = 0.4 * -prior;
        for kind in [Ubi, Retraining, AiRegulation] {
            if support.get(kind) < floor {
                support.set(kind, floor);
            }
        }
    } else if prior > 0.0 {
        let weight = if worker.economic_anxiety > 0.7 { prior * 0.5 } else { prior };
        let ceiling = 1.0 - 0.4 * weight;
        for kind in [Ubi, AiRegulation] {
            if support.get(kind) > ceiling {
                support.set(kind, ceiling);
            }
        }
    }
}

fn apply_trust(worker: &mut WorkerAgent, d: &DynamicsConfig) {
    let trust = worker.trust_in_government;
    if trust < 0.3 {
        for kind in InterventionType::ALL {
            if !kind.is_direct_cash() {
                worker.policy_support.scale(kind, d.low_trust_discount);
            }
        }
    } else if trust > 0.7 {
        for kind in InterventionType::ALL {
            worker.policy_support.scale(kind, d.high_trust_boost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FirmId, IndustryId, RegionId};
    use crate::entity::NetworkContact;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn worker(id: u32) -> WorkerAgent {
        let mut w = WorkerAgent::new(WorkerId(id), RegionId(0), IndustryId(4));
        w.trust_in_government = 0.5;
        w.ideological_prior = 0.0;
        w
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(9)
    }

    #[test]
    fn test_risk_grows_with_capability_and_exposure() {
        let mut w = worker(0);
        w.ai_augmentation_skill = 0.2;
        let low = displacement_risk(0.1, &w);
        let high = displacement_risk(0.5, &w);
        assert!(high > low);

        w.industry = IndustryId(0); // manufacturing, high exposure
        assert!(displacement_risk(0.5, &w) > high);

        w.ai_augmentation_skill = 1.0;
        assert_eq!(displacement_risk(0.9, &w), 0.0);
    }

    #[test]
    fn test_employed_worker_searches_when_risk_exceeds_tolerance() {
        let d = DynamicsConfig::default();
        let mut w = worker(0);
        w.status = EmploymentStatus::Employed;
        w.employer = Some(FirmId(0));
        w.industry = IndustryId(0);
        w.ai_augmentation_skill = 0.0;
        w.risk_tolerance = 0.2;

        step_state(&mut w, 0.6, 1, &d, &mut rng());
        assert!(w.actively_searching);
        assert_eq!(w.tenure_months, 1);

        w.risk_tolerance = 1.0;
        step_state(&mut w, 0.1, 2, &d, &mut rng());
        assert!(!w.actively_searching);
        assert_eq!(w.tenure_months, 2);
    }

    #[test]
    fn test_unemployed_spell_bookkeeping() {
        let d = DynamicsConfig::default();
        let mut w = worker(0);
        w.savings = 1.5;
        w.economic_anxiety = 0.3;
        w.reservation_wage = 3000.0;
        w.initial_reservation_wage = 3000.0;

        step_state(&mut w, 0.1, 1, &d, &mut rng());
        assert_eq!(w.unemployment_duration, 1);
        assert!((w.savings - 0.5).abs() < 1e-6);
        assert!((w.economic_anxiety - 0.32).abs() < 1e-6);
        assert!(w.reservation_wage < 3000.0);
        assert!(w.pending_events.is_empty());

        step_state(&mut w, 0.1, 2, &d, &mut rng());
        assert_eq!(w.savings, 0.0);
        assert_eq!(w.pending_events, vec![LifeEvent::SavingsDepleted]);

        let before = w.policy_support.get(InterventionType::Ubi);
        step_state(&mut w, 0.1, 3, &d, &mut rng());
        assert!(w.policy_support.get(InterventionType::Ubi) > before);
    }

    #[test]
    fn test_reservation_wage_floor() {
        let d = DynamicsConfig::default();
        let mut w = worker(0);
        w.reservation_wage = 3000.0;
        w.initial_reservation_wage = 3000.0;
        w.age = 30;
        for m in 1..200 {
            step_state(&mut w, 0.1, m, &d, &mut rng());
        }
        assert!((w.reservation_wage - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn test_long_term_unemployed_request_retraining() {
        let mut d = DynamicsConfig::default();
        d.unemployed_retraining_probability = 1.0;
        let mut w = worker(0);
        w.age = 30;
        w.unemployment_duration = 5;
        step_state(&mut w, 0.1, 1, &d, &mut rng());
        assert!(w.wants_retraining);

        let mut older = worker(1);
        older.age = 60;
        older.unemployment_duration = 5;
        step_state(&mut older, 0.1, 1, &d, &mut rng());
        assert!(!older.wants_retraining);
    }

    #[test]
    fn test_older_long_term_unemployed_can_exit() {
        let mut d = DynamicsConfig::default();
        d.exit_probability = 1.0;
        let mut w = worker(0);
        w.age = 60;
        w.unemployment_duration = 17;
        assert!(step_state(&mut w, 0.1, 30, &d, &mut rng()));
        assert_eq!(w.status, EmploymentStatus::OutOfLaborForce);
        assert_eq!(w.exited_at, Some(30));

        // Terminal: nothing changes afterwards
        let duration = w.unemployment_duration;
        assert!(!step_state(&mut w, 0.1, 31, &d, &mut rng()));
        assert_eq!(w.unemployment_duration, duration);
    }

    #[test]
    fn test_job_loss_shock() {
        let d = DynamicsConfig::default();
        let mut w = worker(0);
        w.policy_support = PolicySupport::uniform(0.5);
        w.economic_anxiety = 0.3;
        w.record(LifeEvent::JobLoss);

        update_opinions(&mut w, &[], &AHashMap::new(), &d).unwrap();
        assert!(w.pending_events.is_empty());
        assert!((w.economic_anxiety - 0.45).abs() < 1e-6);
        assert!((w.policy_support.get(InterventionType::Ubi) - 0.58).abs() < 1e-6);
    }

    #[test]
    fn test_contagion_pulls_toward_contacts() {
        let d = DynamicsConfig::default();
        let mut a = worker(0);
        a.policy_support = PolicySupport::uniform(0.2);
        a.network.push(NetworkContact { worker: WorkerId(1), closeness: 1.0 });
        let mut b = worker(1);
        b.policy_support = PolicySupport::uniform(0.9);

        let supports = vec![a.policy_support, b.policy_support];
        let index: AHashMap<WorkerId, usize> = [(a.id, 0), (b.id, 1)].into_iter().collect();
        update_opinions(&mut a, &supports, &index, &d).unwrap();

        let ubi = a.policy_support.get(InterventionType::Ubi);
        assert!(ubi > 0.2 && ubi < 0.9);
        // 0.2 + 0.7 * (1.0 * 0.5 * 0.02)
        assert!((ubi - 0.207).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_contact_is_a_fault() {
        let d = DynamicsConfig::default();
        let mut a = worker(0);
        a.network.push(NetworkContact { worker: WorkerId(77), closeness: 0.5 });
        let err = update_opinions(&mut a, &[], &AHashMap::new(), &d).unwrap_err();
        assert!(matches!(err, SimError::AgentFault { kind: "worker", id: 0, .. }));
    }

    #[test]
    fn test_update_workers_resolves_contacts_by_id() {
        use crate::core::config::ScenarioConfig;

        let mut a = worker(10);
        a.network.push(NetworkContact { worker: WorkerId(20), closeness: 1.0 });
        let mut b = worker(20);
        b.network.push(NetworkContact { worker: WorkerId(99), closeness: 1.0 });
        let mut ctx = SimulationContext::new(ScenarioConfig::default(), vec![a, b], Vec::new(), Vec::new(), rng(), 9);

        update_workers(&mut ctx);
        // Only the dangling contact faults
        assert_eq!(ctx.report.faults, 1);
    }

    #[test]
    fn test_left_floor_and_right_ceiling() {
        let d = DynamicsConfig::default();

        let mut left = worker(0);
        left.ideological_prior = -1.0;
        left.policy_support = PolicySupport::uniform(0.0);
        update_opinions(&mut left, &[], &AHashMap::new(), &d).unwrap();
        assert!((left.policy_support.get(InterventionType::Ubi) - 0.4).abs() < 1e-6);
        assert!((left.policy_support.get(InterventionType::Retraining) - 0.4).abs() < 1e-6);
        assert_eq!(left.policy_support.get(InterventionType::WageSubsidy), 0.0);

        let mut right = worker(1);
        right.ideological_prior = 1.0;
        right.economic_anxiety = 0.2;
        right.policy_support = PolicySupport::uniform(1.0);
        update_opinions(&mut right, &[], &AHashMap::new(), &d).unwrap();
        assert!((right.policy_support.get(InterventionType::Ubi) - 0.6).abs() < 1e-6);
        assert_eq!(right.policy_support.get(InterventionType::Retraining), 1.0);

        let mut anxious = worker(2);
        anxious.ideological_prior = 1.0;
        anxious.economic_anxiety = 0.9;
        anxious.policy_support = PolicySupport::uniform(1.0);
        update_opinions(&mut anxious, &[], &AHashMap::new(), &d).unwrap();
        assert!((anxious.policy_support.get(InterventionType::Ubi) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_low_trust_spares_direct_cash() {
        let d = DynamicsConfig::default();
        let mut w = worker(0);
        w.trust_in_government = 0.1;
        w.policy_support = PolicySupport::uniform(0.5);
        update_opinions(&mut w, &[], &AHashMap::new(), &d).unwrap();
        assert_eq!(w.policy_support.get(InterventionType::Ubi), 0.5);
        assert!(w.policy_support.get(InterventionType::Retraining) < 0.5);

        let mut trusting = worker(1);
        trusting.trust_in_government = 0.9;
        trusting.policy_support = PolicySupport::uniform(0.5);
        update_opinions(&mut trusting, &[], &AHashMap::new(), &d).unwrap();
        assert!(trusting.policy_support.get(InterventionType::Ubi) > 0.5);
    }

    fn any_event() -> impl Strategy<Value = LifeEvent> {
        prop_oneof![
            Just(LifeEvent::JobLoss),
            Just(LifeEvent::RetrainingSuccess),
            Just(LifeEvent::RetrainingFailure),
            Just(LifeEvent::UbiReceived),
            Just(LifeEvent::SavingsDepleted),
            (0.1f32..3.0).prop_map(|ratio| LifeEvent::WageChange { ratio }),
        ]
    }

    proptest! {
        #[test]
        fn test_opinions_stay_clamped(
            own in prop::array::uniform4(0.0f32..=1.0),
            theirs in prop::array::uniform4(0.0f32..=1.0),
            prior in -1.0f32..=1.0,
            anxiety in 0.0f32..=1.0,
            trust in 0.0f32..=1.0,
            closeness in 0.0f32..=1.0,
            events in prop::collection::vec(any_event(), 0..8),
        ) {
            let d = DynamicsConfig::default();
            let mut w = worker(0);
            w.policy_support = PolicySupport::new(own);
            w.ideological_prior = prior;
            w.economic_anxiety = anxiety;
            w.trust_in_government = trust;
            w.pending_events = events;
            w.network = vec![NetworkContact { worker: WorkerId(1), closeness }];

            let mut index = AHashMap::new();
            index.insert(WorkerId(1), 1);
            let supports = [PolicySupport::new(own), PolicySupport::new(theirs)];

            update_opinions(&mut w, &supports, &index, &d).unwrap();
            prop_assert!(w.policy_support.is_clamped());
            for (_, value) in w.policy_support.iter() {
                prop_assert!((0.0..=1.0).contains(&value));
            }
        }
    }
}
