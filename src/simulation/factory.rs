//! Initial population generation
//!
//! Builds workers, firms and training programs from a scenario, assigns the
//! initial employment, wires each worker's social network and each firm's
//! competitor set.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::ScenarioConfig;
use crate::core::error::Result;
use crate::core::types::{FirmId, IndustryId, ProgramId, RegionId, WorkerId, INDUSTRIES};
use crate::entity::worker::SKILL_DIMS;
use crate::entity::{
    EducationLevel, EmploymentStatus, FirmAgent, LaborStrategy, NetworkContact, PolicySupport, ProgramType,
    SizeClass, TrainingProgramAgent, WorkerAgent,
};
use crate::simulation::context::SimulationContext;

/// Maximum number of same-industry competitors tracked per firm
pub const MAX_COMPETITORS: usize = 10;

/// Cumulative size-class distribution: 60% small, 25% medium, 12% large, 3% enterprise
const SIZE_DISTRIBUTION: [(f64, SizeClass); 4] = [
    (0.60, SizeClass::Small),
    (0.85, SizeClass::Medium),
    (0.97, SizeClass::Large),
    (1.00, SizeClass::Enterprise),
];

const EDUCATION_DISTRIBUTION: [(f64, EducationLevel); 5] = [
    (0.08, EducationLevel::None),
    (0.35, EducationLevel::HighSchool),
    (0.60, EducationLevel::SomeCollege),
    (0.85, EducationLevel::Bachelor),
    (1.00, EducationLevel::Advanced),
];

/// Build a fully wired context for the scenario.
///
/// Uses the scenario seed when given, otherwise draws one from the system
/// RNG; the seed actually used is stored on the context.
pub fn build_context(scenario: ScenarioConfig) -> Result<SimulationContext> {
    scenario.validate()?;

    let seed = scenario.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut workers = generate_workers(&scenario, &mut rng);
    let mut firms = generate_firms(&scenario, &mut rng);

    let employed = assign_unemployment(&scenario, &mut workers, &mut rng);
    scale_targets(&mut firms, employed.len(), &mut rng);
    seed_initial_adoption(&scenario, &mut firms, &mut rng);
    assign_initial_employment(&mut workers, &mut firms, &employed);
    build_networks(&scenario, &mut workers, &mut rng);
    assign_competitors(&mut firms);
    let programs = generate_programs(&scenario, &mut rng);

    tracing::info!(
        seed,
        workers = workers.len(),
        firms = firms.len(),
        programs = programs.len(),
        "generated initial population"
    );

    Ok(SimulationContext::new(scenario, workers, firms, programs, rng, seed))
}

fn pick<T: Copy>(table: &[(f64, T)], roll: f64) -> T {
    table
        .iter()
        .find(|(threshold, _)| roll < *threshold)
        .map(|(_, v)| *v)
        .unwrap_or(table[table.len() - 1].1)
}

fn generate_workers(scenario: &ScenarioConfig, rng: &mut ChaCha8Rng) -> Vec<WorkerAgent> {
    let regions = scenario.region_count() as u32;
    let mut workers = Vec::with_capacity(scenario.worker_count());

    for i in 0..scenario.worker_count() as u32 {
        let region = RegionId(rng.gen_range(0..regions));
        let industry = IndustryId(rng.gen_range(0..INDUSTRIES.len() as u8));
        let mut w = WorkerAgent::new(WorkerId(i), region, industry);

        w.age = rng.gen_range(18..=64);
        w.education = pick(&EDUCATION_DISTRIBUTION, rng.gen());
        let edu_bonus = w.education as u8 as f32 * 0.05;

        for s in 0..SKILL_DIMS {
            w.skills[s] = rng.gen_range(0.2..0.8) + edu_bonus;
        }
        w.ai_augmentation_skill = rng.gen_range(0.05..0.45) + edu_bonus;
        w.adaptability = rng.gen_range(0.2..0.9) - (w.age as f32 - 40.0) * 0.005;
        w.risk_tolerance = rng.gen_range(0.2..0.9);
        w.mobility_willingness = rng.gen::<f32>().powi(2);
        w.savings = rng.gen_range(0.5..6.0);

        w.wage = industry.info().base_wage * w.education.wage_multiplier() * rng.gen_range(0.85..1.15);
        w.reservation_wage = w.wage * rng.gen_range(0.6..0.8);
        w.initial_reservation_wage = w.reservation_wage;

        w.ideological_prior = rng.gen_range(-1.0..1.0);
        w.political_engagement = rng.gen_range(0.1..0.9);
        w.economic_anxiety = rng.gen_range(0.15..0.4);
        w.trust_in_government = rng.gen_range(0.2..0.8);
        w.information_level = rng.gen_range(0.3..0.7);

        let prior = w.ideological_prior;
        w.policy_support = PolicySupport::new([
            0.45 - 0.25 * prior + opinion_noise(rng),
            0.6 - 0.1 * prior + opinion_noise(rng),
            0.5 - 0.1 * prior + opinion_noise(rng),
            0.5 - 0.2 * prior + opinion_noise(rng),
        ]);

        w.clamp_scalars();
        workers.push(w);
    }

    workers
}

fn opinion_noise(rng: &mut ChaCha8Rng) -> f32 {
    rng.gen_range(-0.1..0.1)
}

/// Mark exactly `round(n × rate)` workers unemployed. Returns the indices of
/// the remaining workers, shuffled, which are to be placed into firms.
fn assign_unemployment(scenario: &ScenarioConfig, workers: &mut [WorkerAgent], rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..workers.len()).collect();
    order.shuffle(rng);

    let unemployed = ((workers.len() as f64) * scenario.initial_unemployment_rate).round() as usize;
    for &idx in &order[..unemployed] {
        let w = &mut workers[idx];
        w.status = EmploymentStatus::Unemployed;
        w.actively_searching = true;
        w.unemployment_duration = rng.gen_range(0..6);
        w.unemployment_spells = 1;
        w.savings = (w.savings - w.unemployment_duration as f32).max(0.0);
    }

    order.split_off(unemployed)
}

fn generate_firms(scenario: &ScenarioConfig, rng: &mut ChaCha8Rng) -> Vec<FirmAgent> {
    let regions = scenario.region_count() as u32;
    (0..scenario.firm_count() as u32)
        .map(|i| {
            let size_class = pick(&SIZE_DISTRIBUTION, rng.gen());
            let industry = IndustryId(rng.gen_range(0..INDUSTRIES.len() as u8));
            let region = RegionId(rng.gen_range(0..regions));
            let mut firm = FirmAgent::new(FirmId(i), industry, region, size_class);

            let (lo, hi) = size_class.headcount_band();
            firm.target_headcount = rng.gen_range(lo..=hi);
            firm.innovativeness = rng.gen_range(0.0..1.0);
            firm.labor_strategy = match rng.gen::<f64>() {
                r if r < 0.3 => LaborStrategy::CostMinimizer,
                r if r < 0.8 => LaborStrategy::Balanced,
                _ => LaborStrategy::TalentInvestor,
            };
            firm
        })
        .collect()
}

/// Rescale raw targets so total target headcount covers the employed
/// population. Rounds up, so every employed worker finds a seat.
fn scale_targets(firms: &mut [FirmAgent], employed: usize, rng: &mut ChaCha8Rng) {
    let raw_total: u32 = firms.iter().map(|f| f.target_headcount).sum();
    if raw_total == 0 || employed == 0 {
        return;
    }
    let factor = employed as f64 / raw_total as f64;
    for firm in firms.iter_mut() {
        let jitter = rng.gen_range(1.0..1.05);
        firm.target_headcount = ((firm.target_headcount as f64 * factor * jitter).ceil() as u32).max(1);
    }
}

/// Start `round(firms × initialAIAdoption)` firms at the Piloting stage
fn seed_initial_adoption(scenario: &ScenarioConfig, firms: &mut [FirmAgent], rng: &mut ChaCha8Rng) {
    let count = (firms.len() as f64 * scenario.initial_ai_adoption).round() as usize;
    let mut order: Vec<usize> = (0..firms.len()).collect();
    order.shuffle(rng);
    let d = &scenario.dynamics;
    for &idx in order.iter().take(count) {
        // None -> Exploring -> Piloting
        firms[idx].advance_adoption(d.automation_step, d.max_automation);
        firms[idx].advance_adoption(d.automation_step, d.max_automation);
    }
}

/// Greedily fill each firm up to its target from the shuffled employed set.
/// Any worker left without a seat becomes unemployed.
fn assign_initial_employment(workers: &mut [WorkerAgent], firms: &mut [FirmAgent], employed: &[usize]) {
    let mut cursor = 0;
    for firm in firms.iter_mut() {
        while firm.employees.len() < firm.target_headcount as usize && cursor < employed.len() {
            let w = &mut workers[employed[cursor]];
            w.status = EmploymentStatus::Employed;
            w.employer = Some(firm.id);
            w.industry = firm.industry;
            w.tenure_months = (w.age.saturating_sub(18)) * 3;
            firm.employees.insert(w.id);
            cursor += 1;
        }
    }

    for &idx in &employed[cursor..] {
        let w = &mut workers[idx];
        w.status = EmploymentStatus::Unemployed;
        w.actively_searching = true;
    }
}

fn build_networks(scenario: &ScenarioConfig, workers: &mut [WorkerAgent], rng: &mut ChaCha8Rng) {
    let d = &scenario.dynamics;
    let mut by_region: Vec<Vec<usize>> = vec![Vec::new(); scenario.region_count()];
    for (idx, w) in workers.iter().enumerate() {
        by_region[w.region.0 as usize].push(idx);
    }

    let n = workers.len();
    for idx in 0..n {
        if n < 2 {
            break;
        }
        let peers = &by_region[workers[idx].region.0 as usize];
        let wanted = rng.gen_range(3..=d.max_contacts.max(3)).min(n - 1);
        let mut contacts: Vec<NetworkContact> = Vec::with_capacity(wanted);
        let mut attempts = 0;

        while contacts.len() < wanted && attempts < wanted * 4 {
            attempts += 1;
            let cross_region = peers.len() < 2 || rng.gen_bool(d.cross_region_fraction);
            let (other, closeness) = if cross_region {
                (rng.gen_range(0..n), rng.gen_range(0.1..0.5))
            } else {
                // Weighted toward strong ties: closeness skews high
                (peers[rng.gen_range(0..peers.len())], 0.3 + 0.7 * rng.gen::<f32>().sqrt())
            };
            let other_id = workers[other].id;
            if other == idx || contacts.iter().any(|c| c.worker == other_id) {
                continue;
            }
            contacts.push(NetworkContact { worker: other_id, closeness });
        }

        workers[idx].network = contacts;
    }
}

fn assign_competitors(firms: &mut [FirmAgent]) {
    let profile: Vec<(FirmId, IndustryId)> = firms.iter().map(|f| (f.id, f.industry)).collect();
    for firm in firms.iter_mut() {
        firm.competitors = profile
            .iter()
            .filter(|(id, industry)| *id != firm.id && *industry == firm.industry)
            .map(|(id, _)| *id)
            .take(MAX_COMPETITORS)
            .collect();
    }
}

fn generate_programs(scenario: &ScenarioConfig, rng: &mut ChaCha8Rng) -> Vec<TrainingProgramAgent> {
    let count = scenario.program_count();
    if count == 0 {
        return Vec::new();
    }
    let regions = scenario.region_count() as u32;
    let capacity = ((scenario.worker_count() / (count * 10)) as u32).max(5);

    (0..count as u32)
        .map(|i| {
            let program_type = ProgramType::ALL[i as usize % ProgramType::ALL.len()];
            let mut p = TrainingProgramAgent::new(ProgramId(i), program_type, RegionId(i % regions), capacity);
            p.completion_rate = rng.gen_range(0.6..0.9);
            p.placement_rate = rng.gen_range(0.4..0.8);
            p.subsidy_level = scenario.training_subsidy;
            p
        })
        .collect()
}
