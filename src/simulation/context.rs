//! SimulationContext - the state container every system operates on

use ahash::AHashMap;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{DynamicsConfig, ScenarioConfig};
use crate::core::error::{Result, SimError};
use crate::core::types::{FirmId, Month, PostingId, WorkerId};
use crate::entity::{EmploymentStatus, FirmAgent, JobPosting, LifeEvent, TrainingProgramAgent, WorkerAgent};
use crate::simulation::frontier::AiCapabilityFrontier;

/// Number of agents processed per fault-isolation chunk
pub const AGENT_CHUNK_SIZE: usize = 256;

/// Policy levers set by the intervention applier and read by other systems
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolicyLevers {
    /// Probability that a candidate layoff is retained by the wage subsidy
    pub wage_subsidy_coverage: f64,
}

/// Activity counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub hires: u32,
    pub layoffs: u32,
    pub admissions: u32,
    pub graduations: u32,
    pub dropouts: u32,
    pub adoptions: u32,
    pub exits: u32,
    /// Agents skipped this tick because their step failed
    pub faults: u32,
}

/// Head counts by employment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmploymentCounts {
    pub employed: usize,
    pub unemployed: usize,
    pub retraining: usize,
    pub out_of_labor_force: usize,
}

impl EmploymentCounts {
    pub fn total(&self) -> usize {
        self.employed + self.unemployed + self.retraining + self.out_of_labor_force
    }

    /// Everyone not out of the labor force; trainees are still in it
    pub fn labor_force(&self) -> usize {
        self.employed + self.unemployed + self.retraining
    }

    pub fn unemployment_rate(&self) -> f64 {
        let lf = self.labor_force();
        if lf == 0 {
            0.0
        } else {
            self.unemployed as f64 / lf as f64
        }
    }
}

/// All agents plus the engine state for one run.
///
/// Agents live in dense vectors and reference each other by id; the
/// id→index maps make every lookup O(1).
#[derive(Clone)]
pub struct SimulationContext {
    pub scenario: ScenarioConfig,
    pub workers: Vec<WorkerAgent>,
    pub firms: Vec<FirmAgent>,
    pub programs: Vec<TrainingProgramAgent>,
    /// Fixed after construction; workers are never added or removed
    pub(crate) worker_index: AHashMap<WorkerId, usize>,
    firm_index: AHashMap<FirmId, usize>,
    pub frontier: AiCapabilityFrontier,
    pub levers: PolicyLevers,
    /// Last completed month (0 = freshly initialized)
    pub month: Month,
    /// Random number generator (deterministic for a given seed)
    pub rng: ChaCha8Rng,
    pub seed: u64,
    pub report: TickReport,
    next_posting_id: u64,
}

impl SimulationContext {
    pub fn new(
        scenario: ScenarioConfig,
        workers: Vec<WorkerAgent>,
        firms: Vec<FirmAgent>,
        programs: Vec<TrainingProgramAgent>,
        rng: ChaCha8Rng,
        seed: u64,
    ) -> Self {
        let worker_index = workers.iter().enumerate().map(|(i, w)| (w.id, i)).collect();
        let firm_index = firms.iter().enumerate().map(|(i, f)| (f.id, i)).collect();
        let frontier = AiCapabilityFrontier::new(
            scenario.initial_ai_level,
            scenario.adoption_curve,
            scenario.automation_pace,
        );

        Self {
            scenario,
            workers,
            firms,
            programs,
            worker_index,
            firm_index,
            frontier,
            levers: PolicyLevers::default(),
            month: 0,
            rng,
            seed,
            report: TickReport::default(),
            next_posting_id: 1,
        }
    }

    pub fn dynamics(&self) -> &DynamicsConfig {
        &self.scenario.dynamics
    }

    pub fn worker_idx(&self, id: WorkerId) -> Option<usize> {
        self.worker_index.get(&id).copied()
    }

    pub fn firm_idx(&self, id: FirmId) -> Option<usize> {
        self.firm_index.get(&id).copied()
    }

    pub fn worker(&self, id: WorkerId) -> Option<&WorkerAgent> {
        self.worker_idx(id).map(|i| &self.workers[i])
    }

    pub fn firm(&self, id: FirmId) -> Option<&FirmAgent> {
        self.firm_idx(id).map(|i| &self.firms[i])
    }

    pub fn next_posting_id(&mut self) -> PostingId {
        let id = PostingId(self.next_posting_id);
        self.next_posting_id += 1;
        id
    }

    /// Hire a worker into a posting, keeping both sides of the employment
    /// link consistent
    pub fn hire(&mut self, worker_idx: usize, posting: &JobPosting) -> Result<()> {
        let firm_idx = self
            .firm_idx(posting.firm)
            .ok_or_else(|| SimError::worker_fault(self.workers[worker_idx].id.0, "posting from unknown firm"))?;

        let worker = &mut self.workers[worker_idx];
        let old_wage = worker.wage;
        worker.status = EmploymentStatus::Employed;
        worker.employer = Some(posting.firm);
        worker.industry = posting.industry;
        worker.wage = posting.wage;
        worker.tenure_months = 0;
        worker.unemployment_duration = 0;
        worker.actively_searching = false;
        worker.wants_retraining = false;
        worker.economic_anxiety = (worker.economic_anxiety - 0.1).max(0.0);
        worker.reservation_wage = worker.reservation_wage.max(posting.wage * 0.7);
        if old_wage > 0.0 {
            worker.record(LifeEvent::WageChange { ratio: (posting.wage / old_wage) as f32 });
        }
        let worker_id = worker.id;

        let firm = &mut self.firms[firm_idx];
        firm.employees.insert(worker_id);
        firm.total_hires += 1;
        Ok(())
    }

    /// Cut the employment link of a worker, removing them from the
    /// employer's roster. Status is left to the caller.
    pub fn detach_from_employer(&mut self, worker_idx: usize) -> Result<()> {
        let worker = &mut self.workers[worker_idx];
        let Some(firm_id) = worker.employer.take() else {
            return Ok(());
        };
        let worker_id = worker.id;
        match self.firm_index.get(&firm_id) {
            Some(&fi) => {
                self.firms[fi].employees.remove(&worker_id);
                Ok(())
            }
            None => Err(SimError::worker_fault(worker_id.0, format!("dangling employer {:?}", firm_id))),
        }
    }

    pub fn employment_counts(&self) -> EmploymentCounts {
        let mut counts = EmploymentCounts::default();
        for w in &self.workers {
            match w.status {
                EmploymentStatus::Employed => counts.employed += 1,
                EmploymentStatus::Unemployed => counts.unemployed += 1,
                EmploymentStatus::Retraining => counts.retraining += 1,
                EmploymentStatus::OutOfLaborForce => counts.out_of_labor_force += 1,
            }
        }
        counts
    }

    pub fn unemployment_rate(&self) -> f64 {
        self.employment_counts().unemployment_rate()
    }

    /// Share of firms at Piloting or beyond
    pub fn ai_adoption_rate(&self) -> f64 {
        if self.firms.is_empty() {
            return 0.0;
        }
        let adopters = self.firms.iter().filter(|f| f.adoption_status.is_adopter()).count();
        adopters as f64 / self.firms.len() as f64
    }

    /// Check the employment link in both directions and program capacity.
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for w in &self.workers {
            match (w.status, w.employer) {
                (EmploymentStatus::Employed, Some(firm_id)) => {
                    let firm = self
                        .firm(firm_id)
                        .ok_or_else(|| format!("worker {:?} employed by unknown firm {:?}", w.id, firm_id))?;
                    if !firm.employees.contains(&w.id) {
                        return Err(format!("worker {:?} missing from roster of {:?}", w.id, firm_id));
                    }
                }
                (EmploymentStatus::Employed, None) => {
                    return Err(format!("worker {:?} employed without employer", w.id));
                }
                (status, Some(firm_id)) => {
                    return Err(format!("worker {:?} is {:?} but has employer {:?}", w.id, status, firm_id));
                }
                (_, None) => {}
            }
            if !w.policy_support.is_clamped() {
                return Err(format!("worker {:?} policy support out of range", w.id));
            }
        }

        for f in &self.firms {
            for &wid in &f.employees {
                let worker = self
                    .worker(wid)
                    .ok_or_else(|| format!("firm {:?} lists unknown worker {:?}", f.id, wid))?;
                if worker.employer != Some(f.id) {
                    return Err(format!("firm {:?} lists {:?} who works for {:?}", f.id, wid, worker.employer));
                }
            }
        }

        for p in &self.programs {
            if p.enrolled.len() as u32 > p.capacity {
                return Err(format!("program {:?} over capacity", p.id));
            }
        }

        Ok(())
    }
}

/// Run `step` over `0..len` in fixed-size chunks. A failing agent is logged
/// and skipped; the rest of the chunk and later chunks still run. Returns
/// the number of faults.
pub fn process_chunked<F>(system: &'static str, len: usize, mut step: F) -> u32
where
    F: FnMut(usize) -> Result<()>,
{
    let mut faults = 0;
    for chunk_start in (0..len).step_by(AGENT_CHUNK_SIZE) {
        let chunk_end = (chunk_start + AGENT_CHUNK_SIZE).min(len);
        for idx in chunk_start..chunk_end {
            if let Err(err) = step(idx) {
                tracing::warn!(system, index = idx, error = %err, "skipping agent after fault");
                faults += 1;
            }
        }
    }
    faults
}
