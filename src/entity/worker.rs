//! Worker agents: demographics, employment state and behavioral scalars

use serde::{Deserialize, Serialize};

use crate::core::types::{clamp01, FirmId, IndustryId, Month, ProgramId, RegionId, WorkerId};
use crate::entity::policy::PolicySupport;

/// Number of dimensions in a worker's skill vector
pub const SKILL_DIMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    None,
    HighSchool,
    SomeCollege,
    Bachelor,
    Advanced,
}

impl EducationLevel {
    /// Wage multiplier relative to an industry's base wage
    pub fn wage_multiplier(&self) -> f64 {
        match self {
            EducationLevel::None => 0.7,
            EducationLevel::HighSchool => 0.85,
            EducationLevel::SomeCollege => 0.95,
            EducationLevel::Bachelor => 1.15,
            EducationLevel::Advanced => 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Retraining,
    OutOfLaborForce,
}

/// A weighted link to another worker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkContact {
    pub worker: WorkerId,
    /// 0.0 = acquaintance, 1.0 = close family
    pub closeness: f32,
}

/// Something that happened to a worker this tick and shapes their opinions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LifeEvent {
    JobLoss,
    RetrainingSuccess,
    RetrainingFailure,
    UbiReceived,
    /// Ratio of new wage to old wage
    WageChange { ratio: f32 },
    SavingsDepleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAgent {
    pub id: WorkerId,
    pub age: u32,
    pub education: EducationLevel,
    pub region: RegionId,
    pub status: EmploymentStatus,
    /// Set iff status is Employed
    pub employer: Option<FirmId>,
    pub industry: IndustryId,
    pub tenure_months: u32,
    pub skills: [f32; SKILL_DIMS],
    pub ai_augmentation_skill: f32,
    pub adaptability: f32,
    /// Monthly wage
    pub wage: f64,
    /// Months of expenses the worker can cover
    pub savings: f32,
    pub reservation_wage: f64,
    pub initial_reservation_wage: f64,
    pub risk_tolerance: f32,
    pub mobility_willingness: f32,
    pub network: Vec<NetworkContact>,

    pub unemployment_duration: u32,
    pub unemployment_spells: u32,
    pub actively_searching: bool,
    pub wants_retraining: bool,
    pub enrolled_program: Option<ProgramId>,
    pub training_progress: f32,
    pub last_displacement_risk: f32,
    pub exited_at: Option<Month>,

    pub policy_support: PolicySupport,
    pub political_engagement: f32,
    /// -1.0 = strongly left, 1.0 = strongly right
    pub ideological_prior: f32,
    pub economic_anxiety: f32,
    pub trust_in_government: f32,
    pub information_level: f32,

    /// Events waiting to be folded into opinions
    pub pending_events: Vec<LifeEvent>,
}

impl WorkerAgent {
    pub fn new(id: WorkerId, region: RegionId, industry: IndustryId) -> Self {
        Self {
            id,
            age: 40,
            education: EducationLevel::HighSchool,
            region,
            status: EmploymentStatus::Unemployed,
            employer: None,
            industry,
            tenure_months: 0,
            skills: [0.5; SKILL_DIMS],
            ai_augmentation_skill: 0.2,
            adaptability: 0.5,
            wage: 0.0,
            savings: 3.0,
            reservation_wage: 0.0,
            initial_reservation_wage: 0.0,
            risk_tolerance: 0.5,
            mobility_willingness: 0.3,
            network: Vec::new(),
            unemployment_duration: 0,
            unemployment_spells: 0,
            actively_searching: false,
            wants_retraining: false,
            enrolled_program: None,
            training_progress: 0.0,
            last_displacement_risk: 0.0,
            exited_at: None,
            policy_support: PolicySupport::default(),
            political_engagement: 0.5,
            ideological_prior: 0.0,
            economic_anxiety: 0.3,
            trust_in_government: 0.5,
            information_level: 0.5,
            pending_events: Vec::new(),
        }
    }

    pub fn is_employed(&self) -> bool {
        self.status == EmploymentStatus::Employed
    }

    pub fn is_unemployed(&self) -> bool {
        self.status == EmploymentStatus::Unemployed
    }

    pub fn in_labor_force(&self) -> bool {
        self.status != EmploymentStatus::OutOfLaborForce
    }

    /// Searching for work while unemployed; the matcher only sees these
    pub fn is_job_seeker(&self) -> bool {
        self.is_unemployed() && self.actively_searching
    }

    pub fn record(&mut self, event: LifeEvent) {
        self.pending_events.push(event);
    }

    /// Mean of the skill vector
    pub fn skill_level(&self) -> f32 {
        self.skills.iter().sum::<f32>() / SKILL_DIMS as f32
    }

    /// Put every [0, 1]-scaled field back in range
    pub fn clamp_scalars(&mut self) {
        self.ai_augmentation_skill = clamp01(self.ai_augmentation_skill);
        self.adaptability = clamp01(self.adaptability);
        self.risk_tolerance = clamp01(self.risk_tolerance);
        self.mobility_willingness = clamp01(self.mobility_willingness);
        self.political_engagement = clamp01(self.political_engagement);
        self.ideological_prior = self.ideological_prior.clamp(-1.0, 1.0);
        self.economic_anxiety = clamp01(self.economic_anxiety);
        self.trust_in_government = clamp01(self.trust_in_government);
        self.information_level = clamp01(self.information_level);
        self.last_displacement_risk = clamp01(self.last_displacement_risk);
        for s in self.skills.iter_mut() {
            *s = clamp01(*s);
        }
        for c in self.network.iter_mut() {
            c.closeness = clamp01(c.closeness);
        }
        self.policy_support.clamp_all();
        self.savings = self.savings.max(0.0);
    }

    /// Reset unemployment bookkeeping and mark as a fresh job seeker
    pub(crate) fn begin_unemployment(&mut self) {
        self.status = EmploymentStatus::Unemployed;
        self.employer = None;
        self.tenure_months = 0;
        self.unemployment_duration = 0;
        self.unemployment_spells += 1;
        self.actively_searching = true;
    }
}
