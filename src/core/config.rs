//! Scenario configuration with documented constants
//!
//! `ScenarioConfig` is the surface a caller hands to `init`. Behavioral
//! constants live in `DynamicsConfig` with explanations of what they drive;
//! changing them changes the pacing of the labor market.

use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::entity::policy::InterventionType;

/// Growth function for the AI capability frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionCurve {
    Linear,
    Exponential,
    #[default]
    SCurve,
}

/// How quickly AI capability advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationPace {
    Slow,
    #[default]
    Moderate,
    Fast,
    Accelerating,
}

impl AutomationPace {
    pub fn multiplier(&self) -> f64 {
        match self {
            AutomationPace::Slow => 0.5,
            AutomationPace::Moderate => 1.0,
            AutomationPace::Fast => 1.5,
            AutomationPace::Accelerating => 2.0,
        }
    }
}

/// A policy intervention toggled for a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    #[serde(rename = "type")]
    pub intervention_type: InterventionType,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub parameters: AHashMap<String, f64>,
}

fn default_true() -> bool {
    true
}

impl Intervention {
    pub fn new(intervention_type: InterventionType) -> Self {
        Self {
            intervention_type,
            active: true,
            parameters: AHashMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }

    /// Read a numeric parameter, falling back to `default` when absent
    pub fn param(&self, key: &str, default: f64) -> f64 {
        self.parameters.get(key).copied().unwrap_or(default)
    }
}

/// Everything a caller supplies to start a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    pub num_workers: i64,
    pub num_firms: i64,
    pub num_training_programs: i64,
    pub num_regions: i64,
    pub duration_months: u32,
    pub initial_unemployment_rate: f64,
    /// Fraction of firms that start at the Piloting stage
    #[serde(rename = "initialAIAdoption", alias = "initialAiAdoption")]
    pub initial_ai_adoption: f64,
    #[serde(rename = "initialAILevel", alias = "initialAiLevel")]
    pub initial_ai_level: f64,
    pub adoption_curve: AdoptionCurve,
    pub automation_pace: AutomationPace,
    pub interventions: Vec<Intervention>,
    /// Starting subsidy level of every training program, 0.0 to 1.0
    pub training_subsidy: f32,
    /// Seed for the simulation RNG; `None` draws one from the system RNG
    pub seed: Option<u64>,
    /// Calendar year of month 0
    pub start_year: u32,
    /// Emit a progress message every this many months
    pub progress_interval: u32,
    pub dynamics: DynamicsConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            num_workers: 1000,
            num_firms: 100,
            num_training_programs: 10,
            num_regions: 5,
            duration_months: 60,
            initial_unemployment_rate: 0.05,
            initial_ai_adoption: 0.1,
            initial_ai_level: 0.1,
            adoption_curve: AdoptionCurve::SCurve,
            automation_pace: AutomationPace::Moderate,
            interventions: Vec::new(),
            training_subsidy: 0.2,
            seed: None,
            start_year: 2025,
            progress_interval: 6,
            dynamics: DynamicsConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_intervention(mut self, intervention: Intervention) -> Self {
        self.interventions.push(intervention);
        self
    }

    /// Parse a scenario from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScenarioConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a scenario from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let config: ScenarioConfig = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Active interventions of the given type
    pub fn active_intervention(&self, kind: InterventionType) -> Option<&Intervention> {
        self.interventions
            .iter()
            .find(|i| i.active && i.intervention_type == kind)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.num_workers <= 0 {
            return Err(SimError::InvalidPopulation { field: "numWorkers", value: self.num_workers });
        }
        if self.num_firms <= 0 {
            return Err(SimError::InvalidPopulation { field: "numFirms", value: self.num_firms });
        }
        if self.num_regions <= 0 {
            return Err(SimError::InvalidPopulation { field: "numRegions", value: self.num_regions });
        }
        if self.num_training_programs < 0 {
            return Err(SimError::InvalidPopulation {
                field: "numTrainingPrograms",
                value: self.num_training_programs,
            });
        }
        if self.duration_months == 0 {
            return Err(SimError::InvalidScenario("durationMonths must be at least 1".into()));
        }
        for (name, value) in [
            ("initialUnemploymentRate", self.initial_unemployment_rate),
            ("initialAIAdoption", self.initial_ai_adoption),
            ("initialAILevel", self.initial_ai_level),
            ("trainingSubsidy", self.training_subsidy as f64),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidScenario(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        self.dynamics.validate().map_err(SimError::InvalidScenario)
    }

    pub fn worker_count(&self) -> usize {
        self.num_workers.max(0) as usize
    }

    pub fn firm_count(&self) -> usize {
        self.num_firms.max(0) as usize
    }

    pub fn program_count(&self) -> usize {
        self.num_training_programs.max(0) as usize
    }

    pub fn region_count(&self) -> usize {
        self.num_regions.max(1) as usize
    }
}

/// Behavioral constants for every per-tick system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    // === FIRMS ===
    /// Probability per tick that a firm clearing its ROI threshold advances
    /// one adoption stage
    pub adoption_step_probability: f64,

    /// Automation gained per adoption stage, capped at `max_automation`
    pub automation_step: f32,
    pub max_automation: f32,

    /// Share of headcount that full automation removes from the target
    ///
    /// Effective target = target × (1 − automation × factor). At the 0.5
    /// automation ceiling this trims 15% of the workforce.
    pub automation_headcount_factor: f32,

    pub max_postings_per_tick: usize,
    pub max_layoffs_per_tick: usize,

    /// Layoffs start only once headcount exceeds target by this ratio
    pub layoff_tolerance: f32,

    // === MATCHING ===
    /// Chance that a searching worker with a qualifying posting is hired
    pub hire_probability: f64,

    /// Minimum posted wage as a share of the worker's reservation wage
    pub reservation_wage_floor: f64,

    /// Above this mobility willingness a worker searches every region
    pub mobility_threshold: f32,

    // === WORKERS ===
    /// Employed workers start searching once displacement risk exceeds
    /// risk tolerance times this factor
    pub risk_tolerance_factor: f32,
    pub employed_retraining_probability: f64,
    pub unemployed_retraining_probability: f64,
    pub retraining_wait_months: u32,
    pub retraining_age_limit: u32,
    pub exit_wait_months: u32,
    pub exit_probability: f64,
    pub anxiety_increment: f32,

    /// Monthly multiplicative decay of an unemployed worker's reservation wage
    pub reservation_decay: f64,

    // === OPINIONS ===
    /// Per-tick convergence toward each contact's policy support
    pub contagion_rate: f32,
    pub network_political_influence: f32,
    /// Multiplier applied to non-cash program support under low trust
    pub low_trust_discount: f32,
    /// Multiplier applied to all program support under high trust
    pub high_trust_boost: f32,

    // === DIFFUSION ===
    pub information_rate: f32,
    pub anxiety_diffusion_rate: f32,
    pub max_contacts: usize,
    pub cross_region_fraction: f64,

    // === TRAINING ===
    pub max_admissions_per_tick: usize,
    pub graduation_skill_boost: f32,

    // === WAGES ===
    pub wage_growth: f64,
    pub wage_decline: f64,

    // === INTERVENTIONS ===
    pub ubi_savings_boost: f32,
    pub ubi_support_boost: f32,
    pub ubi_anxiety_relief: f32,
    pub subsidy_step: f32,
    pub capacity_growth: f32,
    /// Program capacity never grows past base capacity times this
    pub max_capacity_multiple: f32,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            adoption_step_probability: 0.15,
            automation_step: 0.1,
            max_automation: 0.5,
            automation_headcount_factor: 0.3,
            max_postings_per_tick: 5,
            max_layoffs_per_tick: 3,
            layoff_tolerance: 1.1,

            hire_probability: 0.15,
            reservation_wage_floor: 0.8,
            mobility_threshold: 0.7,

            risk_tolerance_factor: 0.7,
            employed_retraining_probability: 0.05,
            unemployed_retraining_probability: 0.1,
            retraining_wait_months: 6,
            retraining_age_limit: 55,
            exit_wait_months: 18,
            exit_probability: 0.02,
            anxiety_increment: 0.02,
            reservation_decay: 0.98,

            contagion_rate: 0.02,
            network_political_influence: 0.5,
            low_trust_discount: 0.99,
            high_trust_boost: 1.005,

            information_rate: 0.05,
            anxiety_diffusion_rate: 0.03,
            max_contacts: 8,
            cross_region_fraction: 0.1,

            max_admissions_per_tick: 5,
            graduation_skill_boost: 0.2,

            wage_growth: 0.005,
            wage_decline: 0.002,

            ubi_savings_boost: 0.5,
            ubi_support_boost: 0.02,
            ubi_anxiety_relief: 0.02,
            subsidy_step: 0.05,
            capacity_growth: 1.02,
            max_capacity_multiple: 2.0,
        }
    }
}

impl DynamicsConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, p) in [
            ("adoption_step_probability", self.adoption_step_probability),
            ("hire_probability", self.hire_probability),
            ("employed_retraining_probability", self.employed_retraining_probability),
            ("unemployed_retraining_probability", self.unemployed_retraining_probability),
            ("exit_probability", self.exit_probability),
            ("cross_region_fraction", self.cross_region_fraction),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{} must be a probability, got {}", name, p));
            }
        }

        if self.layoff_tolerance < 1.0 {
            return Err(format!(
                "layoff_tolerance ({}) must be >= 1.0 or firms would churn at target",
                self.layoff_tolerance
            ));
        }

        if !(0.0..=1.0).contains(&self.max_automation) {
            return Err(format!("max_automation must be within [0, 1], got {}", self.max_automation));
        }

        if self.max_contacts == 0 {
            return Err("max_contacts must be positive".into());
        }

        if self.reservation_decay <= 0.0 || self.reservation_decay > 1.0 {
            return Err(format!("reservation_decay must be within (0, 1], got {}", self.reservation_decay));
        }

        Ok(())
    }
}

/// Partial scenario carried by a step or run request. Present fields
/// replace the running scenario's values; the population is untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioUpdate {
    pub duration_months: Option<u32>,
    pub adoption_curve: Option<AdoptionCurve>,
    pub automation_pace: Option<AutomationPace>,
    pub interventions: Option<Vec<Intervention>>,
    pub progress_interval: Option<u32>,
}

impl ScenarioUpdate {
    pub fn is_empty(&self) -> bool {
        self.duration_months.is_none()
            && self.adoption_curve.is_none()
            && self.automation_pace.is_none()
            && self.interventions.is_none()
            && self.progress_interval.is_none()
    }

    /// Merge into `scenario`, validating the result
    pub fn apply_to(&self, scenario: &mut ScenarioConfig) -> Result<()> {
        if let Some(months) = self.duration_months {
            if months == 0 {
                return Err(SimError::InvalidScenario("durationMonths must be at least 1".into()));
            }
            scenario.duration_months = months;
        }
        if let Some(curve) = self.adoption_curve {
            scenario.adoption_curve = curve;
        }
        if let Some(pace) = self.automation_pace {
            scenario.automation_pace = pace;
        }
        if let Some(interventions) = &self.interventions {
            scenario.interventions = interventions.clone();
        }
        if let Some(interval) = self.progress_interval {
            scenario.progress_interval = interval;
        }
        Ok(())
    }
}
