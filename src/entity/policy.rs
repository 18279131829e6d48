//! Policy interventions and per-worker policy sentiment

use serde::{Deserialize, Serialize};

use crate::core::types::clamp01;

/// Kinds of policy intervention a scenario can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionType {
    /// Universal basic income paid to the unemployed
    Ubi,
    /// Subsidized retraining programs
    Retraining,
    /// Payroll subsidy that discourages layoffs
    WageSubsidy,
    /// Regulation of AI deployment (tracked in opinion only)
    AiRegulation,
}

impl InterventionType {
    pub const ALL: [InterventionType; 4] = [
        InterventionType::Ubi,
        InterventionType::Retraining,
        InterventionType::WageSubsidy,
        InterventionType::AiRegulation,
    ];

    pub fn index(&self) -> usize {
        match self {
            InterventionType::Ubi => 0,
            InterventionType::Retraining => 1,
            InterventionType::WageSubsidy => 2,
            InterventionType::AiRegulation => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InterventionType::Ubi => "ubi",
            InterventionType::Retraining => "retraining",
            InterventionType::WageSubsidy => "wage_subsidy",
            InterventionType::AiRegulation => "ai_regulation",
        }
    }

    /// Policies that put cash directly in workers' hands
    pub fn is_direct_cash(&self) -> bool {
        matches!(self, InterventionType::Ubi)
    }
}

/// One support score per intervention type, each kept within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicySupport([f32; 4]);

impl PolicySupport {
    pub fn new(values: [f32; 4]) -> Self {
        Self(values.map(clamp01))
    }

    pub fn uniform(value: f32) -> Self {
        Self::new([value; 4])
    }

    pub fn get(&self, kind: InterventionType) -> f32 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: InterventionType, value: f32) {
        self.0[kind.index()] = clamp01(value);
    }

    pub fn add(&mut self, kind: InterventionType, delta: f32) {
        self.set(kind, self.get(kind) + delta);
    }

    pub fn scale(&mut self, kind: InterventionType, factor: f32) {
        self.set(kind, self.get(kind) * factor);
    }

    pub fn iter(&self) -> impl Iterator<Item = (InterventionType, f32)> + '_ {
        InterventionType::ALL.iter().map(move |&k| (k, self.get(k)))
    }

    pub fn as_array(&self) -> [f32; 4] {
        self.0
    }

    pub fn clamp_all(&mut self) {
        for v in self.0.iter_mut() {
            *v = clamp01(*v);
        }
    }

    pub fn is_clamped(&self) -> bool {
        self.0.iter().all(|v| (0.0..=1.0).contains(v))
    }
}

impl Default for PolicySupport {
    fn default() -> Self {
        Self::uniform(0.5)
    }
}
