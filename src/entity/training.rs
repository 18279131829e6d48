//! Training programs that move workers through retraining

use serde::{Deserialize, Serialize};

use crate::core::types::{ProgramId, RegionId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    DigitalLiteracy,
    AiAugmentation,
    TradeCertification,
    CareerTransition,
}

impl ProgramType {
    pub const ALL: [ProgramType; 4] = [
        ProgramType::DigitalLiteracy,
        ProgramType::AiAugmentation,
        ProgramType::TradeCertification,
        ProgramType::CareerTransition,
    ];

    pub fn base_duration(&self) -> u32 {
        match self {
            ProgramType::DigitalLiteracy => 3,
            ProgramType::AiAugmentation => 6,
            ProgramType::TradeCertification => 9,
            ProgramType::CareerTransition => 12,
        }
    }

    /// Scales the AI-augmentation skill gain at graduation
    pub fn skill_multiplier(&self) -> f32 {
        match self {
            ProgramType::DigitalLiteracy => 0.6,
            ProgramType::AiAugmentation => 1.5,
            ProgramType::TradeCertification => 0.8,
            ProgramType::CareerTransition => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgramAgent {
    pub id: ProgramId,
    pub program_type: ProgramType,
    pub region: RegionId,
    pub capacity: u32,
    pub base_capacity: u32,
    pub enrolled: Vec<WorkerId>,
    pub duration_months: u32,
    pub completion_rate: f32,
    pub placement_rate: f32,
    pub subsidy_level: f32,
    pub graduates: u32,
    pub dropouts: u32,
}

impl TrainingProgramAgent {
    pub fn new(id: ProgramId, program_type: ProgramType, region: RegionId, capacity: u32) -> Self {
        Self {
            id,
            program_type,
            region,
            capacity,
            base_capacity: capacity,
            enrolled: Vec::new(),
            duration_months: program_type.base_duration(),
            completion_rate: 0.75,
            placement_rate: 0.6,
            subsidy_level: 0.0,
            graduates: 0,
            dropouts: 0,
        }
    }

    pub fn has_capacity(&self) -> bool {
        (self.enrolled.len() as u32) < self.capacity
    }

    /// Enroll a worker; refuses once capacity is reached
    pub fn enroll(&mut self, worker: WorkerId) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.enrolled.push(worker);
        true
    }

    pub fn withdraw(&mut self, worker: WorkerId) -> bool {
        match self.enrolled.iter().position(|&w| w == worker) {
            Some(idx) => {
                self.enrolled.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Progress earned per month of enrollment
    pub fn monthly_progress(&self) -> f32 {
        1.0 / self.duration_months.max(1) as f32
    }

    /// Monthly dropout probability; subsidies halve it at most
    pub fn dropout_probability(&self) -> f64 {
        let base = (1.0 - self.completion_rate as f64).max(0.0) / self.duration_months.max(1) as f64;
        base * (1.0 - 0.5 * self.subsidy_level as f64)
    }
}
