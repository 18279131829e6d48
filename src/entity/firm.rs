//! Firm agents: size, AI adoption funnel and workforce

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{FirmId, IndustryId, PostingId, RegionId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Enterprise,
}

impl SizeClass {
    /// Raw headcount band before scaling to the worker population
    pub fn headcount_band(&self) -> (u32, u32) {
        match self {
            SizeClass::Small => (5, 20),
            SizeClass::Medium => (20, 50),
            SizeClass::Large => (50, 150),
            SizeClass::Enterprise => (150, 400),
        }
    }

    pub fn is_large(&self) -> bool {
        matches!(self, SizeClass::Large | SizeClass::Enterprise)
    }
}

/// Stages of AI adoption. Ordering follows the funnel, so `>=` comparisons
/// mean "at least this far along".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdoptionStatus {
    None,
    Exploring,
    Piloting,
    Scaling,
    Mature,
}

impl AdoptionStatus {
    /// The next funnel stage, or `None` at Mature
    pub fn next(&self) -> Option<AdoptionStatus> {
        match self {
            AdoptionStatus::None => Some(AdoptionStatus::Exploring),
            AdoptionStatus::Exploring => Some(AdoptionStatus::Piloting),
            AdoptionStatus::Piloting => Some(AdoptionStatus::Scaling),
            AdoptionStatus::Scaling => Some(AdoptionStatus::Mature),
            AdoptionStatus::Mature => None,
        }
    }

    /// Counts toward the economy-wide adoption rate
    pub fn is_adopter(&self) -> bool {
        *self >= AdoptionStatus::Piloting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaborStrategy {
    CostMinimizer,
    Balanced,
    TalentInvestor,
}

impl LaborStrategy {
    /// Multiplier on posted wages
    pub fn wage_factor(&self) -> f64 {
        match self {
            LaborStrategy::CostMinimizer => 0.92,
            LaborStrategy::Balanced => 1.0,
            LaborStrategy::TalentInvestor => 1.08,
        }
    }

    /// Shift applied to the adoption ROI threshold
    pub fn adoption_bias(&self) -> f64 {
        match self {
            LaborStrategy::CostMinimizer => -0.05,
            LaborStrategy::Balanced => 0.0,
            LaborStrategy::TalentInvestor => 0.03,
        }
    }
}

/// An open position, retired at the end of the tick if unfilled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: PostingId,
    pub firm: FirmId,
    pub wage: f64,
    pub region: RegionId,
    pub industry: IndustryId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmAgent {
    pub id: FirmId,
    pub industry: IndustryId,
    pub region: RegionId,
    pub size_class: SizeClass,
    pub target_headcount: u32,
    /// Ordered so layoff selection is reproducible for a fixed seed
    pub employees: BTreeSet<WorkerId>,
    pub open_positions: Vec<JobPosting>,
    pub adoption_status: AdoptionStatus,
    /// 0.0 to `max_automation`
    pub automation_level: f32,
    pub innovativeness: f32,
    pub labor_strategy: LaborStrategy,
    /// Same-industry peers
    pub competitors: Vec<FirmId>,
    pub total_hires: u32,
    pub total_layoffs: u32,
}

impl FirmAgent {
    pub fn new(id: FirmId, industry: IndustryId, region: RegionId, size_class: SizeClass) -> Self {
        Self {
            id,
            industry,
            region,
            size_class,
            target_headcount: size_class.headcount_band().0,
            employees: BTreeSet::new(),
            open_positions: Vec::new(),
            adoption_status: AdoptionStatus::None,
            automation_level: 0.0,
            innovativeness: 0.5,
            labor_strategy: LaborStrategy::Balanced,
            competitors: Vec::new(),
            total_hires: 0,
            total_layoffs: 0,
        }
    }

    pub fn headcount(&self) -> usize {
        self.employees.len()
    }

    /// Target headcount after automation has absorbed part of the work
    pub fn effective_target(&self, headcount_factor: f32) -> f32 {
        self.target_headcount as f32 * (1.0 - self.automation_level * headcount_factor)
    }

    /// Move one step along the funnel. Never moves backwards.
    pub fn advance_adoption(&mut self, automation_step: f32, max_automation: f32) -> bool {
        match self.adoption_status.next() {
            Some(next) => {
                self.adoption_status = next;
                self.automation_level = (self.automation_level + automation_step).min(max_automation);
                true
            }
            None => false,
        }
    }

    pub fn remove_posting(&mut self, posting: PostingId) -> Option<JobPosting> {
        let idx = self.open_positions.iter().position(|p| p.id == posting)?;
        Some(self.open_positions.swap_remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firm() -> FirmAgent {
        FirmAgent::new(FirmId(0), IndustryId(0), RegionId(0), SizeClass::Medium)
    }

    #[test]
    fn test_adoption_advances_in_order() {
        let mut f = firm();
        let mut stages = vec![f.adoption_status];
        while f.advance_adoption(0.1, 0.5) {
            stages.push(f.adoption_status);
        }
        assert_eq!(
            stages,
            vec![
                AdoptionStatus::None,
                AdoptionStatus::Exploring,
                AdoptionStatus::Piloting,
                AdoptionStatus::Scaling,
                AdoptionStatus::Mature,
            ]
        );
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_automation_capped() {
        let mut f = firm();
        for _ in 0..10 {
            f.advance_adoption(0.2, 0.5);
        }
        assert_eq!(f.adoption_status, AdoptionStatus::Mature);
        assert!((f.automation_level - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_effective_target() {
        let mut f = firm();
        f.target_headcount = 100;
        f.automation_level = 0.5;
        assert!((f.effective_target(0.3) - 85.0).abs() < 1e-4);
    }

    #[test]
    fn test_adopter_threshold() {
        assert!(!AdoptionStatus::Exploring.is_adopter());
        assert!(AdoptionStatus::Piloting.is_adopter());
        assert!(AdoptionStatus::Mature.is_adopter());
    }

    #[test]
    fn test_remove_posting() {
        let mut f = firm();
        for i in 0..3 {
            f.open_positions.push(JobPosting {
                id: PostingId(i),
                firm: f.id,
                wage: 3000.0,
                region: f.region,
                industry: f.industry,
            });
        }
        assert!(f.remove_posting(PostingId(1)).is_some());
        assert!(f.remove_posting(PostingId(1)).is_none());
        assert_eq!(f.open_positions.len(), 2);
    }
}
