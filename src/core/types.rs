//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation month counter (one tick = one month)
pub type Month = u32;

/// Unique identifier for worker agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl WorkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for firm agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FirmId(pub u32);

impl FirmId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for training programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

/// Unique identifier for a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingId(pub u64);

/// Geographic region index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub u32);

/// Index into the industry table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndustryId(pub u8);

/// Static description of an industry
#[derive(Debug, Clone, Copy)]
pub struct Industry {
    pub name: &'static str,
    /// Median monthly wage for a typical hire
    pub base_wage: f64,
    /// True when a large share of the industry's tasks are automatable
    pub high_ai_exposure: bool,
}

pub const INDUSTRIES: [Industry; 8] = [
    Industry { name: "manufacturing", base_wage: 3800.0, high_ai_exposure: true },
    Industry { name: "retail", base_wage: 2900.0, high_ai_exposure: true },
    Industry { name: "finance", base_wage: 6200.0, high_ai_exposure: true },
    Industry { name: "administrative", base_wage: 3400.0, high_ai_exposure: true },
    Industry { name: "healthcare", base_wage: 4900.0, high_ai_exposure: false },
    Industry { name: "education", base_wage: 4200.0, high_ai_exposure: false },
    Industry { name: "construction", base_wage: 4400.0, high_ai_exposure: false },
    Industry { name: "technology", base_wage: 7800.0, high_ai_exposure: false },
];

impl IndustryId {
    pub fn info(&self) -> &'static Industry {
        &INDUSTRIES[self.0 as usize % INDUSTRIES.len()]
    }

    pub fn all() -> impl Iterator<Item = IndustryId> {
        (0..INDUSTRIES.len() as u8).map(IndustryId)
    }
}

/// Clamp a value into the unit interval
#[inline]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<WorkerId, &str> = HashMap::new();
        map.insert(WorkerId(7), "alice");
        assert_eq!(map.get(&WorkerId(7)), Some(&"alice"));
        assert_eq!(map.get(&WorkerId(8)), None);
    }

    #[test]
    fn test_industry_lookup_wraps() {
        assert_eq!(IndustryId(0).info().name, "manufacturing");
        assert_eq!(IndustryId(8).info().name, "manufacturing");
        assert_eq!(IndustryId::all().count(), INDUSTRIES.len());
    }

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.3), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
        assert_eq!(clamp01(0.42), 0.42);
    }
}
