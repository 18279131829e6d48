//! AI capability frontier: one scalar advanced once per month

use serde::{Deserialize, Serialize};

use crate::core::config::{AdoptionCurve, AutomationPace};
use crate::core::types::Month;

/// Capability never reaches full automation
pub const CAPABILITY_CEILING: f64 = 0.95;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AiCapabilityFrontier {
    pub level: f64,
    pub curve: AdoptionCurve,
    pub pace: AutomationPace,
}

impl AiCapabilityFrontier {
    pub fn new(initial_level: f64, curve: AdoptionCurve, pace: AutomationPace) -> Self {
        Self {
            level: initial_level.clamp(0.0, CAPABILITY_CEILING),
            curve,
            pace,
        }
    }

    /// Advance one month. `month` is the month being simulated (1-based);
    /// only the logistic curve depends on it.
    pub fn advance(&mut self, month: Month) -> f64 {
        self.level = Self::step(self.level, self.curve, self.pace, month);
        self.level
    }

    /// One application of the growth recurrence
    pub fn step(level: f64, curve: AdoptionCurve, pace: AutomationPace, month: Month) -> f64 {
        let pace = pace.multiplier();
        let next = match curve {
            AdoptionCurve::Linear => level + 0.005 * pace,
            AdoptionCurve::Exponential => level * (1.0 + 0.01 * pace),
            AdoptionCurve::SCurve => {
                level + 0.015 * pace / (1.0 + (-0.05 * (month as f64 - 60.0)).exp())
            }
        };
        next.clamp(0.0, CAPABILITY_CEILING)
    }
}
