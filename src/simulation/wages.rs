//! Economy-wide wage drift driven by the unemployment rate

use crate::entity::LifeEvent;
use crate::simulation::context::SimulationContext;

const TIGHT_MARKET: f64 = 0.04;
const SLACK_MARKET: f64 = 0.08;

/// Monthly wage multiplier for the given unemployment rate
pub fn wage_adjustment(unemployment_rate: f64, growth: f64, decline: f64) -> f64 {
    if unemployment_rate < TIGHT_MARKET {
        1.0 + growth
    } else if unemployment_rate > SLACK_MARKET {
        1.0 - decline
    } else {
        1.0
    }
}

/// Apply the uniform adjustment to every employed worker
pub fn adjust_wages(ctx: &mut SimulationContext) {
    let rate = ctx.unemployment_rate();
    let factor = wage_adjustment(rate, ctx.dynamics().wage_growth, ctx.dynamics().wage_decline);
    if factor == 1.0 {
        return;
    }

    let mut adjusted = 0usize;
    for worker in ctx.workers.iter_mut().filter(|w| w.is_employed()) {
        worker.wage *= factor;
        worker.record(LifeEvent::WageChange { ratio: factor as f32 });
        adjusted += 1;
    }
    tracing::debug!(rate, factor, adjusted, "wage drift");
}
