//! Simulation orchestrator: init, single-month stepping and full runs
//!
//! `Simulation` owns the context between requests. It starts empty; every
//! operation other than `init` fails with `NotInitialized` until a scenario
//! has been loaded.

use serde::{Deserialize, Serialize};

use crate::core::config::{ScenarioConfig, ScenarioUpdate};
use crate::core::error::{Result, SimError};
use crate::core::types::Month;
use crate::simulation::context::SimulationContext;
use crate::simulation::factory::build_context;
use crate::simulation::output::{policy_feasibility, MonthlySnapshot, SimulationResult, Summary};
use crate::simulation::tick::run_tick;

/// Full runs hand control back to their host this often
pub const YIELD_INTERVAL: u32 = 12;

/// Population sizes reported after init
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitInfo {
    pub worker_count: usize,
    pub firm_count: usize,
    pub training_program_count: usize,
    pub seed: u64,
}

/// Periodic report during a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub month: Month,
    pub total_months: u32,
    /// 0.0 to 1.0
    pub progress: f64,
    pub current_stats: MonthlySnapshot,
}

/// Receives progress and decides whether a full run keeps going.
/// Cancellation is checked between ticks, never inside one.
pub trait RunObserver {
    fn on_progress(&mut self, progress: &Progress);

    fn should_cancel(&self) -> bool {
        false
    }
}

impl<F: FnMut(&Progress)> RunObserver for F {
    fn on_progress(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Observer that ignores progress
pub struct Silent;

impl RunObserver for Silent {
    fn on_progress(&mut self, _progress: &Progress) {}
}

#[derive(Default)]
pub struct Simulation {
    ctx: Option<SimulationContext>,
    timeline: Vec<MonthlySnapshot>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh population, discarding any previous run
    pub fn init(&mut self, scenario: ScenarioConfig) -> Result<InitInfo> {
        let ctx = build_context(scenario)?;
        let info = InitInfo {
            worker_count: ctx.workers.len(),
            firm_count: ctx.firms.len(),
            training_program_count: ctx.programs.len(),
            seed: ctx.seed,
        };
        self.timeline = vec![MonthlySnapshot::capture(&ctx)];
        self.ctx = Some(ctx);
        tracing::info!(
            workers = info.worker_count,
            firms = info.firm_count,
            programs = info.training_program_count,
            seed = info.seed,
            "simulation initialized"
        );
        Ok(info)
    }

    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn context(&self) -> Result<&SimulationContext> {
        self.ctx.as_ref().ok_or(SimError::NotInitialized)
    }

    pub fn context_mut(&mut self) -> Result<&mut SimulationContext> {
        self.ctx.as_mut().ok_or(SimError::NotInitialized)
    }

    /// Snapshots so far, starting with month 0
    pub fn timeline(&self) -> &[MonthlySnapshot] {
        &self.timeline
    }

    /// Merge a partial scenario into the running one
    pub fn apply_update(&mut self, update: &ScenarioUpdate) -> Result<()> {
        let ctx = self.context_mut()?;
        update.apply_to(&mut ctx.scenario)?;
        ctx.frontier.curve = ctx.scenario.adoption_curve;
        ctx.frontier.pace = ctx.scenario.automation_pace;
        Ok(())
    }

    /// Advance one month and record its snapshot
    pub fn run_month(&mut self) -> Result<MonthlySnapshot> {
        let ctx = self.context_mut()?;
        run_tick(ctx);
        let snapshot = MonthlySnapshot::capture(ctx);
        self.timeline.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Step-by-step driver entry point. With `month` given, runs every tick
    /// up to and including that month; a month already simulated is an error.
    pub fn run_month_at(&mut self, month: Option<Month>, update: Option<&ScenarioUpdate>) -> Result<MonthlySnapshot> {
        let current = self.context()?.month;
        if let Some(update) = update {
            self.apply_update(update)?;
        }
        let target = month.unwrap_or(current + 1);
        if target <= current {
            return Err(SimError::InvalidScenario(format!(
                "month {} already simulated (current month {})",
                target, current
            )));
        }

        let mut snapshot = self.run_month()?;
        while snapshot.month < target {
            snapshot = self.run_month()?;
        }
        Ok(snapshot)
    }

    /// True once the scenario's duration has been simulated
    pub fn is_complete(&self) -> bool {
        self.ctx
            .as_ref()
            .map(|c| c.month >= c.scenario.duration_months)
            .unwrap_or(false)
    }

    /// Whether a full run should report progress after `month`
    pub fn progress_due(&self, month: Month) -> bool {
        match &self.ctx {
            Some(ctx) => {
                let interval = ctx.scenario.progress_interval;
                month == ctx.scenario.duration_months || (interval > 0 && month % interval == 0)
            }
            None => false,
        }
    }

    /// Progress message for the last recorded month
    pub fn progress(&self) -> Result<Progress> {
        let ctx = self.context()?;
        let current_stats = self.timeline.last().cloned().ok_or(SimError::NotInitialized)?;
        let total = ctx.scenario.duration_months;
        Ok(Progress {
            month: ctx.month,
            total_months: total,
            progress: (ctx.month as f64 / total.max(1) as f64).min(1.0),
            current_stats,
        })
    }

    /// Run the remaining months of the scenario and assemble the result
    pub fn run_simulation<O: RunObserver>(
        &mut self,
        update: Option<&ScenarioUpdate>,
        observer: &mut O,
    ) -> Result<SimulationResult> {
        if let Some(update) = update {
            self.apply_update(update)?;
        }
        let start = self.context()?.month;
        tracing::info!(from = start, to = self.context()?.scenario.duration_months, "run started");

        while !self.is_complete() {
            if observer.should_cancel() {
                tracing::info!(month = self.context()?.month, "run cancelled");
                return Err(SimError::Cancelled);
            }
            let snapshot = self.run_month()?;
            if self.progress_due(snapshot.month) {
                observer.on_progress(&self.progress()?);
            }
        }

        self.finish()
    }

    /// Assemble the result from the timeline so far
    pub fn finish(&self) -> Result<SimulationResult> {
        let ctx = self.context()?;
        let summary = Summary::build(&self.timeline, ctx).ok_or(SimError::NotInitialized)?;
        let result = SimulationResult {
            timeline: self.timeline.clone(),
            policy_support: policy_feasibility(&ctx.workers),
            summary,
            seed: ctx.seed,
        };
        tracing::info!(
            months = ctx.month,
            final_unemployment = result.summary.final_stats.unemployment_rate,
            "run complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AutomationPace;

    fn scenario() -> ScenarioConfig {
        let mut s = ScenarioConfig::default().with_seed(99);
        s.num_workers = 200;
        s.num_firms = 20;
        s.num_training_programs = 4;
        s.num_regions = 2;
        s.duration_months = 18;
        s
    }

    #[test]
    fn test_requires_init() {
        let mut sim = Simulation::new();
        assert!(!sim.is_initialized());
        assert!(matches!(sim.run_month(), Err(SimError::NotInitialized)));
        assert!(matches!(sim.finish(), Err(SimError::NotInitialized)));
        assert!(matches!(sim.run_simulation(None, &mut Silent), Err(SimError::NotInitialized)));
    }

    #[test]
    fn test_init_reports_population() {
        let mut sim = Simulation::new();
        let info = sim.init(scenario()).unwrap();
        assert_eq!(info.worker_count, 200);
        assert_eq!(info.firm_count, 20);
        assert_eq!(info.training_program_count, 4);
        assert_eq!(info.seed, 99);
        assert_eq!(sim.timeline().len(), 1);
        assert_eq!(sim.timeline()[0].month, 0);
    }

    #[test]
    fn test_run_month_at_catches_up() {
        let mut sim = Simulation::new();
        sim.init(scenario()).unwrap();
        let snapshot = sim.run_month_at(Some(3), None).unwrap();
        assert_eq!(snapshot.month, 3);
        assert_eq!(sim.timeline().len(), 4);
        assert!(sim.run_month_at(Some(2), None).is_err());
        assert_eq!(sim.run_month_at(None, None).unwrap().month, 4);
    }

    #[test]
    fn test_update_switches_pace() {
        let mut sim = Simulation::new();
        sim.init(scenario()).unwrap();
        let update = ScenarioUpdate {
            automation_pace: Some(AutomationPace::Accelerating),
            ..Default::default()
        };
        sim.run_month_at(None, Some(&update)).unwrap();
        assert_eq!(sim.context().unwrap().frontier.pace, AutomationPace::Accelerating);
    }

    #[test]
    fn test_full_run_reports_progress() {
        let mut sim = Simulation::new();
        sim.init(scenario()).unwrap();
        let mut months = Vec::new();
        let mut observer = |p: &Progress| months.push(p.month);
        let result = sim.run_simulation(None, &mut observer).unwrap();

        assert_eq!(months, vec![6, 12, 18]);
        assert_eq!(result.timeline.len(), 19);
        assert_eq!(result.summary.duration_months, 18);
        assert_eq!(result.policy_support.len(), 4);
        assert!(sim.is_complete());
    }

    struct CancelAfter {
        seen: u32,
        limit: u32,
    }

    impl RunObserver for CancelAfter {
        fn on_progress(&mut self, _progress: &Progress) {
            self.seen += 1;
        }

        fn should_cancel(&self) -> bool {
            self.seen >= self.limit
        }
    }

    #[test]
    fn test_cancel_between_ticks() {
        let mut sim = Simulation::new();
        sim.init(scenario()).unwrap();
        let mut observer = CancelAfter { seen: 0, limit: 1 };
        assert!(matches!(sim.run_simulation(None, &mut observer), Err(SimError::Cancelled)));
        // Stopped right after the first progress report
        assert_eq!(sim.context().unwrap().month, 6);
    }
}
