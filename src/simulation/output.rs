//! Simulation output and serialization

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::Month;
use crate::entity::{InterventionType, WorkerAgent};
use crate::simulation::context::{SimulationContext, TickReport};

/// Support above this counts as strong support
pub const STRONG_SUPPORT: f32 = 0.7;
/// Support below this counts as strong opposition
pub const STRONG_OPPOSE: f32 = 0.3;

/// Population view of one policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAggregate {
    pub mean: f64,
    /// Fraction of workers above the strong-support threshold
    pub strong_support: f64,
    /// Fraction of workers below the strong-oppose threshold
    pub strong_oppose: f64,
}

/// State of the labor market at the end of a month
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    pub month: Month,
    pub year: u32,
    pub employed: usize,
    pub unemployed: usize,
    pub retraining: usize,
    pub out_of_labor_force: usize,
    pub labor_force: usize,
    pub unemployment_rate: f64,
    pub ai_adoption_rate: f64,
    pub ai_capability_level: f64,
    pub monthly_hires: u32,
    pub policy_support: BTreeMap<String, PolicyAggregate>,
    pub median_wage: f64,
    pub activity: TickReport,
}

/// Engagement-weighted support for one policy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyFeasibility {
    pub policy: InterventionType,
    /// Σ support·engagement / Σ engagement
    pub weighted_support: f64,
    pub strong_support: f64,
    pub strong_oppose: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    pub unemployment_rate: f64,
    pub ai_adoption_rate: f64,
    pub ai_capability_level: f64,
    pub employed: usize,
    pub unemployed: usize,
    pub median_wage: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    pub unemployment_rate: f64,
    pub ai_adoption_rate: f64,
    pub ai_capability_level: f64,
    pub employed: i64,
    /// Relative change of the median wage
    pub median_wage_pct: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakUnemployment {
    pub rate: f64,
    pub month: Month,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub duration_months: u32,
    pub total_workers: usize,
    pub total_firms: usize,
    pub initial: EndpointStats,
    #[serde(rename = "final")]
    pub final_stats: EndpointStats,
    pub changes: Changes,
    pub peak_unemployment: PeakUnemployment,
    pub final_policy_support: Vec<PolicyFeasibility>,
}

/// Complete output of a full run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub timeline: Vec<MonthlySnapshot>,
    pub summary: Summary,
    pub policy_support: Vec<PolicyFeasibility>,
    pub seed: u64,
}

/// Median of employed workers' wages, 0 when nobody is employed
pub fn median_wage(workers: &[WorkerAgent]) -> f64 {
    let mut wages: Vec<OrderedFloat<f64>> = workers
        .iter()
        .filter(|w| w.is_employed())
        .map(|w| OrderedFloat(w.wage))
        .collect();
    if wages.is_empty() {
        return 0.0;
    }
    wages.sort_unstable();
    let mid = wages.len() / 2;
    if wages.len() % 2 == 0 {
        (wages[mid - 1].0 + wages[mid].0) / 2.0
    } else {
        wages[mid].0
    }
}

/// Mean and strong support/oppose fractions for one policy
pub fn aggregate_policy(workers: &[WorkerAgent], kind: InterventionType) -> PolicyAggregate {
    if workers.is_empty() {
        return PolicyAggregate::default();
    }
    let n = workers.len() as f64;
    let mut sum = 0.0;
    let mut strong_support = 0usize;
    let mut strong_oppose = 0usize;
    for w in workers {
        let v = w.policy_support.get(kind);
        sum += v as f64;
        if v > STRONG_SUPPORT {
            strong_support += 1;
        } else if v < STRONG_OPPOSE {
            strong_oppose += 1;
        }
    }
    PolicyAggregate {
        mean: sum / n,
        strong_support: strong_support as f64 / n,
        strong_oppose: strong_oppose as f64 / n,
    }
}

/// Engagement-weighted feasibility of every policy
pub fn policy_feasibility(workers: &[WorkerAgent]) -> Vec<PolicyFeasibility> {
    let total_engagement: f64 = workers.iter().map(|w| w.political_engagement as f64).sum();
    InterventionType::ALL
        .iter()
        .map(|&kind| {
            let aggregate = aggregate_policy(workers, kind);
            let weighted_support = if total_engagement > 0.0 {
                workers
                    .iter()
                    .map(|w| w.policy_support.get(kind) as f64 * w.political_engagement as f64)
                    .sum::<f64>()
                    / total_engagement
            } else {
                aggregate.mean
            };
            PolicyFeasibility {
                policy: kind,
                weighted_support,
                strong_support: aggregate.strong_support,
                strong_oppose: aggregate.strong_oppose,
            }
        })
        .collect()
}

impl MonthlySnapshot {
    pub fn capture(ctx: &SimulationContext) -> Self {
        let counts = ctx.employment_counts();
        let policy_support = InterventionType::ALL
            .iter()
            .map(|&kind| (kind.name().to_string(), aggregate_policy(&ctx.workers, kind)))
            .collect();

        Self {
            month: ctx.month,
            year: ctx.scenario.start_year + ctx.month / 12,
            employed: counts.employed,
            unemployed: counts.unemployed,
            retraining: counts.retraining,
            out_of_labor_force: counts.out_of_labor_force,
            labor_force: counts.labor_force(),
            unemployment_rate: counts.unemployment_rate(),
            ai_adoption_rate: ctx.ai_adoption_rate(),
            ai_capability_level: ctx.frontier.level,
            monthly_hires: ctx.report.hires,
            policy_support,
            median_wage: median_wage(&ctx.workers),
            activity: ctx.report,
        }
    }

    fn endpoint(&self) -> EndpointStats {
        EndpointStats {
            unemployment_rate: self.unemployment_rate,
            ai_adoption_rate: self.ai_adoption_rate,
            ai_capability_level: self.ai_capability_level,
            employed: self.employed,
            unemployed: self.unemployed,
            median_wage: self.median_wage,
        }
    }
}

impl Summary {
    /// Build from a non-empty timeline and the final context
    pub fn build(timeline: &[MonthlySnapshot], ctx: &SimulationContext) -> Option<Self> {
        let first = timeline.first()?;
        let last = timeline.last()?;
        let peak = timeline
            .iter()
            .max_by_key(|s| OrderedFloat(s.unemployment_rate))
            .map(|s| PeakUnemployment { rate: s.unemployment_rate, month: s.month })?;

        let median_wage_pct = if first.median_wage > 0.0 {
            (last.median_wage - first.median_wage) / first.median_wage
        } else {
            0.0
        };

        Some(Self {
            duration_months: ctx.scenario.duration_months,
            total_workers: ctx.workers.len(),
            total_firms: ctx.firms.len(),
            initial: first.endpoint(),
            final_stats: last.endpoint(),
            changes: Changes {
                unemployment_rate: last.unemployment_rate - first.unemployment_rate,
                ai_adoption_rate: last.ai_adoption_rate - first.ai_adoption_rate,
                ai_capability_level: last.ai_capability_level - first.ai_capability_level,
                employed: last.employed as i64 - first.employed as i64,
                median_wage_pct,
            },
            peak_unemployment: peak,
            final_policy_support: policy_feasibility(&ctx.workers),
        })
    }
}

impl SimulationResult {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn summary_text(&self) -> String {
        let s = &self.summary;
        let mut text = format!(
            "Simulated {} months ({} workers, {} firms, seed {})\n\
             Unemployment {:.1}% -> {:.1}% (peak {:.1}% in month {})\n\
             AI adoption {:.1}% -> {:.1}%, capability {:.3} -> {:.3}\n\
             Median wage {:.0} -> {:.0}",
            s.duration_months,
            s.total_workers,
            s.total_firms,
            self.seed,
            s.initial.unemployment_rate * 100.0,
            s.final_stats.unemployment_rate * 100.0,
            s.peak_unemployment.rate * 100.0,
            s.peak_unemployment.month,
            s.initial.ai_adoption_rate * 100.0,
            s.final_stats.ai_adoption_rate * 100.0,
            s.initial.ai_capability_level,
            s.final_stats.ai_capability_level,
            s.initial.median_wage,
            s.final_stats.median_wage,
        );
        for p in &self.policy_support {
            text.push_str(&format!(
                "\n  {:<14} support {:.2} (strong {:.0}% / oppose {:.0}%)",
                p.policy.name(),
                p.weighted_support,
                p.strong_support * 100.0,
                p.strong_oppose * 100.0,
            ));
        }
        text
    }
}
