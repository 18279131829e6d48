//! Intervention sweep binary
//!
//! Runs one seeded scenario once per intervention (plus a baseline) and
//! prints final labor-market outcomes and policy support side by side.

use clap::Parser;

use labor_frontier::core::config::{Intervention, ScenarioConfig};
use labor_frontier::entity::InterventionType;
use labor_frontier::simulation::{Silent, Simulation, SimulationResult};

#[derive(Parser, Debug)]
#[command(name = "intervention_sweep")]
#[command(about = "Compare interventions on the same seeded scenario")]
struct Args {
    #[arg(long, default_value_t = 1000)]
    workers: i64,

    #[arg(long, default_value_t = 100)]
    firms: i64,

    #[arg(long, default_value_t = 60)]
    months: u32,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print the results as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn run(
    base: &ScenarioConfig,
    intervention: Option<InterventionType>,
) -> labor_frontier::Result<SimulationResult> {
    let mut scenario = base.clone();
    if let Some(kind) = intervention {
        scenario = scenario.with_intervention(Intervention::new(kind));
    }
    let mut sim = Simulation::new();
    sim.init(scenario)?;
    sim.run_simulation(None, &mut Silent)
}

fn main() -> labor_frontier::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("labor_frontier=warn")
        .init();

    let args = Args::parse();
    let mut base = ScenarioConfig::default().with_seed(args.seed);
    base.num_workers = args.workers;
    base.num_firms = args.firms;
    base.duration_months = args.months;

    let arms: Vec<Option<InterventionType>> = std::iter::once(None)
        .chain(InterventionType::ALL.iter().copied().map(Some))
        .collect();

    let mut rows = Vec::with_capacity(arms.len());
    for arm in arms {
        let label = arm.map(|k| k.name()).unwrap_or("baseline");
        let result = run(&base, arm)?;
        rows.push((label, result));
    }

    if args.json {
        let summaries: Vec<_> = rows
            .iter()
            .map(|(label, r)| serde_json::json!({ "arm": label, "summary": r.summary }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "Intervention sweep: {} workers, {} firms, {} months, seed {}",
        args.workers, args.firms, args.months, args.seed
    );
    println!();
    print!("{:<14} {:>8} {:>8} {:>8}", "arm", "unemp%", "peak%", "adopt%");
    for kind in InterventionType::ALL {
        print!(" {:>14}", kind.name());
    }
    println!();

    for (label, result) in &rows {
        let s = &result.summary;
        print!(
            "{:<14} {:>8.1} {:>8.1} {:>8.1}",
            label,
            s.final_stats.unemployment_rate * 100.0,
            s.peak_unemployment.rate * 100.0,
            s.final_stats.ai_adoption_rate * 100.0,
        );
        for p in &result.policy_support {
            print!(" {:>14.3}", p.weighted_support);
        }
        println!();
    }

    Ok(())
}
