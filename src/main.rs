//! Labor Frontier - Entry Point
//!
//! Runs one scenario through the execution channel: the simulation lives on
//! its own host thread and this process only exchanges messages with it.

use std::path::PathBuf;

use clap::Parser;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use labor_frontier::channel::SimulationClient;
use labor_frontier::core::config::{AdoptionCurve, AutomationPace, Intervention, ScenarioConfig};
use labor_frontier::core::error::Result;
use labor_frontier::entity::InterventionType;

/// Labor market simulation under advancing AI capability
#[derive(Parser, Debug)]
#[command(name = "labor-frontier")]
#[command(about = "Simulate workers, firms and policy sentiment as AI capability advances")]
struct Args {
    /// Scenario file (.toml or .json); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    workers: Option<i64>,

    #[arg(long)]
    firms: Option<i64>,

    #[arg(long)]
    programs: Option<i64>,

    #[arg(long)]
    regions: Option<i64>,

    /// Months to simulate
    #[arg(long)]
    months: Option<u32>,

    /// Adoption curve: linear, exponential or s_curve
    #[arg(long, value_parser = parse_snake::<AdoptionCurve>)]
    curve: Option<AdoptionCurve>,

    /// Automation pace: slow, moderate, fast or accelerating
    #[arg(long, value_parser = parse_snake::<AutomationPace>)]
    pace: Option<AutomationPace>,

    /// Activate an intervention (repeatable): ubi, retraining, wage_subsidy, ai_regulation
    #[arg(long = "intervention", value_parser = parse_snake::<InterventionType>)]
    interventions: Vec<InterventionType>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the full JSON result to this path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "labor_frontier=info")]
    log: String,
}

/// Parse a snake_case enum name through its serde representation
fn parse_snake<T: DeserializeOwned>(value: &str) -> std::result::Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|e| e.to_string())
}

impl Args {
    fn scenario(&self) -> Result<ScenarioConfig> {
        let mut scenario = match &self.config {
            Some(path) => ScenarioConfig::load(path)?,
            None => ScenarioConfig::default(),
        };

        if let Some(v) = self.workers {
            scenario.num_workers = v;
        }
        if let Some(v) = self.firms {
            scenario.num_firms = v;
        }
        if let Some(v) = self.programs {
            scenario.num_training_programs = v;
        }
        if let Some(v) = self.regions {
            scenario.num_regions = v;
        }
        if let Some(v) = self.months {
            scenario.duration_months = v;
        }
        if let Some(v) = self.curve {
            scenario.adoption_curve = v;
        }
        if let Some(v) = self.pace {
            scenario.automation_pace = v;
        }
        if self.seed.is_some() {
            scenario.seed = self.seed;
        }
        for &kind in &self.interventions {
            scenario.interventions.push(Intervention::new(kind));
        }

        scenario.validate()?;
        Ok(scenario)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let scenario = args.scenario()?;
    let rt = Runtime::new()?;
    rt.block_on(run(&args, scenario))
}

async fn run(args: &Args, scenario: ScenarioConfig) -> Result<()> {
    let client = SimulationClient::spawn()?;

    let info = client.init(scenario).await?;
    println!("\n=== LABOR FRONTIER ===");
    println!(
        "{} workers, {} firms, {} training programs (seed {})",
        info.worker_count, info.firm_count, info.training_program_count, info.seed
    );
    println!();

    let result = client
        .run_simulation(None, |p| {
            println!(
                "  month {:>3}/{:<3} unemployment {:>5.1}%  AI adoption {:>5.1}%  capability {:.3}",
                p.month,
                p.total_months,
                p.current_stats.unemployment_rate * 100.0,
                p.current_stats.ai_adoption_rate * 100.0,
                p.current_stats.ai_capability_level,
            );
        })
        .await?;

    println!();
    println!("{}", result.summary_text());

    if let Some(path) = &args.output {
        std::fs::write(path, result.to_json())?;
        println!("\nFull output written to {}", path.display());
    }

    client.terminate().await
}
