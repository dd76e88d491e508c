//! Command line entry point: plan trips for a JSON batch of demand.

use clap::Parser;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use trip_planner::config::Config;
use trip_planner::error::Result;
use trip_planner::problem::{ManufacturingLocation, SkuDeliveryInfo};
use trip_planner::utils::{save_plan_report, PlanStatistics};
use trip_planner::TripPlanner;

#[derive(Parser, Debug)]
#[command(name = "trip-planner", version, about = "Consolidate SKU demand into trips and route them")]
struct Args {
    /// JSON file with `manufacturing_locations` and `demand`
    #[arg(short, long)]
    input: PathBuf,

    /// JSON configuration file; defaults are used for missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the plan as JSON (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write a plain-text report
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Wall-clock limit for routing, in seconds
    #[arg(long)]
    time_limit_secs: Option<u64>,
}

#[derive(Deserialize)]
struct PlanRequest {
    manufacturing_locations: Vec<ManufacturingLocation>,
    demand: Vec<SkuDeliveryInfo>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(seconds) = args.time_limit_secs {
        config = config.with_time_limit(Duration::from_secs(seconds));
    }

    let request: PlanRequest = serde_json::from_str(&fs::read_to_string(&args.input)?)?;
    info!(
        "Loaded {} demand records and {} manufacturing locations from {}",
        request.demand.len(),
        request.manufacturing_locations.len(),
        args.input.display()
    );

    let planner = TripPlanner::new(config)?;
    let plan = planner.plan(&request.demand, &request.manufacturing_locations)?;

    let json = serde_json::to_string_pretty(&plan)?;
    match &args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{}", json),
    }

    if let Some(path) = &args.report {
        save_plan_report(&plan, path)?;
    }

    eprintln!("{}", PlanStatistics::from_plan(&plan).format());

    Ok(())
}
