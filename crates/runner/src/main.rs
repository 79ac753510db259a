//! Evaluates both service schemes for one line configuration and demand
//! profile. Runs REGULAR and SKIP-STOP as two independently supervised
//! actors (§5 "across independent simulation runs... the simulator is
//! re-initialised from topology upward"), following the wiring style of the
//! teacher's `web` binary: `env_logger::init()` then hand the collaborators
//! to the async runtime.

use std::any::Any;
use std::fs;
use std::path::PathBuf;

use actors::actor::{Actor, SupervisionStrategy};
use actors::handler::{Handler, Message};
use async_trait::async_trait;
use clap::Parser;
use config::Configuration;
use demand::RawDemandRecord;
use engine::Simulation;
use model::{AggregatedDemandEntry, Scheme, SchemeMetrics};
use sink::InMemorySink;

#[derive(Parser, Debug)]
#[command(about = "Evaluates REGULAR and SKIP-STOP service on one line configuration and demand profile")]
struct Args {
    /// Path to the configuration JSON (§6).
    #[arg(long)]
    config: PathBuf,
    /// Path to the wide demand CSV (§6).
    #[arg(long)]
    demand: PathBuf,
}

/// Owns everything one scheme's run needs; re-created from scratch on
/// restart, which mirrors the spec's "no state crosses runs" rule (§5).
struct SchemeActor {
    config: Configuration,
    records: Vec<RawDemandRecord>,
    scheme: Scheme,
}

impl Actor for SchemeActor {
    fn on_fail(&mut self, error: Box<dyn Any + Send>) -> SupervisionStrategy {
        log::error!("{:?} run panicked: {:?}", self.scheme, error);
        SupervisionStrategy::Stop
    }
}

#[derive(Clone)]
struct Run;

impl Message for Run {
    type Response = Result<(SchemeMetrics, Vec<AggregatedDemandEntry>), String>;
}

#[async_trait]
impl Handler<Run> for SchemeActor {
    async fn handle(&mut self, _msg: Run) -> Self::Response {
        let simulation = Simulation::new(&self.config, self.scheme, self.records.clone()).map_err(|why| why.to_string())?;
        let mut sink = InMemorySink::new();
        Ok(simulation.run_and_report(&mut sink))
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let config_json = fs::read_to_string(&args.config).expect("could not read configuration file");
    let config = Configuration::from_json(&config_json).expect("invalid configuration");

    let demand_csv = fs::read_to_string(&args.demand).expect("could not read demand file");
    let (records, report) = demand::parse(&demand_csv, config.station_names.len() as u32).expect("invalid demand input");
    log::info!(
        "ingested {} demand group(s); skipped {} row(s), {} column(s), {} cell(s)",
        records.len(),
        report.skipped_rows,
        report.skipped_columns,
        report.skipped_cells
    );

    let regular_config = config.clone();
    let regular_records = records.clone();
    let regular = actors::run(move || SchemeActor {
        config: regular_config.clone(),
        records: regular_records.clone(),
        scheme: Scheme::Regular,
    });

    let skip_stop_config = config.clone();
    let skip_stop_records = records.clone();
    let skip_stop = actors::run(move || SchemeActor {
        config: skip_stop_config.clone(),
        records: skip_stop_records.clone(),
        scheme: Scheme::SkipStop,
    });

    let (regular_result, skip_stop_result) = tokio::join!(regular.ask(Run), skip_stop.ask(Run));

    report_outcome(Scheme::Regular, regular_result);
    report_outcome(Scheme::SkipStop, skip_stop_result);
}

fn report_outcome<E: std::fmt::Debug>(
    scheme: Scheme,
    outcome: Result<Result<(SchemeMetrics, Vec<AggregatedDemandEntry>), String>, E>,
) {
    match outcome {
        Ok(Ok((metrics, aggregated))) => {
            println!(
                "{}: boarded={} avg_wait={:.1}s avg_travel={:.1}s avg_load={:.2} run={}ms aggregated_buckets={}",
                scheme.as_str(),
                metrics.total_boarded,
                metrics.average_wait_time_seconds(),
                metrics.average_travel_time_seconds(),
                metrics.average_load_factor,
                metrics.run_duration_ms,
                aggregated.len()
            );
        }
        Ok(Err(why)) => log::error!("{}: run failed: {why}", scheme.as_str()),
        Err(why) => log::error!("{}: actor failed: {why:?}", scheme.as_str()),
    }
}
