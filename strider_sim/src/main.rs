// strider_sim/src/main.rs

use clap::Parser;
use strider_sim::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SimError> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = RunOptions {
        ticks: cli.ticks,
        log_forecast: cli.forecast,
    };

    for path in collect_scenario_paths(&cli.scenario)? {
        let scenario = ScenarioConfig::load(&path)?;
        let report = run_scenario(&scenario, &options)?;
        info!(
            scenario = %report.scenario,
            stop_errors = ?report.stop_errors,
            final_speed = report.final_speed,
            "finished"
        );
        if cli.print_report {
            println!("{}", toml::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
