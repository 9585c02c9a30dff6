// strider_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Strider: runs scripted movement scenarios through the trajectory engine.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// A scenario TOML file, or a directory to search for them.
    #[arg(short, long, default_value = "assets/scenarios/stop_and_go.toml")]
    pub scenario: PathBuf,

    /// Override the number of ticks to run instead of the scenario's duration.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Log the final forecast sample by sample.
    #[arg(long, default_value_t = false)]
    pub forecast: bool,

    /// Print each run report to stdout as TOML.
    #[arg(long, default_value_t = false)]
    pub print_report: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["strider", "-s", "a.toml", "--ticks", "12", "-v", "--forecast"]);
        assert_eq!(cli.scenario, PathBuf::from("a.toml"));
        assert_eq!(cli.ticks, Some(12));
        assert!(cli.verbose);
        assert!(cli.forecast);
        assert!(!cli.print_report);
    }

    #[test]
    fn defaults_to_bundled_scenario() {
        let cli = Cli::parse_from(["strider"]);
        assert_eq!(cli.scenario, PathBuf::from("assets/scenarios/stop_and_go.toml"));
        assert_eq!(cli.ticks, None);
    }
}
