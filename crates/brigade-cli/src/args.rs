use std::{path::PathBuf, time::Duration};

use brigade_core::{params::PlanRecipe, SchedulerConfig};
use clap::{Args as ClapArgs, Parser, Subcommand};

/// Command-line front end for brigade kitchen sessions
///
/// Brigade splits a recipe between the chefs in a kitchen, re-planning the
/// remaining work whenever someone joins, leaves or finishes a step. The CLI
/// can plan a recipe once, replay a recorded event log against a session, or
/// serve a live session over JSON lines on stdin/stdout.
#[derive(Parser)]
#[command(version, about, name = "brigade")]
pub struct Args {
    /// Path to a machine specification JSON file. Defaults to
    /// $XDG_CONFIG_HOME/brigade/machine.json, then the built-in machine
    #[arg(long, global = true)]
    pub machine_file: Option<PathBuf>,

    /// Length of one scheduling slot in seconds; must divide 60
    #[arg(long, global = true)]
    pub slot_seconds: Option<u32>,

    /// Wall-clock budget in seconds for each solver probe
    #[arg(long, global = true)]
    pub probe_timeout: Option<u64>,

    /// Treat the oven as a shared resource, so baking steps never overlap
    #[arg(long, global = true)]
    pub shared_oven: bool,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Scheduler settings with the command-line overrides applied.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            slot_seconds: self.slot_seconds.unwrap_or(defaults.slot_seconds),
            probe_timeout: self
                .probe_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            ..defaults
        }
    }
}

/// Available commands for the brigade CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Schedule a whole recipe onto a roster and print the plan
    #[command(alias = "p")]
    Plan(PlanArgs),
    /// Apply a JSON-lines event log to a fresh session and print the result
    #[command(alias = "r")]
    Replay(ReplayArgs),
    /// Run a session, reading events from stdin and answering on stdout
    Serve(ServeArgs),
    /// Validate and print the state machine in use
    #[command(alias = "m")]
    Machine,
}

/// Schedule a recipe
///
/// Recipes ending in `.json` are read as a JSON array of instructions; any
/// other file uses the `index;text;seconds;deps` line format.
#[derive(ClapArgs)]
pub struct PlanArgs {
    #[arg(long, help = "Recipe file (.json or index;text;seconds;deps lines)")]
    pub recipe: PathBuf,
    #[arg(
        long,
        value_delimiter = ',',
        required = true,
        help = "Chef names as a comma-separated list"
    )]
    pub chefs: Vec<String>,
    #[arg(long, help = "Smallest horizon in minutes to try")]
    pub lower: Option<u32>,
    #[arg(long, help = "Exclusive upper limit on the horizon in minutes")]
    pub upper: Option<u32>,
}

impl From<&PlanArgs> for PlanRecipe {
    fn from(val: &PlanArgs) -> Self {
        PlanRecipe {
            chefs: val.chefs.clone(),
            lower_bound: val.lower,
            upper_bound: val.upper,
        }
    }
}

/// Replay an event log
#[derive(ClapArgs)]
pub struct ReplayArgs {
    #[arg(long, help = "Recipe file (.json or index;text;seconds;deps lines)")]
    pub recipe: PathBuf,
    #[arg(long, help = "JSON-lines file with one event per line")]
    pub events: PathBuf,
    #[arg(long, default_value = "kitchen", help = "Session identifier")]
    pub session: String,
}

/// Serve a live session
#[derive(ClapArgs)]
pub struct ServeArgs {
    #[arg(long, help = "Recipe file (.json or index;text;seconds;deps lines)")]
    pub recipe: PathBuf,
    #[arg(long, default_value = "kitchen", help = "Session identifier")]
    pub session: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_overrides() {
        let args = Args::parse_from([
            "brigade",
            "--slot-seconds",
            "15",
            "--probe-timeout",
            "5",
            "plan",
            "--recipe",
            "pasta.txt",
            "--chefs",
            "ana,bo",
        ]);
        let config = args.scheduler_config();
        assert_eq!(config.slot_seconds, 15);
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.lower_bound_minutes, 0);

        let Commands::Plan(plan) = &args.command else {
            panic!("expected plan command");
        };
        let params = PlanRecipe::from(plan);
        assert_eq!(params.chefs, vec!["ana", "bo"]);
        assert_eq!(params.upper_bound, None);
    }
}
