//! Command-line argument parsing
//!
//! Every subcommand runs against one deployment target, selected with
//! `--local` or `--gcp`.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::metrics::OutputFormat;
use crate::utils::ConfigError;

/// Deploy, run and measure the social network benchmark
#[derive(Parser, Debug, Clone)]
#[command(name = "dsb-manager")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    // ===== Target =====
    /// Run against localhost
    #[arg(long, global = true)]
    pub local: bool,

    /// Run against the GCP deployment
    #[arg(long, global = true)]
    pub gcp: bool,

    // ===== Environment =====
    /// Root of the benchmark checkout (deploy/, wrk2/, evaluation/ live here)
    #[arg(long = "base-dir", global = true)]
    pub base_dir: Option<PathBuf>,

    /// Log external commands instead of running them
    #[arg(long = "dry-run", global = true)]
    pub dry_run: bool,

    // ===== Readiness =====
    /// Wait budget for swarm readiness gates, in seconds
    #[arg(long = "readiness-budget", global = true, default_value_t = 120)]
    pub readiness_budget_secs: u64,

    /// Wait between readiness checks, in seconds
    #[arg(long = "readiness-interval", global = true, default_value_t = 30)]
    pub readiness_interval_secs: u64,

    // ===== Output =====
    /// Console format for metrics reports that are not saved (saved runs echo their YAML record)
    #[arg(long = "output-format", global = true, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output_format: OutputFormat,

    /// Hide progress bars
    #[arg(long = "no-progress", global = true)]
    pub no_progress: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ===== Cloud deployment =====
    /// Create firewall rules
    Configure,
    /// Provision machines and install the deployment
    Deploy,
    /// Start datastores and the application
    Start,
    /// Stop the application and datastores
    Stop,
    /// Stop, then start
    Restart,
    /// Destroy machines and generated files
    Clean,
    /// Show swarm status and machine addresses
    Info,

    // ===== Local datastores =====
    /// Build datastore images
    StorageBuild,
    /// Deploy datastores
    StorageDeploy,
    /// Run datastores
    StorageRun,
    /// Show datastore status
    StorageInfo,
    /// Remove datastores
    StorageClean,

    // ===== Evaluation =====
    /// Populate the social graph
    InitSocialGraph,
    /// Run the wrk2 workload
    Wrk2(WorkloadArgs),
    /// Aggregate application metrics
    Metrics(MetricsArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Configure => "configure",
            Command::Deploy => "deploy",
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Restart => "restart",
            Command::Clean => "clean",
            Command::Info => "info",
            Command::StorageBuild => "storage-build",
            Command::StorageDeploy => "storage-deploy",
            Command::StorageRun => "storage-run",
            Command::StorageInfo => "storage-info",
            Command::StorageClean => "storage-clean",
            Command::InitSocialGraph => "init-social-graph",
            Command::Wrk2(_) => "wrk2",
            Command::Metrics(_) => "metrics",
        }
    }
}

/// wrk2 tuning
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadArgs {
    /// Number of threads
    #[arg(short = 't', long = "threads", default_value_t = 2)]
    pub threads: u32,

    /// Number of connections
    #[arg(short = 'c', long = "conns", default_value_t = 2)]
    pub conns: u32,

    /// Duration in seconds
    #[arg(short = 'd', long = "duration", default_value_t = 30)]
    pub duration: u64,

    /// Requests per second
    #[arg(short = 'r', long = "rate", default_value_t = 50)]
    pub rate: u64,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Timestamp of the workload run; the report is saved next to it
    #[arg(short = 't', long = "timestamp")]
    pub timestamp: Option<String>,
}

/// Environment a command runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Local,
    Gcp,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Local => "local",
            Target::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Exactly one of `--local` / `--gcp`
    pub fn target(&self) -> Result<Target, ConfigError> {
        match (self.local, self.gcp) {
            (true, false) => Ok(Target::Local),
            (false, true) => Ok(Target::Gcp),
            _ => Err(ConfigError::AmbiguousTarget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrk2_defaults() {
        let args = CliArgs::parse_from(["test", "wrk2", "--local"]);
        assert_eq!(
            args.command,
            Command::Wrk2(WorkloadArgs {
                threads: 2,
                conns: 2,
                duration: 30,
                rate: 50
            })
        );
        assert_eq!(args.target().unwrap(), Target::Local);
    }

    #[test]
    fn test_wrk2_flags() {
        let args = CliArgs::parse_from([
            "test", "--gcp", "wrk2", "-t", "4", "-c", "8", "-d", "60", "-r", "200",
        ]);
        match args.command {
            Command::Wrk2(w) => {
                assert_eq!(w.threads, 4);
                assert_eq!(w.conns, 8);
                assert_eq!(w.duration, 60);
                assert_eq!(w.rate, 200);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.target().unwrap(), Target::Gcp);
    }

    #[test]
    fn test_metrics_timestamp() {
        let args = CliArgs::parse_from(["test", "metrics", "--local", "-t", "2024-05-01_10:00:00"]);
        assert_eq!(
            args.command,
            Command::Metrics(MetricsArgs {
                timestamp: Some("2024-05-01_10:00:00".to_string())
            })
        );
    }

    #[test]
    fn test_kebab_case_subcommands() {
        let args = CliArgs::parse_from(["test", "storage-build", "--local"]);
        assert_eq!(args.command, Command::StorageBuild);
        assert_eq!(args.command.name(), "storage-build");
        let args = CliArgs::parse_from(["test", "init-social-graph", "--gcp"]);
        assert_eq!(args.command, Command::InitSocialGraph);
    }

    #[test]
    fn test_target_required() {
        let args = CliArgs::parse_from(["test", "info"]);
        assert!(matches!(args.target(), Err(ConfigError::AmbiguousTarget)));
        let args = CliArgs::parse_from(["test", "info", "--local", "--gcp"]);
        assert!(matches!(args.target(), Err(ConfigError::AmbiguousTarget)));
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(CliArgs::try_parse_from(["test", "launch", "--local"]).is_err());
    }
}
