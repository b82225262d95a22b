//! wrk2 load generation against the compose-post endpoint

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use crate::config::{ManagerConfig, WorkloadArgs};
use crate::metrics::run_dir;
use crate::utils::{CommandRunner, CommandSpec, ManagerError, ProgressTicker, Result};

pub const WRK_BINARY: &str = "wrk2/wrk";
pub const COMPOSE_POST_SCRIPT: &str = "./wrk2/scripts/social-network/compose-post.lua";
pub const COMPOSE_POST_PATH: &str = "/wrk2-api/post/compose";

/// Timestamp naming one workload run
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d_%H:%M:%S").to_string()
}

/// Load generator parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadParams {
    pub threads: u32,
    pub connections: u32,
    pub duration_secs: u64,
    pub rate: u64,
}

impl Default for WorkloadParams {
    fn default() -> Self {
        Self {
            threads: 2,
            connections: 2,
            duration_secs: 30,
            rate: 50,
        }
    }
}

impl From<WorkloadArgs> for WorkloadParams {
    fn from(args: WorkloadArgs) -> Self {
        Self {
            threads: args.threads,
            connections: args.conns,
            duration_secs: args.duration,
            rate: args.rate,
        }
    }
}

/// Raw output of a finished run
#[derive(Debug, Clone)]
pub struct WorkloadRun {
    pub timestamp: String,
    pub output_path: PathBuf,
    pub output: String,
}

/// Build the wrk2 invocation for an application url
pub fn wrk2_command(config: &ManagerConfig, url: &str, params: &WorkloadParams) -> CommandSpec {
    CommandSpec::new(config.path(WRK_BINARY).to_string_lossy())
        .args(["-D", "exp", "-t"])
        .arg(params.threads.to_string())
        .arg("-c")
        .arg(params.connections.to_string())
        .arg("-d")
        .arg(params.duration_secs.to_string())
        .args(["-L", "-s", COMPOSE_POST_SCRIPT])
        .arg(format!("{}{}", url, COMPOSE_POST_PATH))
        .arg("-R")
        .arg(params.rate.to_string())
        .env("HOST_EU", url)
        .env("HOST_US", url)
        .current_dir(&config.base_dir)
}

/// Run wrk2 and keep its raw output under the evaluation directory
///
/// The output is written verbatim to `<evaluation>/<target>/<timestamp>/workload.out`;
/// it is the input of the later metrics run for the same timestamp.
pub fn run_workload(
    config: &ManagerConfig,
    runner: &dyn CommandRunner,
    url: &str,
    params: &WorkloadParams,
    timestamp: &str,
) -> Result<WorkloadRun> {
    let binary = config.path(WRK_BINARY);
    if !config.dry_run && !binary.is_file() {
        return Err(ManagerError::Workload(format!(
            "'{}' file does not exist",
            binary.display()
        )));
    }

    let spec = wrk2_command(config, url, params);
    let output = {
        let _ticker = ProgressTicker::start(
            Duration::from_secs(params.duration_secs),
            "running workload",
            !config.show_progress,
        );
        runner.output(&spec)?
    };

    let dir = run_dir(&config.evaluation_dir(), config.target.as_str(), timestamp);
    fs::create_dir_all(&dir)?;
    let output_path = dir.join("workload.out");
    fs::write(&output_path, &output)?;

    println!("{}", output);
    info!("workload results saved at {}", output_path.display());

    Ok(WorkloadRun {
        timestamp: timestamp.to_string(),
        output_path,
        output,
    })
}
