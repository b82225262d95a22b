//! Manager configuration derived from CLI arguments

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cli::{CliArgs, Target};
use super::gcp_profile::{GcpLayout, GcpProfile};
use crate::cluster::PollConfig;
use crate::metrics::OutputFormat;
use crate::utils::ConfigError;

pub const APP_PORT: u16 = 9000;
pub const APP_PORT_US: u16 = 9001;
pub const NUM_SWARM_NODES: usize = 3;
pub const NUM_SWARM_SERVICES: usize = 20;

/// Complete manager configuration, built once at startup
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    // Environment
    pub base_dir: PathBuf,
    pub target: Target,
    pub dry_run: bool,

    // Application
    pub app_port: u16,
    pub runtime_program: String,
    pub runtime_deployer: String,

    // Cluster
    pub swarm_nodes: usize,
    pub swarm_services: usize,
    pub readiness: PollConfig,
    pub machines_settle: Duration,
    pub datastores_settle: Duration,

    // GCP
    pub gcp_layout: GcpLayout,
    pub gcp_profile: Option<GcpProfile>,

    // Output
    pub output_format: OutputFormat,
    pub show_progress: bool,
}

impl ManagerConfig {
    /// Create configuration from CLI arguments
    ///
    /// The GCP profile is only loaded for the GCP target.
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let target = args.target()?;

        let base_dir = match args.base_dir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::Read {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let gcp_profile = match target {
            Target::Gcp => Some(GcpProfile::load(&base_dir)?),
            Target::Local => None,
        };

        Ok(Self {
            base_dir,
            target,
            dry_run: args.dry_run,

            app_port: APP_PORT,
            runtime_program: "weaver".to_string(),
            runtime_deployer: "multi".to_string(),

            swarm_nodes: NUM_SWARM_NODES,
            swarm_services: NUM_SWARM_SERVICES,
            readiness: PollConfig {
                interval_secs: args.readiness_interval_secs,
                budget_secs: args.readiness_budget_secs,
            },
            machines_settle: Duration::from_secs(30),
            datastores_settle: Duration::from_secs(30),

            gcp_layout: GcpLayout::default(),
            gcp_profile,

            output_format: args.output_format,
            show_progress: !args.no_progress && !args.quiet,
        })
    }

    /// Resolve a path relative to the base directory
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Generated per-deployment files
    pub fn tmp_dir(&self) -> PathBuf {
        self.path("deploy/tmp")
    }

    /// Workload outputs and metrics records
    pub fn evaluation_dir(&self) -> PathBuf {
        self.path("evaluation")
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.tmp_dir().join("ansible-inventory-gcp.cfg")
    }

    pub fn ansible_vars_path(&self) -> PathBuf {
        self.tmp_dir().join("ansible-vars.yml")
    }

    pub fn require_profile(&self) -> Result<&GcpProfile, ConfigError> {
        self.gcp_profile.as_ref().ok_or(ConfigError::MissingProfile)
    }

    /// Local endpoint of the application
    pub fn local_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.app_port)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            base_dir: PathBuf::from("/srv/dsb"),
            target: Target::Gcp,
            dry_run: false,
            app_port: APP_PORT,
            runtime_program: "weaver".to_string(),
            runtime_deployer: "multi".to_string(),
            swarm_nodes: NUM_SWARM_NODES,
            swarm_services: NUM_SWARM_SERVICES,
            readiness: PollConfig {
                interval_secs: 1,
                budget_secs: 2,
            },
            machines_settle: Duration::ZERO,
            datastores_settle: Duration::ZERO,
            gcp_layout: GcpLayout::default(),
            gcp_profile: Some(GcpProfile {
                project_id: "dsb-project".to_string(),
                username: "bench".to_string(),
            }),
            output_format: OutputFormat::Yaml,
            show_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_local_config() {
        let args = CliArgs::parse_from([
            "test",
            "--local",
            "--base-dir",
            "/opt/dsb",
            "--readiness-budget",
            "300",
            "--no-progress",
            "storage-run",
        ]);
        let config = ManagerConfig::from_cli(&args).unwrap();
        assert_eq!(config.target, Target::Local);
        assert!(config.gcp_profile.is_none());
        assert_eq!(config.readiness.budget_secs, 300);
        assert_eq!(config.readiness.interval_secs, 30);
        assert!(!config.show_progress);
        assert_eq!(config.tmp_dir(), PathBuf::from("/opt/dsb/deploy/tmp"));
        assert_eq!(config.local_url(), "http://127.0.0.1:9000");
        assert!(matches!(
            config.require_profile(),
            Err(ConfigError::MissingProfile)
        ));
    }

    #[test]
    fn test_gcp_requires_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_string_lossy().to_string();
        let args = CliArgs::parse_from(["test", "--gcp", "--base-dir", base.as_str(), "info"]);
        assert!(matches!(
            ManagerConfig::from_cli(&args),
            Err(ConfigError::Read { .. })
        ));
    }
}
