//! Deployment commands
//!
//! This module provides:
//! - The execution [`Context`] shared by every command handler
//! - GCP and localhost command handlers
//! - Config file generation (application config, ansible inventory and vars)
//! - The command registry mapping (target, command) to a handler

pub mod gcp;
pub mod local;
pub mod registry;
pub mod templates;

use std::cell::RefCell;
use std::time::Duration;

use tracing::info;

use crate::cluster::{
    CountdownPacer, HostResolver, Pacer, PollOutcome, ReadinessCheck, ReadinessGate,
    ReadinessPoller,
};
use crate::config::{Command, ManagerConfig};
use crate::metrics::{MetricsAggregator, MetricsReport, MetricsReporter, RuntimeMetricsSource};
use crate::utils::{CommandRunner, CommandSpec, Result};
use crate::workload::WorkloadParams;

pub use registry::{CommandRegistry, CommandTag, Handler};

/// Everything a command handler needs
pub struct Context<'a> {
    pub config: &'a ManagerConfig,
    pub runner: &'a dyn CommandRunner,
    pacer: RefCell<Box<dyn Pacer + 'a>>,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a ManagerConfig, runner: &'a dyn CommandRunner) -> Self {
        let pacer = CountdownPacer {
            hidden: !config.show_progress,
        };
        Self::with_pacer(config, runner, Box::new(pacer))
    }

    pub fn with_pacer(
        config: &'a ManagerConfig,
        runner: &'a dyn CommandRunner,
        pacer: Box<dyn Pacer + 'a>,
    ) -> Self {
        Self {
            config,
            runner,
            pacer: RefCell::new(pacer),
        }
    }

    /// Run in the foreground
    pub fn run(&self, spec: &CommandSpec) -> Result<()> {
        Ok(self.runner.run(spec)?)
    }

    /// Run and capture stdout
    pub fn output(&self, spec: &CommandSpec) -> Result<String> {
        Ok(self.runner.output(spec)?)
    }

    /// Fixed wait with a countdown
    pub fn settle(&self, duration: Duration, message: &str) {
        if self.config.dry_run {
            info!("[dry-run] {} for {} seconds", message, duration.as_secs());
            return;
        }
        self.pacer.borrow_mut().wait(duration.as_secs(), message);
    }

    /// Block on a readiness gate with the configured budget
    pub fn wait_ready(&self, gate: &ReadinessGate) -> Result<PollOutcome> {
        if self.config.dry_run {
            info!("[dry-run] wait for {} {}", gate.target, gate.dimension);
            return Ok(PollOutcome {
                check: ReadinessCheck {
                    dimension: gate.dimension,
                    target: gate.target,
                    actual: gate.target,
                },
                attempts: 0,
                waited_secs: 0,
            });
        }
        let poller = ReadinessPoller::new(self.runner, self.config.readiness);
        let mut pacer = self.pacer.borrow_mut();
        Ok(poller.wait_for(gate, pacer.as_mut())?)
    }

    pub fn resolver(&self) -> Result<HostResolver<'_>> {
        let profile = self.config.require_profile()?;
        Ok(HostResolver::new(self.runner, profile))
    }

    /// `ansible-playbook` against the generated GCP inventory and vars
    pub fn playbook(&self, name: &str) -> CommandSpec {
        let playbook = self.config.path("deploy/ansible/playbooks").join(name);
        CommandSpec::new("ansible-playbook")
            .arg(playbook.to_string_lossy())
            .arg("-i")
            .arg(self.config.inventory_path().to_string_lossy())
            .arg("--extra-vars")
            .arg(format!("@{}", self.config.ansible_vars_path().display()))
            .current_dir(&self.config.base_dir)
    }

    /// Aggregate application metrics; persist them when a timestamp is given
    pub fn collect_metrics(&self, timestamp: Option<&str>) -> Result<MetricsReport> {
        let source = RuntimeMetricsSource::new(
            self.runner,
            &self.config.runtime_program,
            &self.config.runtime_deployer,
        );
        let report = MetricsAggregator::new(&source).aggregate()?;

        let reporter = MetricsReporter::new(self.config.output_format, self.config.evaluation_dir());
        reporter.publish(&report, self.config.target.as_str(), timestamp)?;
        Ok(report)
    }
}

/// wrk2 parameters carried by a command, defaults otherwise
pub fn workload_params(command: &Command) -> WorkloadParams {
    match command {
        Command::Wrk2(args) => WorkloadParams::from(*args),
        _ => WorkloadParams::default(),
    }
}

/// `--timestamp` of a metrics command
pub fn metrics_timestamp(command: &Command) -> Option<&str> {
    match command {
        Command::Metrics(args) => args.timestamp.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::RecordingPacer;
    use crate::config::{MetricsArgs, WorkloadArgs};
    use crate::metrics::table::sample_table;
    use crate::utils::command::fake::FakeRunner;

    #[test]
    fn test_playbook_command() {
        let config = ManagerConfig::for_tests();
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));
        assert_eq!(
            ctx.playbook("start-app.yml").to_string(),
            "ansible-playbook /srv/dsb/deploy/ansible/playbooks/start-app.yml \
             -i /srv/dsb/deploy/tmp/ansible-inventory-gcp.cfg \
             --extra-vars @/srv/dsb/deploy/tmp/ansible-vars.yml"
        );
    }

    #[test]
    fn test_collect_metrics_persists_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ManagerConfig::for_tests();
        config.base_dir = dir.path().to_path_buf();

        let runner = FakeRunner::new();
        runner.stdout("sn_composed_posts", &sample_table("posts", &["12", "7", "0"]));
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));

        let report = ctx.collect_metrics(Some("ts")).unwrap();
        assert_eq!(report.composed_posts(), 19);
        assert!(dir.path().join("evaluation/gcp/ts/metrics.yml").is_file());
    }

    #[test]
    fn test_command_arguments() {
        let wrk2 = Command::Wrk2(WorkloadArgs {
            threads: 8,
            conns: 16,
            duration: 10,
            rate: 100,
        });
        assert_eq!(workload_params(&wrk2).connections, 16);
        assert_eq!(workload_params(&Command::Info), WorkloadParams::default());

        let metrics = Command::Metrics(MetricsArgs {
            timestamp: Some("ts".into()),
        });
        assert_eq!(metrics_timestamp(&metrics), Some("ts"));
        assert_eq!(metrics_timestamp(&Command::Info), None);
    }
}
