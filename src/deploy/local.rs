//! Commands against a localhost deployment

use tracing::info;

use super::{metrics_timestamp, workload_params, Context};
use crate::config::Command;
use crate::utils::{CommandSpec, Result};
use crate::workload::{run_workload, timestamp_now};

/// Datastore images: tag and build context
pub const DATASTORE_IMAGES: [(&str, &str); 3] = [
    ("mongodb-delayed:4.4.6", "docker/mongodb-delayed/."),
    ("mongodb-setup:4.4.6", "docker/mongodb-setup/post-storage/."),
    ("rabbitmq-setup:3.8", "docker/rabbitmq-setup/write-home-timeline/."),
];

fn docker_compose(ctx: &Context<'_>, args: &[&str]) -> CommandSpec {
    CommandSpec::new("docker-compose")
        .args(args.iter().copied())
        .current_dir(&ctx.config.base_dir)
}

pub fn init_social_graph(ctx: &Context<'_>, _: &Command) -> Result<()> {
    let url = ctx.config.local_url();
    let script = CommandSpec::new("./scripts/init_social_graph.py")
        .env("HOST_EU", url.as_str())
        .env("HOST_US", url.as_str())
        .current_dir(&ctx.config.base_dir);
    ctx.run(&script)
}

pub fn wrk2(ctx: &Context<'_>, command: &Command) -> Result<()> {
    let timestamp = timestamp_now();
    run_workload(
        ctx.config,
        ctx.runner,
        &ctx.config.local_url(),
        &workload_params(command),
        &timestamp,
    )?;
    ctx.collect_metrics(Some(&timestamp))?;
    Ok(())
}

pub fn metrics(ctx: &Context<'_>, command: &Command) -> Result<()> {
    ctx.collect_metrics(metrics_timestamp(command))?;
    Ok(())
}

pub fn storage_build(ctx: &Context<'_>, _: &Command) -> Result<()> {
    for (tag, context) in DATASTORE_IMAGES {
        let build = CommandSpec::new("docker")
            .args(["build", "-t", tag, context])
            .current_dir(&ctx.config.base_dir);
        ctx.run(&build)?;
    }
    Ok(())
}

pub fn storage_run(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&docker_compose(ctx, &["up", "-d"]))?;
    ctx.settle(
        ctx.config.datastores_settle,
        "waiting for storages to be ready",
    );
    Ok(())
}

pub fn storage_clean(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&docker_compose(ctx, &["down"]))
}

/// `storage-deploy` and `storage-info` have no local counterpart
pub fn nothing_to_do(_: &Context<'_>, _: &Command) -> Result<()> {
    info!("nothing to be done for local");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::testing::RecordingPacer;
    use crate::config::{ManagerConfig, Target, WorkloadArgs};
    use crate::metrics::table::sample_table;
    use crate::utils::command::fake::FakeRunner;
    use crate::workload::wrk2::WRK_BINARY;
    use std::fs;
    use std::time::Duration;

    fn local_config() -> ManagerConfig {
        let mut config = ManagerConfig::for_tests();
        config.target = Target::Local;
        config.gcp_profile = None;
        config
    }

    #[test]
    fn test_storage_build_images() {
        let config = local_config();
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));
        storage_build(&ctx, &Command::StorageBuild).unwrap();
        assert_eq!(
            runner.call_lines(),
            vec![
                "docker build -t mongodb-delayed:4.4.6 docker/mongodb-delayed/.",
                "docker build -t mongodb-setup:4.4.6 docker/mongodb-setup/post-storage/.",
                "docker build -t rabbitmq-setup:3.8 docker/rabbitmq-setup/write-home-timeline/.",
            ]
        );
    }

    #[test]
    fn test_storage_run_settles() {
        let mut config = local_config();
        config.datastores_settle = Duration::from_secs(30);
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));
        storage_run(&ctx, &Command::StorageRun).unwrap();
        assert_eq!(runner.call_lines(), vec!["docker-compose up -d"]);
    }

    #[test]
    fn test_init_social_graph_env() {
        let config = local_config();
        let runner = FakeRunner::new();
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));
        init_social_graph(&ctx, &Command::InitSocialGraph).unwrap();
        assert_eq!(
            runner.call_lines()[0],
            "HOST_EU=http://127.0.0.1:9000 HOST_US=http://127.0.0.1:9000 ./scripts/init_social_graph.py"
        );
    }

    #[test]
    fn test_wrk2_then_metrics() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("wrk2")).unwrap();
        fs::write(dir.path().join(WRK_BINARY), "").unwrap();
        let mut config = local_config();
        config.base_dir = dir.path().to_path_buf();

        let runner = FakeRunner::new();
        runner.stdout("wrk2/wrk", "Requests/sec: 50.01\n");
        runner.stdout("sn_received_notifications", &sample_table("notifications", &["4"]));
        runner.stdout("sn_inconsistencies", &sample_table("inconsistencies", &["1"]));
        let ctx = Context::with_pacer(&config, &runner, Box::new(RecordingPacer::default()));

        let command = Command::Wrk2(WorkloadArgs {
            threads: 1,
            conns: 1,
            duration: 0,
            rate: 10,
        });
        wrk2(&ctx, &command).unwrap();

        let runs: Vec<_> = fs::read_dir(dir.path().join("evaluation/local"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].join("workload.out").is_file());
        let record = fs::read_to_string(runs[0].join("metrics.yml")).unwrap();
        assert!(record.contains("per_inconsistencies: 25.0"));
        assert_eq!(runner.calls().len(), 7);
    }
}
