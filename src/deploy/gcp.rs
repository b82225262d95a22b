//! Commands against the GCP deployment

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{error, info};

use super::templates::{
    read_template, render_ansible_vars, render_inventory, render_weaver_config, write_output,
    InventoryHosts,
};
use super::{metrics_timestamp, workload_params, Context};
use crate::cluster::swarm::{node_ls, nodes_gate, service_ls, services_gate};
use crate::config::{Command, GcpInstance, Target};
use crate::utils::{CommandSpec, Result};
use crate::workload::{run_workload, timestamp_now};

pub const TERRAFORM_DIR: &str = "./deploy/terraform";

/// Ingress rules opened by `configure`
pub const FIREWALL_RULES: [(&str, &str); 3] = [
    ("weaver-dsb-socialnetwork", "tcp:9000,tcp:9001"),
    (
        "weaver-dsb-storage",
        "tcp:27017,tcp:27018,tcp:15672,tcp:15673,tcp:5672,tcp:5673,\
         tcp:6381,tcp:6382,tcp:6383,tcp:6384,tcp:6385,tcp:6386,tcp:6387,tcp:6388,\
         tcp:11212,tcp:11213,tcp:11214,tcp:11215,tcp:11216,tcp:11217",
    ),
    (
        "weaver-dsb-swarm",
        "tcp:2376,tcp:2377,tcp:7946,udp:4789,udp:7946",
    ),
];

fn terraform(ctx: &Context<'_>, action: &str) -> CommandSpec {
    CommandSpec::new("terraform")
        .arg(format!("-chdir={}", TERRAFORM_DIR))
        .arg(action)
        .current_dir(&ctx.config.base_dir)
}

fn firewall_rule(project: &str, name: &str, rules: &str) -> CommandSpec {
    CommandSpec::new("gcloud")
        .args(["compute", "--project", project, "firewall-rules", "create", name])
        .args([
            "--direction=INGRESS",
            "--priority=100",
            "--network=default",
            "--action=ALLOW",
        ])
        .arg(format!("--rules={}", rules))
        .arg("--source-ranges=0.0.0.0/0")
}

/// Public address of an instance; a placeholder under `--dry-run`
fn host_of(ctx: &Context<'_>, instance: &GcpInstance) -> Result<String> {
    if ctx.config.dry_run {
        return Ok(format!("<{}>", instance.name));
    }
    ctx.resolver()?.public_host(instance)
}

/// Application configs with the datastore hosts of each region
pub fn generate_weaver_configs(ctx: &Context<'_>) -> Result<()> {
    let layout = &ctx.config.gcp_layout;
    for (region, datastore) in [("eu", &layout.db_eu), ("us", &layout.db_us)] {
        let host = host_of(ctx, datastore)?;
        let template = read_template(
            &ctx.config
                .path(format!("deploy/weaver/weaver-template-{}.toml", region)),
        )?;
        let path = ctx.config.tmp_dir().join(format!("weaver-gcp-{}.toml", region));
        write_output(&path, &render_weaver_config(&template, &host)?)?;
        info!("generated app config for GCP at {}", path.display());
    }
    Ok(())
}

/// Ansible inventory with the hosts of every machine
pub fn generate_inventory(ctx: &Context<'_>) -> Result<()> {
    let layout = &ctx.config.gcp_layout;
    let hosts = InventoryHosts {
        db_manager: host_of(ctx, &layout.db_manager)?,
        db_eu: host_of(ctx, &layout.db_eu)?,
        db_us: host_of(ctx, &layout.db_us)?,
        app_wrk2: host_of(ctx, &layout.app_wrk2)?,
        app_eu: host_of(ctx, &layout.app_eu)?,
        app_us: host_of(ctx, &layout.app_us)?,
    };
    let user = &ctx.config.require_profile()?.username;

    let path = ctx.config.inventory_path();
    write_output(&path, &render_inventory(&hosts, user))?;
    info!("generated ansible inventory for GCP at '{}'", path.display());
    Ok(())
}

/// Ansible extra vars for the current deployment
pub fn generate_vars(
    ctx: &Context<'_>,
    timestamp: Option<&str>,
    deployment: Option<Target>,
) -> Result<()> {
    let template = read_template(&ctx.config.path("deploy/ansible/vars.yml"))?;
    let rendered = render_ansible_vars(&template, &ctx.config.base_dir, timestamp, deployment)?;
    write_output(&ctx.config.ansible_vars_path(), &rendered)?;
    Ok(())
}

fn copy_ansible_cfg(ctx: &Context<'_>) -> Result<()> {
    let source = ctx.config.path("deploy/ansible/ansible.cfg");
    if ctx.config.dry_run {
        info!("[dry-run] copy {} to ~/.ansible.cfg", source.display());
        return Ok(());
    }
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME is not set"))?;
    fs::copy(&source, home.join(".ansible.cfg"))?;
    info!("copied {} to ~/.ansible.cfg", source.display());
    Ok(())
}

pub fn configure(ctx: &Context<'_>, _: &Command) -> Result<()> {
    let project = &ctx.config.require_profile()?.project_id;
    info!("configuring firewalls");
    for (name, rules) in FIREWALL_RULES {
        if let Err(e) = ctx.run(&firewall_rule(project, name, rules)) {
            error!("could not configure firewall {}: {}", name, e);
        }
    }
    Ok(())
}

pub fn deploy(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&terraform(ctx, "init"))?;
    ctx.run(&terraform(ctx, "apply"))?;

    ctx.settle(
        ctx.config.machines_settle,
        "waiting for all machines to initialize",
    );
    copy_ansible_cfg(ctx)?;

    let tmp = ctx.config.tmp_dir();
    fs::create_dir_all(&tmp)?;
    info!("created {} directory", tmp.display());

    generate_weaver_configs(ctx)?;
    generate_inventory(ctx)?;
    generate_vars(ctx, None, None)?;

    ctx.run(&ctx.playbook("install-machines.yml"))?;
    ctx.wait_ready(&nodes_gate(ctx.config))?;
    Ok(())
}

pub fn start(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&ctx.playbook("start-datastores.yml"))?;
    ctx.wait_ready(&services_gate(ctx.config))?;
    ctx.run(&ctx.playbook("start-app.yml"))?;
    Ok(())
}

pub fn stop(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&ctx.playbook("stop-datastores.yml"))?;
    ctx.run(&ctx.playbook("stop-app.yml"))?;
    Ok(())
}

pub fn restart(ctx: &Context<'_>, command: &Command) -> Result<()> {
    stop(ctx, command)?;
    start(ctx, command)
}

pub fn clean(ctx: &Context<'_>, _: &Command) -> Result<()> {
    ctx.run(&terraform(ctx, "destroy"))?;
    let tmp = ctx.config.tmp_dir();
    if tmp.exists() {
        fs::remove_dir_all(&tmp)?;
        info!("removed {} directory", tmp.display());
    }
    Ok(())
}

pub fn info(ctx: &Context<'_>, _: &Command) -> Result<()> {
    let layout = &ctx.config.gcp_layout;
    ctx.run(&node_ls(&layout.db_manager))?;
    ctx.run(&service_ls(&layout.db_manager))?;

    println!("\n--- DATASTORES ---");
    println!("storage manager running @ {}", host_of(ctx, &layout.db_manager)?);
    println!("storage in {} running @ {}", layout.db_eu.zone, host_of(ctx, &layout.db_eu)?);
    println!("storage in {} running @ {}", layout.db_us.zone, host_of(ctx, &layout.db_us)?);
    println!("\n--- SERVICES ---");
    println!("wrk2 in {} running @ {}", layout.app_wrk2.zone, host_of(ctx, &layout.app_wrk2)?);
    println!("services in {} running @ {}", layout.app_eu.zone, host_of(ctx, &layout.app_eu)?);
    println!("services in {} running @ {}\n", layout.app_us.zone, host_of(ctx, &layout.app_us)?);
    Ok(())
}

pub fn init_social_graph(_: &Context<'_>, _: &Command) -> Result<()> {
    info!("nothing to be done for gcp");
    Ok(())
}

pub fn metrics(ctx: &Context<'_>, command: &Command) -> Result<()> {
    ctx.collect_metrics(metrics_timestamp(command))?;
    Ok(())
}

pub fn wrk2(ctx: &Context<'_>, command: &Command) -> Result<()> {
    let host = host_of(ctx, &ctx.config.gcp_layout.app_eu)?;
    let url = format!("http://{}:{}", host, ctx.config.app_port);
    let timestamp = timestamp_now();

    run_workload(ctx.config, ctx.runner, &url, &workload_params(command), &timestamp)?;

    generate_vars(ctx, Some(&timestamp), Some(Target::Gcp))?;
    ctx.run(&ctx.playbook("gather-metrics.yml"))?;
    info!(
        "metrics results saved at evaluation/gcp/{}/ in metrics-eu.yaml and metrics-us.yaml files",
        timestamp
    );
    Ok(())
}
